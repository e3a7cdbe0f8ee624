use clap::Parser;

use metrics_gate::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = metrics_gate::run_server(cli).await {
        eprintln!("metrics-gate failed: {:#}", e);
        std::process::exit(1);
    }
}
