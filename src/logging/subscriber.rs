//! Global subscriber for the gateway
//!
//! `RUST_LOG` wins over `logging.level`. Without it, the transport crates
//! under kube are held at `warn` so that building a client per caller does
//! not flood the output with connection chatter.

use anyhow::{bail, Context, Result};
use std::str::FromStr;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};
use uuid::Uuid;

use crate::config::LoggingConfig;

const QUIET_DEPENDENCIES: &[&str] = &[
    "hyper=warn",
    "hyper_util=warn",
    "rustls=warn",
    "tower=warn",
    "kube_client=warn",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => bail!("Unsupported log format: {value}. Use 'json' or 'pretty'"),
        }
    }
}

/// Request correlation id, used when the caller sends none
pub fn generate_trace_id() -> String {
    Uuid::new_v4().to_string()
}

fn level_filter(level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    QUIET_DEPENDENCIES.iter().try_fold(
        EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?,
        |filter, directive| Ok(filter.add_directive(directive.parse()?)),
    )
}

fn event_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true);

    match format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
    }
}

/// Install the process-wide subscriber described by `config`
pub fn setup_tracing(config: &LoggingConfig) -> Result<()> {
    let format: LogFormat = config.format.parse()?;
    let filter = level_filter(&config.level)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(event_layer(format))
        .try_init()
        .context("tracing subscriber already installed")
}
