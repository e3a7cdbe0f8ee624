pub mod sanitization;
pub mod subscriber;
pub mod trace_id;

pub use sanitization::*;
pub use subscriber::*;
pub use trace_id::*;
