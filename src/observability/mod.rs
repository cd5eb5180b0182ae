//! Observability for stocklab
//!
//! Logging goes through `tracing`; this module only installs the subscriber.

mod logger;

pub use logger::{init_logging, LogFormat, DEFAULT_FILTER};
