//! Shared utilities: filesystem helpers and logging setup.

pub mod fs;
pub mod logging;

pub use logging::{init_from_env, init_logging, parse_level, LoggingConfig};
