//! Logging setup.
//!
//! The library itself only emits through the `log` facade. Binaries and demos
//! call [`init_logging`] once to install an `env_logger` backend.

mod init;

pub use init::{init_logging, LoggingConfig};
