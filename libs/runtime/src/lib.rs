//! Process-level plumbing shared by httpsuite binaries: layered configuration
//! and logging setup.

pub mod config;
pub mod logging;

pub use config::{
    default_logging_config, AppConfig, CliArgs, LoggingConfig, ProblemsConfig, Section,
    ServerConfig,
};
