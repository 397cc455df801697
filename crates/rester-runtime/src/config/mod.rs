//! Configuration for rester applications.
//!
//! Layered loading with figment, the schema, and validation of the loaded
//! values.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, ResterConfig, SpanEventConfig,
};
pub use validation::validate_config;

pub use rester_router::RouterConfig;
