//! Rester Runtime - configuration and logging for rester applications.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `ResterConfig`)
//! - Logging initialization (`LoggingBuilder`, `init_from_config`)
//! - The `Runtime`, which ties both to a `Router`
//!
//! ```ignore
//! use rester_runtime::Runtime;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = Runtime::load()?;
//!     runtime.control_default::<Users>("/users")?;
//!
//!     for route in runtime.routes() {
//!         println!("{} {:?}", route.path, route.methods);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, ResterConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};
pub use runtime::{Runtime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for application code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
