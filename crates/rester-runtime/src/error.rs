//! Runtime error types.

use rester_router::RouteError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while starting or driving a [`Runtime`](crate::Runtime).
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating the configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Registering a controller or dispatching a request failed.
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
