//! Routing errors.

use rester_core::ChainError;
use thiserror::Error;

use crate::method::Method;

/// Errors raised while registering controllers or dispatching requests.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    /// Building or invoking a controller's chain failed.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// A different controller type is already registered at the path.
    #[error("path {path} is already controlled by {existing}, cannot register {controller}")]
    Conflict {
        path: String,
        existing: &'static str,
        controller: &'static str,
    },

    /// The controller declares none of the configured verbs.
    #[error("controller {controller} declares no handler for any of {methods:?}")]
    NoHandlers {
        controller: &'static str,
        methods: Vec<Method>,
    },

    /// The path does not start with `/`.
    #[error("invalid path {0:?}: paths must begin with '/'")]
    InvalidPath(String),

    /// No controller is registered at the path.
    #[error("no controller registered at {path}")]
    NotFound { path: String },

    /// The controller at the path does not handle the verb.
    #[error("{method} not allowed on {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    /// The verb is not one of the nine HTTP methods.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),
}

impl RouteError {
    /// Returns the chain error, if this error came from the engine.
    pub fn as_chain(&self) -> Option<&ChainError> {
        match self {
            Self::Chain(err) => Some(err),
            _ => None,
        }
    }
}
