//! Error types for chain construction and invocation.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A boxed error supplied by user code (layer bodies, resolvers).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure value stored in a [`Control`](crate::Control) block or carried by
/// a [`ChainError`].
///
/// Cheap to clone: the underlying error is shared, so the value a layer passed
/// to `abort` is the one the caller gets back.
#[derive(Clone)]
pub struct Failure(Arc<dyn StdError + Send + Sync + 'static>);

impl Failure {
    /// Wraps an error value.
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Creates a failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::from_boxed(message.into())
    }

    /// Wraps an already boxed error without re-boxing it.
    pub fn from_boxed(error: BoxError) -> Self {
        Self(Arc::from(error))
    }

    /// Returns the underlying error as `E`, if that is its concrete type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Returns `true` if both values share the same underlying error.
    pub fn ptr_eq(&self, other: &Failure) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for Failure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

impl From<BoxError> for Failure {
    fn from(error: BoxError) -> Self {
        Self::from_boxed(error)
    }
}

/// Errors produced while building or invoking a method chain.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// No layer of the type declares the requested method.
    #[error("no method chain found: {type_name}.{method}")]
    NoMethodFound {
        /// The concrete type the chain was requested for.
        type_name: &'static str,
        /// The requested method name.
        method: String,
    },

    /// A declaring layer's method has result values.
    #[error("{type_name}.{method} has out parameters")]
    InvalidSignature {
        /// The layer that declares the offending method.
        type_name: &'static str,
        /// The method name.
        method: String,
        /// The declared result types.
        results: Vec<&'static str>,
    },

    /// The resolver could not supply an argument.
    #[error("cannot resolve argument #{index} ({param_type}) of {layer}.{method}: {source}")]
    Resolution {
        /// The layer about to be invoked.
        layer: &'static str,
        /// The method about to be invoked.
        method: String,
        /// Position of the parameter among the injected parameters.
        index: usize,
        /// The parameter's declared type.
        param_type: &'static str,
        /// What went wrong.
        source: Failure,
    },

    /// The resolver's initialization hook rejected the instance.
    #[error("failed to initialize {type_name}: {source}")]
    Initialize {
        /// The concrete type being invoked.
        type_name: &'static str,
        /// What went wrong.
        source: Failure,
    },

    /// A layer called `abort`; carries the failure it supplied.
    #[error(transparent)]
    Aborted(Failure),
}

impl ChainError {
    /// Returns `true` for errors raised while building a chain.
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::NoMethodFound { .. } | Self::InvalidSignature { .. }
        )
    }

    /// Returns the failure a layer aborted with, if this is an abort.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Aborted(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
