//! The Control Block shared by every layer of one instance.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{BoxError, Failure};
use crate::layer::{LayerWalker, Methods, Nested, Projection};

/// Abort state carried by every object that takes part in a method chain.
///
/// `Control` is the innermost layer of every chain. Outer layers reach it
/// through [`Nested::control`] and signal "stop here, with this failure" by
/// calling [`abort`](Control::abort).
///
/// Once aborted the block stays aborted; the failure is recorded at most once
/// and later aborts are ignored.
#[derive(Default)]
pub struct Control {
    aborted: AtomicBool,
    failure: Mutex<Option<Failure>>,
}

impl Control {
    /// Creates a fresh, non-aborted control block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Aborts the chain with `failure`.
    ///
    /// Returns `true` if this call recorded the failure, `false` if the block
    /// was already aborted.
    pub fn abort(&self, failure: impl Into<BoxError>) -> bool {
        let mut slot = self.failure.lock();
        if self.aborted.load(Ordering::SeqCst) {
            trace!("Control block already aborted, ignoring abort");
            return false;
        }
        let failure = Failure::from_boxed(failure.into());
        debug!(failure = %failure, "Chain aborted");
        *slot = Some(failure);
        self.aborted.store(true, Ordering::SeqCst);
        true
    }

    /// Returns `true` once a layer has aborted.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Returns the recorded failure, if any.
    pub fn failure(&self) -> Option<Failure> {
        self.failure.lock().clone()
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("aborted", &self.is_aborted())
            .field("failure", &self.failure())
            .finish()
    }
}

impl Methods for Control {}

impl Nested for Control {
    fn control(&self) -> &Control {
        self
    }

    fn walk<C: Nested>(walker: &mut LayerWalker<C>, project: Projection<C, Self>) {
        walker.visit(project);
    }
}
