//! Execution of a chain against one instance.
//!
//! An invocation walks the chain innermost first. Each layer receives a
//! [`Next`] handle; running it executes the remaining outer layers right
//! there, inside the current layer, and returns once they are done. A layer
//! that drops its handle without running it ends the chain without error.
//!
//! ```text
//! Pending ──start──▶ Running ──outermost done / handle dropped──▶ Completed
//!                       │
//!                       └──abort / resolution failure──▶ Aborted
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;

use tracing::{debug, trace};

use crate::chain::Chain;
use crate::error::{ChainError, ChainResult, Failure};
use crate::layer::{LayerMethod, Nested};
use crate::method::Args;
use crate::resolver::Resolver;

/// Lifecycle of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// No layer has run yet.
    Pending,
    /// Layers are executing.
    Running,
    /// The chain ran to its end or a layer stopped it without aborting.
    Completed,
    /// A layer aborted or an argument could not be resolved.
    Aborted,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        })
    }
}

/// Continuation handle passed to every layer method that asks for one.
///
/// Declare a `next: Next<'_>` parameter to receive it. Calling
/// [`run`](Next::run) executes all outer layers before returning; not calling
/// it means "handled here, outer layers are not needed".
#[must_use = "dropping `Next` without running it stops the chain at this layer"]
pub struct Next<'a> {
    invocation: &'a dyn Continue,
    at: usize,
}

impl<'a> Next<'a> {
    fn new(invocation: &'a dyn Continue, at: usize) -> Self {
        Self { invocation, at }
    }

    /// Runs the remaining outer layers.
    ///
    /// Does nothing once the invocation has been aborted.
    pub fn run(self) {
        self.invocation.proceed(self.at);
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next").field("at", &self.at).finish()
    }
}

trait Continue {
    fn proceed(&self, at: usize);
}

struct Invocation<'a, C, R: ?Sized> {
    chain: &'a Chain<C>,
    target: &'a C,
    resolver: &'a R,
    cursor: Cell<usize>,
    state: Cell<State>,
    error: RefCell<Option<ChainError>>,
}

impl<'a, C: Nested, R: Resolver + ?Sized> Invocation<'a, C, R> {
    fn new(chain: &'a Chain<C>, target: &'a C, resolver: &'a R) -> Self {
        Self {
            chain,
            target,
            resolver,
            cursor: Cell::new(0),
            state: Cell::new(State::Pending),
            error: RefCell::new(None),
        }
    }

    fn transition(&self, to: State) {
        trace!(
            chain = %self.chain,
            from = %self.state.get(),
            to = %to,
            "Invocation state change"
        );
        self.state.set(to);
    }

    fn start(&self) {
        self.transition(State::Running);
        self.step(0);
        if self.state.get() == State::Running {
            self.transition(State::Completed);
        }
    }

    fn step(&self, index: usize) {
        let Some(method) = self.chain.methods().get(index) else {
            return;
        };
        self.cursor.set(index + 1);
        trace!(
            layer = method.layer().type_name(),
            method = method.name(),
            depth = method.layer().depth(),
            "Entering layer"
        );

        let mut args = match self.resolve(method) {
            Ok(args) => args,
            Err(err) => return self.fail(err),
        };
        if let Err(err) = method.call(self.target, Next::new(self, index + 1), &mut args) {
            return self.fail(err);
        }

        if self.target.is_aborted() && self.state.get() == State::Running {
            self.transition(State::Aborted);
        }
    }

    fn resolve(&self, method: &LayerMethod<C>) -> ChainResult<Args> {
        let mut values = Vec::with_capacity(method.params().len());
        for param in method.params() {
            let value = self
                .resolver
                .resolve(method.layer(), param)
                .map_err(|err| method.resolution_error(param, Failure::from_boxed(err)))?;
            if Any::type_id(&*value) != param.type_id() {
                return Err(method.resolution_error(
                    param,
                    Failure::msg(format!(
                        "resolver returned a value that is not `{}`",
                        param.type_name()
                    )),
                ));
            }
            values.push(value);
        }
        Ok(Args::new(
            method.layer().type_name(),
            method.name(),
            method.params().to_vec(),
            values,
        ))
    }

    fn fail(&self, err: ChainError) {
        debug!(chain = %self.chain, error = %err, "Invocation failed");
        self.error.borrow_mut().get_or_insert(err);
        if self.state.get() == State::Running {
            self.transition(State::Aborted);
        }
    }

    fn finish(self) -> ChainResult<()> {
        trace!(
            chain = %self.chain,
            state = %self.state.get(),
            layers_run = self.cursor.get(),
            "Invocation finished"
        );
        match self.state.get() {
            State::Aborted => Err(self
                .error
                .into_inner()
                .unwrap_or_else(|| ChainError::Aborted(stored_failure(self.target)))),
            _ => Ok(()),
        }
    }
}

impl<C: Nested, R: Resolver + ?Sized> Continue for Invocation<'_, C, R> {
    fn proceed(&self, at: usize) {
        if self.state.get() != State::Running || self.target.is_aborted() {
            trace!(chain = %self.chain, at, "Continuation ignored after abort");
            return;
        }
        self.step(at);
    }
}

fn stored_failure<C: Nested>(target: &C) -> Failure {
    target
        .control()
        .failure()
        .unwrap_or_else(|| Failure::msg("chain aborted"))
}

/// Runs `chain` against `target`.
pub(crate) fn run<C, R>(chain: &Chain<C>, target: &mut C, resolver: &R) -> ChainResult<()>
where
    C: Nested,
    R: Resolver + ?Sized,
{
    if target.is_aborted() {
        debug!(chain = %chain, "Instance already aborted, not running");
        return Err(ChainError::Aborted(stored_failure(target)));
    }

    resolver
        .initialize(target)
        .map_err(|err| ChainError::Initialize {
            type_name: chain.type_name(),
            source: Failure::from_boxed(err),
        })?;
    if target.is_aborted() {
        debug!(chain = %chain, "Instance aborted during initialization");
        return Err(ChainError::Aborted(stored_failure(target)));
    }

    let invocation = Invocation::new(chain, &*target, resolver);
    invocation.start();
    invocation.finish()
}
