//! Chain construction and the two binding entry points.
//!
//! A [`Chain`] is the ordered list of layers of a concrete type that declare a
//! given method. It is computed once per `(type, name)` and shared through the
//! [`ChainCache`]. Callers get it bound either to one instance ([`bind`]) or
//! to a factory producing a fresh instance per call ([`make`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use rester_core::{TypeMapResolver, make};
//!
//! let greet = make(Users::default, "greet")?;
//! let resolver = TypeMapResolver::new().with(String::from("alice"));
//!
//! // One chain definition, a fresh `Users` per call.
//! greet.invoke(&resolver)?;
//! greet.invoke(&resolver)?;
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{Ready, ready};
use tower::Service;
use tracing::{debug, warn};

use crate::cache::ChainCache;
use crate::error::{ChainError, ChainResult};
use crate::invoke;
use crate::layer::{LayerId, LayerMethod, Nested, walk};
use crate::resolver::Resolver;
use crate::signature;

// ============================================================================
// Chain
// ============================================================================

/// The validated, ordered methods named `method` across the layers of `C`.
///
/// Immutable once built; one chain serves any number of invocations.
pub struct Chain<C> {
    type_name: &'static str,
    method: String,
    methods: Vec<LayerMethod<C>>,
}

impl<C: Nested> Chain<C> {
    /// Walks `C` and validates every declaration of `name`, bypassing the cache.
    ///
    /// The first declaration with result values fails the whole chain, even
    /// if other layers declare `name` correctly.
    pub fn build(name: &str) -> ChainResult<Self> {
        let type_name = std::any::type_name::<C>();
        let methods = walk::<C>(name);
        if methods.is_empty() {
            debug!(type_name, method = name, "No layer declares method");
            return Err(ChainError::NoMethodFound {
                type_name,
                method: name.to_owned(),
            });
        }

        for method in &methods {
            if let Err(err) = signature::validate(method) {
                warn!(type_name, method = name, error = %err, "Rejected method chain");
                return Err(err);
            }
        }

        debug!(
            type_name,
            method = name,
            layers = methods.len(),
            "Method chain constructed"
        );
        Ok(Self {
            type_name,
            method: name.to_owned(),
            methods,
        })
    }

    /// Returns the cached chain of `name` on `C`.
    pub fn resolve(name: &str) -> ChainResult<Arc<Self>> {
        ChainCache::global().chain::<C>(name)
    }

    /// Runs the chain against `target`.
    pub fn invoke<R>(&self, target: &mut C, resolver: &R) -> ChainResult<()>
    where
        R: Resolver + ?Sized,
    {
        invoke::run(self, target, resolver)
    }
}

impl<C> Chain<C> {
    /// The concrete type's name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The declaring layers, innermost first.
    pub fn layers(&self) -> impl Iterator<Item = &LayerId> {
        self.methods.iter().map(LayerMethod::layer)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub(crate) fn methods(&self) -> &[LayerMethod<C>] {
        &self.methods
    }
}

impl<C> fmt::Display for Chain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.method)
    }
}

impl<C> fmt::Debug for Chain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("type_name", &self.type_name)
            .field("method", &self.method)
            .field("methods", &self.methods)
            .finish()
    }
}

// ============================================================================
// Bind-to-instance
// ============================================================================

/// Builds the chain of `name` for `instance`'s type and binds it to `instance`.
pub fn bind<C: Nested>(instance: C, name: &str) -> ChainResult<BoundChain<C>> {
    let chain = Chain::<C>::resolve(name)?;
    Ok(BoundChain { chain, instance })
}

/// A chain bound to one instance.
///
/// The instance's Control Block persists across invocations: once a layer
/// aborts, every later invocation returns the same failure without running.
pub struct BoundChain<C> {
    chain: Arc<Chain<C>>,
    instance: C,
}

impl<C: Nested> BoundChain<C> {
    /// Runs the chain against the bound instance.
    pub fn invoke<R>(&mut self, resolver: &R) -> ChainResult<()>
    where
        R: Resolver + ?Sized,
    {
        self.chain.invoke(&mut self.instance, resolver)
    }

    pub fn chain(&self) -> &Arc<Chain<C>> {
        &self.chain
    }

    pub fn instance(&self) -> &C {
        &self.instance
    }

    pub fn into_inner(self) -> C {
        self.instance
    }
}

impl<C: fmt::Debug> fmt::Debug for BoundChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundChain")
            .field("chain", &format_args!("{}", self.chain))
            .field("instance", &self.instance)
            .finish()
    }
}

// ============================================================================
// Bind-to-factory
// ============================================================================

/// Builds the chain of `name` for the type `factory` produces.
///
/// The returned callable calls `factory` on every invocation, so no abort
/// state carries over from one invocation to the next.
pub fn make<C, F>(factory: F, name: &str) -> ChainResult<FactoryChain<C, F>>
where
    C: Nested,
    F: Fn() -> C,
{
    let chain = Chain::<C>::resolve(name)?;
    Ok(FactoryChain {
        chain,
        factory,
        _marker: PhantomData,
    })
}

/// A chain that runs against a fresh instance per invocation.
///
/// Implements [`tower::Service`] with the resolver as the request, so it can
/// be wrapped in tower middleware:
///
/// ```rust,ignore
/// use tower::ServiceExt;
///
/// let service = make(Users::default, "get")?;
/// service.oneshot(resolver).await?;
/// ```
pub struct FactoryChain<C, F> {
    chain: Arc<Chain<C>>,
    factory: F,
    _marker: PhantomData<fn() -> C>,
}

impl<C, F> FactoryChain<C, F>
where
    C: Nested,
    F: Fn() -> C,
{
    /// Creates a fresh instance and runs the chain against it.
    pub fn invoke<R>(&self, resolver: &R) -> ChainResult<()>
    where
        R: Resolver + ?Sized,
    {
        let mut instance = (self.factory)();
        self.chain.invoke(&mut instance, resolver)
    }

    pub fn chain(&self) -> &Arc<Chain<C>> {
        &self.chain
    }
}

impl<C, F: Clone> Clone for FactoryChain<C, F> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            factory: self.factory.clone(),
            _marker: PhantomData,
        }
    }
}

impl<C, F> fmt::Debug for FactoryChain<C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryChain")
            .field("chain", &format_args!("{}", self.chain))
            .finish_non_exhaustive()
    }
}

impl<C, F, R> Service<R> for FactoryChain<C, F>
where
    C: Nested,
    F: Fn() -> C,
    R: Resolver,
{
    type Response = ();
    type Error = ChainError;
    type Future = Ready<ChainResult<()>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, resolver: R) -> Self::Future {
        ready(self.invoke(&resolver))
    }
}
