//! Layers and the walk over an object's embedding structure.
//!
//! An object taking part in method chains is built from nested layers:
//!
//! ```text
//! Users { auth: Auth { control: Control } }
//!
//!   depth 0   Control   (innermost, the Control Block)
//!   depth 1   Auth
//!   depth 2   Users     (outermost, the concrete type)
//! ```
//!
//! Each layer implements [`Nested`] (how to reach the Control Block and the
//! next inner layer) and [`Methods`] (its own method table). The walk starts
//! at the concrete type, recurses into the embedded layer first, and records
//! every layer on the way back out, so layers come out innermost first.
//!
//! `#[derive(Nested)]` and `#[methods]` generate both traits.

use std::any::{TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::control::Control;
use crate::error::{BoxError, ChainError, ChainResult, Failure};
use crate::invoke::Next;
use crate::method::{Args, MethodFn, MethodSet, Param};

// ============================================================================
// Layer traits
// ============================================================================

/// The method table a layer declares itself.
///
/// Only methods declared here count for this layer; methods of embedded
/// layers are found by walking those layers, never by promotion.
pub trait Methods: Sized + 'static {
    /// Fills in this layer's own methods. The default declares none.
    fn declare(_methods: &mut MethodSet<Self>) {}
}

/// A structural layer of an object that owns exactly one [`Control`] block.
///
/// # Example
///
/// ```rust,ignore
/// use rester_core::{Control, Nested};
///
/// #[derive(Default, Nested)]
/// pub struct Auth {
///     #[nested(embed)]
///     control: Control,
/// }
///
/// #[derive(Default, Nested)]
/// pub struct Users {
///     #[nested(embed)]
///     auth: Auth,
/// }
/// ```
pub trait Nested: Methods {
    /// The Control Block of the object this layer belongs to.
    fn control(&self) -> &Control;

    /// Visits the embedded layer, then this one.
    ///
    /// `project` reaches `Self` from the concrete type `C`.
    fn walk<C: Nested>(walker: &mut LayerWalker<C>, project: Projection<C, Self>);

    /// Aborts the running chain with `failure`. See [`Control::abort`].
    fn abort(&self, failure: impl Into<BoxError>) -> bool {
        self.control().abort(failure)
    }

    /// Returns `true` once any layer of this object has aborted.
    fn is_aborted(&self) -> bool {
        self.control().is_aborted()
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Borrows layer `L` out of the concrete type `C`.
pub struct Projection<C, L> {
    f: Arc<dyn Fn(&C) -> &L + Send + Sync>,
}

impl<C: 'static> Projection<C, C> {
    /// The projection of the concrete type onto itself.
    pub fn root() -> Self {
        Self::from_fn(|target| target)
    }
}

impl<C: 'static, L: 'static> Projection<C, L> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&C) -> &L + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    /// Extends the projection one layer inwards.
    pub fn then<M: 'static>(&self, step: fn(&L) -> &M) -> Projection<C, M> {
        let outer = self.clone();
        Projection::from_fn(move |target| step(outer.apply(target)))
    }

    pub fn apply<'a>(&self, target: &'a C) -> &'a L {
        (self.f)(target)
    }
}

impl<C, L> Clone for Projection<C, L> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

// ============================================================================
// Layer identity and discovered methods
// ============================================================================

/// Identity of one layer within a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerId {
    type_id: TypeId,
    type_name: &'static str,
    depth: usize,
}

impl LayerId {
    fn of<L: 'static>(depth: usize) -> Self {
        Self {
            type_id: TypeId::of::<L>(),
            type_name: type_name::<L>(),
            depth,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Distance from the Control Block; the Control Block itself is 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` if this layer is of type `L`.
    pub fn is<L: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<L>()
    }
}

type ErasedFn<C> = Arc<dyn Fn(&C, Next<'_>, &mut Args) -> ChainResult<()> + Send + Sync>;

/// A method found on one layer of `C`, callable with a `&C` receiver.
pub struct LayerMethod<C> {
    layer: LayerId,
    name: &'static str,
    params: Vec<Param>,
    results: Vec<&'static str>,
    call: ErasedFn<C>,
}

impl<C: 'static> LayerMethod<C> {
    fn erase<L: 'static>(
        layer: LayerId,
        name: &'static str,
        params: Vec<Param>,
        results: Vec<&'static str>,
        call: MethodFn<L>,
        project: Projection<C, L>,
    ) -> Self {
        let call: ErasedFn<C> = Arc::new(move |target: &C, next: Next<'_>, args: &mut Args| {
            call(project.apply(target), next, args)
        });
        Self {
            layer,
            name,
            params,
            results,
            call,
        }
    }
}

impl<C> LayerMethod<C> {
    /// The declaring layer.
    pub fn layer(&self) -> &LayerId {
        &self.layer
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Declared result types; non-empty means the signature is invalid.
    pub fn results(&self) -> &[&'static str] {
        &self.results
    }

    pub(crate) fn call(&self, target: &C, next: Next<'_>, args: &mut Args) -> ChainResult<()> {
        (self.call)(target, next, args)
    }

    pub(crate) fn resolution_error(&self, param: &Param, source: Failure) -> ChainError {
        ChainError::Resolution {
            layer: self.layer.type_name,
            method: self.name.to_owned(),
            index: param.index(),
            param_type: param.type_name(),
            source,
        }
    }
}

impl<C> fmt::Debug for LayerMethod<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerMethod")
            .field("layer", &self.layer.type_name)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// LayerWalker
// ============================================================================

/// Collects the layers of `C` as [`Nested::walk`] visits them.
pub struct LayerWalker<C> {
    name: Option<String>,
    layers: Vec<LayerId>,
    found: Vec<LayerMethod<C>>,
}

impl<C: Nested> LayerWalker<C> {
    fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            layers: Vec::new(),
            found: Vec::new(),
        }
    }

    /// Records layer `L`, reached from `C` through `project`.
    ///
    /// Called by [`Nested::walk`] after the embedded layer has been walked.
    pub fn visit<L: Nested>(&mut self, project: Projection<C, L>) {
        let layer = LayerId::of::<L>(self.layers.len());
        self.layers.push(layer);

        let Some(name) = self.name.as_deref() else {
            return;
        };
        let mut methods = MethodSet::<L>::new();
        L::declare(&mut methods);
        if let Some(decl) = methods.take(name) {
            let (name, params, results, call) = decl.into_parts();
            self.found.push(LayerMethod::erase(
                layer, name, params, results, call, project,
            ));
        }
    }

    fn run(mut self) -> Self {
        C::walk(&mut self, Projection::root());
        self
    }
}

/// Returns every layer of `C`, innermost first.
pub fn layers<C: Nested>() -> Vec<LayerId> {
    LayerWalker::<C>::new(None).run().layers
}

/// Returns the methods named `name` declared across the layers of `C`,
/// innermost first. Empty if no layer declares it.
pub fn walk<C: Nested>(name: &str) -> Vec<LayerMethod<C>> {
    LayerWalker::<C>::new(Some(name)).run().found
}
