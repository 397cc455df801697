//! The argument resolver contract.
//!
//! The engine never constructs call arguments itself. For every injected
//! parameter of the layer about to run it asks the caller-supplied
//! [`Resolver`], passing the declaring layer and the parameter's position and
//! type. A resolver may also prepare each instance once before the first
//! layer runs.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::layer::LayerId;
use crate::method::Param;

/// A resolved argument value. Its concrete type must be the parameter's type.
pub type Arg = Box<dyn Any>;

/// Supplies call arguments and optional per-instance setup.
///
/// # Example
///
/// ```rust,ignore
/// struct RequestResolver { user: String }
///
/// impl Resolver for RequestResolver {
///     fn resolve(&self, _layer: &LayerId, param: &Param) -> Result<Arg, BoxError> {
///         if param.is::<String>() {
///             return Ok(Box::new(self.user.clone()));
///         }
///         Err(format!("cannot provide `{}`", param.type_name()).into())
///     }
/// }
/// ```
pub trait Resolver {
    /// Called once per invocation, before the first layer runs.
    ///
    /// An error here prevents every layer from running and becomes the
    /// invocation's result.
    fn initialize(&self, _instance: &mut dyn Any) -> Result<(), BoxError> {
        Ok(())
    }

    /// Supplies the value of `param` for a method declared on `layer`.
    fn resolve(&self, layer: &LayerId, param: &Param) -> Result<Arg, BoxError>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn initialize(&self, instance: &mut dyn Any) -> Result<(), BoxError> {
        (**self).initialize(instance)
    }

    fn resolve(&self, layer: &LayerId, param: &Param) -> Result<Arg, BoxError> {
        (**self).resolve(layer, param)
    }
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn initialize(&self, instance: &mut dyn Any) -> Result<(), BoxError> {
        (**self).initialize(instance)
    }

    fn resolve(&self, layer: &LayerId, param: &Param) -> Result<Arg, BoxError> {
        (**self).resolve(layer, param)
    }
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn initialize(&self, instance: &mut dyn Any) -> Result<(), BoxError> {
        (**self).initialize(instance)
    }

    fn resolve(&self, layer: &LayerId, param: &Param) -> Result<Arg, BoxError> {
        (**self).resolve(layer, param)
    }
}

// ============================================================================
// TypeMapResolver
// ============================================================================

type Provider = Box<dyn Fn() -> Arg + Send + Sync>;
type InitHook = Box<dyn Fn(&mut dyn Any) -> Result<(), BoxError> + Send + Sync>;

/// A resolver that answers by parameter type alone.
///
/// Each registered value is cloned into every parameter of that type,
/// regardless of layer or position.
///
/// ```rust,ignore
/// let resolver = TypeMapResolver::new()
///     .with(String::from("alice"))
///     .with(10i32);
/// ```
#[derive(Default)]
pub struct TypeMapResolver {
    providers: HashMap<TypeId, Provider>,
    init: Vec<InitHook>,
}

impl TypeMapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provides a clone of `value` for every parameter of type `T`.
    pub fn with<T: Clone + Send + Sync + 'static>(self, value: T) -> Self {
        self.with_fn(move || value.clone())
    }

    /// Provides a freshly computed value for every parameter of type `T`.
    pub fn with_fn<T, F>(mut self, f: F) -> Self
    where
        T: 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.providers
            .insert(TypeId::of::<T>(), Box::new(move || Box::new(f()) as Arg));
        self
    }

    /// Runs `hook` on every instance of type `C` before its chain starts.
    ///
    /// Instances of other types are left alone.
    pub fn on_initialize<C, F>(mut self, hook: F) -> Self
    where
        C: 'static,
        F: Fn(&mut C) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.init.push(Box::new(move |instance: &mut dyn Any| {
            match instance.downcast_mut::<C>() {
                Some(instance) => hook(instance),
                None => Ok(()),
            }
        }));
        self
    }

    /// Returns `true` if a value of type `T` is registered.
    pub fn contains<T: 'static>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<T>())
    }
}

impl Resolver for TypeMapResolver {
    fn initialize(&self, instance: &mut dyn Any) -> Result<(), BoxError> {
        self.init.iter().try_for_each(|hook| hook(&mut *instance))
    }

    fn resolve(&self, layer: &LayerId, param: &Param) -> Result<Arg, BoxError> {
        let provider = self.providers.get(&param.type_id()).ok_or_else(|| {
            format!(
                "no value registered for `{}` (needed by {})",
                param.type_name(),
                layer.type_name()
            )
        })?;
        Ok(provider())
    }
}

impl fmt::Debug for TypeMapResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMapResolver")
            .field("providers", &self.providers.len())
            .field("init_hooks", &self.init.len())
            .finish()
    }
}
