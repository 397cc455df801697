//! Method tables declared by individual layers.
//!
//! A [`MethodSet`] is what a layer's [`Methods::declare`](crate::Methods::declare)
//! fills in. Each [`MethodDecl`] records the method name, the parameters the
//! resolver has to supply, the declared result types, and a plain function
//! pointer that performs the call once the arguments are resolved.
//!
//! The `#[methods]` attribute generates these declarations; writing them by
//! hand is equivalent:
//!
//! ```rust,ignore
//! impl Methods for Greeter {
//!     fn declare(methods: &mut MethodSet<Self>) {
//!         methods.declare(
//!             MethodDecl::<Self>::new("greet", |this, next, args| {
//!                 this.greet(next, args.take(0)?);
//!                 Ok(())
//!             })
//!             .param::<String>(),
//!         );
//!     }
//! }
//! ```

use std::any::{Any, TypeId, type_name};
use std::fmt;

use tracing::warn;

use crate::error::{ChainError, ChainResult, Failure};
use crate::invoke::Next;
use crate::resolver::Arg;

/// The call shim of a declared method: receiver, continuation, resolved arguments.
pub type MethodFn<L> = fn(&L, Next<'_>, &mut Args) -> ChainResult<()>;

/// A parameter the resolver must supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    index: usize,
    type_id: TypeId,
    type_name: &'static str,
}

impl Param {
    /// Describes parameter `index` of type `T`.
    pub fn of<T: 'static>(index: usize) -> Self {
        Self {
            index,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Position among the injected parameters, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The parameter's type identity.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The parameter's type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the parameter has type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// One method declared directly on layer `L`.
pub struct MethodDecl<L> {
    name: &'static str,
    params: Vec<Param>,
    results: Vec<&'static str>,
    call: MethodFn<L>,
}

impl<L> MethodDecl<L> {
    /// Declares method `name` invoked through `call`.
    pub fn new(name: &'static str, call: MethodFn<L>) -> Self {
        Self {
            name,
            params: Vec::new(),
            results: Vec::new(),
            call,
        }
    }

    /// Appends an injected parameter of type `T`.
    pub fn param<T: 'static>(mut self) -> Self {
        let index = self.params.len();
        self.params.push(Param::of::<T>(index));
        self
    }

    /// Records the method's declared result types.
    pub fn results(mut self, results: &[&'static str]) -> Self {
        self.results = results.to_vec();
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn result_types(&self) -> &[&'static str] {
        &self.results
    }

    pub(crate) fn into_parts(self) -> (&'static str, Vec<Param>, Vec<&'static str>, MethodFn<L>) {
        (self.name, self.params, self.results, self.call)
    }
}

impl<L> fmt::Debug for MethodDecl<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("results", &self.results)
            .finish_non_exhaustive()
    }
}

/// The methods declared directly on layer `L`, in declaration order.
pub struct MethodSet<L> {
    decls: Vec<MethodDecl<L>>,
}

impl<L> Default for MethodSet<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L> MethodSet<L> {
    pub fn new() -> Self {
        Self { decls: Vec::new() }
    }

    /// Adds a declaration. A later declaration with the same name replaces the
    /// earlier one.
    pub fn declare(&mut self, decl: MethodDecl<L>) -> &mut Self {
        if let Some(existing) = self.decls.iter_mut().find(|d| d.name == decl.name) {
            warn!(
                layer = type_name::<L>(),
                method = decl.name,
                "Method declared twice, keeping the later declaration"
            );
            *existing = decl;
        } else {
            self.decls.push(decl);
        }
        self
    }

    /// Looks up a declaration by name.
    pub fn get(&self, name: &str) -> Option<&MethodDecl<L>> {
        self.decls.iter().find(|d| d.name == name)
    }

    /// Declared method names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.decls.iter().map(|d| d.name)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<MethodDecl<L>> {
        let pos = self.decls.iter().position(|d| d.name == name)?;
        Some(self.decls.remove(pos))
    }
}

/// Resolved arguments for one call, consumed positionally by the call shim.
pub struct Args {
    layer: &'static str,
    method: &'static str,
    params: Vec<Param>,
    values: Vec<Option<Arg>>,
}

impl Args {
    pub(crate) fn new(
        layer: &'static str,
        method: &'static str,
        params: Vec<Param>,
        values: Vec<Arg>,
    ) -> Self {
        Self {
            layer,
            method,
            params,
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// Takes argument `index` as a `T`.
    ///
    /// Each argument can be taken once.
    pub fn take<T: 'static>(&mut self, index: usize) -> ChainResult<T> {
        let value = self
            .values
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| self.mismatch::<T>(index, "argument missing"))?;

        match value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => Err(self.mismatch::<T>(index, "argument has an unexpected type")),
        }
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    fn mismatch<T: Any>(&self, index: usize, reason: &str) -> ChainError {
        ChainError::Resolution {
            layer: self.layer,
            method: self.method.to_owned(),
            index,
            param_type: self
                .params
                .get(index)
                .map_or_else(type_name::<T>, Param::type_name),
            source: Failure::msg(reason),
        }
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("layer", &self.layer)
            .field("method", &self.method)
            .field("params", &self.params)
            .field("remaining", &self.remaining())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Layer;

    fn noop(_: &Layer, _: Next<'_>, _: &mut Args) -> ChainResult<()> {
        Ok(())
    }

    #[test]
    fn test_param_indices_follow_declaration_order() {
        let decl = MethodDecl::<Layer>::new("m", noop)
            .param::<String>()
            .param::<i32>();
        assert_eq!(decl.params().len(), 2);
        assert_eq!(decl.params()[0].index(), 0);
        assert!(decl.params()[0].is::<String>());
        assert_eq!(decl.params()[1].index(), 1);
        assert!(decl.params()[1].is::<i32>());
        assert!(decl.result_types().is_empty());
    }

    #[test]
    fn test_later_declaration_replaces_earlier() {
        let mut set = MethodSet::<Layer>::new();
        set.declare(MethodDecl::new("a", noop));
        set.declare(MethodDecl::new("b", noop));
        set.declare(MethodDecl::new("a", noop).param::<u8>());
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(set.get("a").map(|d| d.params().len()), Some(1));
        assert!(set.take("a").is_some());
        assert!(set.get("a").is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_args_take_once() {
        let params = vec![Param::of::<String>(0), Param::of::<i32>(1)];
        let values: Vec<Arg> = vec![Box::new("hi".to_string()), Box::new(10i32)];
        let mut args = Args::new("Layer", "m", params, values);

        assert_eq!(args.take::<i32>(1).unwrap(), 10);
        assert_eq!(args.remaining(), 1);
        assert!(args.take::<i32>(1).is_err());

        let err = args.take::<u64>(0).unwrap_err();
        assert!(matches!(err, ChainError::Resolution { index: 0, param_type, .. } if param_type == type_name::<String>()));
    }
}
