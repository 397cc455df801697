//! Procedural macros for rester.
//!
//! Rust has no runtime reflection, so the layers of an object and the methods
//! each layer declares are registered statically:
//!
//! - `#[derive(Nested)]` - Generates the walk over an embedded layer
//! - `#[methods]` - Generates the method table of an inherent `impl` block
//!
//! ```rust,ignore
//! use rester::prelude::*;
//!
//! #[derive(Default, Nested)]
//! pub struct Auth {
//!     #[nested(embed)]
//!     control: Control,
//! }
//!
//! #[methods]
//! impl Auth {
//!     fn get(&self, next: Next<'_>, token: Option<String>) {
//!         match token {
//!             Some(_) => next.run(),
//!             None => {
//!                 self.abort("missing token");
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! The generated code reaches the engine through the facade,
//! `::rester::engine`. A crate depending on `rester-core` without the facade
//! names it explicitly:
//!
//! ```rust,ignore
//! #[derive(Default, Nested)]
//! #[nested(crate = "rester_core")]
//! pub struct Auth {
//!     #[nested(embed)]
//!     control: Control,
//! }
//!
//! #[methods(crate = "rester_core")]
//! impl Auth { /* ... */ }
//! ```

mod engine;
mod methods;
mod nested;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemImpl, parse_macro_input};

/// Derives `Nested` for a struct embedding one inner layer.
///
/// Exactly one field must carry `#[nested(embed)]`. That field is the next
/// inner layer; the Control Block is reached through it.
///
/// The derive does not declare any methods. Pair it with a `#[methods]` block,
/// or write `impl Methods for T {}` for a layer that only carries structure.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Default, Nested)]
/// pub struct Users {
///     #[nested(embed)]
///     auth: Auth,
///     store: Store,
/// }
/// ```
#[proc_macro_derive(Nested, attributes(nested))]
pub fn derive_nested(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match nested::derive_nested(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Registers the methods of an inherent `impl` block as this layer's method table.
///
/// Every method taking `&self` is registered under its own name. Non-receiver
/// parameters are injected by the resolver, except one optional `Next<'_>`
/// parameter that receives the continuation handle.
///
/// # Method attributes
///
/// - `#[method(name = "...")]` - Register under a different name
/// - `#[method(skip)]` - Do not register this method
///
/// Methods taking `&mut self` or `self`, `async` methods, generic methods and
/// reference-typed parameters are rejected unless skipped. Associated
/// functions without a receiver are left alone.
///
/// A method with a return type still registers, but building a chain that
/// includes it fails with `ChainError::InvalidSignature`.
///
/// The continuation handle is recognised by its spelling, `Next<'_>`; see the
/// crate docs for `#[methods(crate = "...")]`.
#[proc_macro_attribute]
pub fn methods(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut engine = None;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("crate") {
            engine = Some(engine::parse_crate_arg(&meta)?);
            Ok(())
        } else {
            Err(meta.error("unknown methods argument, expected `crate`"))
        }
    });
    parse_macro_input!(attr with parser);
    let input = parse_macro_input!(item as ItemImpl);
    let engine = engine.unwrap_or_else(engine::default_path);

    match methods::expand_methods(engine, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
