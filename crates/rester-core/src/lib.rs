//! # Rester Core
//!
//! Resolution and invocation of method chains across the nested layers of an
//! object.
//!
//! An object is built from layers embedded one inside the other, with a
//! [`Control`] block at the centre. Given a method name, the engine finds
//! every layer that declares that method, checks that none of them returns a
//! value, and produces a callable that runs them innermost first:
//!
//! - a layer continues outwards by running its [`Next`] handle,
//! - stops the chain quietly by not running it,
//! - or aborts with a failure through [`Nested::abort`], which becomes the
//!   invocation's result.
//!
//! Every non-receiver parameter of a layer method is supplied by a
//! caller-provided [`Resolver`].
//!
//! ```rust,ignore
//! use rester_core::{Control, Nested, Next, TypeMapResolver, bind, methods};
//!
//! #[derive(Default, Nested)]
//! #[nested(crate = "rester_core")]
//! struct Auth {
//!     #[nested(embed)]
//!     control: Control,
//! }
//!
//! #[methods(crate = "rester_core")]
//! impl Auth {
//!     fn greet(&self, next: Next<'_>, user: String) {
//!         if user.is_empty() {
//!             self.abort("anonymous");
//!         } else {
//!             next.run();
//!         }
//!     }
//! }
//!
//! #[derive(Default, Nested)]
//! #[nested(crate = "rester_core")]
//! struct Greeter {
//!     #[nested(embed)]
//!     auth: Auth,
//! }
//!
//! #[methods(crate = "rester_core")]
//! impl Greeter {
//!     fn greet(&self, user: String) {
//!         println!("hello {user}");
//!     }
//! }
//!
//! let mut greet = bind(Greeter::default(), "greet")?;
//! greet.invoke(&TypeMapResolver::new().with(String::from("alice")))?;
//! ```
//!
//! Chains are cached per `(type, name)` for the life of the process, see
//! [`ChainCache`].

pub mod cache;
pub mod chain;
pub mod control;
pub mod error;
pub mod invoke;
pub mod layer;
pub mod method;
pub mod resolver;
pub mod signature;

#[cfg(test)]
mod fixtures;

pub use cache::ChainCache;
pub use chain::{BoundChain, Chain, FactoryChain, bind, make};
pub use control::Control;
pub use error::{BoxError, ChainError, ChainResult, Failure};
pub use invoke::{Next, State};
pub use layer::{LayerId, LayerMethod, LayerWalker, Methods, Nested, Projection, layers, walk};
pub use method::{Args, MethodDecl, MethodFn, MethodSet, Param};
pub use resolver::{Arg, Resolver, TypeMapResolver};

pub use rester_macros::{Nested, methods};
