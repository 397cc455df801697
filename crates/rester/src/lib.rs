//! # Rester
//!
//! Controllers built from nested layers, where every layer declaring a
//! method takes part in that method's chain.
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
//!         if token.is_some() {
//!             next.run();
//!         } else {
//!             self.abort("unauthorized");
//!         }
//!     }
//! }
//!
//! #[derive(Default, Nested)]
//! pub struct Users {
//!     #[nested(embed)]
//!     auth: Auth,
//! }
//!
//! #[methods]
//! impl Users {
//!     fn get(&self) {
//!         info!("listing users");
//!     }
//! }
//!
//! let mut runtime = Runtime::load()?;
//! runtime.control_default::<Users>("/users")?;
//! runtime.dispatch(Method::Get, "/users", &resolver)?;
//! ```
//!
//! The crates behind the facade:
//!
//! - [`engine`]: chain construction, invocation and the resolver contract
//! - [`router`]: path and verb registry
//! - [`runtime`]: configuration and logging

pub use rester_core as engine;
pub use rester_router as router;
pub use rester_runtime as runtime;

pub use rester_core::{
    BoundChain, ChainError, ChainResult, Control, FactoryChain, Failure, Nested, Next, Resolver,
    bind, make, methods,
};
pub use rester_router::{Method, RouteError, Router};
pub use rester_runtime::{ResterConfig, Runtime, RuntimeError};

/// Everything needed to declare and serve controllers.
pub mod prelude {
    pub use rester_core::{
        Arg, BoxError, ChainError, Control, LayerId, Methods, Nested, Next, Param, Resolver,
        TypeMapResolver, bind, make, methods,
    };
    pub use rester_router::{Method, Router};
    pub use rester_runtime::Runtime;
    pub use rester_runtime::prelude::*;
}
