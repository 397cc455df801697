//! Application runtime: configuration, logging and the router in one place.
//!
//! ```rust,ignore
//! use rester_runtime::Runtime;
//!
//! // Loads rester.toml (and RESTER_* overrides), initializes logging.
//! let mut runtime = Runtime::load()?;
//! runtime.control_default::<Users>("/users")?;
//! runtime.dispatch(Method::Get, "/users", &resolver)?;
//!
//! // Custom configuration source
//! let runtime = Runtime::builder()
//!     .config_file("config/rester.toml")
//!     .profile("production")
//!     .build()?;
//! ```

use std::path::Path;

use rester_core::{Nested, Resolver};
use rester_router::{Method, Route, Router};
use tracing::info;

use crate::config::{ConfigLoader, ResterConfig, validate_config};
use crate::error::RuntimeResult;
use crate::logging;

/// A validated configuration, initialized logging and a router built from it.
#[derive(Debug)]
pub struct Runtime {
    config: ResterConfig,
    router: Router,
}

impl Runtime {
    /// Loads the configuration from the default locations and starts up.
    pub fn load() -> RuntimeResult<Self> {
        Self::builder().build()
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Validates `config`, initializes logging and builds the router.
    ///
    /// Logging is only initialized once per process; later runtimes reuse the
    /// subscriber installed first.
    pub fn from_config(config: ResterConfig) -> RuntimeResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        let router = Router::with_config(&config.router);
        info!(
            methods = ?router.methods(),
            level = %config.logging.level,
            "Runtime ready"
        );
        Ok(Self { config, router })
    }

    pub fn config(&self) -> &ResterConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// See [`Router::control`].
    pub fn control<C, F>(&mut self, path: &str, factory: F) -> RuntimeResult<()>
    where
        C: Nested,
        F: Fn() -> C + Send + Sync + 'static,
    {
        Ok(self.router.control(path, factory)?)
    }

    /// See [`Router::control_default`].
    pub fn control_default<C: Nested + Default>(&mut self, path: &str) -> RuntimeResult<()> {
        Ok(self.router.control_default::<C>(path)?)
    }

    /// See [`Router::dispatch`].
    pub fn dispatch(
        &self,
        method: Method,
        path: &str,
        resolver: &dyn Resolver,
    ) -> RuntimeResult<()> {
        Ok(self.router.dispatch(method, path, resolver)?)
    }

    pub fn routes(&self) -> Vec<Route> {
        self.router.routes()
    }
}

/// Builder choosing where the runtime's configuration comes from.
pub struct RuntimeBuilder {
    loader: ConfigLoader,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            loader: ConfigLoader::new(),
        }
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.loader = self.loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.loader = self.loader.profile(profile);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.loader = self.loader.without_env();
        self
    }

    /// Replaces the loader entirely.
    pub fn loader(mut self, loader: ConfigLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn build(self) -> RuntimeResult<Runtime> {
        Runtime::from_config(self.loader.load()?)
    }
}
