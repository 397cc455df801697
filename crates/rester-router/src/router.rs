//! Path registry binding controllers to per-verb method chains.
//!
//! A controller is any [`Nested`] type. Registering it at a path builds one
//! factory-bound chain per configured verb it declares; dispatching a request
//! invokes the matching chain against a fresh controller instance.

use std::any::{TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use rester_core::{ChainError, ChainResult, FactoryChain, Nested, Resolver, make};
use tracing::{debug, info, trace};

use crate::config::RouterConfig;
use crate::error::RouteError;
use crate::method::Method;

// ============================================================================
// Endpoint
// ============================================================================

/// A bound chain with its controller type erased.
trait Endpoint: Send + Sync {
    fn invoke(&self, resolver: &dyn Resolver) -> ChainResult<()>;
}

impl<C, F> Endpoint for FactoryChain<C, F>
where
    C: Nested,
    F: Fn() -> C + Send + Sync,
{
    fn invoke(&self, resolver: &dyn Resolver) -> ChainResult<()> {
        FactoryChain::invoke(self, resolver)
    }
}

struct Controller {
    type_id: TypeId,
    type_name: &'static str,
    handlers: BTreeMap<Method, Box<dyn Endpoint>>,
}

impl Controller {
    fn allowed(&self) -> Vec<Method> {
        self.handlers.keys().copied().collect()
    }
}

/// One registered path, as listed by [`Router::routes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub controller: &'static str,
    pub methods: Vec<Method>,
}

// ============================================================================
// Router
// ============================================================================

/// Maps paths to controllers and HTTP verbs to their method chains.
///
/// # Example
///
/// ```rust,ignore
/// let mut router = Router::new();
/// router.control_default::<Users>("/users")?;
///
/// router.dispatch(Method::Get, "/users", &resolver)?;
/// assert_eq!(router.path::<Users>(), Some("/users"));
/// ```
pub struct Router {
    methods: Vec<Method>,
    controllers: HashMap<String, Controller>,
    controller_names: HashMap<&'static str, String>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Creates a router binding all nine verbs.
    pub fn new() -> Self {
        Self::with_config(&RouterConfig::default())
    }

    /// Creates a router binding only the configured verbs.
    pub fn with_config(config: &RouterConfig) -> Self {
        let mut methods = Vec::with_capacity(config.methods.len());
        for method in &config.methods {
            if !methods.contains(method) {
                methods.push(*method);
            }
        }
        Self {
            methods,
            controllers: HashMap::new(),
            controller_names: HashMap::new(),
        }
    }

    /// The verbs this router binds.
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Registers controller type `C`, produced by `factory`, at `path`.
    ///
    /// Verbs `C` does not declare are skipped. Registering the same type at
    /// the same path again does nothing.
    pub fn control<C, F>(&mut self, path: &str, factory: F) -> Result<(), RouteError>
    where
        C: Nested,
        F: Fn() -> C + Send + Sync + 'static,
    {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath(path.to_owned()));
        }
        let controller = type_name::<C>();

        if let Some(existing) = self.controllers.get(path) {
            if existing.type_id == TypeId::of::<C>() {
                trace!(path, controller, "Controller already registered, skipping");
                return Ok(());
            }
            return Err(RouteError::Conflict {
                path: path.to_owned(),
                existing: existing.type_name,
                controller,
            });
        }

        let factory = Arc::new(factory);
        let mut handlers: BTreeMap<Method, Box<dyn Endpoint>> = BTreeMap::new();
        for &method in &self.methods {
            let factory = Arc::clone(&factory);
            match make(move || factory(), method.chain_name()) {
                Ok(chain) => {
                    debug!(path, controller, %method, layers = chain.chain().len(), "Bound handler");
                    handlers.insert(method, Box::new(chain));
                }
                Err(ChainError::NoMethodFound { .. }) => continue,
                Err(err) => return Err(err.into()),
            }
        }

        if handlers.is_empty() {
            return Err(RouteError::NoHandlers {
                controller,
                methods: self.methods.clone(),
            });
        }

        info!(
            path,
            controller,
            methods = ?handlers.keys().collect::<Vec<_>>(),
            "Controller registered"
        );
        self.controller_names.insert(controller, path.to_owned());
        self.controllers.insert(
            path.to_owned(),
            Controller {
                type_id: TypeId::of::<C>(),
                type_name: controller,
                handlers,
            },
        );
        Ok(())
    }

    /// Registers `C` at `path`, creating each instance with `C::default()`.
    pub fn control_default<C>(&mut self, path: &str) -> Result<(), RouteError>
    where
        C: Nested + Default,
    {
        self.control(path, C::default)
    }

    /// The path controller type `C` was last registered at.
    pub fn path<C: Nested>(&self) -> Option<&str> {
        self.controller_names
            .get(type_name::<C>())
            .map(String::as_str)
    }

    /// Runs the chain bound to `method` at `path`.
    pub fn dispatch(
        &self,
        method: Method,
        path: &str,
        resolver: &dyn Resolver,
    ) -> Result<(), RouteError> {
        let controller = self
            .controllers
            .get(path)
            .ok_or_else(|| RouteError::NotFound {
                path: path.to_owned(),
            })?;
        let endpoint =
            controller
                .handlers
                .get(&method)
                .ok_or_else(|| RouteError::MethodNotAllowed {
                    method,
                    path: path.to_owned(),
                    allowed: controller.allowed(),
                })?;

        trace!(%method, path, controller = controller.type_name, "Dispatching");
        endpoint.invoke(resolver).map_err(RouteError::from)
    }

    /// Every registered path, sorted.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .controllers
            .iter()
            .map(|(path, controller)| Route {
                path: path.clone(),
                controller: controller.type_name,
                methods: controller.allowed(),
            })
            .collect();
        routes.sort_by(|a, b| a.path.cmp(&b.path));
        routes
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.methods)
            .field("routes", &self.routes())
            .finish()
    }
}
