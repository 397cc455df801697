use std::sync::Arc;

use parking_lot::Mutex;
use rester_core::{ChainError, Control, Nested, Next, TypeMapResolver, methods};
use rester_router::{Method, RouteError, Router, RouterConfig};

#[derive(Clone, Default)]
struct Hits(Arc<Mutex<Vec<String>>>);

impl Hits {
    fn hit(&self, entry: &str) {
        self.0.lock().push(entry.to_owned());
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock())
    }
}

#[derive(Default, Nested)]
#[nested(crate = "rester_core")]
struct Auth {
    #[nested(embed)]
    control: Control,
}

#[methods(crate = "rester_core")]
impl Auth {
    fn get(&self, next: Next<'_>, hits: Hits, token: Option<String>) {
        self.check(next, hits, token);
    }

    fn post(&self, next: Next<'_>, hits: Hits, token: Option<String>) {
        self.check(next, hits, token);
    }

    #[method(skip)]
    fn check(&self, next: Next<'_>, hits: Hits, token: Option<String>) {
        hits.hit("auth");
        if token.is_none() {
            self.abort("unauthorized");
            return;
        }
        next.run();
    }
}

#[derive(Default, Nested)]
#[nested(crate = "rester_core")]
struct Users {
    #[nested(embed)]
    auth: Auth,
}

#[methods(crate = "rester_core")]
impl Users {
    fn get(&self, hits: Hits) {
        hits.hit("users.get");
    }

    fn post(&self, hits: Hits) {
        hits.hit("users.post");
    }

    fn delete(&self, hits: Hits) {
        hits.hit("users.delete");
    }
}

#[derive(Default, Nested)]
#[nested(crate = "rester_core")]
struct Health {
    #[nested(embed)]
    control: Control,
}

#[methods(crate = "rester_core")]
impl Health {
    #[method(name = "get")]
    fn status(&self, hits: Hits) {
        hits.hit("health");
    }

    #[allow(dead_code)]
    #[method(skip)]
    fn reset(&mut self) {}
}

#[derive(Default, Nested)]
#[nested(crate = "rester_core")]
struct Internal {
    #[nested(embed)]
    control: Control,
}

#[methods(crate = "rester_core")]
impl Internal {
    fn list(&self) {}
}

#[derive(Default, Nested)]
#[nested(crate = "rester_core")]
struct Broken {
    #[nested(embed)]
    control: Control,
}

#[methods(crate = "rester_core")]
impl Broken {
    fn get(&self) -> bool {
        true
    }
}

fn resolver(hits: &Hits, token: Option<&str>) -> TypeMapResolver {
    TypeMapResolver::new()
        .with(hits.clone())
        .with(token.map(str::to_owned))
}

#[test]
fn test_dispatch_runs_layers_innermost_first() {
    let hits = Hits::default();
    let mut router = Router::new();
    router.control_default::<Users>("/users").unwrap();

    router
        .dispatch(Method::Get, "/users", &resolver(&hits, Some("t")))
        .unwrap();
    assert_eq!(hits.take(), ["auth", "users.get"]);

    // Users declares delete but Auth does not guard it.
    router
        .dispatch(Method::Delete, "/users", &resolver(&hits, None))
        .unwrap();
    assert_eq!(hits.take(), ["users.delete"]);
}

#[test]
fn test_abort_reaches_caller() {
    let hits = Hits::default();
    let mut router = Router::new();
    router.control_default::<Users>("/users").unwrap();

    let err = router
        .dispatch(Method::Post, "/users", &resolver(&hits, None))
        .unwrap_err();
    assert_eq!(err.to_string(), "unauthorized");
    assert!(matches!(err.as_chain(), Some(ChainError::Aborted(_))));
    assert_eq!(hits.take(), ["auth"]);

    // A fresh instance per request: the previous abort does not stick.
    router
        .dispatch(Method::Post, "/users", &resolver(&hits, Some("t")))
        .unwrap();
    assert_eq!(hits.take(), ["auth", "users.post"]);
}

#[test]
fn test_unknown_path_and_verb() {
    let hits = Hits::default();
    let mut router = Router::new();
    router.control_default::<Users>("/users").unwrap();

    let err = router
        .dispatch(Method::Get, "/missing", &resolver(&hits, None))
        .unwrap_err();
    assert!(matches!(err, RouteError::NotFound { ref path } if path == "/missing"));

    let err = router
        .dispatch(Method::Put, "/users", &resolver(&hits, None))
        .unwrap_err();
    let RouteError::MethodNotAllowed { allowed, .. } = err else {
        panic!("expected MethodNotAllowed, got {err:?}");
    };
    assert_eq!(allowed, [Method::Get, Method::Post, Method::Delete]);
    assert!(hits.take().is_empty());
}

#[test]
fn test_repeat_registration() {
    let mut router = Router::new();
    router.control_default::<Users>("/users").unwrap();
    router.control_default::<Users>("/users").unwrap();
    assert_eq!(router.len(), 1);

    let err = router.control_default::<Health>("/users").unwrap_err();
    assert!(matches!(err, RouteError::Conflict { existing, .. } if existing == std::any::type_name::<Users>()));
}

#[test]
fn test_registration_errors() {
    let mut router = Router::new();

    let err = router.control_default::<Internal>("/internal").unwrap_err();
    assert!(matches!(err, RouteError::NoHandlers { .. }));

    let err = router.control_default::<Broken>("/broken").unwrap_err();
    assert!(matches!(
        err,
        RouteError::Chain(ChainError::InvalidSignature { .. })
    ));

    let err = router.control_default::<Health>("health").unwrap_err();
    assert!(matches!(err, RouteError::InvalidPath(_)));

    assert!(router.is_empty());
}

#[test]
fn test_renamed_method_and_bookkeeping() {
    let hits = Hits::default();
    let mut router = Router::new();
    router.control_default::<Health>("/health").unwrap();
    router.control_default::<Users>("/users").unwrap();

    router
        .dispatch(Method::Get, "/health", &resolver(&hits, None))
        .unwrap();
    assert_eq!(hits.take(), ["health"]);

    assert_eq!(router.path::<Health>(), Some("/health"));
    assert_eq!(router.path::<Users>(), Some("/users"));
    assert_eq!(router.path::<Internal>(), None);

    let routes = router.routes();
    assert_eq!(routes.len(), 2);
    assert_eq!(routes[0].path, "/health");
    assert_eq!(routes[0].methods, [Method::Get]);
    assert_eq!(routes[1].controller, std::any::type_name::<Users>());
}

#[test]
fn test_configured_methods_only() {
    let hits = Hits::default();
    let mut router = Router::with_config(&RouterConfig {
        methods: vec![Method::Get, Method::Get, Method::Post],
    });
    assert_eq!(router.methods(), [Method::Get, Method::Post]);

    router
        .control("/users", || Users::default())
        .unwrap();
    let err = router
        .dispatch(Method::Delete, "/users", &resolver(&hits, Some("t")))
        .unwrap_err();
    assert!(matches!(err, RouteError::MethodNotAllowed { .. }));
}
