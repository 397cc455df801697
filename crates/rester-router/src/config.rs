//! Router configuration.

use serde::{Deserialize, Serialize};

use crate::method::Method;

/// Which verbs [`Router::control`](crate::Router::control) binds.
///
/// ```toml
/// [router]
/// methods = ["GET", "POST"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Verbs to bind, in order. Defaults to all nine.
    #[serde(default = "default_methods")]
    pub methods: Vec<Method>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            methods: default_methods(),
        }
    }
}

fn default_methods() -> Vec<Method> {
    Method::ALL.to_vec()
}
