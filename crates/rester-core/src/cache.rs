//! Process-wide cache of constructed chains.
//!
//! Types are static, so the chain for a `(type, method name)` pair never
//! changes once computed. Both outcomes are cached: a successful chain and
//! the construction error.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::chain::Chain;
use crate::error::ChainResult;
use crate::layer::Nested;

type CacheKey = (TypeId, String);
type Entry = Arc<dyn Any + Send + Sync>;
type Cached<C> = ChainResult<Arc<Chain<C>>>;

static GLOBAL: LazyLock<ChainCache> = LazyLock::new(ChainCache::new);

/// Lookup-or-insert map of chains keyed by concrete type and method name.
///
/// Construction runs outside the lock. When two callers race on the same
/// key, the first entry inserted wins and both get that entry back.
#[derive(Default)]
pub struct ChainCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    builds: AtomicUsize,
}

impl ChainCache {
    /// Creates an empty, private cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache used by [`bind`](crate::bind) and [`make`](crate::make).
    pub fn global() -> &'static ChainCache {
        &GLOBAL
    }

    /// Returns the chain of method `name` on `C`, constructing it on first use.
    pub fn chain<C: Nested>(&self, name: &str) -> Cached<C> {
        let key = (TypeId::of::<C>(), name.to_owned());

        if let Some(cached) = self.lookup::<C>(&key) {
            trace!(type_name = type_name::<C>(), method = name, "Chain cache hit");
            return cached;
        }

        let built: Cached<C> = Chain::<C>::build(name).map(Arc::new);
        self.builds.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.write();
        let stored = entries
            .entry(key)
            .or_insert_with(|| Arc::new(built.clone()) as Entry);
        debug!(
            type_name = type_name::<C>(),
            method = name,
            ok = built.is_ok(),
            "Chain cached"
        );
        stored.downcast_ref::<Cached<C>>().cloned().unwrap_or(built)
    }

    fn lookup<C: Nested>(&self, key: &CacheKey) -> Option<Cached<C>> {
        self.entries
            .read()
            .get(key)
            .and_then(|entry| entry.downcast_ref::<Cached<C>>())
            .cloned()
    }

    /// Number of cached `(type, name)` pairs.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of constructions performed, including ones that lost a race.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ChainCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainCache")
            .field("entries", &self.len())
            .field("builds", &self.builds())
            .finish()
    }
}
