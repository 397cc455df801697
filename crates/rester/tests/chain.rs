use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rester::prelude::*;
use rester::engine::{Chain, layers};

#[derive(Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn note(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

fn journal_resolver(journal: &Journal) -> TypeMapResolver {
    TypeMapResolver::new().with(journal.clone())
}

// ----------------------------------------------------------------------------
// Greet: A aborts, B embeds A
// ----------------------------------------------------------------------------

#[derive(Default, Nested)]
struct A {
    #[nested(embed)]
    control: Control,
}

#[methods]
impl A {
    fn greet(&self, journal: Journal) {
        journal.note("A.greet");
        self.abort("A refuses to greet");
    }
}

#[derive(Default, Nested)]
struct B {
    #[nested(embed)]
    a: A,
}

#[methods]
impl B {
    fn greet(&self, _journal: Journal) {
        panic!("B.greet must not run after A aborted");
    }
}

#[test]
fn test_inner_abort_stops_outer_layer() {
    let journal = Journal::default();
    let mut greet = bind(B::default(), "greet").unwrap();

    let err = greet.invoke(&journal_resolver(&journal)).unwrap_err();
    assert_eq!(err.to_string(), "A refuses to greet");
    assert!(matches!(err, ChainError::Aborted(_)));
    assert_eq!(journal.entries(), ["A.greet"]);
}

#[test]
fn test_layers_of_embedding() {
    let layers = layers::<B>();
    assert_eq!(layers.len(), 3);
    assert!(layers[0].is::<Control>());
    assert!(layers[1].is::<A>());
    assert!(layers[2].is::<B>());
}

// ----------------------------------------------------------------------------
// Continuation
// ----------------------------------------------------------------------------

#[derive(Debug)]
struct QuotaExceeded {
    limit: u32,
}

impl fmt::Display for QuotaExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quota of {} exceeded", self.limit)
    }
}

impl std::error::Error for QuotaExceeded {}

#[derive(Default, Nested)]
struct Timing {
    #[nested(embed)]
    control: Control,
}

#[methods]
impl Timing {
    fn handle(&self, next: rester::Next<'_>, journal: Journal) {
        journal.note("timing.before");
        next.run();
        journal.note(format!("timing.after aborted={}", self.is_aborted()));
    }

    fn cached(&self, _next: Next<'_>, journal: Journal) {
        journal.note("timing.cache-hit");
    }
}

#[derive(Default, Nested)]
struct Handler {
    #[nested(embed)]
    timing: Timing,
    limit: Option<u32>,
}

#[methods]
impl Handler {
    fn handle(&self, journal: Journal) {
        if let Some(limit) = self.limit {
            self.abort(QuotaExceeded { limit });
            return;
        }
        journal.note("handler");
    }

    fn cached(&self, _journal: Journal) {
        panic!("served by the inner layer");
    }
}

#[test]
fn test_next_runs_outer_layers_in_place() {
    let journal = Journal::default();
    make(Handler::default, "handle")
        .unwrap()
        .invoke(&journal_resolver(&journal))
        .unwrap();

    assert_eq!(
        journal.entries(),
        ["timing.before", "handler", "timing.after aborted=false"]
    );
}

#[test]
fn test_outer_abort_is_visible_after_next() {
    let journal = Journal::default();
    let mut chain = bind(
        Handler {
            limit: Some(3),
            ..Default::default()
        },
        "handle",
    )
    .unwrap();

    let err = chain.invoke(&journal_resolver(&journal)).unwrap_err();
    let quota = err
        .failure()
        .and_then(|failure| failure.downcast_ref::<QuotaExceeded>());
    assert_eq!(quota.map(|q| q.limit), Some(3));
    assert_eq!(err.to_string(), "quota of 3 exceeded");
    assert_eq!(
        journal.entries(),
        ["timing.before", "timing.after aborted=true"]
    );
}

#[test]
fn test_not_running_next_ends_chain_quietly() {
    let journal = Journal::default();
    let mut chain = bind(Handler::default(), "cached").unwrap();
    chain.invoke(&journal_resolver(&journal)).unwrap();
    assert_eq!(journal.entries(), ["timing.cache-hit"]);
    assert!(!chain.instance().is_aborted());
}

// ----------------------------------------------------------------------------
// Construction errors
// ----------------------------------------------------------------------------

#[derive(Debug, Default, Nested)]
struct Store {
    #[nested(embed)]
    control: Control,
}

#[methods]
impl Store {
    fn save(&self) -> Result<(), BoxError> {
        Ok(())
    }

    #[allow(dead_code)]
    #[method(skip)]
    fn flush(&mut self) {}
}

#[derive(Debug, Default, Nested)]
struct Profile {
    #[nested(embed)]
    store: Store,
}

#[methods]
impl Profile {
    fn save(&self, journal: Journal) {
        journal.note("profile.save");
    }
}

#[test]
fn test_inner_result_value_rejects_whole_chain() {
    let err = make(Profile::default, "save").unwrap_err();
    let ChainError::InvalidSignature {
        type_name, method, ..
    } = &err
    else {
        panic!("expected InvalidSignature, got {err:?}");
    };
    assert_eq!(*type_name, std::any::type_name::<Store>());
    assert_eq!(method, "save");
    assert!(err.to_string().ends_with("Store.save has out parameters"));

    // Same outcome from the cache.
    let again = Chain::<Profile>::resolve("save").unwrap_err();
    assert_eq!(again.to_string(), err.to_string());
}

#[test]
fn test_undeclared_method() {
    let err = bind(Profile::default(), "flush").unwrap_err();
    assert!(matches!(err, ChainError::NoMethodFound { .. }));
    assert!(err.is_construction());
}

// ----------------------------------------------------------------------------
// Argument injection
// ----------------------------------------------------------------------------

/// Supplies values by position and type, like a request binder would.
struct Positional {
    journal: Journal,
}

impl Resolver for Positional {
    fn resolve(&self, layer: &LayerId, param: &Param) -> Result<Arg, BoxError> {
        match param.index() {
            0 if param.is::<Journal>() => Ok(Box::new(self.journal.clone())),
            1 if param.is::<String>() => Ok(Box::new(format!("from {}", layer.depth()))),
            2 if param.is::<u32>() => Ok(Box::new(7u32)),
            index => Err(format!("nothing at #{index} for {}", param.type_name()).into()),
        }
    }
}

#[derive(Default, Nested)]
struct Sum {
    #[nested(embed)]
    control: Control,
}

#[methods]
impl Sum {
    #[method(name = "compute")]
    fn sum(&self, journal: Journal, next: Next<'_>, label: String, n: u32) {
        journal.note(format!("{label}: {n}"));
        next.run();
    }

    fn describe() -> &'static str {
        "not a chain method"
    }
}

#[derive(Default, Nested)]
struct Report {
    #[nested(embed)]
    sum: Sum,
}

#[methods]
impl Report {
    fn compute(&self, journal: Journal, label: String) {
        journal.note(format!("report {label}"));
    }
}

#[test]
fn test_arguments_by_index_and_type() {
    let journal = Journal::default();
    let resolver = Positional {
        journal: journal.clone(),
    };
    let mut chain = bind(Report::default(), "compute").unwrap();
    chain.invoke(&resolver).unwrap();

    // Next does not count as an injected parameter.
    assert_eq!(journal.entries(), ["from 1: 7", "report from 2"]);
    assert_eq!(Sum::describe(), "not a chain method");

    let params: Vec<_> = chain.chain().layers().map(|l| l.depth()).collect();
    assert_eq!(params, [1, 2]);
}

#[test]
fn test_resolver_failure_is_reported() {
    let journal = Journal::default();
    let err = bind(Report::default(), "compute")
        .unwrap()
        .invoke(&journal_resolver(&journal))
        .unwrap_err();
    assert!(matches!(err, ChainError::Resolution { index: 1, .. }));
    assert!(journal.entries().is_empty());
}

mod queue {
    /// An application type that happens to be called `Next`.
    #[derive(Clone, Debug)]
    pub struct Next(pub u32);
}

#[derive(Default, Nested)]
struct Pager {
    #[nested(embed)]
    control: Control,
}

#[methods]
impl Pager {
    fn page(&self, journal: Journal, cursor: queue::Next) {
        journal.note(format!("page {}", cursor.0));
    }
}

#[test]
fn test_type_named_next_is_injected() {
    let journal = Journal::default();
    let resolver = journal_resolver(&journal).with(queue::Next(3));
    let mut chain = bind(Pager::default(), "page").unwrap();

    assert_eq!(chain.chain().len(), 1);
    chain.invoke(&resolver).unwrap();
    assert_eq!(journal.entries(), ["page 3"]);
}

// ----------------------------------------------------------------------------
// Factory freshness
// ----------------------------------------------------------------------------

#[test]
fn test_factory_never_leaks_abort_state() {
    static CREATED: AtomicUsize = AtomicUsize::new(0);

    let journal = Journal::default();
    let greet = make(
        || {
            CREATED.fetch_add(1, Ordering::SeqCst);
            B::default()
        },
        "greet",
    )
    .unwrap();

    for _ in 0..3 {
        let err = greet.invoke(&journal_resolver(&journal)).unwrap_err();
        assert_eq!(err.to_string(), "A refuses to greet");
    }
    assert_eq!(CREATED.load(Ordering::SeqCst), 3);
    assert_eq!(journal.entries().len(), 3);
}
