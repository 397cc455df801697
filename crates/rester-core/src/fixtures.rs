//! Hand-written layered types shared by the unit tests.
//!
//! `T1` embeds the Control Block, `T2` embeds `T1`, `T3` embeds `T2`.

use std::any::{Any, type_name};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    Arg, BoxError, Control, LayerId, LayerWalker, MethodDecl, MethodSet, Methods, Nested, Next,
    Param, Projection, Resolver,
};

/// Records which bodies ran, in order.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Supplies the log at index 0, `10` for an `i32` at index 1, and a string
/// for everything else.
#[derive(Default)]
pub struct Context {
    pub log: Log,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Resolver for Context {
    fn initialize(&self, instance: &mut dyn Any) -> Result<(), BoxError> {
        let name = if instance.is::<T1>() {
            "T1"
        } else if instance.is::<T2>() {
            "T2"
        } else {
            "T3"
        };
        self.log.push(format!("init {name}"));
        Ok(())
    }

    fn resolve(&self, _layer: &LayerId, param: &Param) -> Result<Arg, BoxError> {
        if param.index() == 0 && param.is::<Log>() {
            return Ok(Box::new(self.log.clone()));
        }
        if param.index() == 1 && param.is::<i32>() {
            return Ok(Box::new(10i32));
        }
        Ok(Box::new(String::from("test args")))
    }
}

// ----------------------------------------------------------------------------
// T1
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct T1 {
    control: Control,
}

impl T1 {
    fn m1(&self, log: Log) {
        log.push("T1.m1");
    }

    fn m2(&self, next: Next<'_>, log: Log, args: String) {
        log.push(format!("T1.m2 {args}"));
        next.run();
    }

    fn m4(&self, next: Next<'_>, log: Log) {
        log.push("T1.m4");
        self.abort("T1.m4 test abort");
        next.run();
    }

    fn m5(&self, next: Next<'_>, log: Log, args: String) {
        log.push(format!("T1.m5 start {args}"));
        next.run();
        assert!(!self.is_aborted());
        log.push("T1.m5 end");
    }
}

impl Methods for T1 {
    fn declare(methods: &mut MethodSet<Self>) {
        methods
            .declare(
                MethodDecl::<Self>::new("m1", |this, _next, args| {
                    this.m1(args.take(0)?);
                    Ok(())
                })
                .param::<Log>(),
            )
            .declare(
                MethodDecl::<Self>::new("m2", |this, next, args| {
                    this.m2(next, args.take(0)?, args.take(1)?);
                    Ok(())
                })
                .param::<Log>()
                .param::<String>(),
            )
            .declare(
                MethodDecl::<Self>::new("m4", |this, next, args| {
                    this.m4(next, args.take(0)?);
                    Ok(())
                })
                .param::<Log>(),
            )
            .declare(
                MethodDecl::<Self>::new("m5", |this, next, args| {
                    this.m5(next, args.take(0)?, args.take(1)?);
                    Ok(())
                })
                .param::<Log>()
                .param::<String>(),
            );
    }
}

impl Nested for T1 {
    fn control(&self) -> &Control {
        &self.control
    }

    fn walk<C: Nested>(walker: &mut LayerWalker<C>, project: Projection<C, Self>) {
        Control::walk(walker, project.then::<Control>(|t1| &t1.control));
        walker.visit(project);
    }
}

// ----------------------------------------------------------------------------
// T2
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct T2 {
    t1: T1,
}

impl T2 {
    fn m1(&self, log: Log, args: String) {
        log.push(format!("T2.m1 {args}"));
    }

    fn m2(&self, log: Log, args: String) {
        log.push(format!("T2.m2 {args}"));
    }

    fn m3(&self, log: Log, args: i32) {
        assert_eq!(args, 10);
        log.push(format!("T2.m3 {args}"));
    }

    fn m4(&self) {
        panic!("should be aborted");
    }

    fn m5(&self, log: Log) {
        log.push("T2.m5");
    }

    fn m6(&self, log: Log) -> Result<(), BoxError> {
        log.push("T2.m6");
        Ok(())
    }
}

impl Methods for T2 {
    fn declare(methods: &mut MethodSet<Self>) {
        methods
            .declare(
                MethodDecl::<Self>::new("m1", |this, _next, args| {
                    this.m1(args.take(0)?, args.take(1)?);
                    Ok(())
                })
                .param::<Log>()
                .param::<String>(),
            )
            .declare(
                MethodDecl::<Self>::new("m2", |this, _next, args| {
                    this.m2(args.take(0)?, args.take(1)?);
                    Ok(())
                })
                .param::<Log>()
                .param::<String>(),
            )
            .declare(
                MethodDecl::<Self>::new("m3", |this, _next, args| {
                    this.m3(args.take(0)?, args.take(1)?);
                    Ok(())
                })
                .param::<Log>()
                .param::<i32>(),
            )
            .declare(MethodDecl::<Self>::new("m4", |this, _next, _args| {
                this.m4();
                Ok(())
            }))
            .declare(
                MethodDecl::<Self>::new("m5", |this, _next, args| {
                    this.m5(args.take(0)?);
                    Ok(())
                })
                .param::<Log>(),
            )
            .declare(
                MethodDecl::<Self>::new("m6", |this, _next, args| {
                    let _ = this.m6(args.take(0)?);
                    Ok(())
                })
                .param::<Log>()
                .results(&[type_name::<Result<(), BoxError>>()]),
            );
    }
}

impl Nested for T2 {
    fn control(&self) -> &Control {
        self.t1.control()
    }

    fn walk<C: Nested>(walker: &mut LayerWalker<C>, project: Projection<C, Self>) {
        T1::walk(walker, project.then::<T1>(|t2| &t2.t1));
        walker.visit(project);
    }
}

// ----------------------------------------------------------------------------
// T3
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct T3 {
    t2: T2,
}

impl T3 {
    fn m3(&self, log: Log, args: i32) {
        assert_eq!(args, 10);
        log.push(format!("T3.m3 {args}"));
    }

    fn m6(&self, log: Log, args: String) {
        log.push(format!("T3.m6 {args}"));
    }
}

impl Methods for T3 {
    fn declare(methods: &mut MethodSet<Self>) {
        methods
            .declare(
                MethodDecl::<Self>::new("m3", |this, _next, args| {
                    this.m3(args.take(0)?, args.take(1)?);
                    Ok(())
                })
                .param::<Log>()
                .param::<i32>(),
            )
            .declare(
                MethodDecl::<Self>::new("m6", |this, _next, args| {
                    this.m6(args.take(0)?, args.take(1)?);
                    Ok(())
                })
                .param::<Log>()
                .param::<String>(),
            );
    }
}

impl Nested for T3 {
    fn control(&self) -> &Control {
        self.t2.control()
    }

    fn walk<C: Nested>(walker: &mut LayerWalker<C>, project: Projection<C, Self>) {
        T2::walk(walker, project.then::<T2>(|t3| &t3.t2));
        walker.visit(project);
    }
}
