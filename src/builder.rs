use crate::{
    before::Before,
    future::Future,
    manager::{
        Manager,
        engine::{Block, BlockOutcome},
    },
};
use derive_more::Debug;
use std::{any::Any, rc::Rc};

/// Accumulated registration settings shared by [`Builder`] and [`BuilderN`].
#[derive(Debug, Default)]
pub(crate) struct Settings {
    pub(crate) name: Option<String>,
    #[debug(skip)]
    pub(crate) attachment: Option<Rc<dyn Any>>,
    pub(crate) on_demand: bool,
}

impl Settings {
    fn set_name(&mut self, name: String) {
        assert!(self.name.is_none(), "Builder::name: name set twice");
        self.name = Some(name);
    }

    fn set_attachment(&mut self, attachment: Rc<dyn Any>) {
        assert!(
            self.attachment.is_none(),
            "Builder::attachment: attachment set twice"
        );
        self.attachment = Some(attachment);
    }
}

/// Fluent registration of a computable future with no dependencies declared
/// yet.
///
/// Obtained from [`Manager::future`]. Declare dependencies with
/// [`after`](Builder::after), which fixes the shape of the combined result
/// the block will receive, then register the block with
/// [`compute`](Builder::compute) or [`delegate`](Builder::delegate).
#[must_use]
pub struct Builder<'m> {
    manager: &'m mut Manager,
    settings: Settings,
}

impl<'m> Builder<'m> {
    pub(crate) fn new(manager: &'m mut Manager) -> Self {
        Self {
            manager,
            settings: Settings::default(),
        }
    }

    /// Assign the diagnostic name. Settable at most once.
    ///
    /// # Panics
    /// On a second call.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.set_name(name.into());
        self
    }

    /// Attach an opaque payload carried solely for diagnostics (a source
    /// position, typically). Settable at most once.
    ///
    /// # Panics
    /// On a second call.
    pub fn attachment(mut self, attachment: impl Any) -> Self {
        self.settings.set_attachment(Rc::new(attachment));
        self
    }

    /// Allow [`Manager::result`] to force this future ahead of the normal
    /// execution order. Settable any number of times; the last write wins.
    pub fn compute_on_demand(mut self, on_demand: bool) -> Self {
        self.settings.on_demand = on_demand;
        self
    }

    /// Declare the values that must be ready before the block may run: one
    /// future, a `Vec` of futures, or an `IndexMap` of futures.
    pub fn after<D: Before>(self, before: D) -> BuilderN<'m, D> {
        BuilderN {
            manager: self.manager,
            settings: self.settings,
            before,
        }
    }

    /// Register a block returning a final value directly. Sugar: the value
    /// is wrapped as an already-resolved future and delegated to.
    pub fn compute<T: 'static>(
        self,
        block: impl FnOnce(&mut Manager) -> T + 'static,
    ) -> Future<T> {
        self.delegate(move |manager| {
            let value = block(manager);
            manager.resolved(value)
        })
    }

    /// Register a block that runs once and returns another future: an
    /// already-complete one is adopted immediately, a still-pending one
    /// puts this computable into the Copy state until it settles.
    pub fn delegate<T: 'static>(
        self,
        block: impl FnOnce(&mut Manager) -> Future<T> + 'static,
    ) -> Future<T> {
        let Self { manager, settings } = self;
        let erased: Block = Box::new(move |manager| BlockOutcome::Redirect(block(manager).id()));
        Future::new(manager.register(settings, Vec::new(), erased))
    }
}

/// Fluent registration of a computable future with its dependency shape
/// fixed to `D`.
///
/// Further [`after`](BuilderN::after) calls nest the accumulated descriptor
/// with the new one into a pair, so the block's combined argument mirrors
/// the sequence of declarations: `.after(a).after(b).after(c)` resolves to
/// `((a, b), c)`.
#[must_use]
pub struct BuilderN<'m, D> {
    manager: &'m mut Manager,
    settings: Settings,
    before: D,
}

impl<'m, D: Before + 'static> BuilderN<'m, D> {
    /// Assign the diagnostic name. Settable at most once.
    ///
    /// # Panics
    /// On a second call.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.settings.set_name(name.into());
        self
    }

    /// Attach an opaque payload carried solely for diagnostics. Settable at
    /// most once.
    ///
    /// # Panics
    /// On a second call.
    pub fn attachment(mut self, attachment: impl Any) -> Self {
        self.settings.set_attachment(Rc::new(attachment));
        self
    }

    /// Allow [`Manager::result`] to force this future ahead of the normal
    /// execution order. Settable any number of times; the last write wins.
    pub fn compute_on_demand(mut self, on_demand: bool) -> Self {
        self.settings.on_demand = on_demand;
        self
    }

    /// Declare further dependencies, pairing them with the ones accumulated
    /// so far.
    pub fn after<E: Before>(self, before: E) -> BuilderN<'m, (D, E)> {
        BuilderN {
            manager: self.manager,
            settings: self.settings,
            before: (self.before, before),
        }
    }

    /// Register a block consuming the combined dependency result and
    /// returning a final value directly. Sugar over
    /// [`delegate`](BuilderN::delegate).
    pub fn compute<T: 'static>(
        self,
        block: impl FnOnce(&mut Manager, D::Resolved) -> T + 'static,
    ) -> Future<T> {
        self.delegate(move |manager, resolved| {
            let value = block(manager, resolved);
            manager.resolved(value)
        })
    }

    /// Register a block that, once all declared dependencies are satisfied,
    /// consumes the combined result and returns another future: an
    /// already-complete one is adopted immediately, a still-pending one
    /// puts this computable into the Copy state until it settles.
    pub fn delegate<T: 'static>(
        self,
        block: impl FnOnce(&mut Manager, D::Resolved) -> Future<T> + 'static,
    ) -> Future<T> {
        let Self {
            manager,
            settings,
            before,
        } = self;
        let mut inputs = Vec::new();
        before.inputs(&mut inputs);
        let erased: Block = Box::new(move |manager| {
            let resolved = before.resolve(manager);
            BlockOutcome::Redirect(block(manager, resolved).id())
        });
        Future::new(manager.register(settings, inputs, erased))
    }
}
