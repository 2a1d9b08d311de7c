pub(crate) mod engine;
mod force;

use crate::{
    builder::{Builder, Settings},
    config::ManagerConfig,
    error::ResolveError,
    future::{Future, Promise},
    types::{FutureId, IndexSet},
};
use engine::{Block, BlockOutcome, Engine, Node, NodeState};
use rustc_hash::FxBuildHasher;
use std::rc::Rc;
use tracing::{debug, trace};

/// The externally visible lifecycle object of one scheduler instance.
///
/// A manager owns the whole dependency graph: the node arena, the
/// active/blocked partition and the computing stack all live inside it, so
/// independent managers coexist freely (one per compiled unit, one per
/// test). The graph is open: promises and computables may be added
/// throughout the manager's lifetime, including from inside running blocks,
/// until [`finish`](Manager::finish) closes it for good.
///
/// Typical use: create promises and computables incrementally, call
/// [`execute`](Manager::execute) whenever new information might unblock
/// pending work (at the end of a compiler pass, say), and call `finish`
/// exactly once at the end of the pipeline to assert total completion.
#[must_use]
#[derive(Debug)]
pub struct Manager {
    pub(crate) engine: Engine,
    config: ManagerConfig,
}

impl Manager {
    /// Manager with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ManagerConfig::default())
    }

    /// Manager with an explicit [`ManagerConfig`].
    pub fn with_config(config: ManagerConfig) -> Self {
        Self {
            engine: Engine::new(),
            config,
        }
    }

    /// Allocate a promise: a future whose value arrives from outside the
    /// scheduler through [`set_result`](Manager::set_result). Auto-named
    /// `promise-<n>`.
    ///
    /// # Panics
    /// If the manager is already finished.
    pub fn promise<T: 'static>(&mut self) -> Promise<T> {
        self.assert_open("promise");
        let name = self.engine.next_name("promise");
        let id = self.engine.insert(Node {
            name,
            attachment: None,
            on_demand: false,
            outputs: Vec::new(),
            state: NodeState::Promise,
        });
        Promise::new(id)
    }

    /// Wrap an already known value as a permanently resolved future.
    ///
    /// This is what delegate blocks return when the redirection target turns
    /// out to be settled, and what `compute` uses under the hood.
    ///
    /// # Panics
    /// If the manager is already finished.
    pub fn resolved<T: 'static>(&mut self, value: T) -> Future<T> {
        self.assert_open("resolved");
        let name = self.engine.next_name("value");
        let id = self.engine.insert(Node {
            name,
            attachment: None,
            on_demand: false,
            outputs: Vec::new(),
            state: NodeState::Completed {
                value: Rc::new(value),
            },
        });
        Future::new(id)
    }

    /// Start registering a computable future.
    ///
    /// # Panics
    /// If the manager is already finished.
    pub fn future(&mut self) -> Builder<'_> {
        self.assert_open("future");
        Builder::new(self)
    }

    /// Assign the promise's value, exactly once.
    ///
    /// Side effect: every registered output whose last pending input was
    /// this promise moves from blocked to active (Copy outputs adopt the
    /// value immediately). Nothing runs until the next
    /// [`execute`](Manager::execute) pass.
    ///
    /// # Panics
    /// If the promise is already set, or the manager is already finished.
    pub fn set_result<T: 'static>(&mut self, promise: &Promise<T>, value: T) {
        self.assert_open("set_result");
        let id = promise.future().id();
        let node = &self.engine.nodes[id.index()];
        assert!(
            matches!(node.state, NodeState::Promise),
            "Manager::set_result: promise '{}' already set",
            node.name
        );
        debug!(name = %node.name, "promise set");
        self.engine.complete(id, Rc::new(value));
    }

    /// Drain the active set, running blocks until nothing is runnable.
    ///
    /// Removes an arbitrary active element each step; the only ordering
    /// guarantee is that a block runs after all of its declared
    /// dependencies completed. May be invoked any number of times; each
    /// pass picks up whatever external `set_result` calls have unblocked
    /// since the last one.
    ///
    /// # Panics
    /// If the manager is already finished, or when re-entered from inside a
    /// running block without `allow_recursive_execution`.
    pub fn execute(&mut self) {
        self.assert_open("execute");
        self.assert_reentrancy("execute");
        self.drain();
    }

    /// One final execute pass, then permanent closure.
    ///
    /// If anything is still incomplete afterwards, diagnoses it and fails:
    /// a dependency chain that ends at an unset promise is reported as
    /// [`ResolveError::BlockedPromise`], a chain that bites its own tail as
    /// [`ResolveError::Cycle`]. The manager is closed either way; a manager
    /// that produced a diagnosis here is terminally failed.
    ///
    /// # Panics
    /// If the manager is already finished, or when re-entered from inside a
    /// running block without `allow_recursive_execution`.
    ///
    /// # Errors
    /// [`ResolveError::BlockedPromise`] or [`ResolveError::Cycle`], as
    /// above.
    pub fn finish(&mut self) -> Result<(), ResolveError> {
        self.assert_open("finish");
        self.assert_reentrancy("finish");
        self.drain();
        self.engine.finished = true;
        if !self.engine.blocked.is_empty() || self.engine.has_unset_promise() {
            let error = self.engine.diagnose();
            debug!(%error, "finish diagnosis");
            return Err(error);
        }
        debug!(futures = self.engine.nodes.len(), "manager finished");
        Ok(())
    }

    /// Read the future's value.
    ///
    /// Completed futures answer immediately, and keep answering the same
    /// value. An incomplete future marked on-demand is forced: its dependency
    /// chain is resolved out of band, right now, with the duplicate-free
    /// computing stack catching dynamic cycles. An incomplete future not
    /// marked on-demand fails with [`ResolveError::NoResult`].
    ///
    /// # Errors
    /// [`ResolveError::NoResult`] as above; [`ResolveError::BlockedPromise`]
    /// or [`ResolveError::Cycle`] when forcing fails.
    pub fn result<T: 'static>(&mut self, future: Future<T>) -> Result<Rc<T>, ResolveError> {
        if let Some(value) = self.peek(future) {
            return Ok(value);
        }
        let id = future.id();
        let node = &self.engine.nodes[id.index()];
        if !node.on_demand || self.engine.finished {
            return Err(ResolveError::NoResult {
                name: node.name.clone(),
            });
        }
        debug!(name = %node.name, "forcing on-demand resolution");
        self.force(id)?;
        Ok(self.peek(future).expect("Manager::result: [1]"))
    }

    /// Non-forcing read: the value if the future is completed, `None`
    /// otherwise.
    #[must_use]
    pub fn peek<T: 'static>(&self, future: Future<T>) -> Option<Rc<T>> {
        let value = self.engine.completed_value(future.id())?;
        let value = value
            .clone()
            .downcast::<T>()
            .unwrap_or_else(|_| unreachable!("Manager::peek: [1]"));
        Some(value)
    }

    /// Diagnostic name of the future (auto-generated or assigned).
    #[must_use]
    pub fn name(&self, id: FutureId) -> &str {
        &self.engine.nodes[id.index()].name
    }

    /// Register a computable from builder settings, its declared inputs (in
    /// declared order) and the erased block.
    pub(crate) fn register(
        &mut self,
        settings: Settings,
        inputs: Vec<FutureId>,
        block: Block,
    ) -> FutureId {
        let Settings {
            name,
            attachment,
            on_demand,
        } = settings;
        let name = name.unwrap_or_else(|| self.engine.next_name("future"));
        let id = self.engine.next_id();
        let mut declared = IndexSet::with_capacity_and_hasher(inputs.len(), FxBuildHasher);
        let mut pending = IndexSet::with_capacity_and_hasher(inputs.len(), FxBuildHasher);
        for input in inputs {
            assert!(
                declared.insert(input),
                "Manager::register: future '{name}' declares a duplicate dependency on '{}'",
                self.engine.nodes[input.index()].name
            );
            if matches!(
                self.engine.nodes[input.index()].state,
                NodeState::Completed { .. }
            ) {
                continue;
            }
            pending.insert(input);
            self.engine.nodes[input.index()].outputs.push(id);
        }
        let inserted = self.engine.insert(Node {
            name,
            attachment,
            on_demand,
            outputs: Vec::new(),
            state: NodeState::Normal { pending, block },
        });
        debug_assert_eq!(inserted, id, "Manager::register: [1]");
        id
    }

    /// Run one computable whose pending set is empty: take the block out
    /// (state Running), invoke it with the manager, then settle the outcome.
    pub(crate) fn run(&mut self, id: FutureId) {
        let node = &mut self.engine.nodes[id.index()];
        trace!(name = %node.name, "running block");
        let state = core::mem::replace(&mut node.state, NodeState::Running);
        let NodeState::Normal { pending, block } = state else {
            unreachable!("Manager::run: [1]")
        };
        debug_assert!(pending.is_empty(), "Manager::run: [2]");
        match block(self) {
            BlockOutcome::Value(value) => self.engine.complete(id, value),
            BlockOutcome::Redirect(source) => {
                if let Some(value) = self.engine.completed_value(source) {
                    let value = value.clone();
                    self.engine.complete(id, value);
                } else {
                    trace!(
                        name = %self.engine.nodes[id.index()].name,
                        source = %self.engine.nodes[source.index()].name,
                        "block redirected to a pending future"
                    );
                    self.engine.nodes[id.index()].state = NodeState::Copy { source };
                    self.engine.nodes[source.index()].outputs.push(id);
                    self.engine.blocked.insert(id);
                }
            }
        }
    }

    fn drain(&mut self) {
        let was_executing = core::mem::replace(&mut self.engine.executing, true);
        debug!(active = self.engine.active.len(), "execute pass");
        while let Some(id) = self.engine.active.pop() {
            self.run(id);
        }
        self.engine.executing = was_executing;
    }

    fn assert_open(&self, operation: &str) {
        assert!(
            !self.engine.finished,
            "Manager::{operation}: manager already finished"
        );
    }

    fn assert_reentrancy(&self, operation: &str) {
        assert!(
            !self.engine.executing || self.config.allow_recursive_execution,
            "Manager::{operation}: re-entered while a block is executing \
             (set ManagerConfig::allow_recursive_execution to permit this)"
        );
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}
