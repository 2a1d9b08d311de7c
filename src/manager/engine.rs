use crate::{
    error::{CycleNode, ResolveError},
    types::{FutureId, IndexSet},
};
use derive_more::Debug;
use std::{any::Any, rc::Rc};
use tracing::trace;

/// Type-erased completed value. The typed `Future<T>` handle is the only
/// constructor of a `T`-valued slot, so downcasts on read cannot fail.
pub(crate) type Value = Rc<dyn Any>;

/// Type-erased block of a computable: resolves the captured before-descriptor
/// against the manager, then runs the user block.
pub(crate) type Block = Box<dyn FnOnce(&mut super::Manager) -> BlockOutcome>;

/// What a block produced.
pub(crate) enum BlockOutcome {
    /// A final value; the computable completes with it.
    Value(Value),
    /// Another future; adopted immediately if complete, otherwise the
    /// computable enters the Copy state and waits for exactly this future.
    Redirect(FutureId),
}

/// One arena slot.
#[derive(Debug)]
pub(crate) struct Node {
    /// Diagnostic name, auto-generated or assigned via the builder.
    pub(crate) name: String,
    /// Opaque payload carried solely for diagnostics.
    #[debug(skip)]
    pub(crate) attachment: Option<Rc<dyn Any>>,
    /// Whether `Manager::result` may force this future ahead of the normal
    /// execution order.
    pub(crate) on_demand: bool,
    /// Indexes of the dependents to notify when this node completes.
    /// Observational back-links only; ownership stays with the arena.
    pub(crate) outputs: Vec<FutureId>,
    pub(crate) state: NodeState,
}

/// State machine of a node. Closed on purpose: every transition matches
/// exhaustively, so an unreachable state is a compile error rather than a
/// silently permitted branch.
#[derive(Debug)]
pub(crate) enum NodeState {
    /// Unset promise; completes only through `Manager::set_result`.
    Promise,
    /// Computable waiting for `pending` to drain; runnable once empty.
    Normal {
        /// Declared inputs that have not completed yet, in declared order.
        pending: IndexSet<FutureId>,
        #[debug(skip)]
        block: Block,
    },
    /// Block taken out and currently executing.
    Running,
    /// Block already ran and redirected to a still-incomplete future; waits
    /// for exactly `source`, then adopts its value verbatim. The block is
    /// never invoked again.
    Copy { source: FutureId },
    /// Terminal; the value never changes.
    Completed {
        #[debug(skip)]
        value: Value,
    },
}

/// Engine-internal mutable state of one manager: the node arena, the
/// active/blocked partition of pending computables, the duplicate-free
/// computing stack used during forced resolution, the naming counter and
/// the lifecycle flags. Mutated only through the transitions below.
#[derive(Debug)]
pub(crate) struct Engine {
    pub(crate) nodes: Vec<Node>,
    /// Computables whose declared inputs are all completed, not yet run.
    pub(crate) active: IndexSet<FutureId>,
    /// Computables still waiting on at least one input.
    pub(crate) blocked: IndexSet<FutureId>,
    /// Insertion-ordered stack of futures being forced. Rejects duplicates;
    /// an attempted duplicate push is precisely the dynamic-cycle signal.
    pub(crate) computing: IndexSet<FutureId>,
    pub(crate) name_counter: u32,
    pub(crate) executing: bool,
    pub(crate) finished: bool,
}

impl Engine {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            active: IndexSet::default(),
            blocked: IndexSet::default(),
            computing: IndexSet::default(),
            name_counter: 0,
            executing: false,
            finished: false,
        }
    }

    pub(crate) fn next_name(&mut self, prefix: &str) -> String {
        self.name_counter += 1;
        format!("{prefix}-{}", self.name_counter)
    }

    /// Identifier the next inserted node will get.
    pub(crate) fn next_id(&self) -> FutureId {
        FutureId::from_index(self.nodes.len())
    }

    /// Insert a node and file it into the active or blocked set according to
    /// its initial state. Output back-links on its inputs are the caller's
    /// responsibility.
    pub(crate) fn insert(&mut self, node: Node) -> FutureId {
        let id = self.next_id();
        match &node.state {
            NodeState::Normal { pending, .. } if pending.is_empty() => {
                self.active.insert(id);
            }
            NodeState::Normal { .. } => {
                self.blocked.insert(id);
            }
            NodeState::Promise | NodeState::Completed { .. } => {}
            NodeState::Running | NodeState::Copy { .. } => {
                unreachable!("Engine::insert: [1]")
            }
        }
        trace!(name = %node.name, "future created");
        self.nodes.push(node);
        id
    }

    /// Complete `id` with `value` and cascade: every Normal output whose last
    /// pending input was `id` moves from blocked to active; every Copy
    /// output adopts the value immediately and cascades in turn.
    pub(crate) fn complete(&mut self, id: FutureId, value: Value) {
        let node = &mut self.nodes[id.index()];
        debug_assert!(
            !matches!(node.state, NodeState::Completed { .. }),
            "Engine::complete: [1]"
        );
        node.state = NodeState::Completed {
            value: value.clone(),
        };
        trace!(name = %node.name, "future completed");
        let outputs = core::mem::take(&mut node.outputs);
        for output in outputs {
            match &mut self.nodes[output.index()].state {
                NodeState::Normal { pending, .. } => {
                    pending.shift_remove(&id);
                    if pending.is_empty() {
                        self.blocked.shift_remove(&output);
                        self.active.insert(output);
                    }
                }
                NodeState::Copy { source } => {
                    let source = *source;
                    debug_assert_eq!(source, id, "Engine::complete: [2]");
                    self.blocked.shift_remove(&output);
                    self.complete(output, value.clone());
                }
                NodeState::Promise | NodeState::Running | NodeState::Completed { .. } => {
                    unreachable!("Engine::complete: [3]")
                }
            }
        }
    }

    pub(crate) fn completed_value(&self, id: FutureId) -> Option<&Value> {
        match &self.nodes[id.index()].state {
            NodeState::Completed { value } => Some(value),
            _ => None,
        }
    }

    /// First input still keeping `id` from running: the first unresolved
    /// entry of a Normal node's pending set (declared order), or a Copy
    /// node's single source. Promises have no inputs.
    pub(crate) fn first_pending_input(&self, id: FutureId) -> Option<FutureId> {
        match &self.nodes[id.index()].state {
            NodeState::Normal { pending, .. } => pending.first().copied(),
            NodeState::Copy { source } => Some(*source),
            NodeState::Promise | NodeState::Running | NodeState::Completed { .. } => None,
        }
    }

    pub(crate) fn has_unset_promise(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| matches!(node.state, NodeState::Promise))
    }

    pub(crate) fn cycle_node(&self, id: FutureId) -> CycleNode {
        let node = &self.nodes[id.index()];
        CycleNode {
            name: node.name.clone(),
            attachment: node.attachment.clone(),
        }
    }

    /// Dynamic-cycle diagnosis: `repeated` was pushed while already on the
    /// computing stack. The cycle is the stack from the repetition point
    /// back to itself.
    pub(crate) fn cycle_from_stack(&self, repeated: FutureId) -> ResolveError {
        let position = self
            .computing
            .get_index_of(&repeated)
            .expect("Engine::cycle_from_stack: [1]");
        let nodes = self
            .computing
            .iter()
            .skip(position)
            .map(|&id| self.cycle_node(id))
            .collect();
        ResolveError::Cycle { nodes }
    }

    /// Chain reported when forcing runs into the unset promise `promise`:
    /// the names on the computing stack, then the promise's own name.
    pub(crate) fn forced_chain(&self, promise: FutureId) -> Vec<String> {
        let mut chain: Vec<String> = self
            .computing
            .iter()
            .map(|&id| self.nodes[id.index()].name.clone())
            .collect();
        chain.push(self.nodes[promise.index()].name.clone());
        chain
    }

    /// Structural diagnosis after the final execute pass, when something is
    /// still incomplete. Walks from the first blocked computable following
    /// first-pending-input links; the walk must end at an unset promise or
    /// revisit a node on the walk, because nothing is active or running at
    /// this point.
    pub(crate) fn diagnose(&self) -> ResolveError {
        let Some(&start) = self.blocked.first() else {
            // Nothing blocked: the only unfinished futures are promises
            // nobody set and nothing depends on.
            let promise = self
                .nodes
                .iter()
                .find(|node| matches!(node.state, NodeState::Promise))
                .expect("Engine::diagnose: [1]");
            return ResolveError::BlockedPromise {
                chain: vec![promise.name.clone()],
            };
        };
        let mut chain = vec![start];
        loop {
            let current = *chain.last().expect("Engine::diagnose: [2]");
            let input = self
                .first_pending_input(current)
                .expect("Engine::diagnose: [3]");
            if matches!(self.nodes[input.index()].state, NodeState::Promise) {
                let mut names: Vec<String> = chain
                    .iter()
                    .map(|&id| self.nodes[id.index()].name.clone())
                    .collect();
                names.push(self.nodes[input.index()].name.clone());
                return ResolveError::BlockedPromise { chain: names };
            }
            if let Some(position) = chain.iter().position(|&id| id == input) {
                let nodes = chain[position..]
                    .iter()
                    .map(|&id| self.cycle_node(id))
                    .collect();
                return ResolveError::Cycle { nodes };
            }
            chain.push(input);
        }
    }
}
