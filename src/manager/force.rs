use super::{Manager, engine::NodeState};
use crate::{error::ResolveError, types::FutureId};
use tracing::trace;

impl Manager {
    /// Forced ("on-demand") resolution of `target`, ahead of the normal
    /// execution order.
    ///
    /// Starting at the target, repeatedly inspect its first pending input:
    /// - pending input exists: push the current future onto the computing
    ///   stack (a duplicate push is a dynamic cycle), recursively force the
    ///   input, pop, retry;
    /// - no pending input: run it directly, with the same block semantics
    ///   as the ordinary execute loop.
    /// Unwinds once the original target is completed. An unset promise
    /// anywhere in the chain is a hard failure: external inputs cannot be
    /// forced.
    ///
    /// This path is deliberately independent of `allow_recursive_execution`;
    /// its only guard is the duplicate-free computing stack.
    pub(crate) fn force(&mut self, target: FutureId) -> Result<(), ResolveError> {
        loop {
            match &self.engine.nodes[target.index()].state {
                NodeState::Completed { .. } => return Ok(()),
                NodeState::Promise => {
                    return Err(ResolveError::BlockedPromise {
                        chain: self.engine.forced_chain(target),
                    });
                }
                NodeState::Running => {
                    // The target's block is mid-execution further down the
                    // call stack: the degenerate dynamic cycle.
                    let mut nodes: Vec<_> = self
                        .engine
                        .computing
                        .iter()
                        .map(|&id| self.engine.cycle_node(id))
                        .collect();
                    nodes.push(self.engine.cycle_node(target));
                    return Err(ResolveError::Cycle { nodes });
                }
                NodeState::Normal { .. } | NodeState::Copy { .. } => {}
            }
            match self.engine.first_pending_input(target) {
                Some(input) => {
                    if !self.engine.computing.insert(target) {
                        return Err(self.engine.cycle_from_stack(target));
                    }
                    trace!(
                        name = %self.engine.nodes[target.index()].name,
                        "forcing first pending input"
                    );
                    let forced = self.force(input);
                    let popped = self.engine.computing.pop();
                    debug_assert_eq!(popped, Some(target), "Manager::force: [1]");
                    forced?;
                }
                None => {
                    // Normal node with every input completed; may still sit
                    // in the active set if no execute pass has reached it.
                    self.engine.active.shift_remove(&target);
                    self.run(target);
                }
            }
        }
    }
}
