use derive_more::Debug;
use std::{any::Any, rc::Rc};
use thiserror::Error;

/// One step of a diagnosed dependency cycle.
///
/// Carries the future's diagnostic name together with the opaque attachment
/// supplied at registration (a source position, typically), so callers can
/// turn the cycle into a user-facing report.
#[derive(Debug, Clone)]
pub struct CycleNode {
    /// Diagnostic name of the future.
    pub name: String,
    /// Attachment supplied via the builder, if any.
    #[debug(skip)]
    pub attachment: Option<Rc<dyn Any>>,
}

/// Error produced when resolution cannot make the requested progress.
///
/// All variants surface synchronously from `Manager::finish` or
/// `Manager::result`. None of them is recoverable without an external state
/// change: re-invoking reproduces the same diagnosis, and a manager that
/// reported `BlockedPromise` or `Cycle` from `finish` is terminally failed.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ResolveError {
    /// `result` was called on a future that has not been computed yet and
    /// was not marked for on-demand resolution.
    #[error("future '{name}' has no result yet")]
    NoResult {
        /// Diagnostic name of the unresolved future.
        name: String,
    },
    /// A dependency chain leads to a promise that was never set. External
    /// inputs cannot be forced; someone has to call `set_result`.
    #[error("promise left unset: {}", chain.join(" -> "))]
    BlockedPromise {
        /// Ordered dependent names, ending with the unset promise itself.
        chain: Vec<String>,
    },
    /// A dependency chain revisits a future currently being resolved.
    #[error("dependency cycle: {}", format_cycle(nodes))]
    Cycle {
        /// Cycle steps from the repetition point back to itself, each node
        /// exactly once.
        nodes: Vec<CycleNode>,
    },
}

fn format_cycle(nodes: &[CycleNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&node.name);
        out.push_str(" -> ");
    }
    match nodes.first() {
        Some(first) => out.push_str(&first.name),
        None => out.push_str("<empty>"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_display_closes_the_loop() {
        let nodes = vec![
            CycleNode {
                name: "a".into(),
                attachment: None,
            },
            CycleNode {
                name: "b".into(),
                attachment: None,
            },
        ];
        let err = ResolveError::Cycle { nodes };
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
    }

    #[test]
    fn blocked_promise_display_names_the_chain() {
        let err = ResolveError::BlockedPromise {
            chain: vec!["x".into(), "promise-1".into()],
        };
        assert_eq!(err.to_string(), "promise left unset: x -> promise-1");
    }
}
