use dcg::manager::Manager;
use proptest::prelude::*;
use std::{cell::RefCell, rc::Rc};

/// Random layered DAG: `deps[i]` is a distinct set of indices < `i`.
fn layered_deps() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(
        prop::collection::vec(any::<prop::sample::Index>(), 0..4),
        1..24,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, picks)| {
                if i == 0 {
                    return Vec::new();
                }
                let mut deps: Vec<usize> = picks.into_iter().map(|pick| pick.index(i)).collect();
                deps.sort_unstable();
                deps.dedup();
                deps
            })
            .collect()
    })
}

proptest! {
    /// Every block runs exactly once, never before all of its declared
    /// dependencies, and the computed values match a straight topological
    /// evaluation of the same graph.
    #[test]
    fn blocks_run_once_and_in_dependency_order(deps in layered_deps()) {
        let mut manager = Manager::new();
        let log: Rc<RefCell<Vec<usize>>> = Rc::default();
        let mut futures = Vec::with_capacity(deps.len());
        for (i, node_deps) in deps.iter().enumerate() {
            let log = log.clone();
            let inputs: Vec<_> = node_deps.iter().map(|&d| futures[d]).collect();
            let future = if inputs.is_empty() {
                manager.future().name(format!("n{i}")).compute(move |_| {
                    log.borrow_mut().push(i);
                    i as i64
                })
            } else {
                manager
                    .future()
                    .name(format!("n{i}"))
                    .after(inputs)
                    .compute(move |_, values: Vec<Rc<i64>>| {
                        log.borrow_mut().push(i);
                        i as i64 + values.iter().map(|v| **v).sum::<i64>()
                    })
            };
            futures.push(future);
        }

        manager.execute();
        manager.finish().expect("acyclic graph must finish");

        let order = log.borrow();
        prop_assert_eq!(order.len(), deps.len(), "every block ran exactly once");
        for (i, node_deps) in deps.iter().enumerate() {
            let ran_at = order.iter().position(|&n| n == i).expect("node ran");
            for &d in node_deps {
                let dep_ran_at = order.iter().position(|&n| n == d).expect("dep ran");
                prop_assert!(
                    dep_ran_at < ran_at,
                    "node {} ran before its dependency {}",
                    i,
                    d
                );
            }
        }

        let mut expected = vec![0i64; deps.len()];
        for (i, node_deps) in deps.iter().enumerate() {
            expected[i] = i as i64 + node_deps.iter().map(|&d| expected[d]).sum::<i64>();
        }
        for (i, &future) in futures.iter().enumerate() {
            prop_assert_eq!(*manager.result(future).expect("value"), expected[i]);
        }
    }
}
