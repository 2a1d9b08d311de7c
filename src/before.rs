use crate::{future::Future, manager::Manager, types::FutureId};
use core::hash::{BuildHasher, Hash};
use indexmap::IndexMap;
use std::rc::Rc;

/// Composable description of the values that must be ready before a
/// computable may run.
///
/// A descriptor both names the futures a block depends on (`inputs`) and
/// shapes the combined result handed to the block once all of them are
/// completed (`Resolved`). Provided shapes: one future, a `Vec` of futures,
/// an [`IndexMap`] of futures keyed by arbitrary keys, and the pair of two
/// descriptors — the shape [`BuilderN::after`](crate::builder::BuilderN::after)
/// produces when dependencies are accumulated across several calls.
pub trait Before {
    /// Combined result handed to the block once every input is completed.
    type Resolved;

    /// Append the identifiers of all referenced futures, in declared order.
    fn inputs(&self, out: &mut Vec<FutureId>);

    /// Read the combined result.
    ///
    /// # Panics
    /// If any referenced future is not yet completed. The engine only calls
    /// this once every declared input has completed, so the panic is
    /// unreachable through the builder API.
    fn resolve(&self, manager: &Manager) -> Self::Resolved;
}

impl<T: 'static> Before for Future<T> {
    type Resolved = Rc<T>;

    fn inputs(&self, out: &mut Vec<FutureId>) {
        out.push(self.id());
    }

    fn resolve(&self, manager: &Manager) -> Self::Resolved {
        manager.peek(*self).expect("Before::resolve: [1]")
    }
}

impl<T: 'static> Before for Vec<Future<T>> {
    type Resolved = Vec<Rc<T>>;

    fn inputs(&self, out: &mut Vec<FutureId>) {
        out.extend(self.iter().map(Future::id));
    }

    fn resolve(&self, manager: &Manager) -> Self::Resolved {
        self.iter()
            .map(|&future| manager.peek(future).expect("Before::resolve: [2]"))
            .collect()
    }
}

impl<K, T, S> Before for IndexMap<K, Future<T>, S>
where
    K: Clone + Eq + Hash,
    T: 'static,
    S: BuildHasher + Default,
{
    type Resolved = IndexMap<K, Rc<T>, S>;

    fn inputs(&self, out: &mut Vec<FutureId>) {
        out.extend(self.values().map(Future::id));
    }

    fn resolve(&self, manager: &Manager) -> Self::Resolved {
        self.iter()
            .map(|(key, &future)| {
                let value = manager.peek(future).expect("Before::resolve: [3]");
                (key.clone(), value)
            })
            .collect()
    }
}

impl<A: Before, B: Before> Before for (A, B) {
    type Resolved = (A::Resolved, B::Resolved);

    fn inputs(&self, out: &mut Vec<FutureId>) {
        self.0.inputs(out);
        self.1.inputs(out);
    }

    fn resolve(&self, manager: &Manager) -> Self::Resolved {
        (self.0.resolve(manager), self.1.resolve(manager))
    }
}
