use core::num::NonZeroU32;
use indexmap::{IndexMap as _IndexMap, IndexSet as _IndexSet};
use rustc_hash::FxBuildHasher;

/// Unique identifier of a future in its manager's arena.
///
/// Compact `NonZeroU32` keeps `Option<FutureId>` pointer-sized. Identifiers
/// are allocated sequentially and are only meaningful within the manager
/// that produced them; all graph edges (declared inputs and output
/// back-links) are stored as identifiers rather than owning pointers, so
/// mutually waiting futures cannot form an ownership cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FutureId(NonZeroU32);

impl FutureId {
    pub(crate) fn from_index(index: usize) -> Self {
        let raw = u32::try_from(index + 1).expect("FutureId::from_index: [1]");
        Self(NonZeroU32::new(raw).expect("FutureId::from_index: [2]"))
    }

    pub(crate) fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

/// `IndexMap` type with fast hasher.
pub type IndexMap<K, V> = _IndexMap<K, V, FxBuildHasher>;
pub(crate) type IndexSet<T> = _IndexSet<T, FxBuildHasher>;
