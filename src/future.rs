use crate::types::FutureId;
use core::{
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

/// Typed handle to a value that exists now or will exist later.
///
/// A `Future<T>` is a cheap, copyable reference into its manager's arena. It
/// carries no value of its own: reads go through `Manager::result` (which may
/// trigger forced resolution for futures marked on-demand) or the non-forcing
/// `Manager::peek`. The handle is the only way a `T`-valued slot is ever
/// created, which is what keeps the internal type erasure sound.
#[repr(transparent)]
pub struct Future<T> {
    id: FutureId,
    _value: PhantomData<fn() -> T>,
}

impl<T> Future<T> {
    pub(crate) fn new(id: FutureId) -> Self {
        Self {
            id,
            _value: PhantomData,
        }
    }

    /// Identifier of this future within its manager.
    #[must_use]
    pub fn id(&self) -> FutureId {
        self.id
    }
}

// Manual impls: a `Future<T>` is an id regardless of `T`, so none of these
// should require bounds on `T`.
impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Future<T> {}

impl<T> PartialEq for Future<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Future<T> {}

impl<T> Hash for Future<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Future").field(&self.id).finish()
    }
}

/// Single-assignment producer handle for one promise future.
///
/// A `Promise<T>` wraps exactly one not-yet-resolved future whose value
/// arrives from outside the scheduler, through `Manager::set_result`.
/// Deliberately neither `Copy` nor `Clone`: there is one producer. Consumers
/// get the read-only [`Future`] handle via [`Promise::future`].
pub struct Promise<T> {
    future: Future<T>,
}

impl<T> Promise<T> {
    pub(crate) fn new(id: FutureId) -> Self {
        Self {
            future: Future::new(id),
        }
    }

    /// Read-only handle for consumers of the promised value.
    #[must_use]
    pub fn future(&self) -> Future<T> {
        self.future
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Promise").field(&self.future.id()).finish()
    }
}
