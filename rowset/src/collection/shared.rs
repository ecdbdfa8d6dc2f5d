use parking_lot::RwLock;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use crate::collection::Collection;

/// A shared-ownership handle to a nested [Collection].
///
/// When a collection is stored inside another collection (as an element or
/// as a row column), it is held through this handle rather than by value.
/// Cloning the handle shares the same underlying collection, so an in-place
/// mutation through one holder is observable through every other holder.
/// That aliasing is deliberate: the recursive branch of
/// [merge](Collection::merge) absorbs rows into a nested collection in
/// place, and every outer collection pointing at it must see the result.
///
/// Handle identity ([same_handle](SharedCollection::same_handle)) is
/// distinct from structural equality (`==` compares contents).
#[derive(Clone)]
pub struct SharedCollection {
    inner: Arc<RwLock<Collection>>,
}

impl SharedCollection {
    /// Wraps a collection in a fresh handle.
    pub fn new(collection: Collection) -> Self {
        SharedCollection {
            inner: Arc::new(RwLock::new(collection)),
        }
    }

    /// Runs a closure against the shared collection under a read lock.
    #[inline]
    pub fn read_with<R>(&self, f: impl FnOnce(&Collection) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Runs a closure against the shared collection under a write lock.
    #[inline]
    pub fn write_with<R>(&self, f: impl FnOnce(&mut Collection) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Checks whether two handles point at the same underlying collection.
    #[inline]
    pub fn same_handle(&self, other: &SharedCollection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns an independent copy of the current contents.
    ///
    /// Nested handles inside the copy still alias their originals; only the
    /// top level is detached.
    pub fn snapshot(&self) -> Collection {
        self.read_with(|collection| collection.clone())
    }
}

impl From<Collection> for SharedCollection {
    fn from(collection: Collection) -> Self {
        SharedCollection::new(collection)
    }
}

impl PartialEq for SharedCollection {
    fn eq(&self, other: &Self) -> bool {
        if self.same_handle(other) {
            return true;
        }
        self.read_with(|a| other.read_with(|b| a == b))
    }
}

impl Eq for SharedCollection {}

impl Display for SharedCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.read_with(|c| c.to_pretty_json(0)))
    }
}

impl Debug for SharedCollection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.read_with(|c| c.to_debug_string(0)))
    }
}
