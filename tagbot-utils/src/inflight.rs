use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Set of names currently undergoing a guarded operation.
///
/// Cheap to clone; clones share the same set. Membership is acquired with
/// [`InFlightSet::try_acquire`] and released when the returned guard drops.
#[derive(Clone, Debug, Default)]
pub struct InFlightSet {
    names: Arc<Mutex<HashSet<String>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name` if absent. Returns `None` when it is already in flight.
    pub fn try_acquire(&self, name: &str) -> Option<InFlightGuard> {
        if !self.lock().insert(name.to_owned()) {
            return None;
        }

        Some(InFlightGuard {
            set: self.clone(),
            name: name.to_owned(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn release(&self, name: &str) {
        self.lock().remove(name);
    }

    // The set holds no invariant that a panicking holder could break.
    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.names.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Membership of one name in an [`InFlightSet`]; removes it on drop.
#[derive(Debug)]
#[must_use = "the name is released as soon as the guard is dropped"]
pub struct InFlightGuard {
    set: InFlightSet,
    name: String,
}

impl InFlightGuard {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Release the name now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.release(&self.name);
    }
}
