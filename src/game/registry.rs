use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};

/// Scene-lifetime registry of shared resources keyed by `K`.
///
/// `acquire` hands out an `Rc<V>`, creating the value on first use. The
/// registry only keeps weak references, so a resource is dropped as soon as
/// its last holder releases it and is rebuilt on the next acquire. Clones of
/// the registry share the same table.
pub struct SharedRegistry<K, V> {
    entries: Rc<RefCell<HashMap<K, Weak<V>>>>,
}

impl<K, V> Clone for SharedRegistry<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<K: Eq + Hash, V> Default for SharedRegistry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> SharedRegistry<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn acquire(&self, key: K, init: impl FnOnce() -> V) -> Rc<V> {
        let mut entries = self.entries.borrow_mut();
        if let Some(existing) = entries.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        let value = Rc::new(init());
        entries.insert(key, Rc::downgrade(&value));
        value
    }

    pub fn get(&self, key: &K) -> Option<Rc<V>> {
        self.entries.borrow().get(key).and_then(Weak::upgrade)
    }

    /// Number of resources that still have at least one holder.
    pub fn live_count(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Forgets entries whose last holder is gone.
    pub fn prune(&self) {
        self.entries
            .borrow_mut()
            .retain(|_, weak| weak.strong_count() > 0);
    }
}
