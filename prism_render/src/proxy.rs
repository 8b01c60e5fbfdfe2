use bytemuck::Pod;
use itertools::Itertools;
use prism_utils::{PassComponentKey, PrimitiveHandle, ProxyBytes};
use std::collections::HashMap;

/// A component's latest published snapshot, as seen by the submission thread.
#[derive(Debug, Clone)]
pub struct ProxySlot {
    pub bytes: ProxyBytes,
    /// Weak reference to the drawable this component represents. Validated
    /// per access; never extends the drawable's lifetime.
    pub target: Option<PrimitiveHandle>,
}

/// A pass's table of component proxies, rebuilt on every pass tick so the
/// submission hook always observes one consistent snapshot.
#[derive(Debug, Default)]
pub struct ProxyTable {
    slots: HashMap<PassComponentKey, ProxySlot>,
}

impl ProxyTable {
    pub fn get(&self, key: PassComponentKey) -> Option<&ProxySlot> {
        self.slots.get(&key)
    }

    /// Reads a component's proxy back as a typed POD value.
    pub fn read<T: Pod>(&self, key: PassComponentKey) -> Option<T> {
        self.slots.get(&key).and_then(|slot| slot.bytes.read_pod())
    }

    pub fn contains(&self, key: PassComponentKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Iterates proxies in a deterministic key order.
    pub fn iter(&self) -> impl Iterator<Item = (PassComponentKey, &ProxySlot)> {
        self.slots
            .iter()
            .map(|(key, slot)| (*key, slot))
            .sorted_by_key(|(key, _)| *key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
    }

    pub(crate) fn insert(&mut self, key: PassComponentKey, slot: ProxySlot) {
        self.slots.insert(key, slot);
    }
}
