//! Per-page registry mapping opaque element handles to live DOM references.

use std::sync::Arc;

use dashmap::DashMap;
use probe_core_types::ElementHandle;

use crate::metrics;

/// Concurrent registry of nodes resolved on one page.
///
/// Values are stored behind `Arc` so callers can release the shard guard
/// before awaiting on the node.
pub struct ElementRegistry<T> {
    nodes: DashMap<ElementHandle, Arc<T>>,
}

impl<T> ElementRegistry<T> {
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
        }
    }

    pub fn insert(&self, node: T) -> ElementHandle {
        let handle = ElementHandle::next();
        self.nodes.insert(handle, Arc::new(node));
        metrics::handles_added(1);
        handle
    }

    pub fn get(&self, handle: &ElementHandle) -> Option<Arc<T>> {
        self.nodes.get(handle).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, handle: &ElementHandle) -> Option<Arc<T>> {
        let removed = self.nodes.remove(handle).map(|(_, node)| node);
        if removed.is_some() {
            metrics::handles_released(1);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&self) {
        let released = self.nodes.len();
        self.nodes.clear();
        metrics::handles_released(released);
    }
}

impl<T> Drop for ElementRegistry<T> {
    fn drop(&mut self) {
        metrics::handles_released(self.nodes.len());
    }
}

impl<T> Default for ElementRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
