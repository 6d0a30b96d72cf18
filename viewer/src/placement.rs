//! Registry of asset copies placed on real-world surfaces.

#[cfg(test)]
#[path = "placement_test.rs"]
mod placement_test;

use crate::scene::{NodeId, SceneGraph};
use crate::transform::Transform;

/// A placed copy of the loaded asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedInstance {
    pub node: NodeId,
    /// Reticle pose captured at placement.
    pub anchor: Transform,
}

/// Append-only list of placed instances for one AR session.
#[derive(Debug, Default)]
pub struct PlacementRegistry {
    instances: Vec<PlacedInstance>,
}

impl PlacementRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instance: PlacedInstance) {
        self.instances.push(instance);
    }

    /// Remove every instance from `graph` and empty the registry. Returns how
    /// many were removed.
    pub fn clear(&mut self, graph: &mut SceneGraph) -> usize {
        let count = self.instances.len();
        for instance in self.instances.drain(..) {
            graph.remove(&instance.node);
        }
        count
    }

    #[must_use]
    pub fn instances(&self) -> &[PlacedInstance] {
        &self.instances
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
