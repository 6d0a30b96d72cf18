//! Render graph owned by the viewer core.
//!
//! The graph is flat: every node carries its world transform. Backends walk
//! [`SceneGraph::attached_nodes`] each frame and mirror it into their engine.
//! Detaching keeps a node (and its engine resources) alive so it can be
//! re-attached; removing destroys it.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::HashMap;

use uuid::Uuid;

use crate::platform::AssetHandle;
use crate::transform::Transform;

/// Unique identifier for a scene node.
pub type NodeId = Uuid;

/// What a node draws.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    /// The loaded asset in preview mode.
    PreviewAsset(AssetHandle),
    /// A copy of the loaded asset placed on a real-world surface.
    AssetClone(AssetHandle),
    /// Ring marking the targeted surface.
    Reticle { inner_radius: f32, outer_radius: f32 },
    /// Invisible plane that only receives shadows.
    ShadowPlane { size: f32, opacity: f32 },
    /// Sky/ground ambient light.
    HemisphereLight { intensity: f32 },
    /// Shadow-casting sun.
    DirectionalLight { intensity: f32 },
}

/// A node in the render graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneNode {
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    attached: bool,
    seq: u64,
}

impl SceneNode {
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

/// Preview backdrop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    /// Opaque preview color.
    #[default]
    Preview,
    /// Cleared so the camera feed shows through.
    Transparent,
}

/// Flat node store plus background.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    next_seq: u64,
    pub background: Background,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new, visible, attached node.
    pub fn insert(&mut self, kind: NodeKind, transform: Transform) -> NodeId {
        let id = Uuid::new_v4();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.nodes.insert(id, SceneNode { kind, transform, visible: true, attached: true, seq });
        id
    }

    /// Destroy a node.
    pub fn remove(&mut self, id: &NodeId) -> Option<SceneNode> {
        self.nodes.remove(id)
    }

    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Put a detached node back into the drawn graph. Returns whether the
    /// node changed state; attaching an attached node is a no-op.
    pub fn attach(&mut self, id: &NodeId) -> bool {
        self.set_attached(id, true)
    }

    /// Take a node out of the drawn graph without destroying it.
    pub fn detach(&mut self, id: &NodeId) -> bool {
        self.set_attached(id, false)
    }

    fn set_attached(&mut self, id: &NodeId, attached: bool) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) if node.attached != attached => {
                node.attached = attached;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_attached(&self, id: &NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| n.attached)
    }

    pub fn set_transform(&mut self, id: &NodeId, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.transform = transform;
        }
    }

    pub fn set_visible(&mut self, id: &NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.visible = visible;
        }
    }

    /// Attached nodes in insertion order.
    #[must_use]
    pub fn attached_nodes(&self) -> Vec<(NodeId, &SceneNode)> {
        let mut nodes: Vec<_> = self.nodes.iter().filter(|(_, n)| n.attached).map(|(id, n)| (*id, n)).collect();
        nodes.sort_by_key(|(_, n)| n.seq);
        nodes
    }

    /// Number of attached nodes matching `pred`.
    pub fn count_attached(&self, pred: impl Fn(&NodeKind) -> bool) -> usize {
        self.nodes.values().filter(|n| n.attached && pred(&n.kind)).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
