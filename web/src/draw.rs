//! Flattening the scene graph into engine draw calls.
//!
//! The JS engine keeps one object per node id and updates it from these
//! records every frame. Nodes missing from a frame's list are detached on the
//! engine side too.

#[cfg(test)]
#[path = "draw_test.rs"]
mod draw_test;

use viewer::camera::OrbitCamera;
use viewer::scene::{Background, NodeKind, SceneGraph};

/// One node as the engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDraw {
    pub id: String,
    pub kind: &'static str,
    /// Engine asset handle for asset nodes, zero otherwise.
    pub handle: u32,
    /// Kind-specific parameters (radii, size/opacity, intensity).
    pub params: [f32; 2],
    /// Column-major world matrix.
    pub matrix: [f32; 16],
    pub visible: bool,
}

/// Draw records for every attached node, in insertion order.
#[must_use]
pub fn draw_list(graph: &SceneGraph) -> Vec<NodeDraw> {
    graph
        .attached_nodes()
        .into_iter()
        .map(|(id, node)| {
            let (kind, handle, params) = match node.kind {
                NodeKind::PreviewAsset(h) => ("asset", h.0, [0.0, 0.0]),
                NodeKind::AssetClone(h) => ("clone", h.0, [0.0, 0.0]),
                NodeKind::Reticle { inner_radius, outer_radius } => ("reticle", 0, [inner_radius, outer_radius]),
                NodeKind::ShadowPlane { size, opacity } => ("shadow", 0, [size, opacity]),
                NodeKind::HemisphereLight { intensity } => ("hemisphere", 0, [intensity, 0.0]),
                NodeKind::DirectionalLight { intensity } => ("directional", 0, [intensity, 0.0]),
            };
            NodeDraw {
                id: id.to_string(),
                kind,
                handle,
                params,
                matrix: node.transform.to_cols_array(),
                visible: node.visible,
            }
        })
        .collect()
}

#[must_use]
pub fn is_transparent(graph: &SceneGraph) -> bool {
    graph.background == Background::Transparent
}

/// Column-major view and projection matrices for the preview camera.
#[must_use]
pub fn camera_matrices(camera: &OrbitCamera) -> ([f32; 16], [f32; 16]) {
    (camera.view().to_cols_array(), camera.lens.projection().to_cols_array())
}
