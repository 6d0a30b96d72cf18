//! Preview scene bootstrap: camera, lights, shadow receiver, reticle, and the
//! framed, auto-rotating preview asset.
//!
//! `PreviewScene` is the only place the render graph is built. The AR
//! controller mutates it through the narrow methods below during its
//! transitions; nothing else touches the graph.

#[cfg(test)]
#[path = "bootstrap_test.rs"]
mod bootstrap_test;

use glam::{Quat, Vec3};

use crate::bounds::{Aabb, Framing};
use crate::camera::OrbitCamera;
use crate::consts::{
    MAX_FRAME_DT_SECS, RETICLE_INNER_RADIUS, RETICLE_OUTER_RADIUS, SHADOW_OPACITY, SHADOW_PLANE_PARKED_Y,
    SHADOW_PLANE_SIZE, SUN_POSITION,
};
use crate::error::ImportError;
use crate::platform::{AssetHandle, ImportedAsset};
use crate::scene::{Background, NodeId, NodeKind, SceneGraph};
use crate::transform::Transform;

/// The asset currently installed in the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedAsset {
    pub node: NodeId,
    pub handle: AssetHandle,
    /// Bounds in the asset's own units.
    pub bounds: Aabb,
    pub framing: Framing,
}

/// Slow spin of the preview asset around +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoRotate {
    /// User toggle.
    pub enabled: bool,
    /// Set while an AR session owns the scene.
    suspended: bool,
    /// Radians per second.
    pub speed: f32,
    angle: f32,
}

impl AutoRotate {
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self { enabled: true, suspended: false, speed, angle: 0.0 }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.enabled && !self.suspended
    }

    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }
}

/// Render graph plus preview controls.
#[derive(Debug)]
pub struct PreviewScene {
    pub graph: SceneGraph,
    pub camera: OrbitCamera,
    pub auto_rotate: AutoRotate,
    orbit_enabled: bool,
    reticle: NodeId,
    shadow_plane: NodeId,
    asset: Option<LoadedAsset>,
    target_size: f32,
}

impl PreviewScene {
    /// Build the static scene: lights, shadow plane (parked until an asset
    /// is framed), hidden reticle.
    #[must_use]
    pub fn new(target_size: f32, auto_rotate_speed: f32) -> Self {
        let mut graph = SceneGraph::new();
        graph.insert(NodeKind::HemisphereLight { intensity: 1.0 }, Transform::from_translation(Vec3::new(0.5, 1.0, 0.25)));
        graph.insert(NodeKind::DirectionalLight { intensity: 1.0 }, Transform::from_translation(Vec3::from(SUN_POSITION)));
        let shadow_plane = graph.insert(
            NodeKind::ShadowPlane { size: SHADOW_PLANE_SIZE, opacity: SHADOW_OPACITY },
            Transform::from_translation(Vec3::new(0.0, SHADOW_PLANE_PARKED_Y, 0.0)),
        );
        let reticle = graph.insert(
            NodeKind::Reticle { inner_radius: RETICLE_INNER_RADIUS, outer_radius: RETICLE_OUTER_RADIUS },
            Transform::IDENTITY,
        );
        graph.set_visible(&reticle, false);

        Self {
            graph,
            camera: OrbitCamera::default(),
            auto_rotate: AutoRotate::new(auto_rotate_speed),
            orbit_enabled: true,
            reticle,
            shadow_plane,
            asset: None,
            target_size,
        }
    }

    /// Frame and add an imported asset to the preview.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Empty`] when the bounds have no usable extent.
    pub fn install_asset(&mut self, imported: ImportedAsset) -> Result<LoadedAsset, ImportError> {
        let framing = Framing::fit(&imported.bounds, self.target_size).ok_or(ImportError::Empty)?;
        if let Some(previous) = self.asset.take() {
            self.graph.remove(&previous.node);
        }
        let node = self.graph.insert(NodeKind::PreviewAsset(imported.handle), framing.transform());
        let loaded = LoadedAsset { node, handle: imported.handle, bounds: imported.bounds, framing };
        self.asset = Some(loaded);
        self.auto_rotate.angle = 0.0;
        self.rest_shadow_plane();
        tracing::debug!(scale = framing.scale, "framed preview asset");
        Ok(loaded)
    }

    #[must_use]
    pub fn asset(&self) -> Option<&LoadedAsset> {
        self.asset.as_ref()
    }

    /// World-space bounds of the preview asset as currently transformed.
    #[must_use]
    pub fn asset_world_bounds(&self) -> Option<Aabb> {
        let asset = self.asset.as_ref()?;
        let node = self.graph.get(&asset.node)?;
        Some(asset.bounds.transformed(&node.transform))
    }

    #[must_use]
    pub fn reticle(&self) -> NodeId {
        self.reticle
    }

    #[must_use]
    pub fn shadow_plane(&self) -> NodeId {
        self.shadow_plane
    }

    #[must_use]
    pub fn orbit_enabled(&self) -> bool {
        self.orbit_enabled
    }

    // --- Preview controls ---

    /// Advance preview animation by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if !self.auto_rotate.is_running() || !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let dt = dt.min(MAX_FRAME_DT_SECS);
        self.auto_rotate.angle = (self.auto_rotate.angle + self.auto_rotate.speed * dt).rem_euclid(std::f32::consts::TAU);
        self.apply_spin();
    }

    fn apply_spin(&mut self) {
        if let Some(asset) = self.asset {
            let spin = Transform { rotation: Quat::from_rotation_y(self.auto_rotate.angle), ..Transform::IDENTITY };
            self.graph.set_transform(&asset.node, spin.mul_transform(&asset.framing.transform()));
        }
    }

    /// Flip the user auto-rotate toggle; returns the new setting.
    pub fn toggle_rotation(&mut self) -> bool {
        self.auto_rotate.enabled = !self.auto_rotate.enabled;
        self.auto_rotate.enabled
    }

    /// Camera home and unspun asset.
    pub fn reset_view(&mut self) {
        self.camera.reset();
        self.auto_rotate.angle = 0.0;
        self.apply_spin();
    }

    /// Drag-orbit; ignored while AR owns the scene.
    pub fn orbit(&mut self, d_azimuth: f32, d_polar: f32) {
        if self.orbit_enabled {
            self.camera.orbit(d_azimuth, d_polar);
        }
    }

    pub fn zoom(&mut self, factor: f32) {
        if self.orbit_enabled {
            self.camera.zoom(factor);
        }
    }

    // --- AR transitions ---

    /// Hand the scene to an AR session: preview asset out, background
    /// cleared, preview controls suspended, reticle hidden.
    pub(crate) fn enter_ar(&mut self) {
        if let Some(asset) = self.asset {
            self.graph.detach(&asset.node);
        }
        self.graph.background = Background::Transparent;
        self.set_shadow_plane_y(SHADOW_PLANE_PARKED_Y);
        self.auto_rotate.suspended = true;
        self.orbit_enabled = false;
        self.hide_reticle();
    }

    /// Undo [`Self::enter_ar`]. Safe to call repeatedly.
    pub(crate) fn restore_preview(&mut self) {
        if let Some(asset) = self.asset {
            self.graph.attach(&asset.node);
        }
        self.graph.background = Background::Preview;
        self.rest_shadow_plane();
        self.auto_rotate.suspended = false;
        self.orbit_enabled = true;
        self.hide_reticle();
    }

    pub(crate) fn set_rotation_suspended(&mut self, suspended: bool) {
        self.auto_rotate.suspended = suspended;
    }

    pub(crate) fn show_reticle(&mut self, pose: Transform) {
        self.graph.set_transform(&self.reticle, pose);
        self.graph.set_visible(&self.reticle, true);
    }

    pub(crate) fn hide_reticle(&mut self) {
        self.graph.set_visible(&self.reticle, false);
    }

    #[must_use]
    pub fn reticle_visible(&self) -> bool {
        self.graph.get(&self.reticle).is_some_and(|n| n.visible)
    }

    /// Add a grounded copy of the loaded asset at `anchor` and move the
    /// shadow receiver to its height. `None` when no asset is loaded.
    pub(crate) fn spawn_clone(&mut self, anchor: &Transform) -> Option<NodeId> {
        let asset = self.asset?;
        let transform = anchor.mul_transform(&asset.framing.grounded_transform());
        let node = self.graph.insert(NodeKind::AssetClone(asset.handle), transform);
        let mut shadow = self.graph.get(&self.shadow_plane).map(|n| n.transform).unwrap_or_default();
        shadow.translation.y = anchor.translation.y;
        self.graph.set_transform(&self.shadow_plane, shadow);
        Some(node)
    }

    /// Bottom face of the framed preview asset.
    #[must_use]
    pub fn preview_floor_y(&self) -> Option<f32> {
        let asset = self.asset.as_ref()?;
        Some(-0.5 * asset.framing.scale * asset.bounds.size().y)
    }

    /// Put the shadow receiver under the preview asset, or park it when
    /// nothing is loaded.
    fn rest_shadow_plane(&mut self) {
        let y = self.preview_floor_y().unwrap_or(SHADOW_PLANE_PARKED_Y);
        self.set_shadow_plane_y(y);
    }

    fn set_shadow_plane_y(&mut self, y: f32) {
        self.graph.set_transform(&self.shadow_plane, Transform::from_translation(Vec3::new(0.0, y, 0.0)));
    }
}
