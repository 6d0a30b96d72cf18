//! Capability traits implemented by rendering-engine and AR-platform adapters.
//!
//! The viewer core never talks to a browser or an engine directly. A host
//! provides one [`Platform`] that can import meshes, create a render surface,
//! and negotiate AR sessions; everything else in this crate is driven through
//! those traits. All futures are `?Send` because browser futures are
//! single-threaded.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::asset::AssetSource;
use crate::bounds::Aabb;
use crate::camera::OrbitCamera;
use crate::error::{ImportError, SessionError, ViewerError};
use crate::scene::SceneGraph;
use crate::transform::Transform;

/// Engine-side handle of an imported asset's visual representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetHandle(pub u32);

/// Result of a successful import.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedAsset {
    pub handle: AssetHandle,
    /// Bounds in the asset's own units and origin.
    pub bounds: Aabb,
}

/// Byte-level import progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub loaded: u64,
    /// Total size when the transport reports it.
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Whole percent complete, when the total is known.
    #[must_use]
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        let pct = self.loaded.min(total).saturating_mul(100) / total;
        Some(u8::try_from(pct).unwrap_or(100))
    }
}

/// Coordinate frames requested from the AR platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSpaceKind {
    /// World-locked frame poses are reported in.
    Local,
    /// Frame attached to the device; hit-test rays start here.
    Viewer,
}

impl ReferenceSpaceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Viewer => "viewer",
        }
    }
}

/// Features requested with an immersive AR session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFeatures {
    pub required: Vec<&'static str>,
    pub optional: Vec<&'static str>,
}

impl Default for SessionFeatures {
    fn default() -> Self {
        Self { required: vec!["local", "hit-test"], optional: vec!["dom-overlay"] }
    }
}

/// Identifier of the input source that fired a select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputSourceId(pub u32);

/// Future returned by [`ArSession::end`].
pub type PendingEnd = LocalBoxFuture<'static, Result<(), SessionError>>;

/// Out-of-band events queued by the session between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user tapped (or otherwise selected) while in AR.
    Select { input_source: InputSourceId },
    /// The platform ended the session on its own.
    Ended,
}

/// A live immersive AR session.
#[async_trait(?Send)]
pub trait ArSession {
    async fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> Result<(), SessionError>;

    /// Create a hit-test source casting from the origin of `space`.
    async fn request_hit_test_source(&mut self, space: ReferenceSpaceKind) -> Result<(), SessionError>;

    /// Hit-test results for the current frame, nearest first, as poses in
    /// the local reference space. Empty means no surface this frame.
    fn hit_test_results(&mut self) -> Vec<Transform>;

    /// Drain events queued since the previous call.
    fn take_events(&mut self) -> Vec<SessionEvent>;

    /// Fire a haptic pulse on `input_source`, or on every source when `None`.
    /// Returns whether any actuator accepted it.
    fn pulse_haptics(&mut self, input_source: Option<InputSourceId>, intensity: f32, duration_ms: u32) -> bool;

    /// Begin ending the session. The returned future owns everything it
    /// needs so the caller can release the session before awaiting it.
    fn end(&mut self) -> PendingEnd;
}

/// Canvas-bound output of a rendering engine.
pub trait RenderSurface {
    fn resize(&mut self, width: u32, height: u32);

    /// Draw the current graph. In AR the engine uses the session's camera
    /// and ignores `camera`.
    fn present(&mut self, graph: &SceneGraph, camera: &OrbitCamera);
}

/// Everything the viewer core needs from its host environment.
#[async_trait(?Send)]
pub trait Platform {
    /// Import a mesh, reporting progress while pending.
    async fn import_asset(
        &self,
        source: &AssetSource,
        progress: &dyn Fn(LoadProgress),
    ) -> Result<ImportedAsset, ImportError>;

    /// Bind a render surface to the host canvas.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::Config`] when no canvas or context is available.
    fn create_render_surface(&self) -> Result<Box<dyn RenderSurface>, ViewerError>;

    /// One-time capability probe for immersive AR.
    async fn is_ar_supported(&self) -> bool;

    async fn request_ar_session(&self, features: &SessionFeatures) -> Result<Box<dyn ArSession>, SessionError>;

    /// Resolve after `duration`. Used to bound imports.
    async fn sleep(&self, duration: Duration);
}
