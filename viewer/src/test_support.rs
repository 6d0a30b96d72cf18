//! In-crate doubles for the platform, session, store and probe traits.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use glam::Vec3;

use crate::asset::{AssetSource, ModelAsset};
use crate::bounds::Aabb;
use crate::camera::OrbitCamera;
use crate::error::{ImportError, SessionError, ViewerError};
use crate::platform::{
    ArSession, AssetHandle, ImportedAsset, InputSourceId, LoadProgress, PendingEnd, Platform, ReferenceSpaceKind,
    RenderSurface, SessionEvent, SessionFeatures,
};
use crate::resolve::{ContentProbe, ProbeError, ProbeResponse};
use crate::scene::SceneGraph;
use crate::store::{MetadataStore, StoreError};
use crate::transform::Transform;

// =============================================================
// Session
// =============================================================

/// Shared, inspectable state behind a [`MockSession`].
#[derive(Debug, Default)]
pub struct SessionState {
    /// Returned by every `hit_test_results` call until changed.
    pub hits: Vec<Transform>,
    pub events: Vec<SessionEvent>,
    pub reference_spaces: Vec<ReferenceSpaceKind>,
    pub hit_test_source: Option<ReferenceSpaceKind>,
    pub fail_reference_space: Option<SessionError>,
    pub fail_hit_test_source: Option<SessionError>,
    pub fail_end: Option<SessionError>,
    pub hit_polls: usize,
    pub end_calls: usize,
    pub pulses: Vec<(Option<InputSourceId>, f32, u32)>,
    pub haptics_available: bool,
}

pub type SharedSession = Rc<RefCell<SessionState>>;

pub struct MockSession {
    pub state: SharedSession,
}

impl MockSession {
    pub fn new() -> (Box<dyn ArSession>, SharedSession) {
        let state: SharedSession = Rc::new(RefCell::new(SessionState { haptics_available: true, ..SessionState::default() }));
        (Box::new(Self { state: Rc::clone(&state) }), state)
    }
}

#[async_trait(?Send)]
impl ArSession for MockSession {
    async fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> Result<(), SessionError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_reference_space.clone() {
            return Err(err);
        }
        state.reference_spaces.push(kind);
        Ok(())
    }

    async fn request_hit_test_source(&mut self, space: ReferenceSpaceKind) -> Result<(), SessionError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_hit_test_source.clone() {
            return Err(err);
        }
        state.hit_test_source = Some(space);
        Ok(())
    }

    fn hit_test_results(&mut self) -> Vec<Transform> {
        let mut state = self.state.borrow_mut();
        state.hit_polls += 1;
        state.hits.clone()
    }

    fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    fn pulse_haptics(&mut self, input_source: Option<InputSourceId>, intensity: f32, duration_ms: u32) -> bool {
        let mut state = self.state.borrow_mut();
        state.pulses.push((input_source, intensity, duration_ms));
        state.haptics_available
    }

    fn end(&mut self) -> PendingEnd {
        let mut state = self.state.borrow_mut();
        state.end_calls += 1;
        let result = state.fail_end.clone().map_or(Ok(()), Err);
        async move { result }.boxed_local()
    }
}

/// Pose at height `y`, offset along x.
pub fn pose(x: f32, y: f32) -> Transform {
    Transform::from_translation(Vec3::new(x, y, -1.0))
}

// =============================================================
// Platform
// =============================================================

#[derive(Debug, Default)]
pub struct SurfaceState {
    pub presents: usize,
    pub size: Option<(u32, u32)>,
}

pub struct MockSurface {
    pub state: Rc<RefCell<SurfaceState>>,
}

impl RenderSurface for MockSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.state.borrow_mut().size = Some((width, height));
    }

    fn present(&mut self, _graph: &SceneGraph, _camera: &OrbitCamera) {
        self.state.borrow_mut().presents += 1;
    }
}

pub struct MockPlatform {
    pub bounds: Aabb,
    pub import_error: Option<ImportError>,
    /// Import never completes; the timeout sleep fires immediately instead.
    pub import_hangs: bool,
    pub progress: Vec<LoadProgress>,
    pub ar_supported: bool,
    pub session_error: Option<SessionError>,
    /// State handed to the next granted session.
    pub session: SharedSession,
    pub surface: Rc<RefCell<SurfaceState>>,
    pub imports: RefCell<Vec<AssetSource>>,
    pub session_requests: Cell<usize>,
    pub support_probes: Cell<usize>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            bounds: Aabb::from_center_size(Vec3::ZERO, Vec3::new(3.0, 1.0, 2.0)),
            import_error: None,
            import_hangs: false,
            progress: Vec::new(),
            ar_supported: true,
            session_error: None,
            session: Rc::new(RefCell::new(SessionState { haptics_available: true, ..SessionState::default() })),
            surface: Rc::default(),
            imports: RefCell::default(),
            session_requests: Cell::new(0),
            support_probes: Cell::new(0),
        }
    }
}

#[async_trait(?Send)]
impl Platform for MockPlatform {
    async fn import_asset(
        &self,
        source: &AssetSource,
        progress: &dyn Fn(LoadProgress),
    ) -> Result<ImportedAsset, ImportError> {
        self.imports.borrow_mut().push(source.clone());
        for p in &self.progress {
            progress(*p);
        }
        if self.import_hangs {
            futures::future::pending::<()>().await;
        }
        if let Some(err) = self.import_error.clone() {
            return Err(err);
        }
        let bounds = match source {
            AssetSource::DemoCube => Aabb::from_center_size(Vec3::ZERO, Vec3::ONE),
            AssetSource::Url(_) => self.bounds,
        };
        Ok(ImportedAsset { handle: AssetHandle(1), bounds })
    }

    fn create_render_surface(&self) -> Result<Box<dyn RenderSurface>, ViewerError> {
        Ok(Box::new(MockSurface { state: Rc::clone(&self.surface) }))
    }

    async fn is_ar_supported(&self) -> bool {
        self.support_probes.set(self.support_probes.get() + 1);
        self.ar_supported
    }

    async fn request_ar_session(&self, _features: &SessionFeatures) -> Result<Box<dyn ArSession>, SessionError> {
        self.session_requests.set(self.session_requests.get() + 1);
        if let Some(err) = self.session_error.clone() {
            return Err(err);
        }
        Ok(Box::new(MockSession { state: Rc::clone(&self.session) }))
    }

    async fn sleep(&self, _duration: Duration) {
        if !self.import_hangs {
            futures::future::pending::<()>().await;
        }
    }
}

// =============================================================
// Store and probe
// =============================================================

pub fn model(id: &str) -> ModelAsset {
    ModelAsset {
        id: id.to_owned(),
        title: "Chair".to_owned(),
        description: Some("A wooden chair".to_owned()),
        asset_url: Some(format!("https://cdn.example/models/{id}.glb")),
        file_path: None,
        size_bytes: 1_572_864,
        upload_date: Some("2025-06-15T10:00:00Z".to_owned()),
        created_at: None,
        tags: vec!["furniture".to_owned()],
        is_public: true,
    }
}

#[derive(Default)]
pub struct MockStore {
    pub asset: Option<ModelAsset>,
    pub error: Option<StoreError>,
}

impl MockStore {
    pub fn with(asset: ModelAsset) -> Self {
        Self { asset: Some(asset), error: None }
    }
}

#[async_trait(?Send)]
impl MetadataStore for MockStore {
    async fn get(&self, id: &str) -> Result<Option<ModelAsset>, StoreError> {
        if let Some(err) = self.error.clone() {
            return Err(err);
        }
        Ok(self.asset.clone().filter(|a| a.id == id))
    }

    async fn list(&self) -> Result<Vec<ModelAsset>, StoreError> {
        if let Some(err) = self.error.clone() {
            return Err(err);
        }
        Ok(self.asset.clone().into_iter().collect())
    }
}

pub struct MockProbe {
    pub response: Result<ProbeResponse, ProbeError>,
    pub calls: RefCell<Vec<String>>,
}

impl MockProbe {
    pub fn status(status: u16, text: &str) -> Self {
        Self { response: Ok(ProbeResponse { status, status_text: text.to_owned() }), calls: RefCell::default() }
    }

    pub fn ok() -> Self {
        Self::status(200, "OK")
    }

    pub fn failing(err: ProbeError) -> Self {
        Self { response: Err(err), calls: RefCell::default() }
    }
}

#[async_trait(?Send)]
impl ContentProbe for MockProbe {
    async fn head(&self, url: &str) -> Result<ProbeResponse, ProbeError> {
        self.calls.borrow_mut().push(url.to_owned());
        self.response.clone()
    }
}
