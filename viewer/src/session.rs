//! One viewing session per page load.
//!
//! `ViewerSession` owns the preview scene, the AR controller, and everything
//! the presenter reads. It holds no platform handle: hosts keep the
//! [`Platform`] themselves, run the async steps ([`resolve_source`],
//! [`import_with_timeout`], [`acquire_session`]) without borrowing the
//! session, and feed results back through the synchronous methods here. The
//! `load` and `start_ar` conveniences compose those steps for hosts that can
//! hold the session across an await.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::time::Duration;

use futures::future::{Either, select};

use crate::ar::{ArAction, ArController, ArPhase, acquire_session};
use crate::asset::{AssetSource, LaunchParams, ModelAsset};
use crate::bootstrap::PreviewScene;
use crate::config::ViewerConfig;
use crate::error::{ImportError, SessionError, ViewerError};
use crate::platform::{ArSession, ImportedAsset, LoadProgress, PendingEnd, Platform, SessionFeatures};
use crate::presenter::{PageMeta, ViewModel, ViewState, page_meta, present};
use crate::resolve::{ContentProbe, resolve_model};
use crate::share::{
    QrImageState, ShareMode, SharePayload, ShareTarget, qr_download_filename, screenshot_filename, share_url,
};
use crate::store::MetadataStore;

/// Which part of loading is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// Metadata lookup and reachability probe.
    Resolving,
    /// Mesh import.
    Importing,
}

/// Page-level load state.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading { stage: LoadStage, progress: Option<u8> },
    Ready,
    Failed(ViewerError),
}

/// Coarse session mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    Loading,
    Preview,
    RequestingAr,
    ActiveAr,
    Error,
}

/// What to import, and the record it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// `None` in demo mode.
    pub asset: Option<ModelAsset>,
    pub source: AssetSource,
}

/// Transient toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

// =============================================================
// Async steps
// =============================================================

/// Turn launch parameters into something importable. Demo mode needs no
/// store access.
///
/// # Errors
///
/// Propagates resolver failures: database, not-found, unreachable.
pub async fn resolve_source<S, C>(
    store: &S,
    probe: &C,
    config: &ViewerConfig,
    params: &LaunchParams,
) -> Result<ResolvedSource, ViewerError>
where
    S: MetadataStore + ?Sized,
    C: ContentProbe + ?Sized,
{
    let Some(id) = params.model_id.as_deref() else {
        return Ok(ResolvedSource { asset: None, source: AssetSource::DemoCube });
    };
    let resolved = resolve_model(store, probe, &config.store, id).await?;
    Ok(ResolvedSource { asset: Some(resolved.asset), source: AssetSource::Url(resolved.content_url) })
}

/// Import through the platform, failing with [`ImportError::Timeout`] if
/// neither result nor error arrives within `timeout`.
///
/// # Errors
///
/// Returns the engine's [`ImportError`] or a timeout.
pub async fn import_with_timeout<P: Platform + ?Sized>(
    platform: &P,
    source: &AssetSource,
    timeout: Duration,
    progress: &dyn Fn(LoadProgress),
) -> Result<ImportedAsset, ImportError> {
    let import = platform.import_asset(source, progress);
    let deadline = platform.sleep(timeout);
    match select(import, deadline).await {
        Either::Left((result, _)) => result,
        Either::Right(((), _)) => Err(ImportError::Timeout(timeout)),
    }
}

// =============================================================
// Session
// =============================================================

pub struct ViewerSession {
    config: ViewerConfig,
    params: LaunchParams,
    load: LoadState,
    asset: Option<ModelAsset>,
    scene: PreviewScene,
    ar: ArController,
    ar_supported: Option<bool>,
    ar_error: Option<ViewerError>,
    auto_start_consumed: bool,
    share_mode: ShareMode,
    share: ShareTarget,
    qr: QrImageState,
    fullscreen: bool,
    notices: Vec<Notice>,
}

impl ViewerSession {
    #[must_use]
    pub fn new(config: ViewerConfig, params: LaunchParams) -> Self {
        let scene = PreviewScene::new(config.target_size, config.auto_rotate_speed);
        let share_mode = ShareMode::default();
        let share = ShareTarget::new(&config, params.model_id.as_deref(), share_mode);
        Self {
            config,
            params,
            load: LoadState::Loading { stage: LoadStage::Resolving, progress: None },
            asset: None,
            scene,
            ar: ArController::new(),
            ar_supported: None,
            ar_error: None,
            auto_start_consumed: false,
            share_mode,
            share,
            qr: QrImageState::Loading,
            fullscreen: false,
            notices: Vec::new(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn params(&self) -> &LaunchParams {
        &self.params
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    #[must_use]
    pub fn asset(&self) -> Option<&ModelAsset> {
        self.asset.as_ref()
    }

    #[must_use]
    pub fn scene(&self) -> &PreviewScene {
        &self.scene
    }

    /// Mutable scene access for orbit/zoom input.
    pub fn scene_mut(&mut self) -> &mut PreviewScene {
        &mut self.scene
    }

    #[must_use]
    pub fn ar(&self) -> &ArController {
        &self.ar
    }

    #[must_use]
    pub fn ar_supported(&self) -> Option<bool> {
        self.ar_supported
    }

    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.params.is_demo()
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        match (&self.load, self.ar.phase()) {
            (LoadState::Loading { .. }, _) => SessionMode::Loading,
            (LoadState::Failed(_), _) => SessionMode::Error,
            (LoadState::Ready, ArPhase::RequestingSession) => SessionMode::RequestingAr,
            (LoadState::Ready, ArPhase::Active(_) | ArPhase::Ending) => SessionMode::ActiveAr,
            (LoadState::Ready, ArPhase::Preview) => SessionMode::Preview,
        }
    }

    // --- Loading ---

    /// Record the resolver's result and move on to importing.
    pub fn source_resolved(&mut self, resolved: &ResolvedSource) {
        self.asset.clone_from(&resolved.asset);
        self.load = LoadState::Loading { stage: LoadStage::Importing, progress: None };
    }

    /// Best-effort import progress.
    pub fn set_progress(&mut self, progress: LoadProgress) {
        if let LoadState::Loading { progress: current, .. } = &mut self.load
            && let Some(pct) = progress.percent()
        {
            *current = Some(pct);
        }
    }

    /// Install the imported asset, or enter the error state.
    pub fn finish_load(&mut self, result: Result<ImportedAsset, ViewerError>) {
        match result.and_then(|imported| self.scene.install_asset(imported).map_err(ViewerError::from)) {
            Ok(loaded) => {
                self.load = LoadState::Ready;
                tracing::info!(handle = loaded.handle.0, demo = self.is_demo(), "model ready");
                if self.is_demo() {
                    self.notify(NoticeKind::Info, "Demo mode - WebXR AR with sample cube");
                }
            }
            Err(err) => self.fail(err),
        }
    }

    /// Abort the page flow into the error screen.
    pub fn fail(&mut self, err: ViewerError) {
        tracing::warn!(code = err.error_code(), error = %err, "viewer load failed");
        self.load = LoadState::Failed(err);
    }

    /// Store the one-time AR capability probe result.
    pub fn set_ar_supported(&mut self, supported: bool) {
        if self.ar_supported.is_none() {
            tracing::info!(supported, "AR capability probed");
            self.ar_supported = Some(supported);
        }
    }

    /// Resolve, import, and probe AR support in one go.
    pub async fn load<P, S, C>(&mut self, platform: &P, store: &S, probe: &C)
    where
        P: Platform + ?Sized,
        S: MetadataStore + ?Sized,
        C: ContentProbe + ?Sized,
    {
        let resolved = match resolve_source(store, probe, &self.config, &self.params).await {
            Ok(resolved) => resolved,
            Err(err) => return self.fail(err),
        };
        self.source_resolved(&resolved);

        let progress = |p: LoadProgress| tracing::trace!(loaded = p.loaded, total = ?p.total, "import progress");
        let imported = import_with_timeout(platform, &resolved.source, self.config.load_timeout(), &progress).await;
        self.finish_load(imported.map_err(ViewerError::from));
        if self.load == LoadState::Ready {
            self.set_ar_supported(platform.is_ar_supported().await);
        }
    }

    // --- Frame ---

    /// One frame: AR polling while a session is active, preview animation
    /// otherwise.
    pub fn tick(&mut self, dt: f32) -> Vec<ArAction> {
        if self.load != LoadState::Ready {
            return Vec::new();
        }
        if self.ar.phase().is_active() {
            self.ar.tick(&mut self.scene)
        } else {
            self.scene.advance(dt);
            Vec::new()
        }
    }

    // --- AR ---

    /// Whether the `ar=true` launch flag should start AR now. True at most
    /// once.
    pub fn take_auto_start(&mut self) -> bool {
        let ready = self.load == LoadState::Ready
            && self.ar_supported == Some(true)
            && self.ar.phase() == ArPhase::Preview;
        if self.params.auto_start_ar && ready && !self.auto_start_consumed {
            self.auto_start_consumed = true;
            return true;
        }
        false
    }

    /// First half of starting AR.
    ///
    /// # Errors
    ///
    /// Returns the controller's refusal; unsupported and in-progress are not
    /// recorded as AR failures.
    pub fn begin_ar(&mut self) -> Result<(), ViewerError> {
        if self.load != LoadState::Ready {
            return Err(ViewerError::ArUnsupported);
        }
        self.ar_error = None;
        self.ar.begin_request(self.ar_supported, &mut self.scene)
    }

    /// Second half of starting AR, with the acquisition result.
    ///
    /// Returns a pending end when the request had been cancelled and the late
    /// session must be closed.
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::ArSessionDenied`] when acquisition failed; the
    /// session stays in preview.
    pub fn complete_ar(&mut self, result: Result<Box<dyn ArSession>, SessionError>) -> Result<Option<PendingEnd>, ViewerError> {
        match result {
            Ok(session) => match self.ar.activate(session, &mut self.scene) {
                Ok(_) => Ok(None),
                Err(pending) => Ok(Some(pending)),
            },
            Err(err) => {
                let err = self.ar.abort(err, &mut self.scene);
                self.ar_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Request, prepare and activate an AR session.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_ar`] and [`Self::complete_ar`].
    pub async fn start_ar<P: Platform + ?Sized>(&mut self, platform: &P) -> Result<(), ViewerError> {
        self.begin_ar()?;
        let result = acquire_session(platform, &SessionFeatures::default()).await;
        if let Some(pending) = self.complete_ar(result)? {
            if let Err(err) = pending.await {
                tracing::warn!(error = %err, "failed to end cancelled AR session");
            }
        }
        Ok(())
    }

    /// Leave AR. No-op outside a session.
    pub fn exit_ar(&mut self) -> Option<PendingEnd> {
        self.ar.exit(&mut self.scene)
    }

    /// Explicit "place" control.
    pub fn place(&mut self) -> Option<ArAction> {
        self.ar.place(&mut self.scene, None)
    }

    pub fn reset_placements(&mut self) -> Option<ArAction> {
        self.ar.reset_placements(&mut self.scene)
    }

    // --- Preview controls ---

    pub fn toggle_rotation(&mut self) -> bool {
        self.scene.toggle_rotation()
    }

    pub fn reset_view(&mut self) {
        self.scene.reset_view();
    }

    #[must_use]
    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Flip the wanted fullscreen state and return it for the host to apply.
    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    /// Leave fullscreen; `false` when it was not on and there is nothing to do.
    pub fn exit_fullscreen(&mut self) -> bool {
        std::mem::replace(&mut self.fullscreen, false)
    }

    /// Sync with the platform after the user left fullscreen some other way.
    pub fn set_fullscreen(&mut self, on: bool) {
        self.fullscreen = on;
    }

    /// Captures only make sense of the preview, not of an AR camera feed.
    #[must_use]
    pub fn can_screenshot(&self) -> bool {
        self.mode() == SessionMode::Preview
    }

    #[must_use]
    pub fn screenshot_filename(&self) -> String {
        screenshot_filename(self.asset.as_ref().map_or("", |a| a.title.as_str()))
    }

    /// Report the outcome of a canvas capture.
    pub fn screenshot_taken(&mut self, saved: bool) {
        if saved {
            self.notify(NoticeKind::Success, "Screenshot saved!");
        } else {
            self.notify(NoticeKind::Error, "Screenshot failed");
        }
    }

    // --- Share ---

    #[must_use]
    pub fn share_target(&self) -> &ShareTarget {
        &self.share
    }

    #[must_use]
    pub fn share_mode(&self) -> ShareMode {
        self.share_mode
    }

    /// Switch share mode and rebuild the target. The QR image reloads.
    pub fn set_share_mode(&mut self, mode: ShareMode) {
        if mode == self.share_mode {
            return;
        }
        self.share_mode = mode;
        self.share = ShareTarget::new(&self.config, self.params.model_id.as_deref(), mode);
        self.qr = QrImageState::Loading;
    }

    pub fn qr_loaded(&mut self) {
        self.qr = QrImageState::Ready;
    }

    /// The QR image failed; only the QR panel changes.
    pub fn qr_failed(&mut self) {
        tracing::warn!(url = %self.share.qr_image_url, "QR image failed to load");
        self.qr = QrImageState::Failed;
    }

    #[must_use]
    pub fn share_payload(&self) -> SharePayload {
        SharePayload::new(&self.config, self.params.model_id.as_deref(), &self.title())
    }

    #[must_use]
    pub fn qr_download_filename(&self) -> String {
        qr_download_filename(&self.title())
    }

    /// The share sheet was unavailable and the link went to the clipboard.
    pub fn link_copied(&mut self) {
        self.notify(NoticeKind::Success, "Link copied to clipboard!");
    }

    /// Social metadata for the loaded model, pointing at its webpage link.
    /// `None` in demo mode or before the record arrives.
    #[must_use]
    pub fn page_meta(&self) -> Option<PageMeta> {
        let asset = self.asset.as_ref()?;
        let url = share_url(&self.config, Some(&asset.id), ShareMode::Webpage);
        Some(page_meta(asset, &url))
    }

    fn title(&self) -> String {
        match &self.asset {
            Some(asset) => asset.title.clone(),
            None => crate::presenter::DEMO_TITLE.to_owned(),
        }
    }

    // --- Presentation ---

    pub fn notify(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notices.push(Notice { kind, text: text.into() });
    }

    /// Drain toasts queued since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    #[must_use]
    pub fn view_model(&self) -> ViewModel {
        present(&ViewState {
            load: &self.load,
            phase: self.ar.phase(),
            placements: self.ar.placements().len(),
            ar_supported: self.ar_supported,
            ar_error: self.ar_error.as_ref(),
            asset: self.asset.as_ref(),
            demo: self.is_demo(),
            auto_rotate: self.scene.auto_rotate.enabled,
            share_mode: self.share_mode,
            share: &self.share,
            qr: self.qr,
            fullscreen: self.fullscreen,
        })
    }
}
