//! AR session controller.
//!
//! ```text
//! Preview ──begin_request──▶ RequestingSession ──activate──▶ Active(Searching)
//!    ▲                            │ abort                      │   ▲
//!    │◀───────────────────────────┘                 hits ≥ 1   ▼   │ hits = 0
//!    │                                               Active(SurfaceDetected)
//!    └────────── Ending ◀── exit / platform Ended ─────────────┘
//! ```
//!
//! Acquisition is split around its await points so hosts never hold the
//! controller borrowed across one: [`ArController::begin_request`] (sync),
//! [`acquire_session`] (async, touches no controller state), then
//! [`ArController::activate`] or [`ArController::abort`] (sync). Every other
//! transition is synchronous and completes before the next [`ArController::tick`].

#[cfg(test)]
#[path = "ar_test.rs"]
mod ar_test;

use crate::bootstrap::PreviewScene;
use crate::consts::{HAPTIC_DURATION_MS, HAPTIC_INTENSITY};
use crate::error::{SessionError, ViewerError};
use crate::placement::{PlacedInstance, PlacementRegistry};
use crate::platform::{
    ArSession, InputSourceId, PendingEnd, Platform, ReferenceSpaceKind, SessionEvent, SessionFeatures,
};
use crate::scene::NodeId;
use crate::transform::Transform;

/// Surface tracking inside an active session. Recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tracking {
    Searching,
    SurfaceDetected,
}

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArPhase {
    #[default]
    Preview,
    RequestingSession,
    Active(Tracking),
    Ending,
}

impl ArPhase {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// Notable outcomes returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArAction {
    SessionStarted,
    SurfaceFound,
    SurfaceLost,
    Placed { node: NodeId, count: usize },
    PlacementsCleared { count: usize },
    SessionEnded,
}

/// Request an immersive session and prepare it for hit testing.
///
/// Acquires the `local` and `viewer` reference spaces and a hit-test source
/// anchored to the viewer. If any step after the session is granted fails,
/// the session is ended before the error is returned.
///
/// # Errors
///
/// Returns the platform's [`SessionError`] from whichever step failed.
pub async fn acquire_session<P: Platform + ?Sized>(
    platform: &P,
    features: &SessionFeatures,
) -> Result<Box<dyn ArSession>, SessionError> {
    let mut session = platform.request_ar_session(features).await?;
    if let Err(err) = prepare_session(session.as_mut()).await {
        if let Err(end_err) = session.end().await {
            tracing::warn!(error = %end_err, "failed to end half-initialized AR session");
        }
        return Err(err);
    }
    Ok(session)
}

async fn prepare_session(session: &mut dyn ArSession) -> Result<(), SessionError> {
    session.request_reference_space(ReferenceSpaceKind::Local).await?;
    session.request_reference_space(ReferenceSpaceKind::Viewer).await?;
    session.request_hit_test_source(ReferenceSpaceKind::Viewer).await
}

/// Owns the AR session handle, the current reticle pose, and placed instances.
#[derive(Default)]
pub struct ArController {
    phase: ArPhase,
    session: Option<Box<dyn ArSession>>,
    reticle_pose: Option<Transform>,
    placements: PlacementRegistry,
}

impl ArController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> ArPhase {
        self.phase
    }

    /// Latest hit pose; `None` unless a surface was detected this frame.
    #[must_use]
    pub fn reticle_pose(&self) -> Option<Transform> {
        self.reticle_pose
    }

    #[must_use]
    pub fn placements(&self) -> &PlacementRegistry {
        &self.placements
    }

    // --- Acquisition ---

    /// Enter `RequestingSession` and pause the preview spin. `ar_supported`
    /// is the result of the one-time capability probe, `None` while it is
    /// still pending.
    ///
    /// # Errors
    ///
    /// - [`ViewerError::ArSessionInProgress`] outside `Preview`
    /// - [`ViewerError::ArUnsupported`] unless the probe reported support
    pub fn begin_request(&mut self, ar_supported: Option<bool>, scene: &mut PreviewScene) -> Result<(), ViewerError> {
        if self.phase != ArPhase::Preview {
            return Err(ViewerError::ArSessionInProgress);
        }
        if ar_supported != Some(true) {
            return Err(ViewerError::ArUnsupported);
        }
        self.phase = ArPhase::RequestingSession;
        scene.set_rotation_suspended(true);
        tracing::info!("requesting AR session");
        Ok(())
    }

    /// Install an acquired session and hand the scene over to AR.
    ///
    /// # Errors
    ///
    /// When the request was cancelled meanwhile, the session is not installed
    /// and its pending end is returned for the host to drive.
    pub fn activate(&mut self, mut session: Box<dyn ArSession>, scene: &mut PreviewScene) -> Result<ArAction, PendingEnd> {
        if self.phase != ArPhase::RequestingSession {
            tracing::info!("AR request was cancelled; ending late session");
            return Err(session.end());
        }
        scene.enter_ar();
        self.session = Some(session);
        self.reticle_pose = None;
        self.phase = ArPhase::Active(Tracking::Searching);
        tracing::info!("AR session active");
        Ok(ArAction::SessionStarted)
    }

    /// Return to `Preview` after a failed acquisition. Only the preview spin
    /// was paused; the render graph was never touched.
    pub fn abort(&mut self, err: SessionError, scene: &mut PreviewScene) -> ViewerError {
        if self.phase == ArPhase::RequestingSession {
            self.phase = ArPhase::Preview;
            scene.set_rotation_suspended(false);
        }
        let err = ViewerError::from(err);
        tracing::warn!(error = %err, "AR session request failed");
        err
    }

    // --- Per frame ---

    /// Poll the session once: platform events, then hit testing, then
    /// queued selects. Does nothing outside an active session.
    pub fn tick(&mut self, scene: &mut PreviewScene) -> Vec<ArAction> {
        let ArPhase::Active(tracking) = self.phase else {
            return Vec::new();
        };
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };

        let events = session.take_events();
        if events.contains(&SessionEvent::Ended) {
            // Already ended by the platform; only local teardown remains.
            self.session = None;
            self.teardown(scene);
            return vec![ArAction::SessionEnded];
        }

        let mut actions = Vec::new();
        if let Some(pose) = session.hit_test_results().into_iter().next() {
            scene.show_reticle(pose);
            self.reticle_pose = Some(pose);
            self.phase = ArPhase::Active(Tracking::SurfaceDetected);
            if tracking == Tracking::Searching {
                tracing::debug!("surface detected");
                actions.push(ArAction::SurfaceFound);
            }
        } else {
            scene.hide_reticle();
            self.reticle_pose = None;
            self.phase = ArPhase::Active(Tracking::Searching);
            if tracking == Tracking::SurfaceDetected {
                actions.push(ArAction::SurfaceLost);
            }
        }

        for event in events {
            if let SessionEvent::Select { input_source } = event {
                actions.extend(self.place(scene, Some(input_source)));
            }
        }
        actions
    }

    // --- Placement ---

    /// Place a copy of the loaded asset at the reticle. No-op unless the
    /// reticle is visible this frame.
    pub fn place(&mut self, scene: &mut PreviewScene, input_source: Option<InputSourceId>) -> Option<ArAction> {
        if self.phase != ArPhase::Active(Tracking::SurfaceDetected) || !scene.reticle_visible() {
            return None;
        }
        let anchor = self.reticle_pose?;
        let node = scene.spawn_clone(&anchor)?;
        self.placements.push(PlacedInstance { node, anchor });

        if let Some(session) = self.session.as_mut()
            && !session.pulse_haptics(input_source, HAPTIC_INTENSITY, HAPTIC_DURATION_MS)
        {
            tracing::trace!("no haptic actuator accepted the pulse");
        }

        let count = self.placements.len();
        tracing::info!(count, "placed model");
        Some(ArAction::Placed { node, count })
    }

    /// Remove every placed instance while staying in the session.
    pub fn reset_placements(&mut self, scene: &mut PreviewScene) -> Option<ArAction> {
        if !self.phase.is_active() {
            return None;
        }
        let count = self.placements.clear(&mut scene.graph);
        Some(ArAction::PlacementsCleared { count })
    }

    // --- Exit ---

    /// Leave AR and restore the preview. Idempotent: outside an active
    /// session this does nothing, and a pending request is simply cancelled.
    ///
    /// The session handle leaves the controller before this returns, so no
    /// further hit-test polling can happen. The returned future completes
    /// the platform-side end.
    pub fn exit(&mut self, scene: &mut PreviewScene) -> Option<PendingEnd> {
        match self.phase {
            ArPhase::Preview | ArPhase::Ending => None,
            ArPhase::RequestingSession => {
                self.phase = ArPhase::Preview;
                scene.set_rotation_suspended(false);
                tracing::info!("AR request cancelled");
                None
            }
            ArPhase::Active(_) => {
                self.phase = ArPhase::Ending;
                let pending = self.session.take().map(|mut session| session.end());
                self.teardown(scene);
                pending
            }
        }
    }

    fn teardown(&mut self, scene: &mut PreviewScene) {
        self.phase = ArPhase::Ending;
        let removed = self.placements.clear(&mut scene.graph);
        scene.restore_preview();
        self.reticle_pose = None;
        self.phase = ArPhase::Preview;
        tracing::info!(removed, "AR session ended");
    }
}
