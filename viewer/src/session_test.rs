use super::*;
use crate::ar::Tracking;
use crate::error::{DenialReason, UnreachableCategory};
use crate::presenter::Screen;
use crate::scene::NodeKind;
use crate::test_support::{MockPlatform, MockProbe, MockStore, model, pose};

fn config() -> ViewerConfig {
    ViewerConfig { base_url: "https://viewer.example".into(), ..ViewerConfig::default() }
}

fn session(query: &str) -> ViewerSession {
    ViewerSession::new(config(), LaunchParams::from_query(query))
}

async fn loaded(platform: &MockPlatform) -> ViewerSession {
    let mut session = session("?id=abc123");
    session.load(platform, &MockStore::with(model("abc123")), &MockProbe::ok()).await;
    assert_eq!(session.mode(), SessionMode::Preview);
    session
}

fn preview_assets(session: &ViewerSession) -> usize {
    session.scene().graph.count_attached(|k| matches!(k, NodeKind::PreviewAsset(_)))
}

// =============================================================
// Loading
// =============================================================

#[tokio::test]
async fn load_frames_asset_to_target_size() {
    let platform = MockPlatform::default();
    let session = loaded(&platform).await;
    let bounds = session.scene().asset_world_bounds().unwrap();
    assert!((bounds.max_dimension() - 2.0).abs() < 1e-4);
    assert!(bounds.center().length() < 1e-4);
    assert!((session.scene().asset().unwrap().framing.scale - 2.0 / 3.0).abs() < 1e-5);
    assert_eq!(
        *platform.imports.borrow(),
        vec![AssetSource::Url("https://cdn.example/models/abc123.glb".into())]
    );
}

#[tokio::test]
async fn load_probes_ar_support_once() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    assert_eq!(session.ar_supported(), Some(true));
    session.set_ar_supported(false);
    assert_eq!(session.ar_supported(), Some(true));
    assert_eq!(platform.support_probes.get(), 1);
}

#[tokio::test]
async fn missing_asset_file_reaches_error_without_ar_controls() {
    let platform = MockPlatform::default();
    let mut session = session("?id=abc123");
    session.load(&platform, &MockStore::with(model("abc123")), &MockProbe::status(404, "Not Found")).await;

    assert_eq!(session.mode(), SessionMode::Error);
    assert!(matches!(
        session.load_state(),
        LoadState::Failed(ViewerError::AssetUnreachable { category: UnreachableCategory::NotFound, .. })
    ));
    let vm = session.view_model();
    assert!(matches!(vm.screen, Screen::Error { .. }));
    assert!(!vm.show_start_ar && !vm.show_exit_ar && !vm.show_place);
    assert!(platform.imports.borrow().is_empty());
    assert_eq!(platform.support_probes.get(), 0);
}

#[tokio::test]
async fn import_timeout_is_model_load_failed() {
    let platform = MockPlatform { import_hangs: true, ..MockPlatform::default() };
    let mut session = session("?id=abc123");
    session.load(&platform, &MockStore::with(model("abc123")), &MockProbe::ok()).await;
    assert_eq!(
        *session.load_state(),
        LoadState::Failed(ViewerError::ModelLoadFailed(ImportError::Timeout(Duration::from_secs(30))))
    );
}

#[tokio::test]
async fn import_error_is_model_load_failed() {
    let platform = MockPlatform { import_error: Some(ImportError::Engine("bad glb".into())), ..MockPlatform::default() };
    let mut session = session("?id=abc123");
    session.load(&platform, &MockStore::with(model("abc123")), &MockProbe::ok()).await;
    let LoadState::Failed(err) = session.load_state() else { panic!("expected failure") };
    assert_eq!(err.user_message(), "Failed to load 3D model. bad glb");
}

#[tokio::test]
async fn demo_mode_imports_cube_without_store() {
    let platform = MockPlatform::default();
    let mut session = session("");
    let store = MockStore { asset: None, error: Some(crate::store::StoreError::NotConfigured) };
    session.load(&platform, &store, &MockProbe::ok()).await;
    assert_eq!(session.mode(), SessionMode::Preview);
    assert_eq!(*platform.imports.borrow(), vec![AssetSource::DemoCube]);
    assert!(session.view_model().demo);
    assert_eq!(session.take_notices().len(), 1);
    assert!(session.take_notices().is_empty());
}

#[test]
fn progress_updates_loading_percent() {
    let mut session = session("?id=abc123");
    session.source_resolved(&ResolvedSource { asset: Some(model("abc123")), source: AssetSource::DemoCube });
    session.set_progress(LoadProgress { loaded: 50, total: Some(200) });
    assert_eq!(*session.load_state(), LoadState::Loading { stage: LoadStage::Importing, progress: Some(25) });
    session.set_progress(LoadProgress { loaded: 80, total: None });
    assert_eq!(*session.load_state(), LoadState::Loading { stage: LoadStage::Importing, progress: Some(25) });
}

// =============================================================
// Frame loop
// =============================================================

#[tokio::test]
async fn tick_spins_preview_only_outside_ar() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    session.tick(0.05);
    assert!(session.scene().auto_rotate.angle() > 0.0);

    session.start_ar(&platform).await.unwrap();
    let angle = session.scene().auto_rotate.angle();
    platform.session.borrow_mut().hits = vec![pose(0.0, -1.0)];
    session.tick(0.05);
    assert!((session.scene().auto_rotate.angle() - angle).abs() < f32::EPSILON);
    assert_eq!(platform.session.borrow().hit_polls, 1);
}

#[tokio::test]
async fn tick_holds_rotation_while_ar_is_requested() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    session.begin_ar().unwrap();
    assert_eq!(session.mode(), SessionMode::RequestingAr);
    session.tick(0.05);
    assert!(session.scene().auto_rotate.angle().abs() < f32::EPSILON);

    assert!(session.exit_ar().is_none());
    session.tick(0.05);
    assert!(session.scene().auto_rotate.angle() > 0.0);
}

#[test]
fn tick_before_load_does_nothing() {
    let mut session = session("?id=abc123");
    assert!(session.tick(0.05).is_empty());
}

// =============================================================
// AR
// =============================================================

#[tokio::test]
async fn start_ar_activates_session() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    session.start_ar(&platform).await.unwrap();
    assert_eq!(session.mode(), SessionMode::ActiveAr);
    assert_eq!(session.ar().phase(), ArPhase::Active(Tracking::Searching));
    assert_eq!(preview_assets(&session), 0);
}

#[tokio::test]
async fn permission_denial_keeps_preview() {
    let platform = MockPlatform {
        session_error: Some(SessionError::new("NotAllowedError", "The user denied permission")),
        ..MockPlatform::default()
    };
    let mut session = loaded(&platform).await;
    let err = session.start_ar(&platform).await.unwrap_err();

    assert!(matches!(err, ViewerError::ArSessionDenied { reason: DenialReason::PermissionDenied, .. }));
    assert!(!err.is_terminal());
    assert_eq!(session.mode(), SessionMode::Preview);
    assert_eq!(preview_assets(&session), 1);
    assert!(session.scene().auto_rotate.is_running());
    let vm = session.view_model();
    assert_eq!(vm.screen, Screen::Main);
    assert_eq!(vm.ar_status.as_deref(), Some("Camera permission denied - allow camera access to use AR"));

    // Denial is cleared on the next attempt.
    session.begin_ar().unwrap();
    assert_eq!(session.view_model().ar_status.as_deref(), Some("Starting AR session..."));
}

#[tokio::test]
async fn unsupported_device_never_requests_session() {
    let platform = MockPlatform { ar_supported: false, ..MockPlatform::default() };
    let mut session = loaded(&platform).await;
    assert_eq!(session.start_ar(&platform).await.unwrap_err(), ViewerError::ArUnsupported);
    assert_eq!(platform.session_requests.get(), 0);
    assert!(session.view_model().unsupported_notice);
}

#[tokio::test]
async fn begin_ar_before_load_is_refused() {
    let mut session = session("?id=abc123");
    assert_eq!(session.begin_ar().unwrap_err(), ViewerError::ArUnsupported);
}

#[tokio::test]
async fn exit_during_request_discards_late_session() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    session.begin_ar().unwrap();
    assert!(session.exit_ar().is_none());

    let result = crate::ar::acquire_session(&platform, &SessionFeatures::default()).await;
    let pending = session.complete_ar(result).unwrap().unwrap();
    assert!(pending.await.is_ok());
    assert_eq!(platform.session.borrow().end_calls, 1);
    assert_eq!(session.mode(), SessionMode::Preview);
    assert_eq!(preview_assets(&session), 1);
}

#[tokio::test]
async fn place_and_exit_round_trip() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    session.start_ar(&platform).await.unwrap();

    assert!(session.place().is_none());
    platform.session.borrow_mut().hits = vec![pose(0.0, -1.0)];
    session.tick(0.016);
    assert!(session.place().is_some());
    assert_eq!(session.ar().placements().len(), 1);

    let pending = session.exit_ar().unwrap();
    assert!(pending.await.is_ok());
    assert_eq!(session.mode(), SessionMode::Preview);
    assert!(session.ar().placements().is_empty());
    assert_eq!(preview_assets(&session), 1);
    assert!(session.scene().auto_rotate.is_running());
    assert!(session.exit_ar().is_none());
}

#[tokio::test]
async fn auto_start_fires_once_when_ready() {
    let platform = MockPlatform::default();
    let mut session = session("?id=abc123&ar=true");
    assert!(!session.take_auto_start());
    session.load(&platform, &MockStore::with(model("abc123")), &MockProbe::ok()).await;
    assert!(session.take_auto_start());
    assert!(!session.take_auto_start());
}

#[tokio::test]
async fn auto_start_needs_flag() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    assert!(!session.take_auto_start());
}

// =============================================================
// Preview controls and share
// =============================================================

#[tokio::test]
async fn toggle_rotation_and_reset_view() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    assert!(!session.toggle_rotation());
    assert!(!session.view_model().auto_rotate);
    session.scene_mut().orbit(0.5, 0.2);
    session.reset_view();
    assert_eq!(session.scene().camera, crate::camera::OrbitCamera::default());
}

#[test]
fn share_mode_toggle_rebuilds_target() {
    let mut session = session("?id=abc123");
    assert_eq!(session.share_target().url, "https://viewer.example/viewer.html?id=abc123&ar=true");
    session.qr_failed();
    session.set_share_mode(ShareMode::Webpage);
    assert_eq!(session.share_mode(), ShareMode::Webpage);
    assert_eq!(session.share_target().url, "https://viewer.example/viewer.html?id=abc123");
    assert!(session.view_model().share.is_none());
}

#[tokio::test]
async fn qr_failure_only_affects_qr_panel() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    let before = session.view_model();
    session.qr_failed();
    let after = session.view_model();
    assert!(after.share.as_ref().unwrap().qr_image_url.is_none());
    assert_eq!(after.model_info, before.model_info);
    assert_eq!(after.show_start_ar, before.show_start_ar);

    session.set_share_mode(ShareMode::Webpage);
    assert!(session.view_model().share.unwrap().qr_image_url.is_some());
}

#[tokio::test]
async fn share_payload_and_download_name() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    let payload = session.share_payload();
    assert_eq!(payload.title, "Chair");
    assert_eq!(payload.url, "https://viewer.example/viewer.html?id=abc123");
    assert_eq!(session.qr_download_filename(), "Chair_QR.png");
    session.link_copied();
    assert_eq!(session.take_notices()[0].kind, NoticeKind::Success);
}

// =============================================================
// Fullscreen, screenshots and page metadata
// =============================================================

#[test]
fn fullscreen_toggles_and_escape_only_leaves() {
    let mut session = session("?id=abc123");
    assert!(!session.exit_fullscreen());
    assert!(session.toggle_fullscreen());
    assert!(session.view_model().fullscreen);
    assert!(session.exit_fullscreen());
    assert!(!session.is_fullscreen());
}

#[test]
fn platform_fullscreen_exit_is_mirrored() {
    let mut session = session("?id=abc123");
    session.toggle_fullscreen();
    session.set_fullscreen(false);
    assert!(!session.view_model().fullscreen);
}

#[tokio::test]
async fn screenshot_only_in_preview_and_reports_outcome() {
    let platform = MockPlatform::default();
    let mut session = loaded(&platform).await;
    assert!(session.can_screenshot());
    assert_eq!(session.screenshot_filename(), "Chair-screenshot.png");

    session.screenshot_taken(true);
    session.screenshot_taken(false);
    let notices = session.take_notices();
    assert_eq!(notices[0], Notice { kind: NoticeKind::Success, text: "Screenshot saved!".into() });
    assert_eq!(notices[1], Notice { kind: NoticeKind::Error, text: "Screenshot failed".into() });

    session.start_ar(&platform).await.unwrap();
    assert!(!session.can_screenshot());
}

#[test]
fn screenshot_before_load_is_refused() {
    let session = session("?id=abc123");
    assert!(!session.can_screenshot());
}

#[tokio::test]
async fn page_meta_points_at_webpage_link() {
    let platform = MockPlatform::default();
    let session = loaded(&platform).await;
    let meta = session.page_meta().unwrap();
    assert!(meta.open_graph.contains(&("og:url", "https://viewer.example/viewer.html?id=abc123".to_owned())));
    assert!(meta.open_graph.contains(&("og:title", "Chair".to_owned())));
}

#[tokio::test]
async fn demo_has_no_page_meta() {
    let platform = MockPlatform::default();
    let mut session = session("");
    session.load(&platform, &MockStore::default(), &MockProbe::ok()).await;
    assert!(session.page_meta().is_none());
    assert_eq!(session.screenshot_filename(), "model-screenshot.png");
}
