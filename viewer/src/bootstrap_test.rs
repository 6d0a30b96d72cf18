use glam::Vec3;

use super::*;

const EPS: f32 = 1e-4;

fn imported(size: Vec3, center: Vec3) -> ImportedAsset {
    ImportedAsset { handle: AssetHandle(7), bounds: Aabb::from_center_size(center, size) }
}

fn scene_with(size: Vec3, center: Vec3) -> PreviewScene {
    let mut scene = PreviewScene::new(2.0, 0.6);
    scene.install_asset(imported(size, center)).unwrap();
    scene
}

// =============================================================
// Bootstrap
// =============================================================

#[test]
fn new_scene_has_lights_plane_and_hidden_reticle() {
    let scene = PreviewScene::new(2.0, 0.6);
    assert_eq!(scene.graph.len(), 4);
    assert!(!scene.reticle_visible());
    assert!(scene.asset().is_none());
    let plane = scene.graph.get(&scene.shadow_plane()).unwrap();
    assert!((plane.transform.translation.y - SHADOW_PLANE_PARKED_Y).abs() < EPS);
}

#[test]
fn install_frames_three_by_one_by_two() {
    let scene = scene_with(Vec3::new(3.0, 1.0, 2.0), Vec3::new(5.0, -2.0, 1.0));
    let loaded = scene.asset().unwrap();
    assert!((loaded.framing.scale - 2.0 / 3.0).abs() < EPS);
    let world = scene.asset_world_bounds().unwrap();
    assert!((world.max_dimension() - 2.0).abs() < EPS);
    assert!(world.center().length() < EPS);
}

#[test]
fn install_rejects_flat_bounds() {
    let mut scene = PreviewScene::new(2.0, 0.6);
    let err = scene.install_asset(imported(Vec3::ZERO, Vec3::ZERO)).unwrap_err();
    assert_eq!(err, ImportError::Empty);
    assert!(scene.asset().is_none());
}

#[test]
fn reinstall_replaces_previous_asset() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    scene.install_asset(imported(Vec3::splat(4.0), Vec3::ZERO)).unwrap();
    assert_eq!(scene.graph.count_attached(|k| matches!(k, NodeKind::PreviewAsset(_))), 1);
}

// =============================================================
// Auto-rotate
// =============================================================

#[test]
fn advance_spins_asset_around_y() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    scene.advance(0.05);
    assert!((scene.auto_rotate.angle() - 0.03).abs() < EPS);
    let node = scene.graph.get(&scene.asset().unwrap().node).unwrap();
    assert!(node.transform.rotation.angle_between(Quat::IDENTITY) > 0.0);
}

#[test]
fn advance_clamps_long_frames() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    scene.advance(5.0);
    assert!((scene.auto_rotate.angle() - 0.6 * MAX_FRAME_DT_SECS).abs() < EPS);
}

#[test]
fn spin_keeps_asset_centered() {
    let mut scene = scene_with(Vec3::new(3.0, 1.0, 2.0), Vec3::new(1.0, 1.0, 1.0));
    scene.advance(0.1);
    assert!(scene.asset_world_bounds().unwrap().center().length() < EPS);
}

#[test]
fn toggle_rotation_stops_spin() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    assert!(!scene.toggle_rotation());
    scene.advance(0.05);
    assert!(scene.auto_rotate.angle().abs() < EPS);
    assert!(scene.toggle_rotation());
}

#[test]
fn reset_view_restores_camera_and_angle() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    scene.orbit(1.0, 0.3);
    scene.zoom(2.0);
    scene.advance(0.05);
    scene.reset_view();
    assert_eq!(scene.camera, OrbitCamera::default());
    assert!(scene.auto_rotate.angle().abs() < EPS);
}

// =============================================================
// AR hand-off
// =============================================================

#[test]
fn enter_ar_detaches_asset_and_suspends_controls() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    scene.enter_ar();
    assert!(!scene.graph.is_attached(&scene.asset().unwrap().node));
    assert_eq!(scene.graph.background, Background::Transparent);
    assert!(!scene.auto_rotate.is_running());
    assert!(!scene.orbit_enabled());

    let before = scene.camera;
    scene.orbit(1.0, 0.0);
    assert_eq!(scene.camera, before);
    scene.advance(0.05);
    assert!(scene.auto_rotate.angle().abs() < EPS);
}

#[test]
fn restore_preview_reattaches_once() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    scene.enter_ar();
    scene.restore_preview();
    scene.restore_preview();
    assert_eq!(scene.graph.count_attached(|k| matches!(k, NodeKind::PreviewAsset(_))), 1);
    assert_eq!(scene.graph.background, Background::Preview);
    assert!(scene.auto_rotate.is_running());
    assert!(scene.orbit_enabled());
}

#[test]
fn spawn_clone_rests_on_anchor_and_moves_shadow() {
    let mut scene = scene_with(Vec3::new(1.0, 2.0, 1.0), Vec3::new(0.0, 3.0, 0.0));
    let anchor = Transform::from_translation(Vec3::new(0.5, -1.2, -2.0));
    let node = scene.spawn_clone(&anchor).unwrap();

    let loaded = *scene.asset().unwrap();
    let transform = scene.graph.get(&node).unwrap().transform;
    let world = loaded.bounds.transformed(&transform);
    assert!((world.min.y - anchor.translation.y).abs() < EPS);
    assert!((world.center().x - 0.5).abs() < EPS);
    assert!((world.max_dimension() - 2.0).abs() < EPS);

    let plane = scene.graph.get(&scene.shadow_plane()).unwrap();
    assert!((plane.transform.translation.y + 1.2).abs() < EPS);
}

#[test]
fn spawn_clone_without_asset_is_none() {
    let mut scene = PreviewScene::new(2.0, 0.6);
    assert!(scene.spawn_clone(&Transform::IDENTITY).is_none());
}

fn shadow_y(scene: &PreviewScene) -> f32 {
    scene.graph.get(&scene.shadow_plane()).unwrap().transform.translation.y
}

#[test]
fn install_rests_shadow_plane_under_asset() {
    let scene = scene_with(Vec3::new(3.0, 1.0, 2.0), Vec3::new(5.0, -2.0, 1.0));
    let floor = scene.asset_world_bounds().unwrap().min.y;
    assert!((shadow_y(&scene) - floor).abs() < EPS);
    assert!((floor + 1.0 / 3.0).abs() < EPS);
}

#[test]
fn enter_ar_parks_shadow_plane() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    scene.enter_ar();
    assert!((shadow_y(&scene) - SHADOW_PLANE_PARKED_Y).abs() < EPS);
}

#[test]
fn restore_preview_returns_shadow_plane_under_asset() {
    let mut scene = scene_with(Vec3::ONE, Vec3::ZERO);
    scene.enter_ar();
    scene.spawn_clone(&Transform::from_translation(Vec3::new(0.0, -1.0, 0.0)));
    scene.restore_preview();
    assert!((shadow_y(&scene) + 1.0).abs() < EPS);
    assert_eq!(scene.preview_floor_y(), Some(-1.0));
}

#[test]
fn restore_preview_without_asset_keeps_shadow_parked() {
    let mut scene = PreviewScene::new(2.0, 0.6);
    scene.enter_ar();
    scene.restore_preview();
    assert!((shadow_y(&scene) - SHADOW_PLANE_PARKED_Y).abs() < EPS);
}
