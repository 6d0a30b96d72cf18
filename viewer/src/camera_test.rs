#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec_approx_eq(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

// --- Lens ---

#[test]
fn lens_defaults() {
    let lens = Lens::default();
    assert_eq!(lens.fov_y_deg, 70.0);
    assert_eq!(lens.near, 0.01);
    assert_eq!(lens.far, 20.0);
}

#[test]
fn lens_set_viewport_updates_aspect() {
    let mut lens = Lens::default();
    lens.set_viewport(1600.0, 800.0);
    assert_eq!(lens.aspect, 2.0);
}

#[test]
fn lens_zero_height_viewport_is_ignored() {
    let mut lens = Lens::default();
    lens.set_viewport(800.0, 0.0);
    assert_eq!(lens.aspect, 1.0);
}

// --- OrbitCamera ---

#[test]
fn default_camera_sits_at_home() {
    let cam = OrbitCamera::default();
    assert!(vec_approx_eq(cam.position(), Vec3::new(0.0, 2.0, 5.0)));
    assert_eq!(cam.target, Vec3::ZERO);
}

#[test]
fn orbit_keeps_distance() {
    let mut cam = OrbitCamera::default();
    let d = cam.position().length();
    cam.orbit(1.0, 0.3);
    assert!(approx_eq(cam.position().length(), d));
}

#[test]
fn orbit_clamps_polar_off_the_poles() {
    let mut cam = OrbitCamera::default();
    cam.orbit(0.0, -10.0);
    assert!(cam.polar > 0.0);
    cam.orbit(0.0, 20.0);
    assert!(cam.polar < std::f32::consts::PI);
}

#[test]
fn orbit_wraps_azimuth() {
    let mut cam = OrbitCamera::default();
    cam.orbit(std::f32::consts::TAU + 0.5, 0.0);
    assert!(approx_eq(cam.azimuth, 0.5));
}

#[test]
fn zoom_clamps_distance() {
    let mut cam = OrbitCamera::default();
    cam.zoom(100.0);
    assert_eq!(cam.distance, ORBIT_MAX_DISTANCE);
    cam.zoom(0.0001);
    assert_eq!(cam.distance, ORBIT_MIN_DISTANCE);
}

#[test]
fn zoom_ignores_invalid_factor() {
    let mut cam = OrbitCamera::default();
    let before = cam.distance;
    cam.zoom(-1.0);
    cam.zoom(f32::NAN);
    assert_eq!(cam.distance, before);
}

#[test]
fn reset_restores_home_after_orbit() {
    let mut cam = OrbitCamera::default();
    cam.orbit(1.2, 0.4);
    cam.zoom(2.0);
    cam.reset();
    assert!(vec_approx_eq(cam.position(), Vec3::new(0.0, 2.0, 5.0)));
}
