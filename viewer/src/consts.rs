//! Shared numeric constants for the viewer crate.

use std::time::Duration;

// ── Framing ─────────────────────────────────────────────────────

/// Largest dimension of a framed preview asset, in world units.
pub const TARGET_SIZE: f32 = 2.0;

/// Auto-rotation speed around the vertical axis, in radians per second.
pub const AUTO_ROTATE_RADIANS_PER_SEC: f32 = 0.6;

/// Upper bound for a single frame step fed into the animation clock.
pub const MAX_FRAME_DT_SECS: f32 = 0.1;

// ── Camera ──────────────────────────────────────────────────────

/// Vertical field of view of the preview camera, in degrees.
pub const CAMERA_FOV_DEG: f32 = 70.0;

pub const CAMERA_NEAR: f32 = 0.01;
pub const CAMERA_FAR: f32 = 20.0;

/// Camera home position used on load and by "reset view".
pub const CAMERA_HOME: [f32; 3] = [0.0, 2.0, 5.0];

/// Orbit distance limits (world units).
pub const ORBIT_MIN_DISTANCE: f32 = 1.0;
pub const ORBIT_MAX_DISTANCE: f32 = 15.0;

/// Keeps the orbit camera off the poles.
pub const ORBIT_POLAR_EPSILON: f32 = 0.05;

// ── Scene ───────────────────────────────────────────────────────

/// Edge length of the square shadow-receiving ground plane.
pub const SHADOW_PLANE_SIZE: f32 = 20.0;

/// Shadow-plane height while nothing has been placed in AR.
pub const SHADOW_PLANE_PARKED_Y: f32 = 10_000.0;

/// Opacity of the shadow material.
pub const SHADOW_OPACITY: f32 = 0.5;

/// Directional (sun) light position.
pub const SUN_POSITION: [f32; 3] = [10.0, 15.0, 10.0];

pub const RETICLE_INNER_RADIUS: f32 = 0.15;
pub const RETICLE_OUTER_RADIUS: f32 = 0.2;

// ── Loading ─────────────────────────────────────────────────────

/// No load/error signal within this window is a load failure.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

// ── AR ──────────────────────────────────────────────────────────

/// Haptic pulse fired on placement.
pub const HAPTIC_INTENSITY: f32 = 0.5;
pub const HAPTIC_DURATION_MS: u32 = 100;

// ── Share ───────────────────────────────────────────────────────

/// Edge length of the requested QR image, in pixels.
pub const QR_SIZE_PX: u32 = 200;
