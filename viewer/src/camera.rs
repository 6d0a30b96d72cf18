//! Preview camera: perspective lens plus an orbit rig around the origin.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use glam::{Mat4, Vec3};

use crate::consts::{
    CAMERA_FAR, CAMERA_FOV_DEG, CAMERA_HOME, CAMERA_NEAR, ORBIT_MAX_DISTANCE, ORBIT_MIN_DISTANCE,
    ORBIT_POLAR_EPSILON,
};

/// Perspective lens parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Lens {
    fn default() -> Self {
        Self { fov_y_deg: CAMERA_FOV_DEG, aspect: 1.0, near: CAMERA_NEAR, far: CAMERA_FAR }
    }
}

impl Lens {
    /// Update the aspect ratio from viewport dimensions. Zero-height viewports
    /// are ignored.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if height > 0.0 && width > 0.0 {
            self.aspect = width / height;
        }
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }
}

/// Orbit camera state in spherical coordinates around `target`.
///
/// `azimuth` is measured around +Y from +Z, `polar` from +Y, both in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub azimuth: f32,
    pub polar: f32,
    pub distance: f32,
    pub lens: Lens,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let mut camera = Self { target: Vec3::ZERO, azimuth: 0.0, polar: 0.0, distance: 1.0, lens: Lens::default() };
        camera.reset();
        camera
    }
}

impl OrbitCamera {
    /// Move the camera back to its home position looking at the origin.
    pub fn reset(&mut self) {
        let home = Vec3::from(CAMERA_HOME);
        self.target = Vec3::ZERO;
        self.distance = home.length();
        self.polar = (home.y / self.distance).acos();
        self.azimuth = home.x.atan2(home.z);
    }

    /// Rotate around the target by the given angle deltas (radians).
    pub fn orbit(&mut self, d_azimuth: f32, d_polar: f32) {
        self.azimuth = (self.azimuth + d_azimuth).rem_euclid(std::f32::consts::TAU);
        self.polar =
            (self.polar + d_polar).clamp(ORBIT_POLAR_EPSILON, std::f32::consts::PI - ORBIT_POLAR_EPSILON);
    }

    /// Multiply the orbit distance by `factor`, clamped to the allowed range.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).clamp(ORBIT_MIN_DISTANCE, ORBIT_MAX_DISTANCE);
        }
    }

    /// World-space eye position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.distance
    }

    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }
}
