//! Rigid-plus-scale transforms shared by scene nodes, hit-test poses and
//! placed instances.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Translation, rotation and scale of a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE };

    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self { translation, ..Self::IDENTITY }
    }

    /// Decompose a column-major 4x4 matrix, the layout AR platforms use for
    /// pose matrices.
    #[must_use]
    pub fn from_cols_array(cols: &[f32; 16]) -> Self {
        Self::from_matrix(&Mat4::from_cols_array(cols))
    }

    #[must_use]
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self { translation, rotation, scale }
    }

    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    #[must_use]
    pub fn to_cols_array(&self) -> [f32; 16] {
        self.to_matrix().to_cols_array()
    }

    /// Same placement, uniform scale `factor`.
    #[must_use]
    pub fn with_uniform_scale(self, factor: f32) -> Self {
        Self { scale: Vec3::splat(factor), ..self }
    }

    /// Compose `self` (parent) with `child`, child applied first.
    #[must_use]
    pub fn mul_transform(&self, child: &Self) -> Self {
        Self::from_matrix(&(self.to_matrix() * child.to_matrix()))
    }

    /// Apply this transform to a point.
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.translation
    }
}
