//! Axis-aligned bounds and preview framing.
//!
//! An imported asset arrives with arbitrary units and origin. Framing turns its
//! bounds into a uniform scale and a translation so the largest dimension
//! equals the target size and the bounds center sits at the world origin.

#[cfg(test)]
#[path = "bounds_test.rs"]
mod bounds_test;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Build from two opposite corners in any order.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    #[must_use]
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self { min: center - half, max: center + half }
    }

    /// Smallest box containing every point, `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self { min: first, max: first }, |acc, p| Self { min: acc.min.min(p), max: acc.max.max(p) }))
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Bounds of this box after applying `transform` to all eight corners.
    #[must_use]
    pub fn transformed(&self, transform: &Transform) -> Self {
        let corners = (0..8).map(|i| {
            let x = if i & 1 == 0 { self.min.x } else { self.max.x };
            let y = if i & 2 == 0 { self.min.y } else { self.max.y };
            let z = if i & 4 == 0 { self.min.z } else { self.max.z };
            transform.transform_point(Vec3::new(x, y, z))
        });
        // Eight corners, never empty.
        Self::from_points(corners).unwrap_or(*self)
    }
}

/// Uniform scale and re-centering translation applied to a preview asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    pub scale: f32,
    /// Moves the scaled bounds center to the origin.
    pub translation: Vec3,
    /// Moves the scaled bounds bottom-center to the origin, for resting an
    /// instance on a detected surface.
    pub ground_offset: Vec3,
}

impl Framing {
    /// Compute the framing that maps `bounds` onto a `target_size` box centered
    /// at the origin.
    ///
    /// Returns `None` when the bounds have no extent or are not finite.
    #[must_use]
    pub fn fit(bounds: &Aabb, target_size: f32) -> Option<Self> {
        let max_dim = bounds.max_dimension();
        if !max_dim.is_finite() || max_dim <= f32::EPSILON || !bounds.center().is_finite() {
            return None;
        }
        let scale = target_size / max_dim;
        let center = bounds.center();
        Some(Self {
            scale,
            translation: -center * scale,
            ground_offset: Vec3::new(-center.x, -bounds.min.y, -center.z) * scale,
        })
    }

    /// Centered preview transform.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation).with_uniform_scale(self.scale)
    }

    /// Grounded transform: scaled, bottom-center at the local origin.
    #[must_use]
    pub fn grounded_transform(&self) -> Transform {
        Transform::from_translation(self.ground_offset).with_uniform_scale(self.scale)
    }
}
