//! Keyboard shortcuts and pointer-to-orbit mapping for the preview canvas.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::f32::consts::TAU;

/// Wheel delta that scales the orbit distance by `e`.
const WHEEL_ZOOM_SCALE: f32 = 1000.0;

/// Preview shortcuts. Ignored while AR is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    ToggleRotation,
    ResetView,
    Fullscreen,
    /// Only acts while fullscreen.
    ExitFullscreen,
}

/// Map a `KeyboardEvent.key` value to a shortcut.
#[must_use]
pub fn shortcut_for_key(key: &str) -> Option<Shortcut> {
    match key {
        " " => Some(Shortcut::ToggleRotation),
        "r" | "R" => Some(Shortcut::ResetView),
        "f" | "F" => Some(Shortcut::Fullscreen),
        "Escape" => Some(Shortcut::ExitFullscreen),
        _ => None,
    }
}

/// A primary-button drag across the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitDrag {
    last: Option<(f32, f32)>,
}

impl OrbitDrag {
    pub fn start(&mut self, x: f32, y: f32) {
        self.last = Some((x, y));
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.last.is_some()
    }

    /// Angle deltas `(azimuth, polar)` for a move to `(x, y)`. A drag across
    /// the full canvas height turns the model once.
    pub fn move_to(&mut self, x: f32, y: f32, canvas_height: f32) -> Option<(f32, f32)> {
        let (lx, ly) = self.last?;
        self.last = Some((x, y));
        if canvas_height <= 0.0 {
            return None;
        }
        let per_px = TAU / canvas_height;
        Some((-(x - lx) * per_px, -(y - ly) * per_px))
    }

    pub fn end(&mut self) {
        self.last = None;
    }
}

/// Orbit distance factor for a wheel event; scrolling down moves away.
#[must_use]
pub fn wheel_zoom_factor(delta_y: f64) -> f32 {
    #[allow(clippy::cast_possible_truncation)]
    let delta = delta_y as f32;
    (delta / WHEEL_ZOOM_SCALE).clamp(-1.0, 1.0).exp()
}
