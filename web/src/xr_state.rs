//! Per-frame XR state shared between the frame loop and the session adapter.
//!
//! WebXR only reports hit results inside the session's animation frame, and
//! `select`/`end` arrive as DOM events. The frame loop and event listeners
//! write here; the [`viewer::platform::ArSession`] adapter reads it back when
//! the core polls.

#[cfg(test)]
#[path = "xr_state_test.rs"]
mod xr_state_test;

use viewer::platform::{InputSourceId, SessionEvent};
use viewer::transform::Transform;

#[derive(Debug, Default)]
pub struct XrFrameState {
    hits: Vec<Transform>,
    events: Vec<SessionEvent>,
    ended: bool,
}

impl XrFrameState {
    /// Replace the hit results with this frame's.
    pub fn record_hits(&mut self, hits: Vec<Transform>) {
        self.hits = hits;
    }

    #[must_use]
    pub fn hits(&self) -> &[Transform] {
        &self.hits
    }

    pub fn push_select(&mut self, input_source: InputSourceId) {
        if !self.ended {
            self.events.push(SessionEvent::Select { input_source });
        }
    }

    /// Queue a single `Ended`, whichever of `end` and `sessionend` fires.
    pub fn mark_ended(&mut self) {
        if !self.ended {
            self.ended = true;
            self.hits.clear();
            self.events.push(SessionEvent::Ended);
        }
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Pose from a column-major 4x4 matrix as WebXR reports it.
#[must_use]
pub fn pose_from_matrix(values: &[f32]) -> Option<Transform> {
    let Ok(cols) = <&[f32; 16]>::try_from(values) else {
        return None;
    };
    cols.iter().all(|v| v.is_finite()).then(|| Transform::from_cols_array(cols))
}

/// Stable ids for opaque platform objects compared by identity.
#[derive(Debug)]
pub struct SourceRegistry<T> {
    items: Vec<T>,
}

impl<T> Default for SourceRegistry<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> SourceRegistry<T> {
    /// Id of `item`, registering it on first sight.
    pub fn id_for(&mut self, item: T, same: impl Fn(&T, &T) -> bool) -> InputSourceId {
        let index = match self.items.iter().position(|known| same(known, &item)) {
            Some(index) => index,
            None => {
                self.items.push(item);
                self.items.len() - 1
            }
        };
        InputSourceId(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn get(&self, id: InputSourceId) -> Option<&T> {
        self.items.get(usize::try_from(id.0).unwrap_or(usize::MAX))
    }
}
