use super::*;

fn identity() -> [f32; 16] {
    Transform::default().to_cols_array()
}

// =============================================================
// Frame state
// =============================================================

#[test]
fn hits_are_replaced_each_frame() {
    let mut state = XrFrameState::default();
    let pose = pose_from_matrix(&identity()).unwrap();
    state.record_hits(vec![pose, pose]);
    assert_eq!(state.hits().len(), 2);
    state.record_hits(Vec::new());
    assert!(state.hits().is_empty());
}

#[test]
fn events_drain_once() {
    let mut state = XrFrameState::default();
    state.push_select(InputSourceId(0));
    state.push_select(InputSourceId(1));
    assert_eq!(state.take_events().len(), 2);
    assert!(state.take_events().is_empty());
}

#[test]
fn ended_is_queued_once_and_blocks_selects() {
    let mut state = XrFrameState::default();
    state.record_hits(vec![Transform::default()]);
    state.mark_ended();
    state.mark_ended();
    state.push_select(InputSourceId(0));
    assert!(state.is_ended());
    assert!(state.hits().is_empty());
    assert_eq!(state.take_events(), vec![SessionEvent::Ended]);
}

// =============================================================
// Poses and sources
// =============================================================

#[test]
fn pose_needs_sixteen_finite_values() {
    assert!(pose_from_matrix(&identity()[..15]).is_none());
    let mut bad = identity();
    bad[12] = f32::NAN;
    assert!(pose_from_matrix(&bad).is_none());
}

#[test]
fn pose_reads_translation_column() {
    let mut cols = identity();
    cols[12] = 0.5;
    cols[13] = -1.0;
    cols[14] = -2.0;
    let pose = pose_from_matrix(&cols).unwrap();
    assert_eq!(pose.translation.to_array(), [0.5, -1.0, -2.0]);
}

#[test]
fn registry_reuses_ids_by_identity() {
    let mut registry = SourceRegistry::default();
    let a = registry.id_for("left", |x, y| x == y);
    let b = registry.id_for("right", |x, y| x == y);
    assert_ne!(a, b);
    assert_eq!(registry.id_for("left", |x, y| x == y), a);
    assert_eq!(registry.get(b), Some(&"right"));
    assert_eq!(registry.get(a), Some(&"left"));
}
