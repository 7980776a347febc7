#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;

// =============================================================
// Modifiers / Button / Key
// =============================================================

#[test]
fn modifiers_default_all_false() {
    let m = Modifiers::default();
    assert!(!m.shift && !m.ctrl && !m.alt && !m.meta);
}

#[test]
fn button_variants_distinct() {
    assert_ne!(Button::Primary, Button::Secondary);
    assert_ne!(Button::Middle, Button::Secondary);
}

#[test]
fn key_stores_string() {
    assert_eq!(Key("Escape".into()).0, "Escape");
}

// =============================================================
// Touch / UiState
// =============================================================

#[test]
fn touch_carries_point() {
    let t = Touch { id: 3, point: Point::new(1.0, 2.0) };
    assert_eq!(t.point.x, 1.0);
    assert_eq!(t.id, 3);
}

#[test]
fn ui_state_default_no_selection() {
    assert!(UiState::default().selected_id.is_none());
}

// =============================================================
// InputState
// =============================================================

#[test]
fn input_state_default_is_idle() {
    assert!(matches!(InputState::default(), InputState::Idle));
}

#[test]
fn captured_item_for_item_gestures() {
    let id = Uuid::new_v4();
    let drag = InputState::DraggingItem { id, start_world: Point::default(), orig: Point::default() };
    let resize = InputState::ResizingItem {
        id,
        anchor: ResizeAnchor::Se,
        start_world: Point::default(),
        orig: Point::default(),
        orig_size: Size::new(200.0, 100.0),
    };
    assert_eq!(drag.captured_item(), Some(id));
    assert_eq!(resize.captured_item(), Some(id));
    assert_eq!(InputState::PressingItem { id }.captured_item(), Some(id));
}

#[test]
fn captured_item_none_for_canvas_gestures() {
    let pan = InputState::Panning { last_screen: Point::default() };
    let pinch = InputState::Pinching { start_distance: 10.0, start_mid: Point::default(), start_camera: Camera::default() };
    assert!(pan.captured_item().is_none());
    assert!(pinch.captured_item().is_none());
    assert!(InputState::Idle.captured_item().is_none());
}
