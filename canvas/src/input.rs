//! Input model: modifier keys, buttons, touches, and the gesture state machine.
//!
//! `InputState` is the active gesture being tracked between pointer-down and
//! pointer-up (or touch-start and touch-end), carrying the context needed to
//! compute incremental deltas and emit the final item mutation on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::{Camera, Point};
use crate::doc::{ItemId, Size};
use crate::hit::ResizeAnchor;

/// Modifier keys reported with a pointer, wheel, or key event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Alt on most keyboards, Option on macOS.
    pub alt: bool,
    /// Command on macOS, Windows key elsewhere.
    pub meta: bool,
}

/// Which pointer button went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger touch).
    Primary,
    /// Wheel click. Always pans.
    Middle,
    /// Right mouse button.
    Secondary,
}

/// A keyboard key as reported by the host (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Scroll delta from a wheel or trackpad.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Pixels; negative zooms in.
    pub dy: f64,
}

/// One active touch contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Touch {
    /// Host-assigned identifier, stable for the life of the contact.
    pub id: i32,
    /// Screen-space position.
    pub point: Point,
}

/// Board-level UI state the host reads when drawing.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// The id of the currently selected item, if any.
    pub selected_id: Option<ItemId>,
}

/// Gesture in progress between pointer-down and pointer-up.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging empty canvas.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// Pressed on an item body; released without further effect.
    PressingItem {
        id: ItemId,
    },
    /// Moving an item by its move bar.
    DraggingItem {
        id: ItemId,
        /// World-space pointer position at the start of the drag.
        start_world: Point,
        /// Item position at the start of the drag.
        orig: Point,
    },
    /// Resizing an item by one of its corner handles.
    ResizingItem {
        id: ItemId,
        anchor: ResizeAnchor,
        /// World-space pointer position at the start of the resize.
        start_world: Point,
        /// Item position at the start of the resize.
        orig: Point,
        /// Item size at the start of the resize.
        orig_size: Size,
    },
    /// Two-finger pinch: zoom from finger spread, pan from midpoint travel.
    Pinching {
        /// Finger distance when the pinch began.
        start_distance: f64,
        /// Finger midpoint when the pinch began.
        start_mid: Point,
        /// Camera when the pinch began.
        start_camera: Camera,
    },
}

impl InputState {
    /// The item captured by the current gesture, if any.
    #[must_use]
    pub fn captured_item(&self) -> Option<ItemId> {
        match self {
            Self::PressingItem { id } | Self::DraggingItem { id, .. } | Self::ResizingItem { id, .. } => Some(*id),
            Self::Idle | Self::Panning { .. } | Self::Pinching { .. } => None,
        }
    }
}
