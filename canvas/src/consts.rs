//! Shared numeric constants for the canvas crate.

// ── Zoom ────────────────────────────────────────────────────────

/// Smallest allowed camera scale.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed camera scale.
pub const MAX_ZOOM: f64 = 2.0;

/// Relative step used by the toolbar zoom buttons.
pub const ZOOM_BUTTON_STEP: f64 = 0.1;

/// Wheel delta (pixels) to relative zoom step.
pub const WHEEL_ZOOM_SENSITIVITY: f64 = 0.001;

/// Upper bound on the relative zoom step from a single wheel event.
pub const MAX_WHEEL_ZOOM_STEP: f64 = 0.5;

/// World-space padding around the content box when fitting to content.
pub const FIT_PADDING: f64 = 50.0;

// ── Items ───────────────────────────────────────────────────────

/// Minimum item width in world units.
pub const MIN_ITEM_WIDTH: f64 = 150.0;

/// Minimum item height in world units.
pub const MIN_ITEM_HEIGHT: f64 = 80.0;

/// Offset applied to each new item relative to the previously added one.
pub const CASCADE_STEP: f64 = 30.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for resize handles.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

/// Height of the move bar along the top edge of an item, in screen pixels.
pub const MOVE_BAR_HEIGHT_PX: f64 = 28.0;

// ── Sync ────────────────────────────────────────────────────────

/// Debounce window for the board-wide geometry channel.
pub const GEOMETRY_DEBOUNCE_MS: u64 = 2000;

/// Debounce window for each item's content channel.
pub const CONTENT_DEBOUNCE_MS: u64 = 500;

/// Content value carried by upload-backed items while the upload is in flight.
pub const UPLOAD_PLACEHOLDER: &str = "placeholder://uploading";
