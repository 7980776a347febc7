//! Geometry transform: pan/zoom camera and screen/world conversions.
//!
//! Everything here is pure math over explicit state. The interaction
//! controller owns a [`Camera`] and calls into these functions on every
//! pointer, wheel, and touch event.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{FIT_PADDING, MAX_ZOOM, MIN_ZOOM};
use crate::doc::BoardItem;

/// 2D point. Whether it is in screen pixels or world units depends on where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Screen-space center of the viewport.
    #[must_use]
    pub fn center(self) -> Point {
        Point::new(self.width * 0.5, self.height * 0.5)
    }
}

/// Which way a zoom step goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Pan and zoom of the board view.
///
/// `screen = world * zoom + pan`, with pan in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Inverse of [`Camera::world_to_screen`].
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Where a world point lands on screen.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Length of `screen_dist` pixels in world units.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Set the zoom to `new_zoom` (clamped) while keeping the world point
    /// under `anchor` fixed on screen.
    pub fn zoom_about(&mut self, anchor: Point, new_zoom: f64) {
        let new_zoom = clamp_zoom(new_zoom);
        let world = self.screen_to_world(anchor);
        self.zoom = new_zoom;
        self.pan_x = anchor.x - world.x * new_zoom;
        self.pan_y = anchor.y - world.y * new_zoom;
    }

    /// Shift the camera by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// A camera at scale 1 with the world origin at the viewport center.
    #[must_use]
    pub fn centered(viewport: Viewport) -> Self {
        let center = viewport.center();
        Self { pan_x: center.x, pan_y: center.y, zoom: 1.0 }
    }
}

/// Clamp a scale factor to the supported zoom range.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() { zoom.clamp(MIN_ZOOM, MAX_ZOOM) } else { 1.0 }
}

/// Step `current` by the relative amount `delta` in `direction`.
///
/// Zooming in multiplies by `1 + delta`, zooming out divides by it, so an
/// in-step followed by an out-step of the same size returns to the start
/// (unless the clamp intervened).
#[must_use]
pub fn apply_zoom(current: f64, delta: f64, direction: ZoomDirection) -> f64 {
    let factor = 1.0 + delta.abs();
    let next = match direction {
        ZoomDirection::In => current * factor,
        ZoomDirection::Out => current / factor,
    };
    clamp_zoom(next)
}

/// Axis-aligned rectangle in screen space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    #[must_use]
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.x && pt.x <= self.x + self.width && pt.y >= self.y && pt.y <= self.y + self.height
    }
}

/// Where an item lands on screen under `camera`.
#[must_use]
pub fn item_layout(item: &BoardItem, camera: &Camera) -> ScreenRect {
    let origin = camera.world_to_screen(Point::new(item.position.x, item.position.y));
    ScreenRect {
        x: origin.x,
        y: origin.y,
        width: item.size.width * camera.zoom,
        height: item.size.height * camera.zoom,
    }
}

/// Compute a camera that centers and fits every item inside `viewport`.
///
/// The content box is padded by [`FIT_PADDING`] on each side. The scale never
/// exceeds 1.0. With no items the camera is centered on the world origin.
#[must_use]
pub fn fit_to_content<'a, I>(items: I, viewport: Viewport) -> Camera
where
    I: IntoIterator<Item = &'a BoardItem>,
{
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for item in items {
        min_x = min_x.min(item.position.x);
        min_y = min_y.min(item.position.y);
        max_x = max_x.max(item.position.x + item.size.width);
        max_y = max_y.max(item.position.y + item.size.height);
    }
    if !min_x.is_finite() || !max_x.is_finite() {
        return Camera::centered(viewport);
    }

    let box_w = (max_x - min_x) + FIT_PADDING * 2.0;
    let box_h = (max_y - min_y) + FIT_PADDING * 2.0;
    let mut zoom = 1.0_f64;
    if viewport.width > 0.0 && viewport.height > 0.0 {
        zoom = (viewport.width / box_w).min(viewport.height / box_h).min(1.0);
    }
    let zoom = clamp_zoom(zoom);

    let content_center = Point::new((min_x + max_x) * 0.5, (min_y + max_y) * 0.5);
    let screen_center = viewport.center();
    Camera {
        pan_x: screen_center.x - content_center.x * zoom,
        pan_y: screen_center.y - content_center.y * zoom,
        zoom,
    }
}
