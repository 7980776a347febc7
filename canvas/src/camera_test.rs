#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::doc::{BoardItem, ItemKind, Size};

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn item_at(x: f64, y: f64, w: f64, h: f64) -> BoardItem {
    let mut item = BoardItem::new(Uuid::new_v4(), ItemKind::Note, Point::new(x, y));
    item.size = Size::new(w, h);
    item
}

// --- Point ---

#[test]
fn point_distance_and_midpoint() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(6.0, 8.0);
    assert!(approx_eq(a.distance(b), 10.0));
    assert_eq!(a.midpoint(b), Point::new(3.0, 4.0));
}

// --- screen_to_world / world_to_screen ---

#[test]
fn default_camera_is_identity() {
    let cam = Camera::default();
    let p = Point::new(50.0, 75.0);
    assert!(point_approx_eq(cam.screen_to_world(p), p));
    assert!(point_approx_eq(cam.world_to_screen(p), p));
}

#[test]
fn screen_to_world_subtracts_offset_then_divides() {
    let cam = Camera { pan_x: 20.0, pan_y: 10.0, zoom: 2.0 };
    let world = cam.screen_to_world(Point::new(60.0, 50.0));
    assert!(point_approx_eq(world, Point::new(20.0, 20.0)));
}

#[test]
fn world_to_screen_scales_then_adds_offset() {
    let cam = Camera { pan_x: 20.0, pan_y: 10.0, zoom: 3.0 };
    let screen = cam.world_to_screen(Point::new(5.0, 5.0));
    assert!(point_approx_eq(screen, Point::new(35.0, 25.0)));
}

#[test]
fn round_trip_holds_across_transforms() {
    let cameras = [
        Camera::default(),
        Camera { pan_x: 50.0, pan_y: -30.0, zoom: 2.0 },
        Camera { pan_x: 13.7, pan_y: -42.3, zoom: 0.75 },
        Camera { pan_x: -800.0, pan_y: 1200.0, zoom: 0.1 },
    ];
    let points = [Point::new(0.0, 0.0), Point::new(400.0, 300.0), Point::new(-17.25, 9999.5)];
    for cam in cameras {
        for p in points {
            let back = cam.world_to_screen(cam.screen_to_world(p));
            assert!(point_approx_eq(p, back), "{cam:?} {p:?}");
        }
    }
}

#[test]
fn screen_dist_to_world_ignores_pan() {
    let cam = Camera { pan_x: 999.0, pan_y: -999.0, zoom: 4.0 };
    assert!(approx_eq(cam.screen_dist_to_world(8.0), 2.0));
}

// --- apply_zoom ---

#[test]
fn apply_zoom_in_and_out_are_inverse() {
    let up = apply_zoom(1.0, 0.25, ZoomDirection::In);
    assert!(approx_eq(up, 1.25));
    assert!(approx_eq(apply_zoom(up, 0.25, ZoomDirection::Out), 1.0));
}

#[test]
fn apply_zoom_ignores_delta_sign() {
    assert_eq!(apply_zoom(1.0, -0.2, ZoomDirection::In), apply_zoom(1.0, 0.2, ZoomDirection::In));
}

#[test]
fn repeated_zoom_never_leaves_range() {
    let mut scale = 1.0;
    for _ in 0..200 {
        scale = apply_zoom(scale, 0.3, ZoomDirection::In);
        assert!((MIN_ZOOM..=MAX_ZOOM).contains(&scale));
    }
    assert_eq!(scale, MAX_ZOOM);
    for _ in 0..200 {
        scale = apply_zoom(scale, 0.3, ZoomDirection::Out);
        assert!((MIN_ZOOM..=MAX_ZOOM).contains(&scale));
    }
    assert_eq!(scale, MIN_ZOOM);
}

#[test]
fn clamp_zoom_handles_non_finite() {
    assert_eq!(clamp_zoom(f64::NAN), 1.0);
    assert_eq!(clamp_zoom(f64::INFINITY), 1.0);
    assert_eq!(clamp_zoom(50.0), MAX_ZOOM);
}

// --- zoom_about / pan_by ---

#[test]
fn zoom_about_keeps_anchor_fixed() {
    let mut cam = Camera { pan_x: 40.0, pan_y: -10.0, zoom: 1.0 };
    let anchor = Point::new(400.0, 300.0);
    let before = cam.screen_to_world(anchor);
    cam.zoom_about(anchor, 1.5);
    assert!(approx_eq(cam.zoom, 1.5));
    assert!(point_approx_eq(cam.screen_to_world(anchor), before));
}

#[test]
fn zoom_about_clamps() {
    let mut cam = Camera::default();
    cam.zoom_about(Point::new(0.0, 0.0), 9.0);
    assert_eq!(cam.zoom, MAX_ZOOM);
}

#[test]
fn pan_by_shifts_offset() {
    let mut cam = Camera::default();
    cam.pan_by(12.0, -4.0);
    assert_eq!((cam.pan_x, cam.pan_y), (12.0, -4.0));
}

// --- item_layout ---

#[test]
fn item_layout_maps_position_and_size() {
    let cam = Camera { pan_x: 10.0, pan_y: 20.0, zoom: 0.5 };
    let item = item_at(100.0, 200.0, 300.0, 160.0);
    let rect = item_layout(&item, &cam);
    assert_eq!(rect, ScreenRect { x: 60.0, y: 120.0, width: 150.0, height: 80.0 });
    assert!(rect.contains(Point::new(60.0, 120.0)));
    assert!(!rect.contains(Point::new(59.0, 120.0)));
}

// --- fit_to_content ---

#[test]
fn fit_empty_board_is_centered_at_scale_one() {
    let cam = fit_to_content(std::iter::empty(), Viewport::new(800.0, 600.0));
    assert_eq!(cam, Camera { pan_x: 400.0, pan_y: 300.0, zoom: 1.0 });
}

#[test]
fn fit_small_content_does_not_upscale() {
    let items = [item_at(0.0, 0.0, 200.0, 100.0)];
    let cam = fit_to_content(&items, Viewport::new(1600.0, 1200.0));
    assert_eq!(cam.zoom, 1.0);
    // Content center (100, 50) lands on the viewport center.
    assert!(point_approx_eq(cam.world_to_screen(Point::new(100.0, 50.0)), Point::new(800.0, 600.0)));
}

#[test]
fn fit_large_content_scales_down_with_padding() {
    let items = [item_at(0.0, 0.0, 900.0, 300.0), item_at(1000.0, 500.0, 300.0, 200.0)];
    let viewport = Viewport::new(700.0, 800.0);
    let cam = fit_to_content(&items, viewport);
    // Box is 1300 x 700, padded to 1400 x 800; width is the binding axis.
    assert!(approx_eq(cam.zoom, 0.5));
    assert!(point_approx_eq(cam.world_to_screen(Point::new(650.0, 350.0)), viewport.center()));
    for item in &items {
        let rect = item_layout(item, &cam);
        assert!(rect.x >= 0.0 && rect.x + rect.width <= viewport.width);
        assert!(rect.y >= 0.0 && rect.y + rect.height <= viewport.height);
    }
}

#[test]
fn fit_respects_min_zoom() {
    let items = [item_at(0.0, 0.0, 100_000.0, 100_000.0)];
    let cam = fit_to_content(&items, Viewport::new(800.0, 600.0));
    assert_eq!(cam.zoom, MIN_ZOOM);
}

#[test]
fn fit_zero_viewport_keeps_scale_one() {
    let items = [item_at(0.0, 0.0, 5000.0, 5000.0)];
    let cam = fit_to_content(&items, Viewport::default());
    assert_eq!(cam.zoom, 1.0);
}
