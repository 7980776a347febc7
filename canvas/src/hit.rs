#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point, item_layout};
use crate::consts::{HANDLE_RADIUS_PX, MOVE_BAR_HEIGHT_PX};
use crate::doc::{BoardItem, DocStore, ItemId};

/// Which part of an item was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    /// Content area: selects and edits, never drags.
    Body,
    /// Drag strip along the top edge.
    MoveBar,
    ResizeHandle(ResizeAnchor),
}

/// Corner handle used for resizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAnchor {
    Ne,
    Se,
    Sw,
    Nw,
}

impl ResizeAnchor {
    /// Whether dragging this handle moves the item's left edge.
    #[must_use]
    pub fn moves_left(self) -> bool {
        matches!(self, Self::Nw | Self::Sw)
    }

    /// Whether dragging this handle moves the item's top edge.
    #[must_use]
    pub fn moves_top(self) -> bool {
        matches!(self, Self::Nw | Self::Ne)
    }

    /// CSS cursor shown while hovering or dragging the handle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Ne | Self::Sw => "nesw-resize",
            Self::Se | Self::Nw => "nwse-resize",
        }
    }
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub item_id: ItemId,
    pub part: HitPart,
}

/// Test which item (if any) is under `screen_pt`.
///
/// Later-inserted items sit on top, so they are tested first. Handles and
/// the move bar are sized in screen pixels so they stay grabbable at any zoom.
#[must_use]
pub fn hit_test(screen_pt: Point, doc: &DocStore, camera: &Camera) -> Option<Hit> {
    doc.items()
        .rev()
        .find_map(|item| hit_item(screen_pt, item, camera).map(|part| Hit { item_id: item.id, part }))
}

fn hit_item(pt: Point, item: &BoardItem, camera: &Camera) -> Option<HitPart> {
    let rect = item_layout(item, camera);
    let r = HANDLE_RADIUS_PX;
    let corners = [
        (ResizeAnchor::Nw, Point::new(rect.x, rect.y)),
        (ResizeAnchor::Ne, Point::new(rect.x + rect.width, rect.y)),
        (ResizeAnchor::Se, Point::new(rect.x + rect.width, rect.y + rect.height)),
        (ResizeAnchor::Sw, Point::new(rect.x, rect.y + rect.height)),
    ];
    for (anchor, corner) in corners {
        if (pt.x - corner.x).abs() <= r && (pt.y - corner.y).abs() <= r {
            return Some(HitPart::ResizeHandle(anchor));
        }
    }
    if !rect.contains(pt) {
        return None;
    }
    if pt.y - rect.y <= MOVE_BAR_HEIGHT_PX.min(rect.height) {
        return Some(HitPart::MoveBar);
    }
    Some(HitPart::Body)
}
