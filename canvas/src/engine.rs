//! Interaction controller and board model.
//!
//! `EngineCore` owns everything one open board needs on the UI thread: the
//! item store, the dirty tracker, the camera, and the active gesture. Every
//! handler runs synchronously and returns [`Action`]s for the host: remote
//! creates and deletes to issue, repaint requests, cursor changes.
//!
//! Geometry and content writes are not returned as actions. Committed
//! mutations mark the dirty tracker instead, and the host drains it with
//! [`EngineCore::take_due_writes`] when [`EngineCore::next_deadline`] passes.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::collections::HashSet;

use crate::camera::{self, Camera, Point, Viewport, ZoomDirection};
use crate::consts::{
    CASCADE_STEP, MAX_WHEEL_ZOOM_STEP, MIN_ITEM_HEIGHT, MIN_ITEM_WIDTH, UPLOAD_PLACEHOLDER, WHEEL_ZOOM_SENSITIVITY,
    ZOOM_BUTTON_STEP,
};
use crate::dirty::{DebounceWindows, DirtyTracker, GeometryTicket, Millis};
use crate::doc::{BoardId, BoardItem, DocStore, ItemId, ItemKind, PartialBoardItem, Size, SizeInput};
use crate::hit::{self, HitPart, ResizeAnchor};
use crate::input::{Button, InputState, Key, Modifiers, Touch, UiState, WheelDelta};
use crate::variant::{self, ItemEdit};

/// Actions returned from handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A new item exists locally and must be created remotely now.
    ItemCreated(BoardItem),
    /// An item changed locally; the dirty tracker has scheduled the write.
    ItemUpdated { id: ItemId, fields: PartialBoardItem },
    /// An item was removed locally and must be deleted remotely now.
    /// `asset_url` is the URL an upload-backed item referenced. The host
    /// releases it afterwards only if its asset store issued it.
    ItemDeleted { id: ItemId, asset_url: Option<String> },
    SelectionChanged(Option<ItemId>),
    SetCursor(String),
    RenderNeeded,
}

/// Snapshot of one geometry batch.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBatch {
    /// Revision stamps to ack once the batch is written.
    pub ticket: GeometryTicket,
    /// `(id, {position, size})` for each item in the batch.
    pub updates: Vec<(ItemId, PartialBoardItem)>,
}

/// Snapshot of one item's content write.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentWrite {
    pub id: ItemId,
    /// Revision to ack once the write succeeds.
    pub revision: u64,
    pub fields: PartialBoardItem,
}

/// Writes ready to go to the remote collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingWrites {
    pub geometry: Option<GeometryBatch>,
    pub content: Vec<ContentWrite>,
}

impl PendingWrites {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_none() && self.content.is_empty()
    }
}

/// Core engine state for one open board.
pub struct EngineCore {
    pub board_id: BoardId,
    pub doc: DocStore,
    pub dirty: DirtyTracker,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub viewport: Viewport,
    touches: Vec<Touch>,
    uploading: HashSet<ItemId>,
}

impl EngineCore {
    #[must_use]
    pub fn new(board_id: BoardId, windows: DebounceWindows) -> Self {
        Self {
            board_id,
            doc: DocStore::new(),
            dirty: DirtyTracker::new(windows),
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            viewport: Viewport::default(),
            touches: Vec::new(),
            uploading: HashSet::new(),
        }
    }

    // --- Store ---

    /// Hydrate the store from a remote snapshot. Pending marks are dropped.
    pub fn load(&mut self, items: Vec<BoardItem>) {
        self.doc.load(items);
        self.dirty.clear();
        self.uploading.clear();
        self.input = InputState::Idle;
        self.touches.clear();
        if let Some(id) = self.ui.selected_id {
            if self.doc.get(&id).is_none() {
                self.ui.selected_id = None;
            }
        }
    }

    /// Merge a local mutation into the store and mark it for write-back.
    ///
    /// The `type` field is ignored. Returns false (and marks nothing) when
    /// the item is gone.
    pub fn apply(&mut self, id: &ItemId, partial: &PartialBoardItem, now: Millis) -> bool {
        let partial = PartialBoardItem { kind: None, ..partial.clone() };
        if !self.doc.apply(id, &partial) {
            return false;
        }
        if partial.touches_geometry() {
            self.dirty.mark_geometry(*id, now);
        }
        if partial.touches_content() {
            self.dirty.mark_content(*id, now);
        }
        true
    }

    /// Remove an item and every pending mark for it.
    pub fn remove(&mut self, id: &ItemId) -> Option<BoardItem> {
        let removed = self.doc.remove(id)?;
        self.dirty.cancel(id);
        self.uploading.remove(id);
        if self.ui.selected_id.as_ref() == Some(id) {
            self.ui.selected_id = None;
        }
        if self.input.captured_item().as_ref() == Some(id) {
            self.input = InputState::Idle;
        }
        Some(removed)
    }

    /// Adopt an id assigned by the remote store.
    pub fn rekey(&mut self, old: &ItemId, new: ItemId) -> bool {
        if !self.doc.rekey(old, new) {
            return false;
        }
        self.dirty.rekey(old, new);
        if self.uploading.remove(old) {
            self.uploading.insert(new);
        }
        if self.ui.selected_id.as_ref() == Some(old) {
            self.ui.selected_id = Some(new);
        }
        true
    }

    // --- Item lifecycle ---

    /// Where the next new item of `size` goes: one cascade step past the
    /// most recent item, or centered in the viewport on an empty board.
    #[must_use]
    pub fn next_placement(&self, size: Size) -> Point {
        if let Some(last) = self.doc.last() {
            return Point::new(last.position.x + CASCADE_STEP, last.position.y + CASCADE_STEP);
        }
        let center = self.camera.screen_to_world(self.viewport.center());
        Point::new(center.x - size.width * 0.5, center.y - size.height * 0.5)
    }

    /// Create an item locally. The returned `ItemCreated` must be written
    /// remotely right away.
    pub fn add_item(&mut self, kind: ItemKind, content: impl Into<String>) -> (ItemId, Vec<Action>) {
        let position = self.next_placement(kind.default_size());
        let item = BoardItem::new(self.board_id, kind, position).with_content(content);
        let id = item.id;
        self.doc.insert(item.clone());
        let mut actions = vec![Action::ItemCreated(item)];
        actions.extend(self.select(Some(id)));
        actions.push(Action::RenderNeeded);
        (id, actions)
    }

    /// Insert a placeholder for an upload-backed item. Nothing is written
    /// remotely until [`EngineCore::complete_upload`].
    pub fn begin_upload(&mut self, kind: ItemKind) -> (ItemId, Vec<Action>) {
        let position = self.next_placement(kind.default_size());
        let item = BoardItem::new(self.board_id, kind, position).with_content(UPLOAD_PLACEHOLDER);
        let id = item.id;
        self.doc.insert(item);
        self.uploading.insert(id);
        let mut actions = self.select(Some(id));
        actions.push(Action::RenderNeeded);
        (id, actions)
    }

    /// Swap the final URL into a placeholder. Returns the item to create
    /// remotely, or `None` if the placeholder was deleted meanwhile.
    pub fn complete_upload(&mut self, id: &ItemId, url: &str) -> Option<BoardItem> {
        if !self.uploading.remove(id) {
            return None;
        }
        let patch = PartialBoardItem { content: Some(url.to_owned()), ..Default::default() };
        if !self.doc.apply(id, &patch) {
            return None;
        }
        // The create carries the item's current geometry.
        self.dirty.cancel(id);
        self.doc.get(id).cloned()
    }

    /// Drop a placeholder whose upload failed. No remote write is needed.
    pub fn fail_upload(&mut self, id: &ItemId) -> Vec<Action> {
        if !self.uploading.contains(id) {
            return Vec::new();
        }
        let was_selected = self.ui.selected_id.as_ref() == Some(id);
        self.remove(id);
        let mut actions = Vec::new();
        if was_selected {
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    #[must_use]
    pub fn is_uploading(&self, id: &ItemId) -> bool {
        self.uploading.contains(id)
    }

    /// Delete an item. A placeholder still uploading is dropped locally only.
    pub fn delete_item(&mut self, id: &ItemId) -> Vec<Action> {
        let was_selected = self.ui.selected_id.as_ref() == Some(id);
        let was_uploading = self.uploading.contains(id);
        let Some(item) = self.remove(id) else {
            return Vec::new();
        };
        let mut actions = Vec::new();
        if !was_uploading {
            let asset_url = (item.kind.is_upload_backed() && !item.content.trim().is_empty())
                .then(|| item.content.trim().to_owned());
            actions.push(Action::ItemDeleted { id: *id, asset_url });
        }
        if was_selected {
            actions.push(Action::SelectionChanged(None));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Apply a variant-specific edit. Unsupported edits change nothing.
    pub fn edit_item(&mut self, id: &ItemId, edit: &ItemEdit, now: Millis) -> Vec<Action> {
        let Some(item) = self.doc.get(id) else {
            return Vec::new();
        };
        let Some(fields) = variant::edit(item, edit) else {
            return Vec::new();
        };
        if !self.apply(id, &fields, now) {
            return Vec::new();
        }
        vec![Action::ItemUpdated { id: *id, fields }, Action::RenderNeeded]
    }

    // --- Write-back ---

    /// Earliest time a debounced write becomes due.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Millis> {
        self.dirty.next_deadline()
    }

    /// Snapshot every write whose debounce window has elapsed.
    pub fn take_due_writes(&mut self, now: Millis) -> PendingWrites {
        let geometry = self.dirty.take_due_geometry(now).and_then(|t| self.geometry_batch(t));
        let content = self.dirty.take_due_content(now);
        PendingWrites { geometry, content: self.content_writes(content) }
    }

    /// Snapshot every pending write regardless of deadlines (teardown).
    pub fn take_all_writes(&mut self) -> PendingWrites {
        let ticket = self.dirty.take_all_geometry();
        let geometry = self.geometry_batch(ticket);
        let content = self.dirty.take_all_content();
        PendingWrites { geometry, content: self.content_writes(content) }
    }

    fn geometry_batch(&self, ticket: GeometryTicket) -> Option<GeometryBatch> {
        let mut kept = Vec::with_capacity(ticket.len());
        let mut updates = Vec::with_capacity(ticket.len());
        for (id, rev) in ticket {
            if self.uploading.contains(&id) {
                continue;
            }
            let Some(item) = self.doc.get(&id) else {
                continue;
            };
            updates.push((id, PartialBoardItem::geometry(item.position, item.size)));
            kept.push((id, rev));
        }
        (!updates.is_empty()).then_some(GeometryBatch { ticket: kept, updates })
    }

    fn content_writes(&self, due: Vec<(ItemId, u64)>) -> Vec<ContentWrite> {
        due.into_iter()
            .filter(|(id, _)| !self.uploading.contains(id))
            .filter_map(|(id, revision)| {
                let item = self.doc.get(&id)?;
                let fields = PartialBoardItem {
                    content: Some(item.content.clone()),
                    items: item.items.clone(),
                    notes: item.notes.clone(),
                    ..Default::default()
                };
                Some(ContentWrite { id, revision, fields })
            })
            .collect()
    }

    /// Acknowledge a successfully written geometry batch.
    pub fn ack_geometry(&mut self, ticket: &[(ItemId, u64)]) {
        self.dirty.ack_geometry(ticket);
    }

    /// Acknowledge a successfully written content update.
    pub fn ack_content(&mut self, id: &ItemId, revision: u64) {
        self.dirty.ack_content(id, revision);
    }

    // --- Selection ---

    fn select(&mut self, id: Option<ItemId>) -> Vec<Action> {
        if self.ui.selected_id == id {
            return Vec::new();
        }
        self.ui.selected_id = id;
        vec![Action::SelectionChanged(id)]
    }

    /// The currently selected item, if any.
    #[must_use]
    pub fn selection(&self) -> Option<ItemId> {
        self.ui.selected_id
    }

    // --- Viewport / camera ---

    /// Update viewport dimensions in CSS pixels.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = Viewport::new(width.max(0.0), height.max(0.0));
    }

    /// Toolbar zoom in, anchored at the viewport center.
    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.zoom_step(ZOOM_BUTTON_STEP, ZoomDirection::In)
    }

    /// Toolbar zoom out, anchored at the viewport center.
    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.zoom_step(ZOOM_BUTTON_STEP, ZoomDirection::Out)
    }

    fn zoom_step(&mut self, delta: f64, direction: ZoomDirection) -> Vec<Action> {
        let next = camera::apply_zoom(self.camera.zoom, delta, direction);
        self.camera.zoom_about(self.viewport.center(), next);
        vec![Action::RenderNeeded]
    }

    /// Scale 1 with the world origin centered.
    pub fn reset_view(&mut self) -> Vec<Action> {
        self.camera = Camera::centered(self.viewport);
        vec![Action::RenderNeeded]
    }

    /// Frame every item in the viewport.
    pub fn fit_to_content(&mut self) -> Vec<Action> {
        self.camera = camera::fit_to_content(self.doc.items(), self.viewport);
        vec![Action::RenderNeeded]
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        match button {
            Button::Secondary => Vec::new(),
            Button::Middle => self.start_pan(screen_pt),
            Button::Primary => match hit::hit_test(screen_pt, &self.doc, &self.camera) {
                None => self.start_pan(screen_pt),
                Some(hit) => self.start_item_gesture(hit.item_id, hit.part, screen_pt),
            },
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        match self.input {
            InputState::Idle => self.hover_cursor(screen_pt),
            InputState::Panning { last_screen } => {
                self.camera.pan_by(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                self.input = InputState::Panning { last_screen: screen_pt };
                vec![Action::RenderNeeded]
            }
            InputState::DraggingItem { .. } | InputState::ResizingItem { .. } => {
                match self.gesture_geometry(screen_pt) {
                    Some((id, partial)) => {
                        // Live preview only; the write is scheduled on release.
                        self.doc.apply(&id, &partial);
                        vec![Action::RenderNeeded]
                    }
                    None => Vec::new(),
                }
            }
            InputState::PressingItem { .. } | InputState::Pinching { .. } => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers, now: Millis) -> Vec<Action> {
        let actions = self.finish_gesture(screen_pt, now);
        self.input = InputState::Idle;
        actions
    }

    pub fn on_wheel(&mut self, _screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        if delta.dy == 0.0 || !delta.dy.is_finite() {
            return Vec::new();
        }
        let step = (delta.dy.abs() * WHEEL_ZOOM_SENSITIVITY).min(MAX_WHEEL_ZOOM_STEP);
        let direction = if delta.dy < 0.0 { ZoomDirection::In } else { ZoomDirection::Out };
        let mut actions = Vec::new();
        if self.input.captured_item().is_none() {
            actions.extend(self.select(None));
        }
        actions.extend(self.zoom_step(step, direction));
        actions
    }

    pub fn on_key_down(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "Escape" => {
                let mut actions = self.select(None);
                if !actions.is_empty() {
                    actions.push(Action::RenderNeeded);
                }
                actions
            }
            "Delete" | "Backspace" => match self.ui.selected_id {
                Some(id) if matches!(self.input, InputState::Idle) => self.delete_item(&id),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    // --- Touch input ---

    pub fn on_touch_start(&mut self, touches: &[Touch]) -> Vec<Action> {
        self.touches = touches.to_vec();
        match touches {
            [one] => self.on_pointer_down(one.point, Button::Primary, Modifiers::default()),
            [a, b, ..] if self.input.captured_item().is_none() => {
                let mut actions = self.select(None);
                self.input = InputState::Pinching {
                    start_distance: a.point.distance(b.point).max(1.0),
                    start_mid: a.point.midpoint(b.point),
                    start_camera: self.camera,
                };
                actions.push(Action::RenderNeeded);
                actions
            }
            _ => Vec::new(),
        }
    }

    pub fn on_touch_move(&mut self, touches: &[Touch]) -> Vec<Action> {
        self.touches = touches.to_vec();
        match (self.input.clone(), touches) {
            (InputState::Pinching { start_distance, start_mid, start_camera }, [a, b, ..]) => {
                let ratio = a.point.distance(b.point) / start_distance;
                let mid = a.point.midpoint(b.point);
                let mut cam = start_camera;
                cam.zoom_about(self.viewport.center(), start_camera.zoom * ratio);
                cam.pan_by(mid.x - start_mid.x, mid.y - start_mid.y);
                self.camera = cam;
                vec![Action::RenderNeeded]
            }
            (InputState::Pinching { .. }, _) => Vec::new(),
            (_, [one, ..]) => self.on_pointer_move(one.point, Modifiers::default()),
            _ => Vec::new(),
        }
    }

    /// `remaining` holds the contacts still down after this event.
    pub fn on_touch_end(&mut self, remaining: &[Touch], lifted: Point, now: Millis) -> Vec<Action> {
        let previous = std::mem::replace(&mut self.touches, remaining.to_vec());
        if matches!(self.input, InputState::Pinching { .. }) {
            self.input = match remaining {
                [one] => InputState::Panning { last_screen: one.point },
                _ => InputState::Idle,
            };
            return Vec::new();
        }
        if remaining.is_empty() || previous.len() <= 1 {
            return self.on_pointer_up(lifted, Button::Primary, Modifiers::default(), now);
        }
        Vec::new()
    }

    // --- Gesture helpers ---

    fn start_pan(&mut self, screen_pt: Point) -> Vec<Action> {
        let mut actions = self.select(None);
        self.input = InputState::Panning { last_screen: screen_pt };
        actions.push(Action::SetCursor("grabbing".into()));
        actions
    }

    fn start_item_gesture(&mut self, id: ItemId, part: HitPart, screen_pt: Point) -> Vec<Action> {
        let Some(item) = self.doc.get(&id) else {
            return Vec::new();
        };
        let start_world = self.camera.screen_to_world(screen_pt);
        let (input, cursor) = match part {
            HitPart::Body => (InputState::PressingItem { id }, "default"),
            HitPart::MoveBar => (InputState::DraggingItem { id, start_world, orig: item.position }, "grabbing"),
            HitPart::ResizeHandle(anchor) => (
                InputState::ResizingItem { id, anchor, start_world, orig: item.position, orig_size: item.size },
                anchor.cursor(),
            ),
        };
        self.input = input;
        let mut actions = self.select(Some(id));
        actions.push(Action::SetCursor(cursor.into()));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Geometry the active drag/resize implies at `screen_pt`.
    fn gesture_geometry(&self, screen_pt: Point) -> Option<(ItemId, PartialBoardItem)> {
        let world = self.camera.screen_to_world(screen_pt);
        match self.input {
            InputState::DraggingItem { id, start_world, orig } => {
                let size = self.doc.get(&id)?.size;
                let position = Point::new(orig.x + world.x - start_world.x, orig.y + world.y - start_world.y);
                Some((id, PartialBoardItem::geometry(position, size)))
            }
            InputState::ResizingItem { id, anchor, start_world, orig, orig_size } => {
                let (position, size) = resize_rect(anchor, orig, orig_size, world.x - start_world.x, world.y - start_world.y);
                Some((id, PartialBoardItem::geometry(position, size)))
            }
            _ => None,
        }
    }

    fn finish_gesture(&mut self, screen_pt: Point, now: Millis) -> Vec<Action> {
        match self.input {
            InputState::Panning { .. } => vec![Action::SetCursor("default".into())],
            InputState::DraggingItem { .. } | InputState::ResizingItem { .. } => {
                let Some((id, fields)) = self.gesture_geometry(screen_pt) else {
                    return Vec::new();
                };
                let unchanged = self.gesture_origin() == Some((fields.position, fields.size.clone()));
                let mut actions = vec![Action::SetCursor("default".into())];
                if unchanged || !self.apply(&id, &fields, now) {
                    return actions;
                }
                actions.push(Action::ItemUpdated { id, fields });
                actions.push(Action::RenderNeeded);
                actions
            }
            _ => Vec::new(),
        }
    }

    /// Geometry the active drag/resize started from, in the same shape as
    /// [`PartialBoardItem::geometry`].
    fn gesture_origin(&self) -> Option<(Option<Point>, Option<SizeInput>)> {
        match self.input {
            InputState::DraggingItem { id, orig, .. } => {
                let size = self.doc.get(&id)?.size;
                Some((Some(orig), Some(size.into())))
            }
            InputState::ResizingItem { orig, orig_size, .. } => Some((Some(orig), Some(orig_size.into()))),
            _ => None,
        }
    }

    fn hover_cursor(&self, screen_pt: Point) -> Vec<Action> {
        let cursor = match hit::hit_test(screen_pt, &self.doc, &self.camera) {
            Some(hit) => match hit.part {
                HitPart::MoveBar => "grab",
                HitPart::ResizeHandle(anchor) => anchor.cursor(),
                HitPart::Body => "default",
            },
            None => "default",
        };
        vec![Action::SetCursor(cursor.into())]
    }

    // --- Queries ---

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Look up an item by id.
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&BoardItem> {
        self.doc.get(id)
    }
}

/// Rectangle after dragging `anchor` by `(dx, dy)` world units, with the
/// opposite corner fixed and the minimum item size enforced.
#[must_use]
pub fn resize_rect(anchor: ResizeAnchor, orig: Point, orig_size: Size, dx: f64, dy: f64) -> (Point, Size) {
    let (x, width) = resize_axis(orig.x, orig_size.width, dx, anchor.moves_left(), MIN_ITEM_WIDTH);
    let (y, height) = resize_axis(orig.y, orig_size.height, dy, anchor.moves_top(), MIN_ITEM_HEIGHT);
    (Point::new(x, y), Size::new(width, height))
}

fn resize_axis(start: f64, extent: f64, delta: f64, moves_start: bool, min: f64) -> (f64, f64) {
    if moves_start {
        let end = start + extent;
        let extent = (extent - delta).max(min);
        (end - extent, extent)
    } else {
        (start, (extent + delta).max(min))
    }
}
