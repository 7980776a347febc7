//! Document model: board items, their wire shape, and the in-memory store.
//!
//! This module defines what sits on a board (`BoardItem`, `ItemKind`), a
//! sparse-update type for incremental edits (`PartialBoardItem`), the size
//! normalization rules that accept both numeric and unit-suffixed
//! dimensions, and the runtime store that owns all live items (`DocStore`).
//!
//! Data flows into this layer from the remote collaborator (JSON
//! deserialization) and from the interaction controller (mutations). The
//! renderer reads from `DocStore` via `items`, which yields insertion order.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{MIN_ITEM_HEIGHT, MIN_ITEM_WIDTH};

/// Unique identifier for a board item.
pub type ItemId = Uuid;

/// Identifier of the board (project) that owns an item.
pub type BoardId = Uuid;

/// The variant tag of a board item. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// Rich-text sticky note.
    Note,
    /// Uploaded image.
    Image,
    /// Ordered list of checkable entries.
    Checklist,
    /// Row of color swatches.
    Palette,
    /// Video by URL.
    Video,
    /// Embedded audio player (e.g. a streaming track link).
    AudioEmbed,
    /// Map pin for an address or coordinate.
    LocationPin,
    /// Uploaded document preview.
    Document,
    /// Storyboard frame: an image paired with notes.
    StoryboardPanel,
}

impl ItemKind {
    /// Every variant, in toolbar order.
    pub const ALL: [ItemKind; 9] = [
        ItemKind::Note,
        ItemKind::Image,
        ItemKind::Checklist,
        ItemKind::Palette,
        ItemKind::Video,
        ItemKind::AudioEmbed,
        ItemKind::LocationPin,
        ItemKind::Document,
        ItemKind::StoryboardPanel,
    ];

    /// Wire name of the tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Image => "image",
            Self::Checklist => "checklist",
            Self::Palette => "palette",
            Self::Video => "video",
            Self::AudioEmbed => "audioEmbed",
            Self::LocationPin => "locationPin",
            Self::Document => "document",
            Self::StoryboardPanel => "storyboardPanel",
        }
    }

    /// Size given to a freshly created item of this kind.
    #[must_use]
    pub fn default_size(self) -> Size {
        let (width, height) = match self {
            Self::Note => (300.0, 200.0),
            Self::Image => (300.0, 300.0),
            Self::Checklist => (280.0, 240.0),
            Self::Palette => (320.0, 120.0),
            Self::Video => (480.0, 270.0),
            Self::AudioEmbed => (400.0, 152.0),
            Self::LocationPin => (300.0, 250.0),
            Self::Document => (300.0, 400.0),
            Self::StoryboardPanel => (320.0, 360.0),
        };
        Size { width, height }
    }

    /// Whether items of this kind reference an uploaded asset they own.
    #[must_use]
    pub fn is_upload_backed(self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Document | Self::StoryboardPanel)
    }
}

/// Item size in world units, always at least the minimum item size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Raise each axis to the minimum item size.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self { width: self.width.max(MIN_ITEM_WIDTH), height: self.height.max(MIN_ITEM_HEIGHT) }
    }
}

/// One size axis as it may arrive on the wire: a number or a unit-suffixed string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dimension {
    /// Logical units.
    Units(f64),
    /// `"120px"`, `"120"`, or `"50%"`.
    Text(String),
}

impl Dimension {
    /// Resolve to logical units. Percentages scale `default`; anything
    /// unparseable, non-finite, or non-positive yields `default`.
    #[must_use]
    pub fn resolve(&self, default: f64) -> f64 {
        let value = match self {
            Self::Units(v) => Ok(*v),
            Self::Text(raw) => {
                let raw = raw.trim();
                if let Some(pct) = raw.strip_suffix('%') {
                    pct.trim().parse::<f64>().map(|p| default * p / 100.0)
                } else {
                    raw.strip_suffix("px").unwrap_or(raw).trim().parse::<f64>()
                }
            }
        };
        match value {
            Ok(v) if v.is_finite() && v > 0.0 => v,
            _ => default,
        }
    }
}

impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Self::Units(value)
    }
}

/// Size as accepted from the wire, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeInput {
    pub width: Dimension,
    pub height: Dimension,
}

impl SizeInput {
    /// Normalize against `kind`'s defaults and clamp to the minimum size.
    #[must_use]
    pub fn normalize(&self, kind: ItemKind) -> Size {
        let default = kind.default_size();
        Size { width: self.width.resolve(default.width), height: self.height.resolve(default.height) }.clamped()
    }
}

impl From<Size> for SizeInput {
    fn from(size: Size) -> Self {
        Self { width: Dimension::Units(size.width), height: Dimension::Units(size.height) }
    }
}

/// A single checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

impl ChecklistEntry {
    /// New unchecked entry with a fresh id.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4().to_string(), text: text.into(), checked: false }
    }
}

/// A board item as stored in the document and on the wire.
///
/// Deserialization goes through [`WireItem`] so sizes are normalized and
/// positions sanitized before an item ever reaches the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireItem")]
pub struct BoardItem {
    /// Unique identifier, generated client-side.
    pub id: ItemId,
    /// Owning board.
    pub board_id: BoardId,
    /// Variant tag; immutable after creation.
    #[serde(rename = "type")]
    pub kind: ItemKind,
    /// Variant-specific payload (markup, URL, JSON colors, JSON location).
    pub content: String,
    /// Checklist entries; only present for checklists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ChecklistEntry>>,
    /// Free-text annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Top-left corner in world coordinates.
    pub position: Point,
    /// Extent in world units.
    pub size: Size,
}

impl BoardItem {
    /// New item with a fresh id, the kind's default size, and empty content.
    #[must_use]
    pub fn new(board_id: BoardId, kind: ItemKind, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id,
            kind,
            content: String::new(),
            items: (kind == ItemKind::Checklist).then(Vec::new),
            notes: None,
            position,
            size: kind.default_size(),
        }
    }

    /// Builder-style content setter.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Raw wire form of a board item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireItem {
    id: ItemId,
    board_id: BoardId,
    #[serde(rename = "type")]
    kind: ItemKind,
    #[serde(default)]
    content: String,
    #[serde(default)]
    items: Option<Vec<ChecklistEntry>>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    position: Point,
    size: Option<SizeInput>,
}

impl From<WireItem> for BoardItem {
    fn from(wire: WireItem) -> Self {
        let size = wire
            .size
            .map_or_else(|| wire.kind.default_size(), |s| s.normalize(wire.kind));
        let items = if wire.kind == ItemKind::Checklist { Some(wire.items.unwrap_or_default()) } else { None };
        Self {
            id: wire.id,
            board_id: wire.board_id,
            kind: wire.kind,
            content: wire.content,
            items,
            notes: wire.notes,
            position: sanitize_point(wire.position),
            size,
        }
    }
}

fn sanitize_point(p: Point) -> Point {
    Point::new(if p.x.is_finite() { p.x } else { 0.0 }, if p.y.is_finite() { p.y } else { 0.0 })
}

/// Sparse update for a board item. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialBoardItem {
    /// Accepted on the wire but never applied: the tag is immutable.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ItemKind>,
    /// New top-left corner, if being updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// New size, if being updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeInput>,
    /// New content payload, if being updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Full replacement checklist, if being updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ChecklistEntry>>,
    /// New notes, if being updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PartialBoardItem {
    /// Geometry-only update.
    #[must_use]
    pub fn geometry(position: Point, size: Size) -> Self {
        Self { position: Some(position), size: Some(size.into()), ..Default::default() }
    }

    /// Whether the update moves or resizes the item.
    #[must_use]
    pub fn touches_geometry(&self) -> bool {
        self.position.is_some() || self.size.is_some()
    }

    /// Whether the update edits content, checklist entries, or notes.
    #[must_use]
    pub fn touches_content(&self) -> bool {
        self.content.is_some() || self.items.is_some() || self.notes.is_some()
    }
}

/// In-memory store of board items, ordered by insertion.
pub struct DocStore {
    items: HashMap<ItemId, BoardItem>,
    order: Vec<ItemId>,
}

impl DocStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { items: HashMap::new(), order: Vec::new() }
    }

    /// Replace all items with a full snapshot. Later duplicates of an id win.
    pub fn load(&mut self, items: Vec<BoardItem>) {
        self.items.clear();
        self.order.clear();
        for item in items {
            self.insert(item);
        }
    }

    /// Insert an item. An existing item with the same id is replaced in place
    /// and keeps its position in the insertion order.
    pub fn insert(&mut self, item: BoardItem) {
        if !self.items.contains_key(&item.id) {
            self.order.push(item.id);
        }
        self.items.insert(item.id, item);
    }

    /// Remove an item by id, returning it if it was present.
    pub fn remove(&mut self, id: &ItemId) -> Option<BoardItem> {
        let removed = self.items.remove(id)?;
        self.order.retain(|other| other != id);
        Some(removed)
    }

    /// Return a reference to an item by id.
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&BoardItem> {
        self.items.get(id)
    }

    /// Merge a partial update into an existing item. Returns false if the
    /// item doesn't exist. `id` and `kind` are never changed.
    pub fn apply(&mut self, id: &ItemId, partial: &PartialBoardItem) -> bool {
        let Some(item) = self.items.get_mut(id) else {
            return false;
        };
        if let Some(position) = partial.position {
            if position.x.is_finite() && position.y.is_finite() {
                item.position = position;
            }
        }
        if let Some(ref size) = partial.size {
            item.size = size.normalize(item.kind);
        }
        if let Some(ref content) = partial.content {
            item.content.clone_from(content);
        }
        if let Some(ref entries) = partial.items {
            if item.kind == ItemKind::Checklist {
                item.items = Some(entries.clone());
            }
        }
        if let Some(ref notes) = partial.notes {
            item.notes = Some(notes.clone());
        }
        true
    }

    /// Move an item to a new id (e.g. one assigned by the remote store).
    /// Returns false if `old` is absent or `new` is already taken.
    pub fn rekey(&mut self, old: &ItemId, new: ItemId) -> bool {
        if self.items.contains_key(&new) {
            return false;
        }
        let Some(mut item) = self.items.remove(old) else {
            return false;
        };
        item.id = new;
        self.items.insert(new, item);
        for slot in &mut self.order {
            if slot == old {
                *slot = new;
            }
        }
        true
    }

    /// All items in insertion order (oldest first).
    pub fn items(&self) -> impl DoubleEndedIterator<Item = &BoardItem> {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    /// The most recently inserted item.
    #[must_use]
    pub fn last(&self) -> Option<&BoardItem> {
        self.order.last().and_then(|id| self.items.get(id))
    }

    /// Number of items currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the store contains no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for DocStore {
    fn default() -> Self {
        Self::new()
    }
}
