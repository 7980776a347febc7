//! Item variant dispatch: typed content, rendering, and per-variant edits.
//!
//! On the wire every item carries a loosely typed `content` string whose
//! meaning depends on its `type`. This module decodes that string into
//! [`ItemContent`] at read time and encodes edits back into the same wire
//! fields at write time, so nothing else in the engine interprets raw
//! content.
//!
//! Dispatch is a closed `match` from [`ItemKind`] to a static
//! [`ItemVariant`] implementation. Adding a variant means adding one impl and
//! one match arm.
//!
//! Malformed content never fails: a palette that is not a JSON array of
//! strings decodes as an empty palette, and a location pin that does not
//! parse decodes as an invalid pin.

#[cfg(test)]
#[path = "variant_test.rs"]
mod variant_test;

use serde::{Deserialize, Serialize};

use crate::consts::UPLOAD_PLACEHOLDER;
use crate::doc::{BoardItem, ChecklistEntry, ItemKind, PartialBoardItem};

// =============================================================
// Typed payloads
// =============================================================

/// A geographic pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "lon", alias = "longitude")]
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    /// Whether both coordinates are finite and inside their ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Decoded item content, one case per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemContent {
    Note { markup: String },
    Image { url: String },
    Checklist { entries: Vec<ChecklistEntry> },
    Palette { colors: Vec<String> },
    Video { url: String },
    AudioEmbed { url: String },
    /// `None` when the stored content does not describe a valid location.
    LocationPin(Option<Location>),
    Document { url: String },
    StoryboardPanel { url: String, notes: String },
    /// Upload-backed item whose asset is still in flight.
    Uploading { kind: ItemKind },
}

impl ItemContent {
    /// Decode an item's wire fields.
    #[must_use]
    pub fn decode(item: &BoardItem) -> Self {
        if is_uploading(item) {
            return Self::Uploading { kind: item.kind };
        }
        variant_for(item.kind).decode(item)
    }
}

/// Whether `item` still carries the upload placeholder.
#[must_use]
pub fn is_uploading(item: &BoardItem) -> bool {
    item.kind.is_upload_backed() && item.content == UPLOAD_PLACEHOLDER
}

/// Parse palette content. Anything but a JSON array of strings is empty.
#[must_use]
pub fn parse_palette(content: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(content).unwrap_or_default()
}

/// Parse location content. Malformed JSON or out-of-range coordinates yield `None`.
#[must_use]
pub fn parse_location(content: &str) -> Option<Location> {
    match serde_json::from_str::<Location>(content) {
        Ok(loc) if loc.is_valid() => Some(loc),
        _ => None,
    }
}

fn encode_palette(colors: &[String]) -> String {
    serde_json::to_string(colors).unwrap_or_else(|_| String::from("[]"))
}

fn encode_location(loc: &Location) -> String {
    serde_json::to_string(loc).unwrap_or_default()
}

/// Normalize a color for storage. Hex colors are lowercased; other CSS
/// color strings are trimmed. Empty input is rejected.
#[must_use]
pub fn normalize_color(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(hex) = trimmed.strip_prefix('#') {
        let valid = matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
        return valid.then(|| format!("#{}", hex.to_ascii_lowercase()));
    }
    Some(trimmed.to_owned())
}

// =============================================================
// Rendering model
// =============================================================

/// What the host should draw for an item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemView {
    Note { markup: String, preview: String },
    Image { url: String },
    Checklist { entries: Vec<ChecklistEntry>, done: usize, total: usize },
    Palette { colors: Vec<String> },
    Video { url: String, embed_url: Option<String> },
    AudioEmbed { url: String, embed_url: Option<String> },
    Location { lat: f64, lng: f64, address: Option<String> },
    InvalidLocation,
    Document { url: String, file_name: String },
    StoryboardPanel { url: String, notes: String },
    /// Upload placeholder.
    Uploading { kind: ItemKind },
    /// Upload-backed item without an asset yet.
    Empty { kind: ItemKind },
}

/// Inline editing affordances the host should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    EditText,
    ToggleEntry,
    AddEntry,
    RemoveEntry,
    AddColor,
    RemoveColor,
    EditLocation,
    EditNotes,
    ReplaceAsset,
    EditUrl,
}

/// An in-place edit requested by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEdit {
    SetMarkup(String),
    AddEntry(String),
    ToggleEntry(String),
    EditEntry { id: String, text: String },
    RemoveEntry(String),
    AddColor(String),
    RemoveColor(usize),
    SetLocation(Location),
    SetNotes(String),
    SetUrl(String),
}

/// Type-specific decode, render, and edit behavior for one variant.
pub trait ItemVariant: Sync {
    /// The tag this behavior handles.
    fn kind(&self) -> ItemKind;

    /// Decode the wire fields of an item of this kind.
    fn decode(&self, item: &BoardItem) -> ItemContent;

    /// Affordances offered while the item is selected.
    fn affordances(&self) -> &'static [Affordance];

    /// Turn an edit into the partial update that carries it, or `None` if
    /// the edit does not apply to this variant or this item's state.
    fn edit(&self, item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem>;
}

/// Select the behavior for `kind`.
#[must_use]
pub fn variant_for(kind: ItemKind) -> &'static dyn ItemVariant {
    match kind {
        ItemKind::Note => &NoteVariant,
        ItemKind::Image => &AssetVariant(ItemKind::Image),
        ItemKind::Checklist => &ChecklistVariant,
        ItemKind::Palette => &PaletteVariant,
        ItemKind::Video => &AssetVariant(ItemKind::Video),
        ItemKind::AudioEmbed => &AudioEmbedVariant,
        ItemKind::LocationPin => &LocationPinVariant,
        ItemKind::Document => &AssetVariant(ItemKind::Document),
        ItemKind::StoryboardPanel => &StoryboardVariant,
    }
}

/// Render an item into its view model.
#[must_use]
pub fn render(item: &BoardItem) -> ItemView {
    match ItemContent::decode(item) {
        ItemContent::Note { markup } => {
            let preview = plain_text(&markup);
            ItemView::Note { markup, preview }
        }
        ItemContent::Checklist { entries } => {
            let done = entries.iter().filter(|e| e.checked).count();
            let total = entries.len();
            ItemView::Checklist { entries, done, total }
        }
        ItemContent::Palette { colors } => ItemView::Palette { colors },
        ItemContent::LocationPin(Some(loc)) => ItemView::Location { lat: loc.lat, lng: loc.lng, address: loc.address },
        ItemContent::LocationPin(None) => ItemView::InvalidLocation,
        ItemContent::Uploading { kind } => ItemView::Uploading { kind },
        ItemContent::Image { url } if url.is_empty() => ItemView::Empty { kind: ItemKind::Image },
        ItemContent::Image { url } => ItemView::Image { url },
        ItemContent::Video { url } if url.is_empty() => ItemView::Empty { kind: ItemKind::Video },
        ItemContent::Video { url } => {
            let embed_url = video_embed_url(&url);
            ItemView::Video { url, embed_url }
        }
        ItemContent::AudioEmbed { url } => {
            let embed_url = audio_embed_url(&url);
            ItemView::AudioEmbed { url, embed_url }
        }
        ItemContent::Document { url } if url.is_empty() => ItemView::Empty { kind: ItemKind::Document },
        ItemContent::Document { url } => {
            let file_name = file_name_from_url(&url);
            ItemView::Document { url, file_name }
        }
        ItemContent::StoryboardPanel { url, notes } => ItemView::StoryboardPanel { url, notes },
    }
}

/// Apply the variant's edit handler. Items still uploading accept no edits.
#[must_use]
pub fn edit(item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem> {
    if is_uploading(item) {
        return None;
    }
    variant_for(item.kind).edit(item, edit)
}

fn content_patch(content: String) -> PartialBoardItem {
    PartialBoardItem { content: Some(content), ..Default::default() }
}

fn notes_patch(notes: &str) -> PartialBoardItem {
    PartialBoardItem { notes: Some(notes.to_owned()), ..Default::default() }
}

// =============================================================
// Variants
// =============================================================

struct NoteVariant;

impl ItemVariant for NoteVariant {
    fn kind(&self) -> ItemKind {
        ItemKind::Note
    }

    fn decode(&self, item: &BoardItem) -> ItemContent {
        ItemContent::Note { markup: item.content.clone() }
    }

    fn affordances(&self) -> &'static [Affordance] {
        &[Affordance::EditText]
    }

    fn edit(&self, _item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem> {
        match edit {
            ItemEdit::SetMarkup(markup) => Some(content_patch(markup.clone())),
            _ => None,
        }
    }
}

/// Image, video, and document: a single asset URL plus optional notes.
struct AssetVariant(ItemKind);

impl ItemVariant for AssetVariant {
    fn kind(&self) -> ItemKind {
        self.0
    }

    fn decode(&self, item: &BoardItem) -> ItemContent {
        let url = item.content.trim().to_owned();
        match self.0 {
            ItemKind::Video => ItemContent::Video { url },
            ItemKind::Document => ItemContent::Document { url },
            _ => ItemContent::Image { url },
        }
    }

    fn affordances(&self) -> &'static [Affordance] {
        match self.0 {
            ItemKind::Video => &[Affordance::EditUrl, Affordance::ReplaceAsset],
            _ => &[Affordance::ReplaceAsset, Affordance::EditNotes],
        }
    }

    fn edit(&self, _item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem> {
        match edit {
            ItemEdit::SetUrl(url) => Some(content_patch(url.trim().to_owned())),
            ItemEdit::SetNotes(notes) if self.0 != ItemKind::Video => Some(notes_patch(notes)),
            _ => None,
        }
    }
}

struct ChecklistVariant;

impl ChecklistVariant {
    fn entries(item: &BoardItem) -> Vec<ChecklistEntry> {
        item.items.clone().unwrap_or_default()
    }

    fn patch(entries: Vec<ChecklistEntry>) -> PartialBoardItem {
        PartialBoardItem { items: Some(entries), ..Default::default() }
    }
}

impl ItemVariant for ChecklistVariant {
    fn kind(&self) -> ItemKind {
        ItemKind::Checklist
    }

    fn decode(&self, item: &BoardItem) -> ItemContent {
        ItemContent::Checklist { entries: Self::entries(item) }
    }

    fn affordances(&self) -> &'static [Affordance] {
        &[Affordance::AddEntry, Affordance::ToggleEntry, Affordance::EditText, Affordance::RemoveEntry]
    }

    fn edit(&self, item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem> {
        let mut entries = Self::entries(item);
        match edit {
            ItemEdit::AddEntry(text) if !text.trim().is_empty() => {
                entries.push(ChecklistEntry::new(text.trim()));
            }
            ItemEdit::ToggleEntry(id) => {
                let entry = entries.iter_mut().find(|e| &e.id == id)?;
                entry.checked = !entry.checked;
            }
            ItemEdit::EditEntry { id, text } => {
                let entry = entries.iter_mut().find(|e| &e.id == id)?;
                entry.text.clone_from(text);
            }
            ItemEdit::RemoveEntry(id) => {
                let before = entries.len();
                entries.retain(|e| &e.id != id);
                if entries.len() == before {
                    return None;
                }
            }
            _ => return None,
        }
        Some(Self::patch(entries))
    }
}

struct PaletteVariant;

impl ItemVariant for PaletteVariant {
    fn kind(&self) -> ItemKind {
        ItemKind::Palette
    }

    fn decode(&self, item: &BoardItem) -> ItemContent {
        ItemContent::Palette { colors: parse_palette(&item.content) }
    }

    fn affordances(&self) -> &'static [Affordance] {
        &[Affordance::AddColor, Affordance::RemoveColor]
    }

    fn edit(&self, item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem> {
        let mut colors = parse_palette(&item.content);
        match edit {
            ItemEdit::AddColor(raw) => colors.push(normalize_color(raw)?),
            ItemEdit::RemoveColor(index) if *index < colors.len() => {
                colors.remove(*index);
            }
            _ => return None,
        }
        Some(content_patch(encode_palette(&colors)))
    }
}

struct AudioEmbedVariant;

impl ItemVariant for AudioEmbedVariant {
    fn kind(&self) -> ItemKind {
        ItemKind::AudioEmbed
    }

    fn decode(&self, item: &BoardItem) -> ItemContent {
        ItemContent::AudioEmbed { url: item.content.trim().to_owned() }
    }

    fn affordances(&self) -> &'static [Affordance] {
        &[Affordance::EditUrl]
    }

    fn edit(&self, _item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem> {
        match edit {
            ItemEdit::SetUrl(url) => Some(content_patch(url.trim().to_owned())),
            _ => None,
        }
    }
}

struct LocationPinVariant;

impl ItemVariant for LocationPinVariant {
    fn kind(&self) -> ItemKind {
        ItemKind::LocationPin
    }

    fn decode(&self, item: &BoardItem) -> ItemContent {
        ItemContent::LocationPin(parse_location(&item.content))
    }

    fn affordances(&self) -> &'static [Affordance] {
        &[Affordance::EditLocation]
    }

    fn edit(&self, _item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem> {
        match edit {
            ItemEdit::SetLocation(loc) if loc.is_valid() => Some(content_patch(encode_location(loc))),
            _ => None,
        }
    }
}

struct StoryboardVariant;

impl ItemVariant for StoryboardVariant {
    fn kind(&self) -> ItemKind {
        ItemKind::StoryboardPanel
    }

    fn decode(&self, item: &BoardItem) -> ItemContent {
        ItemContent::StoryboardPanel {
            url: item.content.trim().to_owned(),
            notes: item.notes.clone().unwrap_or_default(),
        }
    }

    fn affordances(&self) -> &'static [Affordance] {
        &[Affordance::ReplaceAsset, Affordance::EditNotes]
    }

    fn edit(&self, _item: &BoardItem, edit: &ItemEdit) -> Option<PartialBoardItem> {
        match edit {
            ItemEdit::SetUrl(url) => Some(content_patch(url.trim().to_owned())),
            ItemEdit::SetNotes(notes) => Some(notes_patch(notes)),
            _ => None,
        }
    }
}

// =============================================================
// Helpers
// =============================================================

/// Strip markup tags and decode common entities for a one-line preview.
#[must_use]
pub fn plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => {
                in_tag = true;
                out.push(' ');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    let decoded = out
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Embeddable player URL for YouTube and Vimeo links.
#[must_use]
pub fn video_embed_url(url: &str) -> Option<String> {
    let rest = strip_scheme(url);
    let host_path = rest.trim_start_matches("www.").trim_start_matches("m.");
    let id = if let Some(path) = host_path.strip_prefix("youtube.com/watch") {
        query_param(path, "v")
    } else if let Some(path) = host_path.strip_prefix("youtu.be/") {
        Some(first_segment(path))
    } else if let Some(path) = host_path.strip_prefix("youtube.com/shorts/") {
        Some(first_segment(path))
    } else if let Some(path) = host_path.strip_prefix("youtube.com/embed/") {
        Some(first_segment(path))
    } else if let Some(path) = host_path.strip_prefix("vimeo.com/") {
        let id = first_segment(path);
        return (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
            .then(|| format!("https://player.vimeo.com/video/{id}"));
    } else {
        None
    };
    id.filter(|id| !id.is_empty()).map(|id| format!("https://www.youtube.com/embed/{id}"))
}

/// Embeddable player URL for Spotify links.
#[must_use]
pub fn audio_embed_url(url: &str) -> Option<String> {
    let rest = strip_scheme(url);
    let path = rest.strip_prefix("open.spotify.com/")?;
    if path.starts_with("embed/") {
        return Some(format!("https://open.spotify.com/{}", path_without_query(path)));
    }
    let path = path_without_query(path);
    let mut parts = path.splitn(2, '/');
    let kind = parts.next().unwrap_or_default();
    let id = parts.next().unwrap_or_default();
    let supported = matches!(kind, "track" | "album" | "playlist" | "episode" | "show");
    (supported && !id.is_empty()).then(|| format!("https://open.spotify.com/embed/{kind}/{id}"))
}

/// Last path segment of a URL, without query or fragment.
#[must_use]
pub fn file_name_from_url(url: &str) -> String {
    let path = path_without_query(strip_scheme(url));
    match path.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() && path.contains('/') => name.to_owned(),
        _ => String::from("document"),
    }
}

fn strip_scheme(url: &str) -> &str {
    let url = url.trim();
    url.strip_prefix("https://").or_else(|| url.strip_prefix("http://")).unwrap_or(url)
}

fn path_without_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn first_segment(path: &str) -> String {
    path_without_query(path).split('/').next().unwrap_or_default().to_owned()
}

fn query_param(path: &str, key: &str) -> Option<String> {
    let query = path.split_once('?')?.1;
    let query = query.split('#').next().unwrap_or_default();
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == key).then(|| v.to_owned())
    })
}
