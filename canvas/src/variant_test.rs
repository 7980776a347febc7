#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;
use crate::camera::Point;

fn item(kind: ItemKind, content: &str) -> BoardItem {
    BoardItem::new(Uuid::new_v4(), kind, Point::new(0.0, 0.0)).with_content(content)
}

fn checklist(entries: Vec<ChecklistEntry>) -> BoardItem {
    let mut it = item(ItemKind::Checklist, "");
    it.items = Some(entries);
    it
}

// =============================================================
// Dispatch
// =============================================================

#[test]
fn dispatch_covers_every_kind() {
    for kind in ItemKind::ALL {
        assert_eq!(variant_for(kind).kind(), kind);
        assert!(!variant_for(kind).affordances().is_empty());
    }
}

#[test]
fn decode_matches_kind() {
    let cases = [
        (item(ItemKind::Note, "<b>x</b>"), "Note"),
        (item(ItemKind::Image, "u"), "Image"),
        (item(ItemKind::Video, "u"), "Video"),
        (item(ItemKind::Document, "u"), "Document"),
        (item(ItemKind::AudioEmbed, "u"), "AudioEmbed"),
        (item(ItemKind::StoryboardPanel, "u"), "StoryboardPanel"),
    ];
    for (it, name) in cases {
        let decoded = format!("{:?}", ItemContent::decode(&it));
        assert!(decoded.starts_with(name), "{decoded}");
    }
}

// =============================================================
// Palette
// =============================================================

#[test]
fn palette_parses_color_array() {
    let it = item(ItemKind::Palette, r##"["#ff0000", "teal"]"##);
    assert_eq!(render(&it), ItemView::Palette { colors: vec!["#ff0000".into(), "teal".into()] });
}

#[test]
fn palette_not_json_is_empty() {
    let it = item(ItemKind::Palette, "not-json");
    assert_eq!(render(&it), ItemView::Palette { colors: vec![] });
}

#[test]
fn palette_non_array_is_empty() {
    assert!(parse_palette(r#"{"a": 1}"#).is_empty());
    assert!(parse_palette("[1, 2, 3]").is_empty());
    assert!(parse_palette("").is_empty());
}

#[test]
fn palette_add_color_rewrites_whole_array() {
    let it = item(ItemKind::Palette, r##"["#000000"]"##);
    let patch = edit(&it, &ItemEdit::AddColor(" #ABCDEF ".into())).unwrap();
    assert_eq!(patch.content.as_deref(), Some(r##"["#000000","#abcdef"]"##));
    assert!(!patch.touches_geometry());
}

#[test]
fn palette_add_to_malformed_starts_fresh() {
    let it = item(ItemKind::Palette, "garbage");
    let patch = edit(&it, &ItemEdit::AddColor("#fff".into())).unwrap();
    assert_eq!(patch.content.as_deref(), Some(r##"["#fff"]"##));
}

#[test]
fn palette_rejects_bad_hex_and_bad_index() {
    let it = item(ItemKind::Palette, r##"["#000000"]"##);
    assert!(edit(&it, &ItemEdit::AddColor("#zzz".into())).is_none());
    assert!(edit(&it, &ItemEdit::AddColor("   ".into())).is_none());
    assert!(edit(&it, &ItemEdit::RemoveColor(5)).is_none());
}

#[test]
fn palette_remove_color() {
    let it = item(ItemKind::Palette, r##"["#111111","#222222"]"##);
    let patch = edit(&it, &ItemEdit::RemoveColor(0)).unwrap();
    assert_eq!(patch.content.as_deref(), Some(r##"["#222222"]"##));
}

// =============================================================
// Location pin
// =============================================================

#[test]
fn location_renders_coordinates() {
    let it = item(ItemKind::LocationPin, r#"{"lat": 51.5, "lng": -0.12, "address": "London"}"#);
    assert_eq!(render(&it), ItemView::Location { lat: 51.5, lng: -0.12, address: Some("London".into()) });
}

#[test]
fn location_accepts_long_key_names() {
    let loc = parse_location(r#"{"latitude": 10, "longitude": 20}"#).unwrap();
    assert_eq!((loc.lat, loc.lng), (10.0, 20.0));
}

#[test]
fn location_malformed_renders_invalid() {
    for raw in ["", "nope", r#"{"lat": 1}"#, r#"{"lat": 95, "lng": 0}"#, r#""str""#] {
        let it = item(ItemKind::LocationPin, raw);
        assert_eq!(render(&it), ItemView::InvalidLocation, "{raw}");
    }
}

#[test]
fn location_edit_validates() {
    let it = item(ItemKind::LocationPin, "");
    let good = Location { lat: 40.0, lng: -73.9, address: None };
    let patch = edit(&it, &ItemEdit::SetLocation(good.clone())).unwrap();
    assert_eq!(parse_location(patch.content.as_deref().unwrap()), Some(good));
    let bad = Location { lat: 0.0, lng: 200.0, address: None };
    assert!(edit(&it, &ItemEdit::SetLocation(bad)).is_none());
}

// =============================================================
// Checklist
// =============================================================

#[test]
fn checklist_missing_items_is_empty() {
    let mut it = item(ItemKind::Checklist, "");
    it.items = None;
    assert_eq!(render(&it), ItemView::Checklist { entries: vec![], done: 0, total: 0 });
}

#[test]
fn checklist_counts_done() {
    let mut a = ChecklistEntry::new("a");
    a.checked = true;
    let it = checklist(vec![a, ChecklistEntry::new("b")]);
    match render(&it) {
        ItemView::Checklist { done, total, .. } => assert_eq!((done, total), (1, 2)),
        other => panic!("unexpected view {other:?}"),
    }
}

#[test]
fn checklist_toggle_emits_full_list() {
    let a = ChecklistEntry::new("a");
    let b = ChecklistEntry::new("b");
    let it = checklist(vec![a.clone(), b.clone()]);
    let patch = edit(&it, &ItemEdit::ToggleEntry(b.id.clone())).unwrap();
    let entries = patch.items.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(!entries[0].checked);
    assert!(entries[1].checked);
    assert!(patch.content.is_none());
}

#[test]
fn checklist_edit_add_remove() {
    let a = ChecklistEntry::new("a");
    let it = checklist(vec![a.clone()]);

    let renamed = edit(&it, &ItemEdit::EditEntry { id: a.id.clone(), text: "alpha".into() }).unwrap();
    assert_eq!(renamed.items.unwrap()[0].text, "alpha");

    let added = edit(&it, &ItemEdit::AddEntry(" book studio ".into())).unwrap();
    let entries = added.items.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].text, "book studio");

    let removed = edit(&it, &ItemEdit::RemoveEntry(a.id.clone())).unwrap();
    assert_eq!(removed.items, Some(vec![]));
}

#[test]
fn checklist_unknown_entry_is_rejected() {
    let it = checklist(vec![ChecklistEntry::new("a")]);
    assert!(edit(&it, &ItemEdit::ToggleEntry("missing".into())).is_none());
    assert!(edit(&it, &ItemEdit::RemoveEntry("missing".into())).is_none());
    assert!(edit(&it, &ItemEdit::AddEntry("  ".into())).is_none());
}

// =============================================================
// Notes, media, uploads
// =============================================================

#[test]
fn note_preview_strips_markup() {
    let it = item(ItemKind::Note, "<p>Call&nbsp;<b>Sam</b></p><p>re: casting &amp; wardrobe</p>");
    match render(&it) {
        ItemView::Note { preview, .. } => assert_eq!(preview, "Call Sam re: casting & wardrobe"),
        other => panic!("unexpected view {other:?}"),
    }
}

#[test]
fn wrong_edit_for_variant_is_rejected() {
    let note = item(ItemKind::Note, "");
    assert!(edit(&note, &ItemEdit::AddColor("#fff".into())).is_none());
    let video = item(ItemKind::Video, "");
    assert!(edit(&video, &ItemEdit::SetNotes("x".into())).is_none());
}

#[test]
fn storyboard_notes_edit() {
    let it = item(ItemKind::StoryboardPanel, "https://cdn.example/p1.png");
    let patch = edit(&it, &ItemEdit::SetNotes("pan left".into())).unwrap();
    assert_eq!(patch.notes.as_deref(), Some("pan left"));
}

#[test]
fn uploading_placeholder_renders_and_blocks_edits() {
    let it = item(ItemKind::Image, UPLOAD_PLACEHOLDER);
    assert_eq!(render(&it), ItemView::Uploading { kind: ItemKind::Image });
    assert!(edit(&it, &ItemEdit::SetUrl("x".into())).is_none());
}

#[test]
fn placeholder_on_note_is_plain_content() {
    let it = item(ItemKind::Note, UPLOAD_PLACEHOLDER);
    assert!(!is_uploading(&it));
}

#[test]
fn empty_asset_renders_empty() {
    assert_eq!(render(&item(ItemKind::Document, "")), ItemView::Empty { kind: ItemKind::Document });
}

#[test]
fn document_file_name() {
    let it = item(ItemKind::Document, "https://cdn.example/boards/abc/call-sheet.pdf?token=1");
    assert_eq!(
        render(&it),
        ItemView::Document {
            url: "https://cdn.example/boards/abc/call-sheet.pdf?token=1".into(),
            file_name: "call-sheet.pdf".into(),
        }
    );
    assert_eq!(file_name_from_url("https://cdn.example"), "document");
}

#[test]
fn video_embed_urls() {
    let cases = [
        ("https://www.youtube.com/watch?v=abc123&t=4", Some("https://www.youtube.com/embed/abc123")),
        ("https://youtu.be/xyz?si=1", Some("https://www.youtube.com/embed/xyz")),
        ("https://youtube.com/shorts/s1", Some("https://www.youtube.com/embed/s1")),
        ("https://vimeo.com/12345", Some("https://player.vimeo.com/video/12345")),
        ("https://cdn.example/clip.mp4", None),
    ];
    for (url, expected) in cases {
        assert_eq!(video_embed_url(url).as_deref(), expected, "{url}");
    }
}

#[test]
fn audio_embed_urls() {
    assert_eq!(
        audio_embed_url("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=x").as_deref(),
        Some("https://open.spotify.com/embed/track/4uLU6hMCjMI75M1A2tKUQC")
    );
    assert!(audio_embed_url("https://soundcloud.com/a/b").is_none());
    assert!(audio_embed_url("https://open.spotify.com/user/me").is_none());
}

#[test]
fn normalize_color_rules() {
    assert_eq!(normalize_color("#AbC").as_deref(), Some("#abc"));
    assert_eq!(normalize_color(" rebeccapurple ").as_deref(), Some("rebeccapurple"));
    assert!(normalize_color("#12345").is_none());
}
