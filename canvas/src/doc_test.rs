#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use serde_json::json;
use uuid::Uuid;

use super::*;

fn make_item(kind: ItemKind) -> BoardItem {
    BoardItem::new(Uuid::new_v4(), kind, Point::new(0.0, 0.0))
}

fn make_item_with_id(id: Uuid, kind: ItemKind) -> BoardItem {
    let mut item = make_item(kind);
    item.id = id;
    item
}

// =============================================================
// ItemKind serde
// =============================================================

#[test]
fn kind_serde_all_variants() {
    let cases = [
        (ItemKind::Note, "\"note\""),
        (ItemKind::Image, "\"image\""),
        (ItemKind::Checklist, "\"checklist\""),
        (ItemKind::Palette, "\"palette\""),
        (ItemKind::Video, "\"video\""),
        (ItemKind::AudioEmbed, "\"audioEmbed\""),
        (ItemKind::LocationPin, "\"locationPin\""),
        (ItemKind::Document, "\"document\""),
        (ItemKind::StoryboardPanel, "\"storyboardPanel\""),
    ];
    for (kind, expected) in cases {
        assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        let back: ItemKind = serde_json::from_str(expected).unwrap();
        assert_eq!(back, kind);
    }
}

#[test]
fn kind_as_str_matches_serde() {
    for kind in ItemKind::ALL {
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, format!("\"{}\"", kind.as_str()));
    }
}

#[test]
fn kind_unknown_tag_rejected() {
    assert!(serde_json::from_str::<ItemKind>("\"sticky\"").is_err());
}

#[test]
fn upload_backed_kinds() {
    let backed: Vec<ItemKind> = ItemKind::ALL.into_iter().filter(|k| k.is_upload_backed()).collect();
    assert_eq!(backed, vec![ItemKind::Image, ItemKind::Video, ItemKind::Document, ItemKind::StoryboardPanel]);
}

#[test]
fn default_sizes_respect_minimum() {
    for kind in ItemKind::ALL {
        let size = kind.default_size();
        assert!(size.width >= MIN_ITEM_WIDTH, "{kind:?}");
        assert!(size.height >= MIN_ITEM_HEIGHT, "{kind:?}");
    }
}

// =============================================================
// Dimension
// =============================================================

#[test]
fn dimension_number_passes_through() {
    assert_eq!(Dimension::Units(240.0).resolve(300.0), 240.0);
}

#[test]
fn dimension_px_suffix() {
    assert_eq!(Dimension::Text("180px".into()).resolve(300.0), 180.0);
    assert_eq!(Dimension::Text(" 180 px ".into()).resolve(300.0), 180.0);
}

#[test]
fn dimension_bare_numeric_string() {
    assert_eq!(Dimension::Text("220.5".into()).resolve(300.0), 220.5);
}

#[test]
fn dimension_percent_scales_default() {
    assert_eq!(Dimension::Text("50%".into()).resolve(300.0), 150.0);
    assert_eq!(Dimension::Text("200%".into()).resolve(300.0), 600.0);
}

#[test]
fn dimension_garbage_falls_back_to_default() {
    assert_eq!(Dimension::Text("wide".into()).resolve(300.0), 300.0);
    assert_eq!(Dimension::Text(String::new()).resolve(300.0), 300.0);
}

#[test]
fn dimension_non_positive_falls_back_to_default() {
    assert_eq!(Dimension::Units(0.0).resolve(300.0), 300.0);
    assert_eq!(Dimension::Units(-10.0).resolve(300.0), 300.0);
    assert_eq!(Dimension::Units(f64::NAN).resolve(300.0), 300.0);
}

#[test]
fn size_input_normalize_clamps_to_minimum() {
    let input = SizeInput { width: Dimension::Units(20.0), height: Dimension::Text("10px".into()) };
    let size = input.normalize(ItemKind::Note);
    assert_eq!(size, Size::new(MIN_ITEM_WIDTH, MIN_ITEM_HEIGHT));
}

// =============================================================
// BoardItem wire shape
// =============================================================

#[test]
fn item_deserializes_numeric_size() {
    let id = Uuid::new_v4();
    let board = Uuid::new_v4();
    let item: BoardItem = serde_json::from_value(json!({
        "id": id,
        "boardId": board,
        "type": "note",
        "content": "<p>hi</p>",
        "position": { "x": 10.5, "y": -4 },
        "size": { "width": 320, "height": 210 },
    }))
    .unwrap();
    assert_eq!(item.id, id);
    assert_eq!(item.board_id, board);
    assert_eq!(item.kind, ItemKind::Note);
    assert_eq!(item.position, Point::new(10.5, -4.0));
    assert_eq!(item.size, Size::new(320.0, 210.0));
    assert!(item.items.is_none());
}

#[test]
fn item_deserializes_string_sizes() {
    let item: BoardItem = serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "boardId": Uuid::new_v4(),
        "type": "image",
        "content": "https://cdn.example/a.png",
        "position": { "x": 0, "y": 0 },
        "size": { "width": "400px", "height": "50%" },
    }))
    .unwrap();
    assert_eq!(item.size, Size::new(400.0, 150.0));
}

#[test]
fn item_missing_size_uses_kind_default() {
    let item: BoardItem = serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "boardId": Uuid::new_v4(),
        "type": "palette",
        "position": { "x": 0, "y": 0 },
    }))
    .unwrap();
    assert_eq!(item.size, ItemKind::Palette.default_size());
    assert_eq!(item.content, "");
}

#[test]
fn checklist_items_default_to_empty() {
    let item: BoardItem = serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "boardId": Uuid::new_v4(),
        "type": "checklist",
        "content": "",
        "position": { "x": 0, "y": 0 },
        "size": { "width": 280, "height": 240 },
    }))
    .unwrap();
    assert_eq!(item.items, Some(Vec::new()));
}

#[test]
fn non_checklist_items_field_dropped() {
    let item: BoardItem = serde_json::from_value(json!({
        "id": Uuid::new_v4(),
        "boardId": Uuid::new_v4(),
        "type": "note",
        "content": "",
        "items": [{ "id": "a", "text": "x", "checked": true }],
        "position": { "x": 0, "y": 0 },
        "size": { "width": 300, "height": 200 },
    }))
    .unwrap();
    assert!(item.items.is_none());
}

#[test]
fn item_serializes_camel_case_with_numeric_size() {
    let mut item = make_item(ItemKind::StoryboardPanel);
    item.notes = Some("wide shot".into());
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["type"], "storyboardPanel");
    assert!(value.get("boardId").is_some());
    assert_eq!(value["size"]["width"], 320.0);
    assert_eq!(value["notes"], "wide shot");
    assert!(value.get("items").is_none());
}

// =============================================================
// PartialBoardItem
// =============================================================

#[test]
fn partial_default_touches_nothing() {
    let p = PartialBoardItem::default();
    assert!(!p.touches_geometry());
    assert!(!p.touches_content());
}

#[test]
fn partial_geometry_classification() {
    let p = PartialBoardItem::geometry(Point::new(1.0, 2.0), Size::new(200.0, 100.0));
    assert!(p.touches_geometry());
    assert!(!p.touches_content());
}

#[test]
fn partial_content_classification() {
    let p = PartialBoardItem { notes: Some("n".into()), ..Default::default() };
    assert!(p.touches_content());
    assert!(!p.touches_geometry());
}

#[test]
fn partial_serialization_skips_none() {
    let p = PartialBoardItem { content: Some("x".into()), ..Default::default() };
    let value = serde_json::to_value(&p).unwrap();
    assert_eq!(value, json!({ "content": "x" }));
}

// =============================================================
// DocStore
// =============================================================

#[test]
fn store_new_is_empty() {
    let store = DocStore::new();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert!(store.last().is_none());
}

#[test]
fn store_preserves_insertion_order() {
    let mut store = DocStore::new();
    let a = make_item(ItemKind::Note);
    let b = make_item(ItemKind::Image);
    let c = make_item(ItemKind::Palette);
    let ids = [a.id, b.id, c.id];
    store.insert(a);
    store.insert(b);
    store.insert(c);
    let order: Vec<ItemId> = store.items().map(|i| i.id).collect();
    assert_eq!(order, ids);
    assert_eq!(store.last().map(|i| i.id), Some(ids[2]));
}

#[test]
fn store_insert_existing_keeps_slot() {
    let mut store = DocStore::new();
    let a = make_item(ItemKind::Note);
    let b = make_item(ItemKind::Note);
    let (a_id, b_id) = (a.id, b.id);
    store.insert(a.clone());
    store.insert(b);
    store.insert(a.with_content("replaced"));
    let order: Vec<ItemId> = store.items().map(|i| i.id).collect();
    assert_eq!(order, vec![a_id, b_id]);
    assert_eq!(store.get(&a_id).unwrap().content, "replaced");
}

#[test]
fn store_load_replaces_everything() {
    let mut store = DocStore::new();
    store.insert(make_item(ItemKind::Note));
    let fresh = vec![make_item(ItemKind::Video), make_item(ItemKind::Document)];
    let ids: Vec<ItemId> = fresh.iter().map(|i| i.id).collect();
    store.load(fresh);
    assert_eq!(store.len(), 2);
    assert_eq!(store.items().map(|i| i.id).collect::<Vec<_>>(), ids);
}

#[test]
fn store_remove_returns_item() {
    let mut store = DocStore::new();
    let item = make_item(ItemKind::Note);
    let id = item.id;
    store.insert(item);
    assert_eq!(store.remove(&id).map(|i| i.id), Some(id));
    assert!(store.is_empty());
    assert!(store.items().next().is_none());
}

#[test]
fn store_remove_missing_is_none() {
    let mut store = DocStore::new();
    assert!(store.remove(&Uuid::new_v4()).is_none());
}

#[test]
fn apply_missing_item_is_noop() {
    let mut store = DocStore::new();
    let p = PartialBoardItem { content: Some("x".into()), ..Default::default() };
    assert!(!store.apply(&Uuid::new_v4(), &p));
}

#[test]
fn apply_never_changes_type() {
    let mut store = DocStore::new();
    let item = make_item(ItemKind::Note);
    let id = item.id;
    store.insert(item);
    let p = PartialBoardItem { kind: Some(ItemKind::Palette), content: Some("[]".into()), ..Default::default() };
    assert!(store.apply(&id, &p));
    let stored = store.get(&id).unwrap();
    assert_eq!(stored.kind, ItemKind::Note);
    assert_eq!(stored.id, id);
    assert_eq!(stored.content, "[]");
}

#[test]
fn apply_normalizes_size() {
    let mut store = DocStore::new();
    let item = make_item(ItemKind::Note);
    let id = item.id;
    store.insert(item);
    let p = PartialBoardItem {
        size: Some(SizeInput { width: Dimension::Text("10px".into()), height: Dimension::Text("150%".into()) }),
        ..Default::default()
    };
    store.apply(&id, &p);
    assert_eq!(store.get(&id).unwrap().size, Size::new(MIN_ITEM_WIDTH, 300.0));
}

#[test]
fn apply_ignores_non_finite_position() {
    let mut store = DocStore::new();
    let item = make_item_with_id(Uuid::new_v4(), ItemKind::Note);
    let id = item.id;
    store.insert(item);
    let p = PartialBoardItem { position: Some(Point::new(f64::NAN, 3.0)), ..Default::default() };
    store.apply(&id, &p);
    assert_eq!(store.get(&id).unwrap().position, Point::new(0.0, 0.0));
}

#[test]
fn apply_items_only_on_checklist() {
    let mut store = DocStore::new();
    let note = make_item(ItemKind::Note);
    let list = make_item(ItemKind::Checklist);
    let (note_id, list_id) = (note.id, list.id);
    store.insert(note);
    store.insert(list);
    let p = PartialBoardItem { items: Some(vec![ChecklistEntry::new("call agent")]), ..Default::default() };
    store.apply(&note_id, &p);
    store.apply(&list_id, &p);
    assert!(store.get(&note_id).unwrap().items.is_none());
    assert_eq!(store.get(&list_id).unwrap().items.as_ref().map(Vec::len), Some(1));
}

#[test]
fn rekey_moves_item_and_keeps_order() {
    let mut store = DocStore::new();
    let a = make_item(ItemKind::Note);
    let b = make_item(ItemKind::Note);
    let (a_id, b_id) = (a.id, b.id);
    store.insert(a);
    store.insert(b);
    let new_id = Uuid::new_v4();
    assert!(store.rekey(&a_id, new_id));
    assert!(store.get(&a_id).is_none());
    assert_eq!(store.get(&new_id).unwrap().id, new_id);
    assert_eq!(store.items().map(|i| i.id).collect::<Vec<_>>(), vec![new_id, b_id]);
}

#[test]
fn rekey_refuses_taken_id() {
    let mut store = DocStore::new();
    let a = make_item(ItemKind::Note);
    let b = make_item(ItemKind::Note);
    let (a_id, b_id) = (a.id, b.id);
    store.insert(a);
    store.insert(b);
    assert!(!store.rekey(&a_id, b_id));
    assert!(store.get(&a_id).is_some());
}
