use super::*;
use crate::{
    assets::payload::Payload, foundation::clock::FixedClock, foundation::error::SnapError,
    store::kv::InMemoryKvStore,
};

const CAT: &str = "events";

fn snap(ts: i64, caption: &str) -> Snap {
    Snap {
        raster_payload: Payload::from_jpeg_bytes(&[0xff, 0xd8, ts as u8]),
        base_payload: Payload::from_jpeg_bytes(&[0xff, 0xd8, ts as u8]),
        caption: caption.to_string(),
        caption_font_key: Default::default(),
        stickers: Vec::new(),
        editing_frame: None,
        timestamp: ts,
    }
}

fn store_at(day: &str) -> (SnapStore<InMemoryKvStore>, FixedClock) {
    let clock = FixedClock::new(day, 1_700_000_000_000).unwrap();
    (
        SnapStore::new(InMemoryKvStore::new(), Arc::new(clock.clone())),
        clock,
    )
}

fn seed_legacy(store: &mut SnapStore<InMemoryKvStore>) {
    let json = r#"[
        {"data":"data:image/jpeg;base64,/9gB","caption":"b","captionFontKey":"yomogi","ts":2,
         "stickers":[{"text":"🐱","x":10,"y":20,"scale":1.5}],"frame":{"w":320,"h":240}},
        {"data":"data:image/jpeg;base64,/9gA","caption":"a","ts":1}
    ]"#;
    store
        .store_mut()
        .set(&CategoryKeys::new(CAT).legacy, json)
        .unwrap();
}

#[test]
fn keys_follow_category_namespace() {
    let k = CategoryKeys::new("moods");
    assert_eq!(k.legacy, "snaps:moods");
    assert_eq!(k.calendar, "snaps:moods:calendar");
    assert_eq!(k.today, "snaps:moods:today");
    assert_eq!(k.schema, "snaps:moods:schema");
}

#[test]
fn migration_moves_legacy_records_into_today_once() {
    let (mut store, _clock) = store_at("2024-05-01");
    seed_legacy(&mut store);

    let first = store.migrate_if_needed(CAT).unwrap();
    assert_eq!(first.from_version, 0);
    assert_eq!(first.imported, 2);

    let cal = store.load_calendar(CAT).unwrap();
    let today = cal.get(&DayKey::parse("2024-05-01").unwrap()).unwrap();
    assert_eq!(today.len(), 2);
    assert_eq!(today[0].caption, "b");
    assert_eq!(today[0].stickers[0].glyph, "🐱");
    assert_eq!(today[0].editing_frame.unwrap().width, 320.0);
    assert_eq!(today[0].base_payload, today[0].raster_payload);

    // Legacy list is now metadata only.
    let legacy = store.store().get("snaps:events").unwrap().unwrap();
    assert!(!legacy.contains("base64"));
    assert!(legacy.contains("\"captionFontKey\":\"yomogi\""));
    assert_eq!(store.schema_version(CAT).unwrap(), SCHEMA_VERSION);

    let second = store.migrate_if_needed(CAT).unwrap();
    assert_eq!(second.from_version, SCHEMA_VERSION);
    assert_eq!(second.imported, 0);
    assert_eq!(store.load_calendar(CAT).unwrap(), cal);
}

#[test]
fn migration_rerun_without_marker_does_not_duplicate() {
    let (mut store, _clock) = store_at("2024-05-01");
    seed_legacy(&mut store);
    store.migrate_if_needed(CAT).unwrap();
    let cal = store.load_calendar(CAT).unwrap();

    // Marker lost, original list restored by an older client.
    store.store_mut().remove("snaps:events:schema").unwrap();
    seed_legacy(&mut store);
    let again = store.migrate_if_needed(CAT).unwrap();
    assert_eq!(again.imported, 0);
    assert_eq!(again.skipped, 2);
    assert_eq!(store.load_calendar(CAT).unwrap(), cal);
}

#[test]
fn migration_without_legacy_only_sets_marker() {
    let (mut store, _clock) = store_at("2024-05-01");
    let report = store.migrate_if_needed(CAT).unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(store.store().keys().unwrap(), vec!["snaps:events:schema".to_string()]);
}

#[test]
fn migration_exports_every_calendar_day_to_the_legacy_list() {
    let (mut store, clock) = store_at("2024-04-30");
    store.commit_today(CAT, vec![snap(7, "older")]).unwrap();
    clock.set_today("2024-05-01").unwrap();
    seed_legacy(&mut store);

    store.migrate_if_needed(CAT).unwrap();
    let legacy: Vec<LegacyMeta> =
        serde_json::from_str(&store.store().get("snaps:events").unwrap().unwrap()).unwrap();
    assert_eq!(
        legacy.iter().map(|m| m.ts).collect::<Vec<_>>(),
        vec![7, 2, 1]
    );
}

#[test]
fn day_rollover_rederives_mirror() {
    let (mut store, clock) = store_at("2024-05-01");
    store.commit_today(CAT, vec![snap(1, "may first")]).unwrap();
    assert_eq!(store.ensure_today_mirror(CAT).unwrap().len(), 1);

    clock.set_today("2024-05-02").unwrap();
    assert!(store.ensure_today_mirror(CAT).unwrap().is_empty());
    let mirror: TodayMirror =
        serde_json::from_str(&store.store().get("snaps:events:today").unwrap().unwrap()).unwrap();
    assert_eq!(mirror.date.as_str(), "2024-05-02");
    assert!(mirror.items.is_empty());

    // History is intact.
    let cal = store.load_calendar(CAT).unwrap();
    assert_eq!(cal[&DayKey::parse("2024-05-01").unwrap()][0].caption, "may first");
}

#[test]
fn commit_writes_calendar_mirror_and_metadata_legacy() {
    let (mut store, _clock) = store_at("2024-05-01");
    let items = vec![snap(2, "second"), snap(1, "first")];
    let persisted = store.commit_today(CAT, items.clone()).unwrap();
    assert_eq!(persisted, items);

    let mirror: TodayMirror =
        serde_json::from_str(&store.store().get("snaps:events:today").unwrap().unwrap()).unwrap();
    assert_eq!(mirror.items, items);

    let legacy: Vec<LegacyMeta> =
        serde_json::from_str(&store.store().get("snaps:events").unwrap().unwrap()).unwrap();
    assert_eq!(
        legacy.iter().map(|m| m.ts).collect::<Vec<_>>(),
        vec![2, 1]
    );
}

#[test]
fn committing_empty_list_removes_the_day() {
    let (mut store, _clock) = store_at("2024-05-01");
    store.commit_today(CAT, vec![snap(1, "x")]).unwrap();
    store.commit_today(CAT, Vec::new()).unwrap();
    assert!(store.load_calendar(CAT).unwrap().is_empty());
    assert!(store.ensure_today_mirror(CAT).unwrap().is_empty());
}

struct NoLegacyStore(InMemoryKvStore);

impl KvStore for NoLegacyStore {
    fn get(&self, key: &str) -> SnapResult<Option<String>> {
        self.0.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> SnapResult<()> {
        if key == "snaps:events" {
            return Err(SnapError::storage("read-only legacy key"));
        }
        self.0.set(key, value)
    }

    fn remove(&mut self, key: &str) -> SnapResult<()> {
        self.0.remove(key)
    }

    fn keys(&self) -> SnapResult<Vec<String>> {
        self.0.keys()
    }
}

#[test]
fn legacy_failure_never_aborts_commit() {
    let clock = FixedClock::new("2024-05-01", 0).unwrap();
    let mut store = SnapStore::new(NoLegacyStore(InMemoryKvStore::new()), Arc::new(clock));
    let persisted = store.commit_today(CAT, vec![snap(7, "kept")]).unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(store.ensure_today_mirror(CAT).unwrap()[0].caption, "kept");
}

#[test]
fn mirror_from_an_earlier_day_is_not_returned() {
    let (mut store, clock) = store_at("2024-05-01");
    store.commit_today(CAT, vec![snap(1, "old")]).unwrap();
    clock.set_today("2024-05-03").unwrap();
    let items = store.ensure_today_mirror(CAT).unwrap();
    assert!(items.is_empty());
}
