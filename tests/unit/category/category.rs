use std::{cell::RefCell, io::Cursor, rc::Rc, sync::Arc};

use super::*;
use crate::{
    assets::payload::Payload,
    config::SnapConfig,
    fonts::catalog::FontCatalog,
    foundation::clock::FixedClock,
    store::kv::InMemoryKvStore,
};

fn ctx() -> (SnapContext, FixedClock) {
    let clock = FixedClock::new("2024-06-01", 1_717_200_000_000).unwrap();
    let ctx = SnapContext::from_parts(
        SnapConfig::default(),
        FontCatalog::empty(),
        Arc::new(clock.clone()),
    );
    (ctx, clock)
}

fn snap(ts: i64, caption: &str) -> Snap {
    Snap {
        raster_payload: Payload::from_jpeg_bytes(&[0xff, 0xd8, 0xff, ts as u8]),
        base_payload: Payload::from_jpeg_bytes(&[0xff, 0xd8, 0xff, 0]),
        caption: caption.to_string(),
        caption_font_key: Default::default(),
        stickers: Vec::new(),
        editing_frame: None,
        timestamp: ts,
    }
}

fn captions(items: &[Snap]) -> Vec<&str> {
    items.iter().map(|s| s.caption.as_str()).collect()
}

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(w, h, image::Rgb([200, 10, 10]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn invalid_category_keys_are_rejected() {
    let (ctx, _) = ctx();
    assert!(SnapCategory::init(&ctx, InMemoryKvStore::new(), CategoryConfig::new("")).is_err());
    assert!(
        SnapCategory::init(&ctx, InMemoryKvStore::new(), CategoryConfig::new("a:b")).is_err()
    );
}

#[test]
fn multi_category_prepends_and_edits_in_place() {
    let (ctx, _) = ctx();
    let mut cat = SnapCategory::init(
        &ctx,
        InMemoryKvStore::new(),
        CategoryConfig::new("events").single(false),
    )
    .unwrap();
    assert!(!cat.has_snap().unwrap());
    assert!(!cat.needs_replace_confirmation().unwrap());

    cat.commit_new(snap(1, "first")).unwrap();
    let items = cat.commit_new(snap(2, "second")).unwrap();
    assert_eq!(captions(&items), vec!["second", "first"]);

    assert!(cat.commit_edit(1, snap(3, "first edited")).unwrap());
    assert_eq!(captions(&cat.items().unwrap()), vec!["second", "first edited"]);

    assert!(!cat.commit_edit(5, snap(4, "ghost")).unwrap());
    assert!(!cat.delete(5).unwrap());
    assert!(cat.delete(0).unwrap());
    assert_eq!(captions(&cat.items().unwrap()), vec!["first edited"]);
}

#[test]
fn single_category_replaces_and_truncates_on_load() {
    let (ctx, _) = ctx();
    let mut store = InMemoryKvStore::new();
    // An older client left three snaps for today.
    {
        let mut s = SnapStore::new(&mut store, ctx.clock());
        s.commit_today("mood", vec![snap(3, "c"), snap(2, "b"), snap(1, "a")])
            .unwrap();
    }
    let mut cat = SnapCategory::init(&ctx, store, CategoryConfig::new("mood")).unwrap();
    assert_eq!(captions(&cat.items().unwrap()), vec!["c"]);
    let cal = cat.store().load_calendar("mood").unwrap();
    assert_eq!(cal.values().next().unwrap().len(), 1);

    assert!(cat.needs_replace_confirmation().unwrap());
    let items = cat.commit_new(snap(9, "new")).unwrap();
    assert_eq!(captions(&items), vec!["new"]);
}

#[test]
fn subscribers_run_after_commits_and_are_isolated() {
    let (ctx, _) = ctx();
    let mut cat =
        SnapCategory::init(&ctx, InMemoryKvStore::new(), CategoryConfig::new("x")).unwrap();
    let hits = Rc::new(RefCell::new(0));
    cat.on_change(|| anyhow::bail!("subscriber broke"));
    cat.on_change(|| panic!("subscriber exploded"));
    let h = Rc::clone(&hits);
    cat.on_change(move || {
        *h.borrow_mut() += 1;
        Ok(())
    });

    cat.reload().unwrap();
    assert_eq!(*hits.borrow(), 0);
    cat.commit_new(snap(1, "a")).unwrap();
    cat.delete(0).unwrap();
    cat.delete(0).unwrap();
    assert_eq!(*hits.borrow(), 2);
}

struct RecordingView(Rc<RefCell<Vec<usize>>>);

impl SnapView for RecordingView {
    fn render(&mut self, items: &[Snap]) {
        self.0.borrow_mut().push(items.len());
    }
}

#[test]
fn view_and_render_callback_follow_every_render() {
    let (ctx, _) = ctx();
    let renders = Rc::new(RefCell::new(Vec::new()));
    let flags = Rc::new(RefCell::new(Vec::new()));
    let f = Rc::clone(&flags);
    let cfg = CategoryConfig::new("v")
        .single(false)
        .view(RecordingView(Rc::clone(&renders)))
        .on_render(move |any| f.borrow_mut().push(any));
    let mut cat = SnapCategory::init(&ctx, InMemoryKvStore::new(), cfg).unwrap();
    cat.commit_new(snap(1, "a")).unwrap();
    cat.commit_new(snap(2, "b")).unwrap();
    assert_eq!(*renders.borrow(), vec![0, 1, 2]);
    assert_eq!(*flags.borrow(), vec![false, true, true]);
}

#[test]
fn latest_as_file_returns_newest_payload() {
    let (ctx, _) = ctx();
    let mut cat = SnapCategory::init(
        &ctx,
        InMemoryKvStore::new(),
        CategoryConfig::new("f").single(false),
    )
    .unwrap();
    assert!(cat.latest_as_file("image/jpeg", "snap.jpg").is_none());

    cat.commit_new(snap(1, "old")).unwrap();
    cat.commit_new(snap(2, "new")).unwrap();
    let file = cat.latest_as_file("image/jpeg", "snap.jpg").unwrap();
    assert_eq!(file.name, "snap.jpg");
    assert_eq!(file.mime, "image/jpeg");
    assert_eq!(file.bytes, vec![0xff, 0xd8, 0xff, 2]);

    let mut evicted = snap(3, "evicted");
    evicted.evict_payloads();
    cat.commit_new(evicted).unwrap();
    assert!(cat.latest_as_file("image/jpeg", "snap.jpg").is_none());
}

#[test]
fn capture_rejects_unreadable_photos_without_writing() {
    let (ctx, _) = ctx();
    let mut cat =
        SnapCategory::init(&ctx, InMemoryKvStore::new(), CategoryConfig::new("c")).unwrap();
    let before = cat.store().store().keys().unwrap();
    let err = cat.begin_capture(b"garbage").unwrap_err();
    assert!(matches!(err, SnapError::Decode(_)));
    assert_eq!(cat.store().store().keys().unwrap(), before);
    assert!(!cat.has_snap().unwrap());
}

#[test]
fn capture_sizes_stage_to_photo_aspect() {
    let (ctx, _) = ctx();
    let cat = SnapCategory::init(
        &ctx,
        InMemoryKvStore::new(),
        CategoryConfig::new("c").ingest_max_side(400),
    )
    .unwrap();
    let session = cat.begin_capture(&png(800, 400)).unwrap();
    let frame = session.frame();
    assert!((frame.width / frame.height - 2.0).abs() < 0.01);
    assert!(frame.width <= 840.0 && frame.height <= 600.0);
}

#[test]
fn begin_edit_restores_seed_and_ignores_stale_index() {
    let (ctx, _) = ctx();
    let mut cat = SnapCategory::init(
        &ctx,
        InMemoryKvStore::new(),
        CategoryConfig::new("e").single(false),
    )
    .unwrap();
    assert!(cat.begin_edit(0).unwrap().is_none());

    let mut s = snap(1, "caption");
    s.base_payload = Payload::from_bytes("image/png", &png(40, 30));
    s.raster_payload = s.base_payload.clone();
    cat.commit_new(s).unwrap();
    let session = cat.begin_edit(0).unwrap().unwrap();
    assert_eq!(session.caption(), "caption");
}
