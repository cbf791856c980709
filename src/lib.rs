//! snapbook is an annotated daily photo journal engine.
//!
//! Each journal *category* keeps a photo per day (or several), decorated with glyph stickers and a
//! caption, composited into a 900x1200 "polaroid" JPEG.
//!
//! # Pipeline overview
//!
//! 1. **Ingest**: raw photo bytes are bounded to a longer side and re-encoded ([`ingest`]).
//! 2. **Edit**: an [`EditorSession`] places, drags and scales stickers on an in-memory copy.
//! 3. **Compose**: [`plan_compose`] resolves geometry; a [`RenderSurface`] (the CPU one by
//!    default) draws it and the [`Compositor`] encodes the result.
//! 4. **Persist**: [`SnapCategory`] commits through [`SnapStore`], which writes the canonical day
//!    calendar, a mirror of today and a metadata-only legacy list, degrading data through the
//!    [`QuotaWriter`] relief ladder when the backing [`KvStore`] is full.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Calendar first**: the day calendar is the source of truth; everything else is derived.
//! - **Premultiplied RGBA8** inside the renderer.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod category;
mod config;
mod context;
mod editor;
mod fonts;
mod foundation;
mod model;
mod render;
mod store;

pub use assets::decode::{PreparedImage, decode_image, decode_payload, payload_dimensions};
pub use assets::ingest::{
    INGEST_QUALITY, encode_premul_rgba8_jpeg, ingest, ingest_with_quality, reencode,
};
pub use assets::payload::Payload;
pub use category::{CategoryConfig, SnapCategory, SnapFile, SnapView, Subscriber};
pub use config::SnapConfig;
pub use context::SnapContext;
pub use editor::palette::{PALETTE, PaletteCategory};
pub use editor::session::{
    EditorSession, EditorState, PlacedSticker, STAGE_STICKER_PX, SessionSeed, StickerId,
};
pub use fonts::catalog::{FontCatalog, FontReadiness, FontRole, LoadedFont};
pub use fonts::options::{FONT_OPTIONS, FontKey, FontOption, STICKER_FONT_FILES};
pub use foundation::clock::{Clock, DayKey, FixedClock, SystemClock};
pub use foundation::core::{Affine, Canvas, EditingFrame, Point, Rect, Rgba8Premul, Vec2};
pub use foundation::error::{SnapError, SnapResult};
pub use model::snap::{
    CalendarMap, LegacyMeta, LegacyRecord, MAX_STICKER_SCALE, MIN_STICKER_SCALE, Snap, Sticker,
    TodayMirror, clamp_scale,
};
pub use render::blur::{ShadowPatch, blur_coverage, shadow_patch};
pub use render::composite::{PremulRgba8, over, over_in_place};
pub use render::compositor::{Compositor, DEFAULT_FONT_WAIT};
pub use render::cpu::CpuSurface;
pub use render::plan::{
    CANVAS_HEIGHT, CANVAS_WIDTH, CAPTION_BAND, CAPTION_GAP, CAPTION_LINE_HEIGHT, CAPTION_SIZE_PX,
    CONTENT_HEIGHT, CONTENT_WIDTH, CaptionLine, ComposePlan, ComposeRequest, MARGIN,
    STICKER_BASE_PX, ShadowSpec, StickerOp, map_to_photo, photo_rect, plan_compose, wrap_chars,
};
pub use render::surface::{FrameRGBA, RenderSurface};
pub use store::kv::{FileKvStore, InMemoryKvStore, KvStore};
pub use store::quota::{QuotaWriter, ReliefStage, ScopedValue, WriteOutcome};
pub use store::schema::{CategoryKeys, MigrationReport, SCHEMA_VERSION, SnapStore};
