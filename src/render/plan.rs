use crate::{
    assets::payload::Payload,
    fonts::options::FontKey,
    foundation::core::{Canvas, EditingFrame, Point, Rect, Rgba8Premul},
    model::snap::Sticker,
};

/// Output canvas width.
pub const CANVAS_WIDTH: u32 = 900;
/// Output canvas height.
pub const CANVAS_HEIGHT: u32 = 1200;
/// White border around the content box.
pub const MARGIN: f64 = 40.0;
/// Height reserved for the caption at the bottom.
pub const CAPTION_BAND: f64 = 160.0;
/// Width of the box the photo is letterboxed into.
pub const CONTENT_WIDTH: f64 = CANVAS_WIDTH as f64 - 2.0 * MARGIN;
/// Height of the box the photo is letterboxed into.
pub const CONTENT_HEIGHT: f64 = CANVAS_HEIGHT as f64 - 2.0 * MARGIN - CAPTION_BAND;

/// Sticker glyph size at scale 1.
pub const STICKER_BASE_PX: f64 = 64.0;
/// Caption font size.
pub const CAPTION_SIZE_PX: f32 = 28.0;
/// Distance between caption line tops.
pub const CAPTION_LINE_HEIGHT: f64 = 34.0;
/// Gap between the content box and the first caption line.
pub const CAPTION_GAP: f64 = 18.0;

/// Everything needed to render one snap.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposeRequest {
    /// Un-annotated photo.
    pub base: Payload,
    /// Caption text; empty draws nothing.
    pub caption: String,
    /// Stickers in z order.
    pub stickers: Vec<Sticker>,
    /// Frame the sticker coordinates were recorded in; `None` means the content box.
    pub frame: Option<EditingFrame>,
    /// Caption font.
    pub font_key: FontKey,
}

/// A blurred, offset silhouette drawn beneath a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSpec {
    /// Shadow color.
    pub color: Rgba8Premul,
    /// Blur extent in pixels (canvas-style `shadowBlur`).
    pub blur_px: u32,
    /// Vertical offset in pixels.
    pub offset_y: f64,
}

impl ShadowSpec {
    /// Gaussian sigma matching the blur extent.
    pub fn sigma(self) -> f32 {
        self.blur_px as f32 / 2.0
    }
}

/// One sticker glyph, centered on `center`.
#[derive(Clone, Debug, PartialEq)]
pub struct StickerOp {
    /// Display symbol.
    pub glyph: String,
    /// Center in canvas pixels.
    pub center: Point,
    /// Font size in pixels, already scaled and rounded.
    pub font_px: f32,
}

/// One wrapped caption line, horizontally centered on `center_x`.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLine {
    /// Line text.
    pub text: String,
    /// Horizontal center.
    pub center_x: f64,
    /// Top of the line box.
    pub top_y: f64,
}

/// Resolved geometry for one composite; backends only draw what it says.
#[derive(Clone, Debug, PartialEq)]
pub struct ComposePlan {
    /// Output size.
    pub canvas: Canvas,
    /// Fill behind everything.
    pub background: Rgba8Premul,
    /// Where the photo lands.
    pub photo_rect: Rect,
    /// Shadow under the photo.
    pub photo_shadow: ShadowSpec,
    /// Stickers in draw order.
    pub stickers: Vec<StickerOp>,
    /// Fill for sticker glyphs.
    pub sticker_color: Rgba8Premul,
    /// Shadow under each sticker.
    pub sticker_shadow: ShadowSpec,
    /// Wrapped caption.
    pub caption_lines: Vec<CaptionLine>,
    /// Caption font.
    pub caption_font: FontKey,
    /// Caption size.
    pub caption_px: f32,
    /// Caption fill.
    pub caption_color: Rgba8Premul,
}

/// Letterbox a `w x h` photo into the content box, centered. Scales up as well as down.
pub fn photo_rect(w: u32, h: u32) -> Rect {
    let (w, h) = (f64::from(w.max(1)), f64::from(h.max(1)));
    let s = (CONTENT_WIDTH / w).min(CONTENT_HEIGHT / h);
    let (dw, dh) = (w * s, h * s);
    let x0 = (f64::from(CANVAS_WIDTH) - dw) / 2.0;
    let y0 = MARGIN + (CONTENT_HEIGHT - dh) / 2.0;
    Rect::new(x0, y0, x0 + dw, y0 + dh)
}

/// Map a point from editing-frame space onto the photo rect.
pub fn map_to_photo(x: f64, y: f64, frame: EditingFrame, photo: Rect) -> Point {
    Point::new(
        photo.x0 + (x / frame.width) * photo.width(),
        photo.y0 + (y / frame.height) * photo.height(),
    )
}

/// Break `text` into lines no wider than `max_width`, one character at a time.
///
/// A line is closed before the character that would overflow it; the first character always
/// stays on the first line even when it alone is too wide.
pub fn wrap_chars(text: &str, max_width: f64, mut measure: impl FnMut(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for (i, ch) in text.chars().enumerate() {
        let mut candidate = line.clone();
        candidate.push(ch);
        if i > 0 && measure(&candidate) > max_width {
            lines.push(std::mem::take(&mut line));
            line.push(ch);
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Resolve all geometry for `req` given the decoded photo size.
///
/// `measure` returns the rendered width of a caption string in the caption font.
pub fn plan_compose(
    req: &ComposeRequest,
    photo_w: u32,
    photo_h: u32,
    measure: impl FnMut(&str) -> f64,
) -> ComposePlan {
    let photo = photo_rect(photo_w, photo_h);
    let frame = req
        .frame
        .unwrap_or(EditingFrame::new(CONTENT_WIDTH, CONTENT_HEIGHT))
        .sanitized((CONTENT_WIDTH, CONTENT_HEIGHT));

    let stickers = req
        .stickers
        .iter()
        .map(|st| StickerOp {
            glyph: st.glyph.clone(),
            center: map_to_photo(st.x, st.y, frame, photo),
            font_px: (STICKER_BASE_PX * st.scale).round().max(1.0) as f32,
        })
        .collect();

    let top = MARGIN + CONTENT_HEIGHT + CAPTION_GAP;
    let center_x = f64::from(CANVAS_WIDTH) / 2.0;
    let caption_lines = wrap_chars(&req.caption, CONTENT_WIDTH, measure)
        .into_iter()
        .enumerate()
        .map(|(i, text)| CaptionLine {
            text,
            center_x,
            top_y: top + i as f64 * CAPTION_LINE_HEIGHT,
        })
        .collect();

    ComposePlan {
        canvas: Canvas {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
        },
        background: Rgba8Premul::opaque(255, 255, 255),
        photo_rect: photo,
        photo_shadow: ShadowSpec {
            color: Rgba8Premul::shadow(0.18),
            blur_px: 16,
            offset_y: 8.0,
        },
        stickers,
        sticker_color: Rgba8Premul::opaque(255, 255, 255),
        sticker_shadow: ShadowSpec {
            color: Rgba8Premul::shadow(0.35),
            blur_px: 6,
            offset_y: 3.0,
        },
        caption_lines,
        caption_font: req.font_key,
        caption_px: CAPTION_SIZE_PX,
        caption_color: Rgba8Premul::opaque(0x22, 0x22, 0x22),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/plan.rs"]
mod tests;
