use std::time::Duration;

use crate::{
    assets::decode::PreparedImage,
    assets::payload::Payload,
    fonts::catalog::{FontReadiness, FontRole},
    foundation::error::SnapResult,
    render::plan::ComposePlan,
};

#[derive(Clone, Debug)]
/// CPU-readable RGBA8 frame.
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major RGBA8 layout.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied by alpha.
    pub premultiplied: bool,
}

/// What the compositor needs from a drawing backend.
///
/// Geometry is decided by [`crate::render::plan::plan_compose`]; a surface only decodes, measures
/// and draws.
pub trait RenderSurface {
    /// Decode a stored photo.
    fn decode_image(&mut self, payload: &Payload) -> SnapResult<PreparedImage>;

    /// Rendered width of `text` in the font for `role` at `size_px`.
    fn measure_glyph_width(&mut self, role: FontRole, size_px: f32, text: &str) -> f64;

    /// Block until the font for `role` is usable or `timeout` elapses.
    fn wait_font_ready(&mut self, role: FontRole, timeout: Duration) -> FontReadiness;

    /// Draw `plan` with `photo` into a frame of `plan.canvas` size.
    fn rasterize(&mut self, plan: &ComposePlan, photo: &PreparedImage) -> SnapResult<FrameRGBA>;
}
