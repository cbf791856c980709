use std::time::Duration;

use crate::{
    assets::ingest::{INGEST_QUALITY, encode_premul_rgba8_jpeg},
    assets::payload::Payload,
    fonts::catalog::{FontReadiness, FontRole},
    foundation::error::{SnapError, SnapResult},
    render::plan::{CAPTION_SIZE_PX, ComposeRequest, plan_compose},
    render::surface::{FrameRGBA, RenderSurface},
};

/// Default bound on the caption font wait.
pub const DEFAULT_FONT_WAIT: Duration = Duration::from_millis(3500);

/// Turns a [`ComposeRequest`] into an encoded 900x1200 JPEG.
pub struct Compositor<R> {
    surface: R,
    font_wait: Duration,
    quality: f32,
}

impl<R: RenderSurface> Compositor<R> {
    /// Compositor with the default font wait and output quality.
    pub fn new(surface: R) -> Self {
        Self {
            surface,
            font_wait: DEFAULT_FONT_WAIT,
            quality: INGEST_QUALITY,
        }
    }

    /// Override the font wait bound.
    pub fn with_font_wait(mut self, font_wait: Duration) -> Self {
        self.font_wait = font_wait;
        self
    }

    /// Override the JPEG quality in `(0, 1]`.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Underlying surface.
    pub fn surface(&self) -> &R {
        &self.surface
    }

    /// Render `req`.
    ///
    /// Waits (bounded) for the caption font first; a timeout only degrades metrics. A photo that
    /// fails to decode is a [`SnapError::Decode`].
    #[tracing::instrument(skip_all, fields(stickers = req.stickers.len(), font = %req.font_key))]
    pub fn compose(&mut self, req: &ComposeRequest) -> SnapResult<Payload> {
        let role = FontRole::Caption(req.font_key);
        match self.surface.wait_font_ready(role, self.font_wait) {
            FontReadiness::Ready => {}
            FontReadiness::TimedOut => {
                tracing::warn!(
                    wait_ms = self.font_wait.as_millis() as u64,
                    "caption font not ready, composing anyway"
                );
            }
            FontReadiness::Unavailable => {
                tracing::warn!("caption font unavailable, using fallback metrics");
            }
        }

        let photo = self.surface.decode_image(&req.base)?;
        let surface = &mut self.surface;
        let plan = plan_compose(req, photo.width, photo.height, |text| {
            surface.measure_glyph_width(role, CAPTION_SIZE_PX, text)
        });
        let frame = self.surface.rasterize(&plan, &photo)?;
        let bytes = encode_frame_jpeg(&frame, self.quality)?;
        tracing::debug!(out_len = bytes.len(), "composed snap");
        Ok(Payload::from_jpeg_bytes(&bytes))
    }
}

fn encode_frame_jpeg(frame: &FrameRGBA, quality: f32) -> SnapResult<Vec<u8>> {
    if frame.premultiplied {
        return encode_premul_rgba8_jpeg(frame.width, frame.height, &frame.data, quality);
    }
    // Opaque straight pixels are already premultiplied.
    if frame.data.chunks_exact(4).any(|px| px[3] != 255) {
        return Err(SnapError::validation(
            "straight-alpha frames must be opaque to encode",
        ));
    }
    encode_premul_rgba8_jpeg(frame.width, frame.height, &frame.data, quality)
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
