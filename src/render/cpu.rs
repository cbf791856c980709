use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use crate::{
    assets::decode::{PreparedImage, decode_payload},
    assets::payload::Payload,
    fonts::catalog::{FontCatalog, FontReadiness, FontRole, LoadedFont},
    foundation::core::{Affine, Rect, Rgba8Premul},
    foundation::error::{SnapError, SnapResult},
    render::blur::shadow_patch,
    render::composite::{fill, over_in_place},
    render::plan::{ComposePlan, ShadowSpec},
    render::surface::{FrameRGBA, RenderSurface},
    render::text::{ShapedLine, TextShaper},
};

/// Width estimate per character when no caption font could be loaded.
const FALLBACK_ADVANCE_EM: f64 = 0.6;

/// Software [`RenderSurface`] on `vello_cpu`, shaping text with Parley.
///
/// Every layer (shadow, photo, glyph) is rasterized into its own pixmap and composited over the
/// accumulated frame, so shadows can be blurred independently.
pub struct CpuSurface {
    fonts: FontCatalog,
    shaper: TextShaper,
    font_data: HashMap<PathBuf, vello_cpu::peniko::FontData>,
}

impl CpuSurface {
    /// Surface drawing with fonts from `fonts`.
    pub fn new(fonts: FontCatalog) -> Self {
        Self {
            fonts,
            shaper: TextShaper::new(),
            font_data: HashMap::new(),
        }
    }

    fn font_for(&self, role: FontRole) -> Option<Arc<LoadedFont>> {
        match role {
            FontRole::Caption(key) => self.fonts.caption_font(key),
            FontRole::Sticker => self.fonts.sticker_font(),
        }
    }

    fn paint_font(&mut self, font: &LoadedFont) -> vello_cpu::peniko::FontData {
        self.font_data
            .entry(font.path.clone())
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
                    0,
                )
            })
            .clone()
    }

    /// Shape `text`; `None` when no usable font exists for `role`.
    fn shape(
        &mut self,
        role: FontRole,
        text: &str,
        size_px: f32,
    ) -> Option<(ShapedLine, vello_cpu::peniko::FontData)> {
        let font = self.font_for(role)?;
        match self.shaper.shape_line(&font, text, size_px) {
            Ok(line) => Some((line, self.paint_font(&font))),
            Err(e) => {
                tracing::debug!(?role, "text shaping failed: {e}");
                None
            }
        }
    }
}

impl RenderSurface for CpuSurface {
    fn decode_image(&mut self, payload: &Payload) -> SnapResult<PreparedImage> {
        decode_payload(payload)
    }

    fn measure_glyph_width(&mut self, role: FontRole, size_px: f32, text: &str) -> f64 {
        match self.shape(role, text, size_px) {
            Some((line, _)) => line.width,
            None => text.chars().count() as f64 * f64::from(size_px) * FALLBACK_ADVANCE_EM,
        }
    }

    fn wait_font_ready(&mut self, role: FontRole, timeout: Duration) -> FontReadiness {
        self.fonts.wait_ready(role, timeout)
    }

    #[tracing::instrument(skip_all, fields(stickers = plan.stickers.len()))]
    fn rasterize(&mut self, plan: &ComposePlan, photo: &PreparedImage) -> SnapResult<FrameRGBA> {
        let (w, h) = (plan.canvas.width, plan.canvas.height);
        let (w16, h16) = canvas_u16(w, h)?;
        let mut frame = vec![0u8; plan.canvas.rgba8_len()];
        fill(&mut frame, plan.background.to_array());

        let photo_rect = plan.photo_rect;
        let shadow = render_layer(w16, h16, |ctx| {
            ctx.set_paint(color(Rgba8Premul::opaque(0, 0, 0)));
            ctx.fill_rect(&rect_to_cpu(offset_rect(photo_rect, plan.photo_shadow)));
        });
        composite_shadow(
            &mut frame,
            &shadow,
            w,
            h,
            offset_rect(photo_rect, plan.photo_shadow),
            plan.photo_shadow,
        )?;

        let paint = image_paint(photo)?;
        let sx = photo_rect.width() / f64::from(photo.width);
        let sy = photo_rect.height() / f64::from(photo.height);
        let layer = render_layer(w16, h16, |ctx| {
            ctx.set_transform(affine_to_cpu(
                Affine::translate((photo_rect.x0, photo_rect.y0)) * Affine::scale_non_uniform(sx, sy),
            ));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(photo.width),
                f64::from(photo.height),
            ));
        });
        over_in_place(&mut frame, layer.data_as_u8_slice(), 1.0)?;

        for op in &plan.stickers {
            let Some((line, font)) = self.shape(FontRole::Sticker, &op.glyph, op.font_px) else {
                tracing::debug!(glyph = %op.glyph, "sticker skipped: no glyph font");
                continue;
            };
            let origin = (
                op.center.x - line.width / 2.0,
                op.center.y - line.height / 2.0,
            );
            let bounds = Rect::new(
                origin.0,
                origin.1,
                origin.0 + line.width,
                origin.1 + line.height,
            );

            let shadow_origin = (origin.0, origin.1 + plan.sticker_shadow.offset_y);
            let shadow = render_layer(w16, h16, |ctx| {
                draw_glyphs(ctx, &font, &line, op.font_px, shadow_origin, plan.sticker_color);
            });
            composite_shadow(
                &mut frame,
                &shadow,
                w,
                h,
                offset_rect(bounds, plan.sticker_shadow),
                plan.sticker_shadow,
            )?;

            let glyph = render_layer(w16, h16, |ctx| {
                draw_glyphs(ctx, &font, &line, op.font_px, origin, plan.sticker_color);
            });
            over_in_place(&mut frame, glyph.data_as_u8_slice(), 1.0)?;
        }

        if !plan.caption_lines.is_empty() {
            let role = FontRole::Caption(plan.caption_font);
            let mut shaped = Vec::with_capacity(plan.caption_lines.len());
            for cl in &plan.caption_lines {
                match self.shape(role, &cl.text, plan.caption_px) {
                    Some((line, font)) => {
                        shaped.push(((cl.center_x - line.width / 2.0, cl.top_y), line, font));
                    }
                    None => tracing::debug!("caption line skipped: no caption font"),
                }
            }
            let layer = render_layer(w16, h16, |ctx| {
                for (origin, line, font) in &shaped {
                    draw_glyphs(ctx, font, line, plan.caption_px, *origin, plan.caption_color);
                }
            });
            over_in_place(&mut frame, layer.data_as_u8_slice(), 1.0)?;
        }

        Ok(FrameRGBA {
            width: w,
            height: h,
            data: frame,
            premultiplied: true,
        })
    }
}

fn canvas_u16(w: u32, h: u32) -> SnapResult<(u16, u16)> {
    let w16: u16 = w
        .try_into()
        .map_err(|_| SnapError::validation("canvas width exceeds u16"))?;
    let h16: u16 = h
        .try_into()
        .map_err(|_| SnapError::validation("canvas height exceeds u16"))?;
    Ok((w16, h16))
}

fn render_layer(
    w: u16,
    h: u16,
    draw: impl FnOnce(&mut vello_cpu::RenderContext),
) -> vello_cpu::Pixmap {
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    draw(&mut ctx);
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    pixmap
}

/// Blur the silhouette `layer` drew around `bounds` into the shadow color and lay it under what
/// follows.
fn composite_shadow(
    frame: &mut [u8],
    layer: &vello_cpu::Pixmap,
    w: u32,
    h: u32,
    bounds: Rect,
    spec: ShadowSpec,
) -> SnapResult<()> {
    let patch = shadow_patch(
        layer.data_as_u8_slice(),
        w,
        h,
        bounds,
        spec.color.to_array(),
        spec.blur_px,
        spec.sigma(),
    )?;
    match patch {
        Some(patch) => patch.composite_onto(frame, w),
        None => Ok(()),
    }
}

fn draw_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    line: &ShapedLine,
    size_px: f32,
    origin: (f64, f64),
    fill: Rgba8Premul,
) {
    ctx.set_transform(vello_cpu::kurbo::Affine::translate(origin));
    ctx.set_paint(color(fill));
    let glyphs = line
        .glyphs
        .iter()
        .map(|&(id, x, y)| vello_cpu::Glyph { id, x, y });
    ctx.glyph_run(font).font_size(size_px).fill_glyphs(glyphs);
}

fn offset_rect(r: Rect, spec: ShadowSpec) -> Rect {
    Rect::new(r.x0, r.y0 + spec.offset_y, r.x1, r.y1 + spec.offset_y)
}

fn color(c: Rgba8Premul) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn image_paint(img: &PreparedImage) -> SnapResult<vello_cpu::Image> {
    let w: u16 = img
        .width
        .try_into()
        .map_err(|_| SnapError::validation("image width exceeds u16"))?;
    let h: u16 = img
        .height
        .try_into()
        .map_err(|_| SnapError::validation("image height exceeds u16"))?;
    if img.rgba8_premul.len() != img.width as usize * img.height as usize * 4 {
        return Err(SnapError::validation("prepared image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(img.width as usize * img.height as usize);
    for px in img.rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}
