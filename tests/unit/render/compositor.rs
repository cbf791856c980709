use std::io::Cursor;

use image::GenericImageView;

use super::*;
use crate::{
    assets::decode::{PreparedImage, decode_payload},
    fonts::options::FontKey,
    render::plan::ComposePlan,
};

#[derive(Default)]
struct RecordingSurface {
    waited: Vec<(FontRole, Duration)>,
    readiness: Option<FontReadiness>,
    measured: usize,
    plans: Vec<ComposePlan>,
}

impl RenderSurface for RecordingSurface {
    fn decode_image(&mut self, payload: &Payload) -> SnapResult<PreparedImage> {
        decode_payload(payload)
    }

    fn measure_glyph_width(&mut self, _role: FontRole, size_px: f32, text: &str) -> f64 {
        self.measured += 1;
        text.chars().count() as f64 * f64::from(size_px)
    }

    fn wait_font_ready(&mut self, role: FontRole, timeout: Duration) -> FontReadiness {
        self.waited.push((role, timeout));
        self.readiness.unwrap_or(FontReadiness::Ready)
    }

    fn rasterize(&mut self, plan: &ComposePlan, _photo: &PreparedImage) -> SnapResult<FrameRGBA> {
        self.plans.push(plan.clone());
        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: plan.background.to_array().repeat(plan.canvas.rgba8_len() / 4),
            premultiplied: true,
        })
    }
}

fn photo_payload() -> Payload {
    let img = image::RgbImage::from_pixel(64, 48, image::Rgb([10, 120, 200]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    Payload::from_bytes("image/png", &buf)
}

fn request(base: Payload) -> ComposeRequest {
    ComposeRequest {
        base,
        caption: "hello".to_string(),
        stickers: Vec::new(),
        frame: None,
        font_key: FontKey::Sawarabi,
    }
}

#[test]
fn waits_for_caption_font_then_encodes_full_canvas() {
    let mut c = Compositor::new(RecordingSurface::default()).with_font_wait(Duration::from_millis(5));
    let out = c.compose(&request(photo_payload())).unwrap();

    assert_eq!(
        c.surface().waited,
        vec![(FontRole::Caption(FontKey::Sawarabi), Duration::from_millis(5))]
    );
    assert!(c.surface().measured > 0);
    assert_eq!(c.surface().plans[0].caption_lines.len(), 1);

    assert_eq!(out.mime(), Some("image/jpeg"));
    let decoded = image::load_from_memory(&out.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded.dimensions(), (900, 1200));
}

#[test]
fn font_timeout_is_not_an_error() {
    let surface = RecordingSurface {
        readiness: Some(FontReadiness::TimedOut),
        ..RecordingSurface::default()
    };
    let mut c = Compositor::new(surface);
    assert!(c.compose(&request(photo_payload())).is_ok());
}

#[test]
fn undecodable_photo_is_a_decode_error_and_draws_nothing() {
    let mut c = Compositor::new(RecordingSurface::default());
    let err = c
        .compose(&request(Payload::from_jpeg_bytes(b"not a jpeg")))
        .unwrap_err();
    assert!(matches!(err, SnapError::Decode(_)));
    assert!(c.surface().plans.is_empty());
}

#[test]
fn translucent_straight_frames_are_rejected() {
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![1, 2, 3, 4],
        premultiplied: false,
    };
    assert!(encode_frame_jpeg(&frame, 0.9).is_err());
}
