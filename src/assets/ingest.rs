use image::{DynamicImage, GenericImageView as _, codecs::jpeg::JpegEncoder, imageops::FilterType};

use crate::{
    assets::payload::Payload,
    foundation::error::{SnapError, SnapResult},
    foundation::math::{fit_scale, unpremul_u8},
};

/// JPEG quality used when a photo is first captured.
pub const INGEST_QUALITY: f32 = 0.92;

/// Decode raw photo bytes, bound the longer side to `max_side` and re-encode as JPEG.
///
/// Decode failures surface as [`SnapError::Decode`] so the caller can tell the user; nothing is
/// written on that path.
#[tracing::instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn ingest(raw: &[u8], max_side: u32) -> SnapResult<Payload> {
    ingest_with_quality(raw, max_side, INGEST_QUALITY)
}

/// [`ingest`] with an explicit JPEG quality in `(0, 1]`.
pub fn ingest_with_quality(raw: &[u8], max_side: u32, quality: f32) -> SnapResult<Payload> {
    if max_side == 0 {
        return Err(SnapError::validation("ingest max_side must be > 0"));
    }
    let img = image::load_from_memory(raw)
        .map_err(|e| SnapError::decode(format!("unreadable photo: {e}")))?;
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(SnapError::decode("photo has zero dimensions"));
    }
    let scaled = scale_to_fit(img, max_side);
    let bytes = encode_jpeg(&scaled, quality)?;
    tracing::debug!(
        src_w = w,
        src_h = h,
        out_w = scaled.width(),
        out_h = scaled.height(),
        out_len = bytes.len(),
        "ingested photo"
    );
    Ok(Payload::from_jpeg_bytes(&bytes))
}

/// Scale down and recompress an already-encoded payload.
///
/// Used only by storage relief. Any failure (empty payload, corrupt data, encoder error) yields
/// `None` and the caller keeps the original.
pub fn reencode(payload: &Payload, max_side: u32, quality: f32) -> Option<Payload> {
    if payload.is_empty() || max_side == 0 {
        return None;
    }
    let bytes = payload.to_bytes().ok()?;
    let img = image::load_from_memory(&bytes).ok()?;
    let scaled = scale_to_fit(img, max_side);
    let out = encode_jpeg(&scaled, quality).ok()?;
    Some(Payload::from_jpeg_bytes(&out))
}

/// Encode a premultiplied RGBA8 buffer as JPEG (alpha is dropped after unpremultiplying).
pub fn encode_premul_rgba8_jpeg(
    width: u32,
    height: u32,
    rgba8_premul: &[u8],
    quality: f32,
) -> SnapResult<Vec<u8>> {
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(SnapError::validation(
            "encode_premul_rgba8_jpeg expects width*height*4 bytes",
        ));
    }
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        rgb.push(unpremul_u8(px[0], a));
        rgb.push(unpremul_u8(px[1], a));
        rgb.push(unpremul_u8(px[2], a));
    }
    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| SnapError::validation("rgb buffer does not match dimensions"))?;
    encode_jpeg(&DynamicImage::ImageRgb8(img), quality)
}

fn scale_to_fit(img: DynamicImage, max_side: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    let s = fit_scale(w, h, max_side);
    if s >= 1.0 {
        return img;
    }
    let nw = ((f64::from(w) * s).round() as u32).max(1);
    let nh = ((f64::from(h) * s).round() as u32).max(1);
    img.resize_exact(nw, nh, FilterType::Triangle)
}

fn encode_jpeg(img: &DynamicImage, quality: f32) -> SnapResult<Vec<u8>> {
    let q = (quality.clamp(0.01, 1.0) * 100.0).round() as u8;
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let mut enc = JpegEncoder::new_with_quality(&mut buf, q.max(1));
    enc.encode_image(&rgb)
        .map_err(|e| SnapError::Other(anyhow::anyhow!("jpeg encode failed: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/ingest.rs"]
mod tests;
