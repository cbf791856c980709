use std::sync::Arc;

use crate::{
    assets::payload::Payload,
    foundation::error::{SnapError, SnapResult},
};

#[derive(Clone, Debug)]
/// Decoded raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode encoded image bytes (any format the `image` crate sniffs).
pub fn decode_image(bytes: &[u8]) -> SnapResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| SnapError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(SnapError::decode("image has zero dimensions"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Decode a stored payload.
pub fn decode_payload(payload: &Payload) -> SnapResult<PreparedImage> {
    decode_image(&payload.to_bytes()?)
}

/// Pixel size of a stored payload, read from the image header only.
pub fn payload_dimensions(payload: &Payload) -> SnapResult<(u32, u32)> {
    let bytes = payload.to_bytes()?;
    let (w, h) = image::ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| SnapError::decode(format!("sniff image format: {e}")))?
        .into_dimensions()
        .map_err(|e| SnapError::decode(format!("read image header: {e}")))?;
    if w == 0 || h == 0 {
        return Err(SnapError::decode("image has zero dimensions"));
    }
    Ok((w, h))
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
