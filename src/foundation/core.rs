use crate::foundation::error::{SnapError, SnapResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Create a validated canvas with non-zero dimensions.
    pub fn new(width: u32, height: u32) -> SnapResult<Self> {
        if width == 0 || height == 0 {
            return Err(SnapError::validation("Canvas dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Number of bytes in an RGBA8 buffer of this size.
    pub fn rgba8_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Size of the on-screen viewport sticker coordinates were recorded against.
///
/// Coordinates are stored in this space so the compositor can map them proportionally onto the
/// final photo rect, whatever size the editing stage had on screen.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EditingFrame {
    /// Viewport width in CSS-like pixels.
    #[serde(alias = "w")]
    pub width: f64,
    /// Viewport height in CSS-like pixels.
    #[serde(alias = "h")]
    pub height: f64,
}

impl EditingFrame {
    /// Construct a frame without validation.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size an editing stage for an image of `image_w x image_h` so it fits inside
    /// `max_w x max_h` while keeping the image aspect ratio.
    ///
    /// Zero image dimensions fall back to a 3:4 portrait stage.
    pub fn fit(image_w: u32, image_h: u32, max_w: f64, max_h: f64) -> Self {
        let iw = if image_w == 0 { 3.0 } else { f64::from(image_w) };
        let ih = if image_h == 0 { 4.0 } else { f64::from(image_h) };
        let ar = ih / iw;
        let max_w = max_w.max(1.0).floor();
        let max_h = max_h.max(1.0).floor();

        let (w, h) = if ar >= 1.0 {
            let h = max_h.min((max_w * ar).round());
            let w = max_w.min((h / ar).round());
            (w, max_h.min((w * ar).round()))
        } else {
            let w = max_w.min((max_h / ar).round());
            (w, max_h.min((w * ar).round()))
        };
        Self {
            width: w.max(1.0),
            height: h.max(1.0),
        }
    }

    /// Replace non-finite or sub-pixel dimensions so the frame is safe to divide by.
    ///
    /// Missing dimensions (zero, negative, NaN) take the matching `fallback` value.
    pub fn sanitized(self, fallback: (f64, f64)) -> Self {
        fn pick(v: f64, fallback: f64) -> f64 {
            if v.is_finite() && v > 0.0 {
                v.max(1.0)
            } else {
                fallback.max(1.0)
            }
        }
        Self {
            width: pick(self.width, fallback.0),
            height: pick(self.height, fallback.1),
        }
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Opaque color from straight RGB.
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Black at the given opacity in `[0, 1]`.
    pub fn shadow(opacity: f32) -> Self {
        let a = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::from_straight_rgba(0, 0, 0, a)
    }

    /// Channels as an array in RGBA order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
