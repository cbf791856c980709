use crate::foundation::core::Rect;
use crate::foundation::error::{SnapError, SnapResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::composite::{PremulRgba8, over_in_place};

/// Gaussian blur of one 8-bit coverage plane, clamping at the edges.
pub fn blur_coverage(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> SnapResult<Vec<u8>> {
    let len = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| SnapError::validation("coverage plane size overflow"))?;
    if src.len() != len {
        return Err(SnapError::validation(
            "blur_coverage expects src matching width*height",
        ));
    }
    if radius == 0 || len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    // Each pass blurs rows and writes them transposed, so two passes cover both axes.
    let mut transposed = vec![0u8; len];
    blur_rows_transposed(src, &mut transposed, width as usize, height as usize, &kernel);
    let mut out = vec![0u8; len];
    blur_rows_transposed(&transposed, &mut out, height as usize, width as usize, &kernel);
    Ok(out)
}

/// A tinted, blurred silhouette covering part of the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct ShadowPatch {
    /// Left edge in canvas pixels.
    pub x: u32,
    /// Top edge in canvas pixels.
    pub y: u32,
    /// Patch width.
    pub width: u32,
    /// Patch height.
    pub height: u32,
    /// Premultiplied RGBA8, row-major.
    pub rgba8_premul: Vec<u8>,
}

/// Shadow for what `layer` drew inside `region`.
///
/// The layer's coverage inside `region`, grown by twice the blur radius and clipped to the
/// canvas, is blurred and tinted with `color`. Anything the layer drew outside that window is
/// ignored. `None` when the window misses the canvas.
pub fn shadow_patch(
    layer: &[u8],
    width: u32,
    height: u32,
    region: Rect,
    color: PremulRgba8,
    radius: u32,
    sigma: f32,
) -> SnapResult<Option<ShadowPatch>> {
    if layer.len() != width as usize * height as usize * 4 {
        return Err(SnapError::validation(
            "shadow_patch expects layer matching width*height*4",
        ));
    }
    let pad = f64::from(radius) * 2.0;
    let x0 = (region.x0 - pad).floor().clamp(0.0, f64::from(width)) as u32;
    let y0 = (region.y0 - pad).floor().clamp(0.0, f64::from(height)) as u32;
    let x1 = (region.x1 + pad).ceil().clamp(0.0, f64::from(width)) as u32;
    let y1 = (region.y1 + pad).ceil().clamp(0.0, f64::from(height)) as u32;
    if x1 <= x0 || y1 <= y0 {
        return Ok(None);
    }

    let (pw, ph) = (x1 - x0, y1 - y0);
    let mut coverage = Vec::with_capacity(pw as usize * ph as usize);
    for y in y0..y1 {
        let start = (y as usize * width as usize + x0 as usize) * 4;
        coverage.extend(
            layer[start..start + pw as usize * 4]
                .chunks_exact(4)
                .map(|px| px[3]),
        );
    }
    let coverage = blur_coverage(&coverage, pw, ph, radius, sigma)?;
    let rgba8_premul = coverage
        .iter()
        .flat_map(|&a| color.map(|c| mul_div255_u8(u16::from(c), u16::from(a))))
        .collect();

    Ok(Some(ShadowPatch {
        x: x0,
        y: y0,
        width: pw,
        height: ph,
        rgba8_premul,
    }))
}

impl ShadowPatch {
    /// Source-over this patch onto a canvas buffer `frame_width` pixels wide.
    pub fn composite_onto(&self, frame: &mut [u8], frame_width: u32) -> SnapResult<()> {
        if self.width == 0 || self.height == 0 {
            return Ok(());
        }
        let stride = frame_width as usize * 4;
        let row_len = self.width as usize * 4;
        let fits_x = u64::from(self.x) + u64::from(self.width) <= u64::from(frame_width);
        let fits_y = (self.y as usize + self.height as usize) * stride <= frame.len();
        if !fits_x || !fits_y || self.rgba8_premul.len() != row_len * self.height as usize {
            return Err(SnapError::validation("shadow patch does not fit the frame"));
        }
        for (row, src) in self.rgba8_premul.chunks_exact(row_len).enumerate() {
            let start = (self.y as usize + row) * stride + self.x as usize * 4;
            over_in_place(&mut frame[start..start + row_len], src, 1.0)?;
        }
        Ok(())
    }
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> SnapResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(SnapError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i) * f64::from(i) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();

    let mut q: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Rounding drift goes to the center tap so the kernel sums to exactly 1.0.
    let drift = 65536 - q.iter().map(|&w| i64::from(w)).sum::<i64>();
    let mid = q.len() / 2;
    q[mid] = (i64::from(q[mid]) + drift).clamp(0, 65536) as u32;
    Ok(q)
}

fn blur_rows_transposed(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: &[u32]) {
    let r = k.len() / 2;
    for (y, row) in src.chunks_exact(w).enumerate().take(h) {
        for x in 0..w {
            let acc: u64 = k
                .iter()
                .enumerate()
                .map(|(ki, &kw)| {
                    let sx = (x + ki).saturating_sub(r).min(w - 1);
                    u64::from(kw) * u64::from(row[sx])
                })
                .sum();
            dst[x * h + y] = q16_to_u8(acc);
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/blur.rs"]
mod tests;
