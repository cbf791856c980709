pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Undo premultiplication for one channel, rounding to nearest.
pub(crate) fn unpremul_u8(c: u8, a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    let v = (u32::from(c) * 255 + u32::from(a) / 2) / u32::from(a);
    v.min(255) as u8
}

/// Uniform scale factor that makes the longer side of `w x h` at most `max_side`; never upscales.
pub(crate) fn fit_scale(w: u32, h: u32, max_side: u32) -> f64 {
    let longest = w.max(h);
    if longest == 0 {
        return 1.0;
    }
    (f64::from(max_side) / f64::from(longest)).min(1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
