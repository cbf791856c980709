use super::*;

#[test]
fn radius_zero_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6];
    assert_eq!(blur_coverage(&src, 3, 2, 0, 1.0).unwrap(), src);
}

#[test]
fn constant_plane_is_unchanged() {
    let src = vec![90u8; 7 * 5];
    assert_eq!(blur_coverage(&src, 7, 5, 3, 2.0).unwrap(), src);
}

#[test]
fn single_pixel_spreads_and_keeps_energy() {
    let (w, h) = (7u32, 5u32);
    let mut src = vec![0u8; (w * h) as usize];
    src[(2 * w + 3) as usize] = 255;

    let out = blur_coverage(&src, w, h, 2, 1.2).unwrap();
    assert!(out.iter().filter(|&&a| a != 0).count() > 1);
    let sum: i32 = out.iter().map(|&a| i32::from(a)).sum();
    assert!((sum - 255).abs() <= 12);
    // Non-square planes keep their orientation.
    assert!(out[(2 * w + 3) as usize] >= out[(2 * w + 4) as usize]);
    assert_eq!(out[(2 * w + 2) as usize], out[(2 * w + 4) as usize]);
    assert_eq!(out[(w + 3) as usize], out[(3 * w + 3) as usize]);
}

#[test]
fn rejects_bad_sigma_and_sizes() {
    assert!(blur_coverage(&[0; 4], 2, 2, 2, 0.0).is_err());
    assert!(blur_coverage(&[0; 3], 2, 2, 2, 1.0).is_err());
}

fn block_layer(w: u32, h: u32, rect: (u32, u32, u32, u32)) -> Vec<u8> {
    let mut layer = vec![0u8; (w * h * 4) as usize];
    for y in rect.1..rect.3 {
        for x in rect.0..rect.2 {
            let i = ((y * w + x) * 4) as usize;
            layer[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
        }
    }
    layer
}

#[test]
fn patch_covers_the_grown_region_in_the_shadow_color() {
    let (w, h) = (40u32, 30u32);
    let layer = block_layer(w, h, (18, 12, 22, 16));
    let patch = shadow_patch(
        &layer,
        w,
        h,
        Rect::new(18.0, 12.0, 22.0, 16.0),
        [0, 0, 0, 128],
        3,
        1.5,
    )
    .unwrap()
    .unwrap();
    assert_eq!((patch.x, patch.y, patch.width, patch.height), (12, 6, 16, 16));
    assert!(patch.rgba8_premul.chunks_exact(4).all(|px| px[..3] == [0, 0, 0]));
    let center = ((8 * patch.width + 8) * 4 + 3) as usize;
    assert!(patch.rgba8_premul[center] > 0 && patch.rgba8_premul[center] <= 128);
}

#[test]
fn patch_ignores_layer_content_outside_the_window() {
    let (w, h) = (40u32, 30u32);
    let layer = block_layer(w, h, (0, 0, 3, 3));
    let patch = shadow_patch(
        &layer,
        w,
        h,
        Rect::new(30.0, 20.0, 34.0, 24.0),
        [0, 0, 0, 255],
        1,
        0.5,
    )
    .unwrap()
    .unwrap();
    assert!(patch.rgba8_premul.iter().all(|&b| b == 0));
}

#[test]
fn patch_outside_canvas_is_none() {
    let layer = vec![0u8; 4 * 4 * 4];
    let patch = shadow_patch(
        &layer,
        4,
        4,
        Rect::new(100.0, 100.0, 120.0, 120.0),
        [0, 0, 0, 255],
        2,
        1.0,
    )
    .unwrap();
    assert!(patch.is_none());
}

#[test]
fn composite_darkens_only_under_the_patch() {
    let (w, h) = (10u32, 10u32);
    let mut frame = [255u8; 4].repeat((w * h) as usize);
    let patch = ShadowPatch {
        x: 2,
        y: 3,
        width: 2,
        height: 1,
        rgba8_premul: [0, 0, 0, 255].repeat(2),
    };
    patch.composite_onto(&mut frame, w).unwrap();
    let px = |x: u32, y: u32| &frame[((y * w + x) * 4) as usize..((y * w + x) * 4 + 4) as usize];
    assert_eq!(px(2, 3), [0, 0, 0, 255]);
    assert_eq!(px(3, 3), [0, 0, 0, 255]);
    assert_eq!(px(4, 3), [255, 255, 255, 255]);
    assert_eq!(px(2, 4), [255, 255, 255, 255]);

    let stray = ShadowPatch { x: 9, ..patch };
    assert!(stray.composite_onto(&mut frame, w).is_err());
}
