use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(0, 255), 0);
    assert_eq!(mul_div255_u8(128, 128), 64);
    assert_eq!(mul_div255_u16(255, 1), 1);
}

#[test]
fn unpremul_inverts_premul_for_opaque_and_zero_alpha() {
    assert_eq!(unpremul_u8(200, 255), 200);
    assert_eq!(unpremul_u8(200, 0), 0);
    assert_eq!(unpremul_u8(64, 128), 128);
}

#[test]
fn fit_scale_never_upscales() {
    assert_eq!(fit_scale(100, 50, 1200), 1.0);
    assert_eq!(fit_scale(2400, 1200, 1200), 0.5);
    assert_eq!(fit_scale(1000, 4000, 1000), 0.25);
    assert_eq!(fit_scale(0, 0, 10), 1.0);
}
