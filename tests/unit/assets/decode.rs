use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let prepared = decode_image(&png_bytes(1, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!(prepared.width, 1);
    assert_eq!(prepared.height, 1);
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn corrupt_bytes_are_a_decode_error() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, SnapError::Decode(_)));
}

#[test]
fn decode_payload_round_trips_through_data_url() {
    let payload = Payload::from_bytes("image/png", &png_bytes(3, 2, [1, 2, 3, 255]));
    let prepared = decode_payload(&payload).unwrap();
    assert_eq!((prepared.width, prepared.height), (3, 2));
}

#[test]
fn payload_dimensions_reads_header() {
    let payload = Payload::from_bytes("image/png", &png_bytes(7, 5, [0, 0, 0, 255]));
    assert_eq!(payload_dimensions(&payload).unwrap(), (7, 5));
    assert!(matches!(
        payload_dimensions(&Payload::from_jpeg_bytes(b"nope")).unwrap_err(),
        SnapError::Decode(_)
    ));
}
