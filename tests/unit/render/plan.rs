use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn request(stickers: Vec<Sticker>, frame: Option<EditingFrame>, caption: &str) -> ComposeRequest {
    ComposeRequest {
        base: Payload::empty(),
        caption: caption.to_string(),
        stickers,
        frame,
        font_key: FontKey::Kosugi,
    }
}

fn sticker(x: f64, y: f64, scale: f64) -> Sticker {
    Sticker {
        glyph: "⭐".to_string(),
        x,
        y,
        scale,
    }
}

#[test]
fn layout_constants_match_canvas() {
    assert!(approx(CONTENT_WIDTH, 820.0));
    assert!(approx(CONTENT_HEIGHT, 960.0));
}

#[test]
fn wide_photo_fills_content_width() {
    let r = photo_rect(1640, 960);
    assert!(approx(r.x0, 40.0) && approx(r.width(), 820.0));
    assert!(approx(r.height(), 480.0));
    assert!(approx(r.y0, 40.0 + 240.0));
}

#[test]
fn tall_photo_fills_content_height_and_upscales() {
    let r = photo_rect(300, 600);
    assert!(approx(r.height(), 960.0));
    assert!(approx(r.width(), 480.0));
    assert!(approx(r.x0, 210.0));
    assert!(approx(r.y0, 40.0));
}

#[test]
fn sticker_mapping_is_proportional_to_frame() {
    let frame = EditingFrame::new(410.0, 480.0);
    let plan = plan_compose(
        &request(vec![sticker(205.0, 120.0, 1.5)], Some(frame), ""),
        820,
        960,
        |_| 0.0,
    );
    let op = &plan.stickers[0];
    assert!(approx(op.center.x, 40.0 + 410.0));
    assert!(approx(op.center.y, 40.0 + 240.0));
    assert_eq!(op.font_px, 96.0);
}

#[test]
fn missing_or_degenerate_frame_falls_back_to_content_box() {
    let plan = plan_compose(
        &request(vec![sticker(410.0, 480.0, 1.0)], None, ""),
        820,
        960,
        |_| 0.0,
    );
    assert!(approx(plan.stickers[0].center.x, 450.0));
    assert!(approx(plan.stickers[0].center.y, 520.0));

    let zero = EditingFrame::new(0.0, f64::NAN);
    let plan = plan_compose(
        &request(vec![sticker(0.0, 0.0, 1.0)], Some(zero), ""),
        820,
        960,
        |_| 0.0,
    );
    assert!(plan.stickers[0].center.x.is_finite());
}

#[test]
fn sticker_font_size_rounds() {
    let plan = plan_compose(
        &request(vec![sticker(0.0, 0.0, 0.7)], None, ""),
        10,
        10,
        |_| 0.0,
    );
    assert_eq!(plan.stickers[0].font_px, 45.0);
}

#[test]
fn wrap_breaks_before_the_overflowing_character() {
    let lines = wrap_chars("abcdefg", 30.0, |s| s.chars().count() as f64 * 10.0);
    assert_eq!(lines, vec!["abc", "def", "g"]);
}

#[test]
fn wrap_keeps_oversized_first_character() {
    let lines = wrap_chars("WW", 5.0, |s| s.chars().count() as f64 * 10.0);
    assert_eq!(lines, vec!["W", "W"]);
    assert!(wrap_chars("", 5.0, |_| 0.0).is_empty());
}

#[test]
fn caption_lines_stack_from_the_band_top() {
    let text: String = std::iter::repeat_n('あ', 40).collect();
    let plan = plan_compose(&request(Vec::new(), None, &text), 10, 10, |s| {
        s.chars().count() as f64 * 28.0
    });
    // 820 / 28 => 29 characters per line.
    assert_eq!(plan.caption_lines.len(), 2);
    assert_eq!(plan.caption_lines[0].text.chars().count(), 29);
    assert!(approx(plan.caption_lines[0].top_y, 1018.0));
    assert!(approx(plan.caption_lines[1].top_y, 1052.0));
    assert!(approx(plan.caption_lines[0].center_x, 450.0));
    assert_eq!(plan.caption_font, FontKey::Kosugi);
    assert_eq!(plan.caption_color, Rgba8Premul::opaque(0x22, 0x22, 0x22));
}
