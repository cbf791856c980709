use super::*;

#[test]
fn six_non_empty_categories() {
    assert_eq!(PALETTE.len(), 6);
    assert!(PALETTE.iter().all(|c| !c.glyphs.is_empty()));
    assert_eq!(category(1).unwrap().glyphs[0], "🐱");
    assert!(category(6).is_none());
}
