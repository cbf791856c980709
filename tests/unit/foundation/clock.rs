use super::*;

#[test]
fn day_keys_sort_chronologically() {
    let mut days = vec![
        DayKey::parse("2025-10-01").unwrap(),
        DayKey::parse("2025-01-31").unwrap(),
        DayKey::parse("2024-12-31").unwrap(),
    ];
    days.sort();
    let s: Vec<&str> = days.iter().map(DayKey::as_str).collect();
    assert_eq!(s, vec!["2024-12-31", "2025-01-31", "2025-10-01"]);
}

#[test]
fn day_key_rejects_garbage() {
    assert!(DayKey::parse("yesterday").is_err());
    assert!(DayKey::parse("2025-02-30").is_err());
}

#[test]
fn day_key_serializes_as_plain_string() {
    let d = DayKey::parse("2025-01-02").unwrap();
    assert_eq!(serde_json::to_string(&d).unwrap(), "\"2025-01-02\"");
}

#[test]
fn fixed_clock_clones_share_state() {
    let clock = FixedClock::new("2025-01-01", 1_000).unwrap();
    let handle = clock.clone();
    handle.set_today("2025-01-02").unwrap();
    assert_eq!(clock.today().as_str(), "2025-01-02");

    let a = clock.now_millis();
    let b = clock.now_millis();
    assert!(b > a);
}
