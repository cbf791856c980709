use super::*;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("snapbook-kv-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn memory_store_enforces_quota_without_partial_writes() {
    let mut s = InMemoryKvStore::with_quota(10);
    s.set("a", "12345").unwrap();
    let err = s.set("b", "123456").unwrap_err();
    assert!(err.is_capacity());
    assert_eq!(s.get("b").unwrap(), None);

    // Replacing a value only counts the difference.
    s.set("a", "123456789").unwrap();
    assert_eq!(s.used_bytes(), 10);
}

#[test]
fn memory_store_remove_and_keys() {
    let mut s = InMemoryKvStore::new();
    s.set("z", "1").unwrap();
    s.set("a", "2").unwrap();
    assert_eq!(s.keys().unwrap(), vec!["a".to_string(), "z".to_string()]);
    s.remove("z").unwrap();
    s.remove("never-there").unwrap();
    assert_eq!(s.keys().unwrap(), vec!["a".to_string()]);
}

#[test]
fn key_encoding_is_reversible_and_file_safe() {
    let key = "snaps:events:today/..";
    let enc = encode_key(key);
    assert!(!enc.contains(':') && !enc.contains('/'));
    assert_eq!(decode_key(&enc).unwrap(), key);
    assert_eq!(encode_key("snaps:a b"), "snaps%3Aa%20b");
    assert_eq!(decode_key("%FF"), None);
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = temp_dir("reopen");
    {
        let mut s = FileKvStore::open(&dir, None).unwrap();
        s.set("snaps:events:calendar", "{}").unwrap();
    }
    let s = FileKvStore::open(&dir, None).unwrap();
    assert_eq!(s.get("snaps:events:calendar").unwrap().as_deref(), Some("{}"));
    assert_eq!(s.get("missing").unwrap(), None);
    assert_eq!(s.keys().unwrap(), vec!["snaps:events:calendar".to_string()]);
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn file_store_quota_rejects_oversized_values() {
    let dir = temp_dir("quota");
    let mut s = FileKvStore::open(&dir, Some(16)).unwrap();
    s.set("k", "0123456789").unwrap();
    assert!(s.set("k2", "0123456789").unwrap_err().is_capacity());
    // Overwriting the same key does not double count.
    s.set("k", "0123456789abcdef").unwrap();
    std::fs::remove_dir_all(&dir).unwrap();
}
