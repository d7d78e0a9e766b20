// Unit tests for the file-backed signature store.

use kuchikomi::signature::SignatureStore;
use tempfile::tempdir;

#[test]
fn missing_file_loads_as_empty() {
    let dir = tempdir().unwrap();
    let store = SignatureStore::new(dir.path().join("last_review.txt"));
    assert_eq!(store.load().unwrap(), "");
}

#[test]
fn save_then_load_roundtrip() {
    let dir = tempdir().unwrap();
    let store = SignatureStore::new(dir.path().join("last_review.txt"));
    store.save("ネタが新鮮でとても美味しかったです。").unwrap();
    assert_eq!(store.load().unwrap(), "ネタが新鮮でとても美味しかったです。");
}

#[test]
fn load_trims_surrounding_whitespace() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("last_review.txt");
    std::fs::write(&path, "\n  signaturevalue  \n").unwrap();
    let store = SignatureStore::new(&path);
    assert_eq!(store.load().unwrap(), "signaturevalue");
}

#[test]
fn save_overwrites_previous_value() {
    let dir = tempdir().unwrap();
    let store = SignatureStore::new(dir.path().join("last_review.txt"));
    store.save("first").unwrap();
    store.save("second").unwrap();
    assert_eq!(store.load().unwrap(), "second");
}

#[test]
fn save_leaves_no_temp_file_behind() {
    let dir = tempdir().unwrap();
    let store = SignatureStore::new(dir.path().join("last_review.txt"));
    store.save("value").unwrap();
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec!["last_review.txt".to_string()]);
}

#[test]
fn clear_removes_the_file() {
    let dir = tempdir().unwrap();
    let store = SignatureStore::new(dir.path().join("last_review.txt"));
    store.save("value").unwrap();
    store.clear().unwrap();
    assert!(!store.path().exists());
    assert_eq!(store.load().unwrap(), "");
}

#[test]
fn clear_on_missing_file_is_ok() {
    let dir = tempdir().unwrap();
    let store = SignatureStore::new(dir.path().join("last_review.txt"));
    store.clear().unwrap();
}
