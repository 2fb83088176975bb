use super::*;
use crate::store::Store;

#[test]
fn save_then_load_round_trips_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arena.snap");

    let mut s1 = Store::new(0x4000, 0x1000, 8);
    assert!(s1.set(b"k1", b"v1"));
    assert!(s1.set(b"k2", b"v2"));
    save(&s1, &path).unwrap();

    let mut s2 = Store::new(0x4000, 0x1000, 8);
    load(&mut s2, &path).unwrap();
    assert_eq!(s2.get(b"k1"), Some(b"v1".to_vec()));
    assert_eq!(s2.get(b"k2"), Some(b"v2".to_vec()));
}

#[test]
fn load_zero_pads_an_undersized_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.snap");
    std::fs::write(&path, vec![0xABu8; 4]).unwrap();

    let mut s = Store::new(0x4000, 0x1000, 8);
    load(&mut s, &path).unwrap();
    assert_eq!(s.arena().total_memory_size(), 0x4000);
    assert_eq!(&s.arena().raw()[..4], &[0xAB; 4]);
    assert!(s.arena().raw()[4..].iter().all(|&b| b == 0));
}

#[test]
fn load_truncates_an_oversized_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.snap");
    std::fs::write(&path, vec![0xCDu8; 0x8000]).unwrap();

    let mut s = Store::new(0x4000, 0x1000, 8);
    load(&mut s, &path).unwrap();
    assert_eq!(s.arena().total_memory_size(), 0x4000);
    assert!(s.arena().raw().iter().all(|&b| b == 0xCD));
}

#[test]
fn load_clears_cache_so_stale_values_are_not_served() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("arena.snap");

    let s1 = Store::new(0x4000, 0x1000, 8);
    save(&s1, &path).unwrap(); // empty snapshot

    let mut s2 = Store::new(0x4000, 0x1000, 8);
    s2.set(b"k", b"stale");
    load(&mut s2, &path).unwrap();
    assert_eq!(s2.get(b"k"), None);
}
