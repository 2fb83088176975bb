use super::*;

#[test]
fn empty_input_returns_seed() {
    assert_eq!(seeded_hash(0, b""), 0);
    assert_eq!(seeded_hash(199, b""), 199);
}

#[test]
fn deterministic_across_calls() {
    let a = seeded_hash(199, b"hello");
    let b = seeded_hash(199, b"hello");
    assert_eq!(a, b);
}

#[test]
fn different_seeds_diverge() {
    let a = seeded_hash(199, b"hello");
    let b = seeded_hash(731, b"hello");
    assert_ne!(a, b);
}

#[test]
fn seeded_hash_struct_matches_free_fn() {
    let h = SeededHash::new(1087);
    assert_eq!(h.hash(b"key"), seeded_hash(1087, b"key"));
}

#[test]
fn single_byte_matches_formula() {
    // h = seed; h = ((h<<5) - h) + b
    let seed: u32 = 5;
    let b: u8 = 65;
    let expected = seed
        .wrapping_shl(5)
        .wrapping_sub(seed)
        .wrapping_add(b as u32);
    assert_eq!(seeded_hash(seed, &[b]), expected);
}
