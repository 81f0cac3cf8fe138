use canonset_common::error::ErrorKind;

use crate::{K_MAX, binomial, rank, rank_bits, rank_valid, unrank};

fn bits_of(positions: &[u32]) -> u64 {
    positions.iter().fold(0, |acc, &p| acc | (1u64 << p))
}

#[test]
fn test_colex_order_of_two_out_of_four() {
    let expected = [
        (&[0, 1][..], 0),
        (&[0, 2], 1),
        (&[1, 2], 2),
        (&[0, 3], 3),
        (&[1, 3], 4),
        (&[2, 3], 5),
    ];
    for (positions, r) in expected {
        let bits = bits_of(positions);
        assert_eq!(rank(bits, 4, 2).unwrap(), r, "{positions:?}");
        assert_eq!(unrank(r, 4, 2).unwrap(), bits);
    }
}

#[test]
fn test_rank_of_segment_pattern() {
    // Identifiers {5, 10, 15} relative to a segment starting at 5.
    let bits = bits_of(&[0, 5, 10]);
    assert_eq!(rank(bits, 11, 3).unwrap(), 130);
    assert_eq!(unrank(130, 11, 3).unwrap(), bits);
}

#[test]
fn test_empty_and_full_patterns() {
    for n in 0..=64 {
        assert_eq!(rank(0, n, 0).unwrap(), 0);
        assert_eq!(unrank(0, n, 0).unwrap(), 0);
        assert!(rank_valid(0, n, 0));
        assert!(!rank_valid(1, n, 0));
        assert_eq!(rank_bits(n, 0), 0);
    }
    for n in 1..=K_MAX {
        let full = (1u64 << n) - 1;
        assert_eq!(rank(full, n, n).unwrap(), 0);
        assert_eq!(unrank(0, n, n).unwrap(), full);
    }
}

#[test]
fn test_exhaustive_small_widths() {
    for n in 0..=12u32 {
        let mut seen = vec![vec![false; 1 << 12]; 13];
        for bits in 0u64..(1 << n) {
            let k = bits.count_ones();
            let r = rank(bits, n, k).unwrap();
            assert!(rank_valid(r, n, k));
            assert!(!seen[k as usize][r as usize], "duplicate rank {r} for n={n} k={k}");
            seen[k as usize][r as usize] = true;
            assert_eq!(unrank(r, n, k).unwrap(), bits);
        }
        for k in 0..=n {
            let covered = seen[k as usize].iter().filter(|s| **s).count() as u64;
            assert_eq!(covered, binomial(n, k));
        }
    }
}

#[test]
fn test_random_full_width_inverse() {
    let mut rng = fastrand::Rng::with_seed(0xc0b1);
    for _ in 0..20_000 {
        let n = rng.u32(1..=64);
        let k = rng.u32(0..=n.min(K_MAX));
        let c = binomial(n, k);
        let r = rng.u64(0..c);
        let bits = unrank(r, n, k).unwrap();
        assert_eq!(bits.count_ones(), k);
        assert!(n == 64 || bits >> n == 0);
        assert_eq!(rank(bits, n, k).unwrap(), r);
        assert!(64 - r.leading_zeros() <= rank_bits(n, k));
    }
}

#[test]
fn test_highest_rank_uses_top_positions() {
    let top = unrank(binomial(64, 18) - 1, 64, 18).unwrap();
    assert_eq!(top, u64::MAX << 46);
    assert_eq!(rank(top, 64, 18).unwrap(), binomial(64, 18) - 1);
}

#[test]
fn test_parameter_range_errors() {
    let is_invalid_arg =
        |e: canonset_common::error::Error| matches!(e.kind(), ErrorKind::InvalidArgument { .. });

    assert!(is_invalid_arg(rank(0, 65, 0).unwrap_err()));
    assert!(is_invalid_arg(rank(1, 64, 19).unwrap_err()));
    assert!(is_invalid_arg(rank(0b111, 2, 3).unwrap_err()));
    assert!(is_invalid_arg(rank(0b1000, 3, 1).unwrap_err()));
    assert!(is_invalid_arg(rank(0b0110, 4, 1).unwrap_err()));
    assert!(is_invalid_arg(unrank(6, 4, 2).unwrap_err()));
    assert!(is_invalid_arg(unrank(0, 64, 19).unwrap_err()));

    assert!(!rank_valid(0, 65, 1));
    assert!(!rank_valid(0, 64, 19));
    assert!(!rank_valid(0, 3, 4));
    assert!(rank_valid(5, 4, 2));
    assert!(!rank_valid(6, 4, 2));
}
