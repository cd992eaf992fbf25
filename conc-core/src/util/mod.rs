//! Utility functions.
//!
//! Seed derivation for the restart generator.

use std::time::{SystemTime, UNIX_EPOCH};

/// Resolve the caller-supplied seed.
//
// A nonzero seed is used as-is so repeated solves are reproducible; zero
// asks for a clock-derived seed. The clock reading is passed through a
// splitmix64-style mixer so that nearby readings give unrelated streams,
// and the mapping stays deterministic for any given reading.
pub fn derive_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    mix(nanos)
}

#[inline]
fn mix(v: u64) -> u64 {
    let mut z = v.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
