//! Benchmark workloads for the gsi item buffer.
//!
//! - [`shuffled_keys`]: deterministic key sequences via a seeded ChaCha8 RNG
//! - [`filled`]: a buffer pre-populated with `0..n`

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use gsi_array::GsiArray;
use gsi_zone::Zone;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// `n` keys drawn from `0..n`, reproducible for a given `seed`.
pub fn shuffled_keys(n: usize, seed: u64) -> Vec<u32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let bound = n.max(1) as u64;
    (0..n)
        .map(|_| (u64::from(rng.next_u32()) % bound) as u32)
        .collect()
}

/// A buffer in `zone` holding `0..n` in order.
///
/// # Panics
///
/// Panics if the zone cannot hold `n` items.
pub fn filled<Z: Zone>(zone: Z, n: usize) -> GsiArray<u32, Z> {
    let mut a = GsiArray::with_capacity_in(n, zone).unwrap();
    for v in 0..n as u32 {
        a.push(v).unwrap();
    }
    a
}
