//! Deterministic parameter and vector initialization.
//!
//! Values come from chained SipHash rounds seeded by `(seed, label)`, so the
//! same pair always yields the same vector within a build. No RNG state is
//! shared between callers.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Generate `len` values uniformly spread over `[-bound, bound]`.
///
/// Algorithm:
/// 1. Hash `seed` and `label` together to get the initial state
/// 2. Rehash the state once per value
/// 3. Map each `u64` state onto `[-1.0, 1.0]` and scale by `bound`
pub fn hashed_uniform(seed: u64, label: &str, len: usize, bound: f32) -> Vec<f32> {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    label.hash(&mut hasher);
    let mut state = hasher.finish();

    let mut values = Vec::with_capacity(len);
    for _ in 0..len {
        let mut h = DefaultHasher::new();
        state.hash(&mut h);
        state = h.finish();

        let unit = (state as f64 / u64::MAX as f64) * 2.0 - 1.0;
        values.push(unit as f32 * bound);
    }
    values
}
