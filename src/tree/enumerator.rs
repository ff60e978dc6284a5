//! Unlabeled rooted tree counts (OEIS A000081).
//!
//! Uses the divisor-sum recurrence
//!
//! ```text
//! a(0) = 0, a(1) = 1
//! a(n) = 1/(n-1) · Σ_{k=1}^{n-1} ( Σ_{d|k} d·a(d) ) · a(n-k)     n ≥ 2
//! ```
//!
//! filled bottom-up into a cache owned by the enumerator. The cache only
//! grows; a single enumerator can be shared by handing out `&mut` access.

use tracing::debug;

use crate::error::{HypershellError, Result};

/// Maximum distance from an integer a recurrence term may have before it is
/// treated as an arithmetic bug.
pub const INTEGRALITY_TOLERANCE: f64 = 0.01;

/// Memoized A000081 counter.
#[derive(Debug, Clone)]
pub struct RootedTreeEnumerator {
    /// `counts[n] = a(n)`
    counts: Vec<u128>,
    /// `divisor_sums[k] = Σ_{d|k} d·a(d)` (index 0 unused)
    divisor_sums: Vec<u128>,
}

impl Default for RootedTreeEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl RootedTreeEnumerator {
    /// Create an enumerator seeded with `a(0) = 0, a(1) = 1`.
    pub fn new() -> Self {
        Self {
            counts: vec![0, 1],
            divisor_sums: vec![0],
        }
    }

    /// Number of cached terms (`a(0)..a(len-1)` are known).
    pub fn cached_len(&self) -> usize {
        self.counts.len()
    }

    /// Number of unlabeled rooted trees with exactly `n` nodes.
    ///
    /// # Errors
    ///
    /// `ArithmeticConsistency` if a term is not integral,
    /// `ArithmeticOverflow` if an intermediate exceeds 128 bits.
    pub fn count_rooted_trees(&mut self, n: usize) -> Result<u128> {
        if n >= self.counts.len() {
            let from = self.counts.len();
            for m in from..=n {
                let value = self.next_term(m)?;
                self.counts.push(value);
            }
            debug!("A000081 cache extended from {} to {} terms", from, n + 1);
        }
        Ok(self.counts[n])
    }

    /// `[a(0), a(1), ..., a(n)]`.
    pub fn sequence(&mut self, n: usize) -> Result<Vec<u128>> {
        self.count_rooted_trees(n)?;
        Ok(self.counts[..=n].to_vec())
    }

    /// Compute a(m) assuming a(0)..a(m-1) are cached.
    fn next_term(&mut self, m: usize) -> Result<u128> {
        let overflow = || HypershellError::ArithmeticOverflow { n: m };

        let mut total: u128 = 0;
        for k in 1..m {
            let s = self.divisor_sum(k).ok_or_else(overflow)?;
            let term = s.checked_mul(self.counts[m - k]).ok_or_else(overflow)?;
            total = total.checked_add(term).ok_or_else(overflow)?;
        }

        integral_quotient(m, total, (m - 1) as u128)
    }

    /// `Σ_{d|k} d·a(d)`, memoized. Requires a(1)..a(k) to be cached.
    fn divisor_sum(&mut self, k: usize) -> Option<u128> {
        while self.divisor_sums.len() <= k {
            let j = self.divisor_sums.len();
            let mut sum: u128 = 0;
            for d in (1..=j).filter(|d| j % d == 0) {
                sum = sum.checked_add((d as u128).checked_mul(self.counts[d])?)?;
            }
            self.divisor_sums.push(sum);
        }
        Some(self.divisor_sums[k])
    }
}

/// `total / divisor` as the a(n) term, rounded to the nearest integer when
/// the fractional part is within [`INTEGRALITY_TOLERANCE`] of one.
fn integral_quotient(n: usize, total: u128, divisor: u128) -> Result<u128> {
    let quotient = total / divisor;
    let fraction = (total % divisor) as f64 / divisor as f64;
    if fraction > INTEGRALITY_TOLERANCE && fraction < 1.0 - INTEGRALITY_TOLERANCE {
        return Err(HypershellError::ArithmeticConsistency {
            n,
            value: quotient as f64 + fraction,
        });
    }
    Ok(if fraction >= 0.5 { quotient + 1 } else { quotient })
}

#[cfg(test)]
mod tests {
    use super::*;

    const A000081: [u128; 11] = [0, 1, 1, 2, 4, 9, 20, 48, 115, 286, 719];

    #[test]
    fn test_known_values() {
        let mut e = RootedTreeEnumerator::new();
        for (n, expected) in A000081.iter().enumerate() {
            assert_eq!(e.count_rooted_trees(n).unwrap(), *expected, "a({})", n);
        }
    }

    #[test]
    fn test_sequence_length_and_values() {
        let mut e = RootedTreeEnumerator::new();
        let seq = e.sequence(10).unwrap();
        assert_eq!(seq.len(), 11);
        assert_eq!(seq, A000081.to_vec());
    }

    #[test]
    fn test_larger_terms() {
        let mut e = RootedTreeEnumerator::new();
        assert_eq!(e.count_rooted_trees(15).unwrap(), 87811);
        assert_eq!(e.count_rooted_trees(20).unwrap(), 12826228);
    }

    #[test]
    fn test_cache_grows_monotonically() {
        let mut e = RootedTreeEnumerator::new();
        assert_eq!(e.cached_len(), 2);
        e.count_rooted_trees(8).unwrap();
        assert_eq!(e.cached_len(), 9);
        // Lower queries never shrink the cache.
        assert_eq!(e.count_rooted_trees(3).unwrap(), 2);
        assert_eq!(e.cached_len(), 9);
        e.sequence(12).unwrap();
        assert_eq!(e.cached_len(), 13);
    }

    #[test]
    fn test_out_of_order_queries_agree() {
        let mut forward = RootedTreeEnumerator::new();
        let mut jump = RootedTreeEnumerator::new();
        let seq = forward.sequence(25).unwrap();
        assert_eq!(jump.count_rooted_trees(25).unwrap(), seq[25]);
        assert_eq!(jump.count_rooted_trees(11).unwrap(), seq[11]);
    }

    #[test]
    fn test_integral_quotient_exact() {
        assert_eq!(integral_quotient(5, 36, 4).unwrap(), 9);
    }

    #[test]
    fn test_integral_quotient_within_tolerance_rounds() {
        // 1/200 = 0.005 below the tolerance: rounds down.
        assert_eq!(integral_quotient(201, 2001, 200).unwrap(), 10);
        // 199/200 = 0.995 within the tolerance of 1: rounds up.
        assert_eq!(integral_quotient(201, 2199, 200).unwrap(), 11);
    }

    #[test]
    fn test_integral_quotient_outside_tolerance_fails() {
        let err = integral_quotient(5, 38, 4).unwrap_err();
        match err {
            HypershellError::ArithmeticConsistency { n, value } => {
                assert_eq!(n, 5);
                assert_eq!(value, 9.5);
            }
            other => panic!("unexpected error: {other}"),
        }
        // 3/200 = 0.015 just above the tolerance.
        assert!(matches!(
            integral_quotient(201, 2003, 200),
            Err(HypershellError::ArithmeticConsistency { .. })
        ));
        // 197/200 = 0.985 just below 1 - tolerance.
        assert!(matches!(
            integral_quotient(201, 2197, 200),
            Err(HypershellError::ArithmeticConsistency { .. })
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut e = RootedTreeEnumerator::new();
        let err = e.count_rooted_trees(400).unwrap_err();
        assert!(matches!(err, HypershellError::ArithmeticOverflow { .. }));
        // Everything computed before the overflow stays cached.
        assert!(e.cached_len() > 20);
        assert_eq!(e.count_rooted_trees(10).unwrap(), 719);
    }
}
