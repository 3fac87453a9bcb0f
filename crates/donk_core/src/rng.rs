//! # Seeded Randomness
//!
//! One deterministic random stream per run.
//!
//! ## Determinism Guarantee
//!
//! Given the same `RunSeed` and the same sequence of calls, `SeededRng`
//! produces **exactly** the same values on any platform, any time. ChaCha8
//! is used instead of `StdRng` because `StdRng`'s algorithm is allowed to
//! change between `rand` releases.
//!
//! Every helper checks for an empty choice set before touching the stream,
//! so an empty set never panics and never consumes randomness.

use std::ops::Range;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seed for one run of the tube.
///
/// All procedural decisions of a run derive from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunSeed(u64);

impl RunSeed {
    /// Creates a new run seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Default for RunSeed {
    fn default() -> Self {
        Self(2)
    }
}

/// Deterministic random stream.
///
/// # Example
///
/// ```rust,ignore
/// let mut rng = SeededRng::new(RunSeed::new(2));
///
/// let t = rng.next_f32();                     // [0, 1)
/// let slot = rng.range(0..20);                 // [0, 20)
/// let kind = rng.choose_weighted(&[("wall", 4), ("gap", 1)]);
/// let picks = rng.sample_k(&tiles, 8);         // with replacement
/// ```
#[derive(Clone, Debug)]
pub struct SeededRng {
    inner: ChaCha8Rng,
}

impl SeededRng {
    /// Creates a stream from a seed.
    #[must_use]
    pub fn new(seed: RunSeed) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed.value()),
        }
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Uniform integer in `range`.
    ///
    /// An empty range returns `range.start` without consuming randomness.
    #[inline]
    pub fn range(&mut self, range: Range<usize>) -> usize {
        if range.is_empty() {
            return range.start;
        }
        self.inner.gen_range(range)
    }

    /// Picks one element uniformly.
    ///
    /// Returns None for an empty slice.
    #[inline]
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.inner)
    }

    /// Picks one element uniformly and copies it out.
    #[inline]
    pub fn choose_copied<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        self.choose(items).copied()
    }

    /// Picks one option with probability proportional to its weight.
    ///
    /// Returns None when the list is empty or every weight is zero.
    pub fn choose_weighted<T: Copy>(&mut self, options: &[(T, u32)]) -> Option<T> {
        if options.iter().all(|(_, weight)| *weight == 0) {
            return None;
        }
        let index = WeightedIndex::new(options.iter().map(|(_, weight)| *weight)).ok()?;
        Some(options[index.sample(&mut self.inner)].0)
    }

    /// Draws `k` elements with replacement.
    ///
    /// Returns an empty vector for an empty slice.
    pub fn sample_k<T: Clone>(&mut self, items: &[T], k: usize) -> Vec<T> {
        if items.is_empty() {
            return Vec::new();
        }
        (0..k)
            .map(|_| items[self.inner.gen_range(0..items.len())].clone())
            .collect()
    }

    /// Shuffles a slice in place.
    #[inline]
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = SeededRng::new(RunSeed::new(12345));
        let mut rng2 = SeededRng::new(RunSeed::new(12345));

        for _ in 0..100 {
            assert_eq!(rng1.next_f32().to_bits(), rng2.next_f32().to_bits());
            assert_eq!(rng1.range(0..1000), rng2.range(0..1000));
        }
    }

    #[test]
    fn test_different_seeds_different_results() {
        let mut rng1 = SeededRng::new(RunSeed::new(1));
        let mut rng2 = SeededRng::new(RunSeed::new(2));

        let a: Vec<usize> = (0..16).map(|_| rng1.range(0..1_000_000)).collect();
        let b: Vec<usize> = (0..16).map(|_| rng2.range(0..1_000_000)).collect();

        assert_ne!(a, b, "Different seeds should produce different streams");
    }

    #[test]
    fn test_float_range() {
        let mut rng = SeededRng::new(RunSeed::new(42));
        for _ in 0..10_000 {
            let value = rng.next_f32();
            assert!((0.0..1.0).contains(&value), "Value {value} out of [0, 1)");
        }
    }

    #[test]
    fn test_empty_sets_do_not_consume() {
        let mut rng = SeededRng::new(RunSeed::new(7));
        let mut control = SeededRng::new(RunSeed::new(7));

        let empty: [u8; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert!(rng.choose_weighted::<u8>(&[]).is_none());
        assert!(rng.choose_weighted(&[(1u8, 0), (2u8, 0)]).is_none());
        assert!(rng.sample_k(&empty, 4).is_empty());
        assert_eq!(rng.range(5..5), 5);

        assert_eq!(rng.range(0..1000), control.range(0..1000));
    }

    #[test]
    fn test_weighted_choice_respects_weights() {
        let mut rng = SeededRng::new(RunSeed::new(99));
        let mut heavy = 0;
        for _ in 0..5000 {
            if rng.choose_weighted(&[('a', 4), ('b', 1)]) == Some('a') {
                heavy += 1;
            }
        }
        // Expect ~80% 'a'
        assert!((3700..4300).contains(&heavy), "Got {heavy} heavy picks");

        for _ in 0..100 {
            assert_eq!(rng.choose_weighted(&[('x', 0), ('y', 3)]), Some('y'));
        }
    }

    #[test]
    fn test_sample_k_with_replacement() {
        let mut rng = SeededRng::new(RunSeed::new(3));
        let picks = rng.sample_k(&[1, 2], 50);
        assert_eq!(picks.len(), 50);
        assert!(picks.iter().all(|p| *p == 1 || *p == 2));
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = SeededRng::new(RunSeed::new(5));
        let mut items: Vec<u32> = (0..32).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }
}
