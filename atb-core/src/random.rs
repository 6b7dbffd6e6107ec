//! Seeded random source
//!
//! Every collaborator of an evaluation run (model, scenario) owns its own
//! `RandomSource` built from the run seed. As long as the call order
//! within a tick is fixed, two runs with the same seed are identical.

use std::collections::BTreeMap;
use std::fmt::Debug;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use thiserror::Error;

use crate::PMF_TOLERANCE;

/// Errors from random draws
#[derive(Debug, Error, PartialEq)]
pub enum RandomError {
    #[error("The mean must be between [0, 1], but was {0:.2}")]
    InvalidMean(f64),

    #[error("The standard deviation must be non-negative, but was {0:.2}")]
    InvalidDeviation(f64),

    #[error("Probability of {key} must be between [0, 1], but was {value:.4}")]
    InvalidProbability { key: String, value: f64 },

    #[error("Probabilities must sum to 1, but summed to {0:.6}")]
    InvalidTotal(f64),
}

/// Deterministic random source
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
    seed: u64,
}

impl RandomSource {
    /// Create a source seeded with `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed this source was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw from [0, 1)
    pub fn next_double(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Uniform draw from [lo, hi]; returns `lo` for an empty range
    pub fn next_double_from_to(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    /// Uniform integer from [lo, hi]; returns `lo` for an empty range
    pub fn next_int_from_to(&mut self, lo: usize, hi: usize) -> usize {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    /// Draw from a normal distribution truncated to [0, 1]
    ///
    /// Values outside the unit interval are rejected and redrawn, so the
    /// mean itself must lie in [0, 1].
    pub fn next_unit_tnd(&mut self, mean: f64, sd: f64) -> Result<f64, RandomError> {
        if !(0.0..=1.0).contains(&mean) {
            return Err(RandomError::InvalidMean(mean));
        }
        if !(sd >= 0.0) {
            return Err(RandomError::InvalidDeviation(sd));
        }
        if sd == 0.0 {
            return Ok(mean);
        }

        let normal = Normal::new(mean, sd).map_err(|_| RandomError::InvalidDeviation(sd))?;
        loop {
            let value = normal.sample(&mut self.rng);
            if (0.0..=1.0).contains(&value) {
                return Ok(value);
            }
        }
    }

    /// Draw a key from a probability mass function
    ///
    /// Returns `None` for an empty distribution. Every probability must be
    /// in [0, 1] and they must sum to one within [`PMF_TOLERANCE`].
    pub fn from_weights<K>(&mut self, pmf: &BTreeMap<K, f64>) -> Result<Option<K>, RandomError>
    where
        K: Ord + Clone + Debug,
    {
        if pmf.is_empty() {
            return Ok(None);
        }

        let mut total = 0.0;
        for (key, &p) in pmf {
            if !(0.0..=1.0).contains(&p) {
                return Err(RandomError::InvalidProbability {
                    key: format!("{:?}", key),
                    value: p,
                });
            }
            total += p;
        }
        if (1.0 - total).abs() > PMF_TOLERANCE {
            return Err(RandomError::InvalidTotal(total));
        }

        let u = self.next_double();
        let mut cumulative = 0.0;
        for (key, &p) in pmf {
            cumulative += p;
            if cumulative > u {
                return Ok(Some(key.clone()));
            }
        }

        // Rounding left the running sum just under u
        Ok(pmf.keys().next_back().cloned())
    }

    /// Pick `round(len * fraction)` distinct items uniformly at random
    pub fn choose_random<T: Clone>(&mut self, items: &[T], fraction: f64) -> Vec<T> {
        let count = ((items.len() as f64) * fraction.clamp(0.0, 1.0)).round() as usize;
        items
            .choose_multiple(&mut self.rng, count.min(items.len()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = RandomSource::new(42);
        let mut b = RandomSource::new(42);

        for _ in 0..100 {
            assert_eq!(a.next_double(), b.next_double());
        }
        assert_eq!(
            a.next_unit_tnd(0.3, 0.2).unwrap(),
            b.next_unit_tnd(0.3, 0.2).unwrap()
        );
        assert_eq!(a.seed(), 42);
    }

    #[test]
    fn test_unit_tnd_stays_in_range() {
        let mut random = RandomSource::new(7);
        for _ in 0..1000 {
            let value = random.next_unit_tnd(0.95, 0.5).unwrap();
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_unit_tnd_rejects_bad_mean() {
        let mut random = RandomSource::new(7);
        assert_eq!(random.next_unit_tnd(1.5, 0.1), Err(RandomError::InvalidMean(1.5)));
    }

    #[test]
    fn test_unit_tnd_rejects_negative_deviation() {
        let mut random = RandomSource::new(7);
        assert_eq!(
            random.next_unit_tnd(0.5, -1.0),
            Err(RandomError::InvalidDeviation(-1.0))
        );
        assert!(random.next_unit_tnd(0.5, f64::NAN).is_err());
    }

    #[test]
    fn test_unit_tnd_zero_deviation() {
        let mut random = RandomSource::new(7);
        assert_eq!(random.next_unit_tnd(0.4, 0.0).unwrap(), 0.4);
    }

    #[test]
    fn test_from_weights() {
        let mut random = RandomSource::new(3);

        let empty: BTreeMap<usize, f64> = BTreeMap::new();
        assert_eq!(random.from_weights(&empty).unwrap(), None);

        let mut certain = BTreeMap::new();
        certain.insert(1usize, 0.0);
        certain.insert(2usize, 1.0);
        for _ in 0..50 {
            assert_eq!(random.from_weights(&certain).unwrap(), Some(2));
        }

        let mut unnormalized = BTreeMap::new();
        unnormalized.insert(1usize, 0.5);
        unnormalized.insert(2usize, 0.6);
        assert!(matches!(
            random.from_weights(&unnormalized),
            Err(RandomError::InvalidTotal(_))
        ));

        let mut negative = BTreeMap::new();
        negative.insert(1usize, -0.5);
        negative.insert(2usize, 1.5);
        assert!(matches!(
            random.from_weights(&negative),
            Err(RandomError::InvalidProbability { .. })
        ));
    }

    #[test]
    fn test_from_weights_frequencies() {
        let mut random = RandomSource::new(11);
        let mut pmf = BTreeMap::new();
        pmf.insert("a", 0.25);
        pmf.insert("b", 0.75);

        let draws = 10_000;
        let mut hits = 0;
        for _ in 0..draws {
            if random.from_weights(&pmf).unwrap() == Some("b") {
                hits += 1;
            }
        }
        let share = hits as f64 / draws as f64;
        assert!((share - 0.75).abs() < 0.03, "share was {}", share);
    }

    #[test]
    fn test_choose_random() {
        let mut random = RandomSource::new(5);
        let items: Vec<usize> = (0..10).collect();

        let half = random.choose_random(&items, 0.5);
        assert_eq!(half.len(), 5);

        let mut unique = half.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 5);

        assert_eq!(random.choose_random(&items, 1.0).len(), 10);
        assert!(random.choose_random(&items, 0.0).is_empty());
    }

    #[test]
    fn test_ranges() {
        let mut random = RandomSource::new(9);
        for _ in 0..100 {
            let d = random.next_double_from_to(0.2, 0.4);
            assert!((0.2..=0.4).contains(&d));
            let i = random.next_int_from_to(3, 5);
            assert!((3..=5).contains(&i));
        }
        assert_eq!(random.next_int_from_to(4, 4), 4);
    }
}
