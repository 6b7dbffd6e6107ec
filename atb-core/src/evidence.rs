//! Beta-distributed evidence
//!
//! A [`BrsPair`] holds positive (`r`) and negative (`s`) pseudo-counts; it
//! is the sufficient statistic of Beta(r + 1, s + 1).

use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, ContinuousCDF};

/// Positive and negative evidence counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BrsPair {
    pub r: f64,
    pub s: f64,
}

impl BrsPair {
    pub fn new(r: f64, s: f64) -> Self {
        Self { r, s }
    }

    /// Accumulate evidence
    pub fn add(&mut self, r: f64, s: f64) {
        self.r += r;
        self.s += s;
    }

    /// Expected value of Beta(r + 1, s + 1)
    pub fn mean(&self) -> f64 {
        beta_mean(self.r, self.s)
    }

    /// Standard deviation of Beta(r + 1, s + 1)
    pub fn sd(&self) -> f64 {
        beta_sd(self.r, self.s)
    }
}

/// `(m + 1) / (m + n + 2)`
pub fn beta_mean(m: f64, n: f64) -> f64 {
    (m + 1.0) / (m + n + 2.0)
}

/// Standard deviation of Beta(m + 1, n + 1)
pub fn beta_sd(m: f64, n: f64) -> f64 {
    let total = m + n + 2.0;
    ((m + 1.0) * (n + 1.0) / (total * total) / (total + 1.0)).sqrt()
}

/// Probability mass of Beta(m + 1, n + 1) on `[lo, hi]`
///
/// Bounds are clamped to [0, 1]. Counts that do not form a valid Beta
/// distribution yield zero mass.
pub fn beta_integral(m: f64, n: f64, lo: f64, hi: f64) -> f64 {
    let lo = lo.clamp(0.0, 1.0);
    let hi = hi.clamp(0.0, 1.0);

    match Beta::new(m + 1.0, n + 1.0) {
        Ok(dist) => {
            let mass = dist.cdf(hi) - dist.cdf(lo);
            if mass.is_finite() {
                mass.max(0.0)
            } else {
                0.0
            }
        }
        Err(_) => 0.0,
    }
}
