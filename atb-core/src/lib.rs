//! Alpha Testbed Core - data tuples and shared state for trust-model evaluation
//!
//! This crate provides the foundational primitives:
//! - Experience, opinion and opinion-request tuples
//! - A seeded random source (uniform, truncated-normal and weighted draws)
//! - Positional algorithm parameters with validation
//! - Agent-indexed storage that grows as new agents appear
//! - Beta-distributed evidence pairs

pub mod tuples;
pub mod random;
pub mod params;
pub mod sparse;
pub mod evidence;

pub use tuples::*;
pub use random::*;
pub use params::*;
pub use sparse::*;
pub use evidence::*;

/// Tolerance when checking that a probability mass function sums to one
pub const PMF_TOLERANCE: f64 = 1e-5;

/// Lowest possible trust, outcome or opinion degree
pub const MIN_DEGREE: f64 = 0.0;

/// Highest possible trust, outcome or opinion degree
pub const MAX_DEGREE: f64 = 1.0;
