//! Alpha Testbed Scenarios
//!
//! Synthetic environments that feed trust models:
//! - **Scenario**: agents, services, hidden capabilities, opinions and experiences
//! - **Deception**: how reporting agents distort what they believe
//! - **Random**: uniformly drawn capabilities, with optional partner
//!   and opinion provider selection

pub mod traits;
pub mod deception;
pub mod random;

pub use traits::*;
pub use deception::*;
pub use random::*;
