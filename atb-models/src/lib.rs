//! Alpha Testbed Trust Models
//!
//! Algorithms that estimate trust from experiences and opinions:
//! - **EigenTrust**: power iteration over a normalized local-trust matrix
//! - **TRAVOS**: Beta evidence with reporter-accuracy discounting
//! - **Simple**: mean outcomes blended with mean opinions
//!
//! Any model can be wrapped by [`SelectingPartners`] or
//! [`SelectingProviders`] to take part in decision-making evaluations.

pub mod traits;
pub mod eigentrust;
pub mod travos;
pub mod simple;
pub mod selection;

pub use traits::*;
pub use eigentrust::*;
pub use travos::*;
pub use simple::*;
pub use selection::*;
