//! Alpha Testbed Runtime
//!
//! Evaluation of trust models against scenarios:
//! - **Metrics**: accuracy, utility and opinion cost scoring
//! - **Protocol**: mode selection and the per-tick pipeline
//! - **Runner**: multi-tick runs collected into serializable readings

pub mod metrics;
pub mod protocol;
pub mod runner;

pub use metrics::*;
pub use protocol::*;
pub use runner::*;
