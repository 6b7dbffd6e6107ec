//! Deception models
//!
//! Transform the trust degree an agent actually holds into the degree it
//! reports. Silent agents report nothing and have no model.

use atb_core::{AgentId, RandomSource};
use serde::{Deserialize, Serialize};

/// Kinds of reporting behavior, in assignment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeceptionKind {
    Complementary,
    NegativeExaggeration,
    PositiveExaggeration,
    Random,
    Silent,
    Truthful,
}

/// How a reporting agent distorts its opinions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeceptionModel {
    /// Reports what it believes
    Truthful,
    /// `x(1 - κ) + κ`
    PositiveExaggeration { kappa: f64 },
    /// `x(1 - κ)`
    NegativeExaggeration { kappa: f64 },
    /// `1 - x`
    Complementary,
    /// Uniform noise, unrelated to the belief
    Random,
}

impl DeceptionModel {
    /// Build the model for `kind`; `None` for silent agents
    pub fn for_kind(kind: DeceptionKind, positive_kappa: f64, negative_kappa: f64) -> Option<Self> {
        match kind {
            DeceptionKind::Truthful => Some(DeceptionModel::Truthful),
            DeceptionKind::PositiveExaggeration => Some(DeceptionModel::PositiveExaggeration {
                kappa: positive_kappa,
            }),
            DeceptionKind::NegativeExaggeration => Some(DeceptionModel::NegativeExaggeration {
                kappa: negative_kappa,
            }),
            DeceptionKind::Complementary => Some(DeceptionModel::Complementary),
            DeceptionKind::Random => Some(DeceptionModel::Random),
            DeceptionKind::Silent => None,
        }
    }

    /// Degree to report given the believed `degree`
    pub fn apply(&self, degree: f64, random: &mut RandomSource) -> f64 {
        match *self {
            DeceptionModel::Truthful => degree,
            DeceptionModel::PositiveExaggeration { kappa } => degree * (1.0 - kappa) + kappa,
            DeceptionModel::NegativeExaggeration { kappa } => degree * (1.0 - kappa),
            DeceptionModel::Complementary => 1.0 - degree,
            DeceptionModel::Random => random.next_double_from_to(0.0, 1.0),
        }
    }
}

/// Deception kind of `agent` out of `num_agents`
///
/// Kinds occupy consecutive blocks of agent ids. A kind's block ends at
/// `round(cumulative share × num_agents)`, so the shares are honored up to
/// rounding and the assignment does not depend on random draws.
pub fn assign_kind(
    agent: AgentId,
    num_agents: usize,
    shares: &[(DeceptionKind, f64)],
) -> Option<DeceptionKind> {
    let mut cumulative = 0.0;
    for &(kind, share) in shares {
        cumulative += share;
        let boundary = (cumulative * num_agents as f64).round() as usize;
        if agent < boundary {
            return Some(kind);
        }
    }
    None
}
