//! Scoring metrics
//!
//! Three families, one per thing being scored:
//! - **Accuracy**: how well a trust ranking matches hidden capabilities
//! - **Utility**: how good the chosen interaction partner was
//! - **Opinion cost**: how many opinions the model asked for
//!
//! Instances may keep state between ticks, so the protocol spawns a fresh
//! instance per service with `spawn`.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use atb_core::{AgentId, OpinionRequest, ServiceId};
use atb_models::TrustMap;
use atb_scenarios::CapabilityMap;

/// Scores a trust ranking against ground truth
pub trait AccuracyMetric {
    fn name(&self) -> &'static str;

    /// Fresh instance with the same configuration
    fn spawn(&self) -> Box<dyn AccuracyMetric>;

    fn evaluate(&mut self, trust: &TrustMap, capabilities: &CapabilityMap) -> f64;
}

/// Scores the partner chosen for an interaction
pub trait UtilityMetric {
    fn name(&self) -> &'static str;

    fn spawn(&self) -> Box<dyn UtilityMetric>;

    fn evaluate(&mut self, capabilities: &CapabilityMap, agent: AgentId) -> f64;
}

/// Scores the set of requested opinions
pub trait OpinionCostMetric {
    fn name(&self) -> &'static str;

    fn spawn(&self) -> Box<dyn OpinionCostMetric>;

    fn evaluate(
        &mut self,
        agents: &[AgentId],
        services: &[ServiceId],
        requests: &BTreeSet<OpinionRequest>,
    ) -> f64;
}

fn direction(a: f64, b: f64) -> i32 {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal) as i32
}

/// Kendall's tau-A rank correlation, rescaled to `[0, 1]`
///
/// Every pair of agents with a known capability counts towards the
/// denominator, but only pairs the trust map covers can be concordant or
/// discordant. Missing estimates therefore pull the score towards 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct KendallsTauA;

impl AccuracyMetric for KendallsTauA {
    fn name(&self) -> &'static str {
        "Kendall's Tau-A"
    }

    fn spawn(&self) -> Box<dyn AccuracyMetric> {
        Box::new(*self)
    }

    fn evaluate(&mut self, trust: &TrustMap, capabilities: &CapabilityMap) -> f64 {
        let mut concordant = 0u64;
        let mut discordant = 0u64;

        for (first, (&a1, &c1)) in capabilities.iter().enumerate() {
            for (&a2, &c2) in capabilities.iter().skip(first + 1) {
                let (Some(&r1), Some(&r2)) = (trust.get(&a1), trust.get(&a2)) else {
                    continue;
                };

                match (direction(r1, r2) * direction(c1, c2)).cmp(&0) {
                    Ordering::Greater => concordant += 1,
                    Ordering::Less => discordant += 1,
                    Ordering::Equal => {}
                }
            }
        }

        let size = capabilities.len() as f64;
        let pairs = size * (size - 1.0) / 2.0;
        if pairs == 0.0 {
            return 0.5;
        }

        let tau = (concordant as f64 - discordant as f64) / pairs;
        (tau + 1.0) / 2.0
    }
}

fn best_capability(capabilities: &CapabilityMap) -> f64 {
    capabilities.values().copied().fold(0.0, f64::max)
}

fn ratio(obtained: f64, best: f64) -> f64 {
    if best > 0.0 {
        obtained / best
    } else {
        // nobody is capable, so every choice is as good as it gets
        1.0
    }
}

/// Capability of the chosen partner over the best capability available
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedUtility;

impl UtilityMetric for NormalizedUtility {
    fn name(&self) -> &'static str {
        "Normalized utility"
    }

    fn spawn(&self) -> Box<dyn UtilityMetric> {
        Box::new(*self)
    }

    fn evaluate(&mut self, capabilities: &CapabilityMap, agent: AgentId) -> f64 {
        let obtained = capabilities.get(&agent).copied().unwrap_or(0.0);
        ratio(obtained, best_capability(capabilities))
    }
}

/// Running sum of obtained capability over the running sum of the best
#[derive(Debug, Clone, Copy, Default)]
pub struct CumulativeNormalizedUtility {
    obtained: f64,
    best: f64,
}

impl UtilityMetric for CumulativeNormalizedUtility {
    fn name(&self) -> &'static str {
        "Cumulative normalized utility"
    }

    fn spawn(&self) -> Box<dyn UtilityMetric> {
        Box::<CumulativeNormalizedUtility>::default()
    }

    fn evaluate(&mut self, capabilities: &CapabilityMap, agent: AgentId) -> f64 {
        self.obtained += capabilities.get(&agent).copied().unwrap_or(0.0);
        self.best += best_capability(capabilities);
        ratio(self.obtained, self.best)
    }
}

/// Share of all possible opinions that was requested
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultOpinionCost;

impl OpinionCostMetric for DefaultOpinionCost {
    fn name(&self) -> &'static str {
        "Default opinion cost"
    }

    fn spawn(&self) -> Box<dyn OpinionCostMetric> {
        Box::new(*self)
    }

    fn evaluate(
        &mut self,
        agents: &[AgentId],
        services: &[ServiceId],
        requests: &BTreeSet<OpinionRequest>,
    ) -> f64 {
        let possible = agents.len().saturating_sub(1) * agents.len() * services.len();
        if possible == 0 {
            return 0.0;
        }
        requests.len() as f64 / possible as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(values: &[f64]) -> std::collections::BTreeMap<usize, f64> {
        values.iter().copied().enumerate().collect()
    }

    #[test]
    fn test_tau_perfect_and_reversed() {
        let caps = map(&[0.1, 0.5, 0.9]);
        let mut metric = KendallsTauA;

        assert_eq!(metric.evaluate(&map(&[0.2, 0.3, 0.4]), &caps), 1.0);
        assert_eq!(metric.evaluate(&map(&[0.4, 0.3, 0.2]), &caps), 0.0);
    }

    #[test]
    fn test_tau_partial_coverage() {
        let caps = map(&[0.1, 0.5, 0.9]);
        let trust = map(&[0.2, 0.3]);

        let score = KendallsTauA.evaluate(&trust, &caps);
        assert!((score - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_tau_ties_are_neutral() {
        let caps = map(&[0.1, 0.5]);
        assert_eq!(KendallsTauA.evaluate(&map(&[0.3, 0.3]), &caps), 0.5);
    }

    #[test]
    fn test_tau_single_agent() {
        assert_eq!(KendallsTauA.evaluate(&map(&[0.3]), &map(&[0.7])), 0.5);
        assert_eq!(KendallsTauA.evaluate(&TrustMap::new(), &CapabilityMap::new()), 0.5);
    }

    #[test]
    fn test_normalized_utility() {
        let caps = map(&[0.2, 0.8]);
        let mut metric = NormalizedUtility;

        assert!((metric.evaluate(&caps, 0) - 0.25).abs() < 1e-12);
        assert_eq!(metric.evaluate(&caps, 1), 1.0);
        assert_eq!(metric.evaluate(&caps, 9), 0.0);
        assert_eq!(metric.evaluate(&map(&[0.0, 0.0]), 0), 1.0);
    }

    #[test]
    fn test_cumulative_utility_accumulates() {
        let caps = map(&[0.2, 0.8]);
        let mut metric = CumulativeNormalizedUtility::default();

        assert!((metric.evaluate(&caps, 0) - 0.25).abs() < 1e-12);
        assert!((metric.evaluate(&caps, 1) - 0.625).abs() < 1e-12);

        let mut fresh = metric.spawn();
        assert!((fresh.evaluate(&caps, 0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_opinion_cost() {
        let requests: BTreeSet<_> = [OpinionRequest::new(1, 0, 0), OpinionRequest::new(2, 0, 0)]
            .into_iter()
            .collect();
        let mut metric = DefaultOpinionCost;

        let cost = metric.evaluate(&[0, 1, 2], &[0], &requests);
        assert!((cost - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(metric.evaluate(&[0], &[0], &requests), 0.0);
    }
}
