//! EigenTrust - trust as the stationary vector of a local-trust matrix
//!
//! - Experiences build pretrust: satisfactory outcomes count +1, others -1
//! - Opinions build local trust: each opinion is sampled into positive and
//!   negative votes, and the surplus of positives is stored
//! - Trust is found by power iteration mixing propagated trust with pretrust

use atb_core::{
    highest_experienced, highest_mentioned, AgentMatrix, AgentVec, Experience, Opinion, ParamError,
    Params, RandomSource, ServiceId, Tick, AT_LEAST_ONE, UNIT_INTERVAL,
};
use tracing::{debug, warn};

use crate::traits::{ModelError, TrustMap, TrustModel};

/// Power iteration stops once successive vectors are closer than this
pub const CONVERGENCE_TOLERANCE: f64 = 0.01;

/// Upper bound on power iterations
pub const MAX_ITERATIONS: usize = 10_000;

const NAME: &str = "EigenTrust";

/// EigenTrust parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenTrustConfig {
    /// Share of pretrust mixed into every iteration
    pub weight: f64,
    /// Outcomes and samples at or above this are satisfactory
    pub satisfactory_threshold: f64,
    /// Samples drawn per opinion
    pub opinion_samples: usize,
    /// Standard deviation of opinion samples
    pub opinion_sample_sd: f64,
}

impl Default for EigenTrustConfig {
    fn default() -> Self {
        Self {
            weight: 0.5,
            satisfactory_threshold: 0.5,
            opinion_samples: 10,
            opinion_sample_sd: 0.1,
        }
    }
}

impl EigenTrustConfig {
    /// Read `[weight, threshold, samples, sample_sd]`
    pub fn from_params(params: &Params) -> Result<Self, ParamError> {
        Ok(Self {
            weight: params.float(0, UNIT_INTERVAL)?,
            satisfactory_threshold: params.float(1, UNIT_INTERVAL)?,
            opinion_samples: params.int(2, AT_LEAST_ONE)? as usize,
            opinion_sample_sd: params.float(3, UNIT_INTERVAL)?,
        })
    }
}

/// EigenTrust trust model
#[derive(Debug, Clone)]
pub struct EigenTrust {
    random: RandomSource,
    config: Option<EigenTrustConfig>,
    time: Tick,
    /// Satisfactory minus unsatisfactory interactions, per agent
    experiences: AgentVec<i64>,
    /// Local trust, indexed `(subject, reporter)`
    opinions: AgentMatrix<u32>,
}

impl EigenTrust {
    pub fn new(random: RandomSource) -> Self {
        Self {
            random,
            config: None,
            time: 0,
            experiences: AgentVec::new(1, 0),
            opinions: AgentMatrix::new(1, 0),
        }
    }

    fn config(&self) -> Result<EigenTrustConfig, ModelError> {
        self.config.ok_or(ModelError::Uninitialized(NAME))
    }

    /// Number of agents currently tracked
    pub fn dim(&self) -> usize {
        self.experiences.len()
    }

    fn grow_to(&mut self, agent: usize) {
        let grew = self.experiences.grow_to(agent);
        self.opinions.grow_to(agent);
        if grew {
            debug!(agents = self.dim(), "EigenTrust state grew");
        }
    }

    /// Normalized positive experience counts; uniform if none are positive
    fn pretrust(&self) -> Vec<f64> {
        let n = self.dim();
        let positive: Vec<f64> = self
            .experiences
            .as_slice()
            .iter()
            .map(|&c| c.max(0) as f64)
            .collect();
        let sum: f64 = positive.iter().sum();

        if sum > 0.0 {
            positive.into_iter().map(|c| c / sum).collect()
        } else {
            vec![1.0 / n as f64; n]
        }
    }

    /// Column-normalized local trust, row-major; empty columns take pretrust
    fn local_trust(&self, pretrust: &[f64]) -> Vec<f64> {
        let n = self.dim();
        let mut matrix = vec![0.0; n * n];

        for reporter in 0..n {
            let sum: f64 = self.opinions.column(reporter).map(|&c| f64::from(c)).sum();
            for (subject, &count) in self.opinions.column(reporter).enumerate() {
                matrix[subject * n + reporter] = if sum > 0.0 {
                    f64::from(count) / sum
                } else {
                    pretrust[subject]
                };
            }
        }

        matrix
    }
}

/// One power-iteration step: `(1 - weight) * C * trust + weight * pretrust`
fn propagate(matrix: &[f64], pretrust: &[f64], weight: f64, trust: &[f64]) -> Vec<f64> {
    let n = pretrust.len();
    (0..n)
        .map(|i| {
            let propagated: f64 = (0..n).map(|j| matrix[i * n + j] * trust[j]).sum();
            (1.0 - weight) * propagated + weight * pretrust[i]
        })
        .collect()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

impl TrustModel for EigenTrust {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self, params: &Params) -> Result<(), ModelError> {
        self.config = Some(EigenTrustConfig::from_params(params)?);
        Ok(())
    }

    fn set_current_time(&mut self, time: Tick) -> Result<(), ModelError> {
        self.config()?;
        self.time = time;
        Ok(())
    }

    fn process_experiences(&mut self, experiences: &[Experience]) -> Result<(), ModelError> {
        let config = self.config()?;
        if let Some(max) = highest_experienced(experiences) {
            self.grow_to(max);
        }

        for e in experiences {
            self.experiences[e.agent] += if e.outcome >= config.satisfactory_threshold {
                1
            } else {
                -1
            };
        }
        Ok(())
    }

    fn process_opinions(&mut self, opinions: &[Opinion]) -> Result<(), ModelError> {
        let config = self.config()?;
        if let Some(max) = highest_mentioned(opinions) {
            self.grow_to(max);
        }

        for o in opinions {
            let mut positive: i64 = 0;
            let mut negative: i64 = 0;
            for _ in 0..config.opinion_samples {
                let sample = self.random.next_unit_tnd(o.degree, config.opinion_sample_sd)?;
                if sample > config.satisfactory_threshold {
                    positive += 1;
                } else {
                    negative += 1;
                }
            }

            // latest opinion replaces the previous one
            self.opinions[(o.subject, o.reporter)] = (positive - negative).max(0) as u32;
        }
        Ok(())
    }

    fn calculate_trust(&mut self) -> Result<(), ModelError> {
        // computed lazily in get_trust
        self.config().map(|_| ())
    }

    fn get_trust(&self, _service: ServiceId) -> Result<TrustMap, ModelError> {
        let config = self.config()?;
        let pretrust = self.pretrust();
        let matrix = self.local_trust(&pretrust);

        let mut trust = pretrust.clone();
        let mut converged = false;
        for iteration in 1..=MAX_ITERATIONS {
            let next = propagate(&matrix, &pretrust, config.weight, &trust);
            let distance = euclidean(&next, &trust);
            trust = next;

            if distance < CONVERGENCE_TOLERANCE {
                debug!(iterations = iteration, time = self.time, "EigenTrust converged");
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "EigenTrust did not converge within {} iterations; using last iterate",
                MAX_ITERATIONS
            );
        }

        Ok(trust.into_iter().enumerate().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atb_core::params;
    use proptest::prelude::*;

    fn model(weight: f64, sd: f64) -> EigenTrust {
        let mut tm = EigenTrust::new(RandomSource::new(0));
        tm.initialize(&params![weight, 0.5, 10, sd]).unwrap();
        tm
    }

    fn ranks(trust: &TrustMap) -> Vec<usize> {
        let mut agents: Vec<_> = trust.iter().map(|(&a, &t)| (a, t)).collect();
        agents.sort_by(|a, b| b.1.total_cmp(&a.1));
        agents.into_iter().map(|(a, _)| a).collect()
    }

    #[test]
    fn test_uninitialized() {
        let mut tm = EigenTrust::new(RandomSource::new(0));
        assert_eq!(tm.get_trust(0), Err(ModelError::Uninitialized("EigenTrust")));
        assert!(tm.process_experiences(&[]).is_err());
        assert!(tm.set_current_time(1).is_err());
    }

    #[test]
    fn test_invalid_params() {
        let mut tm = EigenTrust::new(RandomSource::new(0));
        let err = tm.initialize(&params![1.2, 0.5, 10, 0.1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid parameters: Parameter 0 must be between 0 and 1 inclusively, but was 1.20"
        );
        assert!(tm.initialize(&params![0.5, 0.5, 0, 0.1]).is_err());
        assert!(tm.initialize(&params![0.5, 0.5, 10]).is_err());
    }

    #[test]
    fn test_uniform_pretrust_without_experiences() {
        let mut tm = model(0.5, 0.05);
        tm.process_opinions(&[Opinion::new(3, 0, 0, 1, 0.5)]).unwrap();

        let pretrust = tm.pretrust();
        assert_eq!(pretrust.len(), 4);
        assert!(pretrust.iter().all(|&p| (p - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_pretrust_ignores_negative_counts() {
        let mut tm = model(0.5, 0.05);
        tm.process_experiences(&[
            Experience::new(0, 0, 1, 0.1),
            Experience::new(1, 0, 1, 0.9),
            Experience::new(1, 0, 1, 0.9),
            Experience::new(2, 0, 1, 0.6),
        ])
        .unwrap();

        let pretrust = tm.pretrust();
        assert_eq!(tm.experiences.as_slice(), &[-1, 2, 1]);
        assert!((pretrust.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(pretrust[0], 0.0);
        assert!((pretrust[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_dangling_columns_return_pretrust() {
        let mut tm = model(0.3, 0.05);
        tm.process_experiences(&[
            Experience::new(1, 0, 1, 1.0),
            Experience::new(1, 0, 1, 1.0),
            Experience::new(1, 0, 1, 1.0),
            Experience::new(2, 0, 1, 1.0),
        ])
        .unwrap();
        tm.calculate_trust().unwrap();

        let trust = tm.get_trust(0).unwrap();
        assert_eq!(trust.len(), 3);
        assert!(trust[&0].abs() < 1e-12);
        assert!((trust[&1] - 0.75).abs() < 1e-12);
        assert!((trust[&2] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_three_agent_example() {
        let mut tm = model(0.5, 0.05);
        let opinions = vec![
            Opinion::new(0, 0, 0, 0, 0.0),
            Opinion::new(1, 0, 0, 0, 2.0 / 3.0),
            Opinion::new(2, 0, 0, 0, 1.0 / 8.0),
            Opinion::new(0, 1, 0, 0, 1.0),
            Opinion::new(1, 1, 0, 0, 0.0),
            Opinion::new(2, 1, 0, 0, 7.0 / 8.0),
            Opinion::new(0, 2, 0, 0, 0.0),
            Opinion::new(1, 2, 0, 0, 1.0 / 3.0),
            Opinion::new(2, 2, 0, 0, 0.0),
        ];

        tm.set_current_time(0).unwrap();
        tm.process_opinions(&opinions).unwrap();
        tm.process_experiences(&[]).unwrap();
        tm.calculate_trust().unwrap();

        let trust = tm.get_trust(0).unwrap();
        assert_eq!(ranks(&trust), vec![1, 0, 2]);
        assert!((trust[&0] - 0.3889).abs() < 0.02);
        assert!((trust[&1] - 0.4444).abs() < 0.02);
        assert!((trust[&2] - 0.1667).abs() < 0.02);
    }

    #[test]
    fn test_growth_keeps_counts() {
        let mut tm = model(0.5, 0.05);
        tm.process_opinions(&[Opinion::new(1, 0, 0, 0, 1.0)]).unwrap();
        assert_eq!(tm.opinions[(0, 1)], 10);

        tm.process_experiences(&[Experience::new(6, 0, 1, 1.0)]).unwrap();
        assert_eq!(tm.dim(), 7);
        assert_eq!(tm.opinions[(0, 1)], 10);
        assert_eq!(tm.experiences[6], 1);

        let trust = tm.get_trust(0).unwrap();
        assert_eq!(trust.keys().copied().collect::<Vec<_>>(), (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_opinion_overwrites() {
        let mut tm = model(0.5, 0.05);
        tm.process_opinions(&[Opinion::new(1, 0, 0, 0, 1.0)]).unwrap();
        tm.process_opinions(&[Opinion::new(1, 0, 0, 1, 0.0)]).unwrap();
        assert_eq!(tm.opinions[(0, 1)], 0);
    }

    #[test]
    fn test_same_seed_same_trust() {
        let opinions: Vec<_> = (0..5)
            .flat_map(|r| (0..5).map(move |s| Opinion::new(r, s, 0, 0, (r * s) as f64 / 16.0)))
            .collect();

        let mut a = model(0.2, 0.3);
        let mut b = model(0.2, 0.3);
        a.process_opinions(&opinions).unwrap();
        b.process_opinions(&opinions).unwrap();
        assert_eq!(a.get_trust(0).unwrap(), b.get_trust(0).unwrap());
    }

    fn experiences() -> impl Strategy<Value = Vec<Experience>> {
        prop::collection::vec((0usize..8, 0.0f64..=1.0), 0..30).prop_map(|draws| {
            draws
                .into_iter()
                .map(|(agent, outcome)| Experience::new(agent, 0, 1, outcome))
                .collect()
        })
    }

    fn opinions() -> impl Strategy<Value = Vec<Opinion>> {
        prop::collection::vec((0usize..8, 0usize..8, 0.0f64..=1.0), 0..40).prop_map(|draws| {
            draws
                .into_iter()
                .map(|(reporter, subject, degree)| Opinion::new(reporter, subject, 0, 1, degree))
                .collect()
        })
    }

    fn l1(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    }

    proptest! {
        #[test]
        fn prop_pretrust_is_a_distribution(experiences in experiences(), seed in any::<u64>()) {
            let mut tm = EigenTrust::new(RandomSource::new(seed));
            tm.initialize(&params![0.5, 0.5, 10, 0.1]).unwrap();
            tm.process_experiences(&experiences).unwrap();

            let pretrust = tm.pretrust();
            prop_assert_eq!(pretrust.len(), tm.dim());
            prop_assert!((pretrust.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            prop_assert!(pretrust.iter().all(|&p| p >= 0.0));

            if tm.experiences.as_slice().iter().all(|&c| c <= 0) {
                let uniform = 1.0 / tm.dim() as f64;
                prop_assert!(pretrust.iter().all(|&p| (p - uniform).abs() < 1e-12));
            }
        }

        #[test]
        fn prop_local_trust_is_column_stochastic(
            experiences in experiences(),
            opinions in opinions(),
            seed in any::<u64>(),
        ) {
            let mut tm = EigenTrust::new(RandomSource::new(seed));
            tm.initialize(&params![0.5, 0.5, 10, 0.1]).unwrap();
            tm.process_experiences(&experiences).unwrap();
            tm.process_opinions(&opinions).unwrap();

            let n = tm.dim();
            let matrix = tm.local_trust(&tm.pretrust());
            for reporter in 0..n {
                let column: f64 = (0..n).map(|subject| matrix[subject * n + reporter]).sum();
                prop_assert!((column - 1.0).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_iterates_contract_until_convergence(
            experiences in experiences(),
            opinions in opinions(),
            weight in 0.05f64..=1.0,
            seed in any::<u64>(),
        ) {
            let mut tm = EigenTrust::new(RandomSource::new(seed));
            tm.initialize(&params![weight, 0.5, 10, 0.1]).unwrap();
            tm.process_experiences(&experiences).unwrap();
            tm.process_opinions(&opinions).unwrap();

            let pretrust = tm.pretrust();
            let matrix = tm.local_trust(&pretrust);

            // the step is a (1 - weight) contraction in the L1 norm
            let mut trust = pretrust.clone();
            let mut previous = f64::INFINITY;
            let mut converged = false;
            for _ in 0..MAX_ITERATIONS {
                let next = propagate(&matrix, &pretrust, weight, &trust);
                let step = l1(&next, &trust);
                prop_assert!(step <= previous + 1e-12);
                prop_assert!((next.iter().sum::<f64>() - 1.0).abs() < 1e-9);

                let distance = euclidean(&next, &trust);
                previous = step;
                trust = next;
                if distance < CONVERGENCE_TOLERANCE {
                    converged = true;
                    break;
                }
            }
            prop_assert!(converged);

            let result = tm.get_trust(0).unwrap();
            prop_assert_eq!(result.len(), tm.dim());
        }
    }
}
