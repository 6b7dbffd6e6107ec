//! TRAVOS - Bayesian trust with opinion-accuracy filtering
//!
//! Direct experiences are Beta evidence. When they are not conclusive, the
//! model folds in opinions, discounting each reporter by how well its past
//! opinions matched the outcomes actually observed.

use std::collections::BTreeMap;

use atb_core::{
    beta_integral, beta_mean, beta_sd, highest_experienced, highest_mentioned, AgentId,
    AgentMatrix, AgentVec, BrsPair, Experience, Opinion, ParamError, Params, RandomSource,
    ServiceId, Tick, AT_LEAST_ONE, UNIT_INTERVAL,
};
use tracing::debug;

use crate::traits::{ModelError, TrustMap, TrustModel};

/// Opinion accuracy is tracked in this many equal-width bins of [0, 1]
pub const NUM_BINS: usize = 5;

/// Width of one accuracy bin
pub const BIN_WIDTH: f64 = 0.2;

/// Standard deviation of the uniform distribution on [0, 1]
pub const UNIFORM_SD: f64 = 0.288675;

const NAME: &str = "TRAVOS";

/// TRAVOS parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravosConfig {
    pub satisfactory_threshold: f64,
    pub opinion_samples: usize,
    pub opinion_sample_sd: f64,
    /// Direct evidence is final once its confidence exceeds this
    pub confidence_threshold: f64,
    /// Half-width of the confidence interval around the mean
    pub error: f64,
}

impl Default for TravosConfig {
    fn default() -> Self {
        Self {
            satisfactory_threshold: 0.5,
            opinion_samples: 10,
            opinion_sample_sd: 0.1,
            confidence_threshold: 0.95,
            error: 0.2,
        }
    }
}

impl TravosConfig {
    /// Read `[threshold, samples, sample_sd, confidence_threshold, error]`
    pub fn from_params(params: &Params) -> Result<Self, ParamError> {
        Ok(Self {
            satisfactory_threshold: params.float(0, UNIT_INTERVAL)?,
            opinion_samples: params.int(1, AT_LEAST_ONE)? as usize,
            opinion_sample_sd: params.float(2, UNIT_INTERVAL)?,
            confidence_threshold: params.float(3, UNIT_INTERVAL)?,
            error: params.float(4, UNIT_INTERVAL)?,
        })
    }
}

/// Accuracy bin of an opinion with evidence `(r, s)`
pub fn determine_bin(r: f64, s: f64) -> usize {
    let mean = beta_mean(r, s);
    let mut border = 0.0;
    let mut index = 0;

    loop {
        border += BIN_WIDTH;
        if mean <= border || index == NUM_BINS - 1 {
            return index;
        }
        index += 1;
    }
}

/// Mean of opinion `(m, n)` pulled towards 0.5 by its inaccuracy
pub fn adjust_mean(m: f64, n: f64, p_acc: f64) -> f64 {
    0.5 + p_acc * (beta_mean(m, n) - 0.5)
}

/// Standard deviation of opinion `(m, n)` pulled towards the uniform one
pub fn adjust_sd(m: f64, n: f64, p_acc: f64) -> f64 {
    UNIFORM_SD + p_acc * (beta_sd(m, n) - UNIFORM_SD)
}

/// Positive evidence of the Beta distribution with the given moments
pub fn scale_m(mean: f64, sd: f64) -> f64 {
    (mean * mean - mean * mean * mean) / (sd * sd) - mean - 1.0
}

/// Negative evidence of the Beta distribution with the given moments
pub fn scale_n(mean: f64, sd: f64) -> f64 {
    scale_m(1.0 - mean, sd)
}

/// TRAVOS trust model
#[derive(Debug, Clone)]
pub struct Travos {
    random: RandomSource,
    config: Option<TravosConfig>,
    /// Direct evidence per agent
    experiences: BTreeMap<AgentId, BrsPair>,
    /// Latest sampled opinion, indexed `(reporter, subject)`
    opinions: AgentMatrix<Option<BrsPair>>,
    /// Observed outcomes per reporter and opinion bin
    observations: AgentVec<[BrsPair; NUM_BINS]>,
}

impl Travos {
    pub fn new(random: RandomSource) -> Self {
        Self {
            random,
            config: None,
            experiences: BTreeMap::new(),
            opinions: AgentMatrix::new(0, None),
            observations: AgentVec::new(0, [BrsPair::default(); NUM_BINS]),
        }
    }

    fn config(&self) -> Result<TravosConfig, ModelError> {
        self.config.ok_or(ModelError::Uninitialized(NAME))
    }

    fn grow_to(&mut self, agent: AgentId) {
        let grew = self.opinions.grow_to(agent);
        self.observations.grow_to(agent);
        if grew {
            debug!(agents = self.opinions.dim(), "TRAVOS state grew");
        }
    }

    /// Evidence contributed by `reporter`'s opinion `(m, n)`
    fn discounted(&self, reporter: AgentId, opinion: BrsPair) -> (f64, f64) {
        let bin = determine_bin(opinion.r, opinion.s);
        let observed = self
            .observations
            .get(reporter)
            .map(|bins| bins[bin])
            .unwrap_or_default();

        let lo = bin as f64 * BIN_WIDTH;
        let p_acc = beta_integral(observed.r, observed.s, lo, lo + BIN_WIDTH);
        let mean = adjust_mean(opinion.r, opinion.s, p_acc);
        let sd = adjust_sd(opinion.r, opinion.s, p_acc);

        (scale_m(mean, sd), scale_n(mean, sd))
    }
}

impl TrustModel for Travos {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self, params: &Params) -> Result<(), ModelError> {
        self.config = Some(TravosConfig::from_params(params)?);
        Ok(())
    }

    fn set_current_time(&mut self, _time: Tick) -> Result<(), ModelError> {
        self.config().map(|_| ())
    }

    fn process_experiences(&mut self, experiences: &[Experience]) -> Result<(), ModelError> {
        let config = self.config()?;
        if let Some(max) = highest_experienced(experiences) {
            self.grow_to(max);
        }

        for e in experiences {
            let (r, s) = if e.outcome >= config.satisfactory_threshold {
                (1.0, 0.0)
            } else {
                (0.0, 1.0)
            };
            self.experiences.entry(e.agent).or_default().add(r, s);

            // score every reporter that gave an opinion about this agent
            for reporter in 0..self.opinions.dim() {
                if let Some(opinion) = self.opinions[(reporter, e.agent)] {
                    let bin = determine_bin(opinion.r, opinion.s);
                    self.observations[reporter][bin].add(r, s);
                }
            }
        }
        Ok(())
    }

    fn process_opinions(&mut self, opinions: &[Opinion]) -> Result<(), ModelError> {
        let config = self.config()?;
        if let Some(max) = highest_mentioned(opinions) {
            self.grow_to(max);
        }

        for o in opinions {
            let mut sampled = BrsPair::default();
            for _ in 0..config.opinion_samples {
                let sample = self.random.next_unit_tnd(o.degree, config.opinion_sample_sd)?;
                if sample > config.satisfactory_threshold {
                    sampled.add(1.0, 0.0);
                } else {
                    sampled.add(0.0, 1.0);
                }
            }
            self.opinions[(o.reporter, o.subject)] = Some(sampled);
        }
        Ok(())
    }

    fn calculate_trust(&mut self) -> Result<(), ModelError> {
        // computed lazily in get_trust
        self.config().map(|_| ())
    }

    fn get_trust(&self, _service: ServiceId) -> Result<TrustMap, ModelError> {
        let config = self.config()?;
        let mut trust = TrustMap::new();

        for (&agent, pair) in &self.experiences {
            let mean = pair.mean();
            let confidence = beta_integral(pair.r, pair.s, mean - config.error, mean + config.error);
            if confidence > config.confidence_threshold {
                trust.insert(agent, mean);
            }
        }

        let dim = self.opinions.dim();
        for agent in 0..dim {
            if trust.contains_key(&agent) {
                continue;
            }

            let mut reputation = self.experiences.get(&agent).copied();
            for reporter in 0..dim {
                if let Some(opinion) = self.opinions[(reporter, agent)] {
                    let (m, n) = self.discounted(reporter, opinion);
                    reputation.get_or_insert_with(BrsPair::default).add(m, n);
                }
            }

            // unused ids have neither experiences nor opinions
            if let Some(reputation) = reputation {
                trust.insert(agent, reputation.mean());
            }
        }

        Ok(trust)
    }
}
