//! Simple trust model
//!
//! Mean outcome of own interactions, blended with the mean of received
//! opinions while fewer than three interactions are known.

use atb_core::{
    highest_experienced, highest_mentioned, AgentId, AgentMatrix, AgentVec, Experience, Opinion,
    Params, ServiceId, Tick,
};

use crate::traits::{ModelError, TrustMap, TrustModel};

/// Interactions after which opinions are ignored
pub const EXPERIENCE_SATURATION: u32 = 3;

const NAME: &str = "Simple";

/// Simple trust model
#[derive(Debug, Clone)]
pub struct Simple {
    initialized: bool,
    outcome_sums: AgentVec<f64>,
    outcome_counts: AgentVec<u32>,
    /// Latest opinion degree, indexed `(reporter, subject)`
    opinions: AgentMatrix<Option<f64>>,
}

impl Simple {
    pub fn new() -> Self {
        Self {
            initialized: false,
            outcome_sums: AgentVec::new(0, 0.0),
            outcome_counts: AgentVec::new(0, 0),
            opinions: AgentMatrix::new(0, None),
        }
    }

    fn check(&self) -> Result<(), ModelError> {
        if self.initialized {
            Ok(())
        } else {
            Err(ModelError::Uninitialized(NAME))
        }
    }

    fn grow_to(&mut self, agent: AgentId) {
        self.outcome_sums.grow_to(agent);
        self.outcome_counts.grow_to(agent);
        self.opinions.grow_to(agent);
    }

    /// Mean opinion degree about `subject`, if anyone reported one
    fn reputation(&self, subject: AgentId) -> Option<f64> {
        if subject >= self.opinions.dim() {
            return None;
        }
        let degrees: Vec<f64> = self.opinions.column(subject).filter_map(|d| *d).collect();
        if degrees.is_empty() {
            None
        } else {
            Some(degrees.iter().sum::<f64>() / degrees.len() as f64)
        }
    }
}

impl Default for Simple {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustModel for Simple {
    fn name(&self) -> &'static str {
        NAME
    }

    fn initialize(&mut self, _params: &Params) -> Result<(), ModelError> {
        self.initialized = true;
        Ok(())
    }

    fn set_current_time(&mut self, _time: Tick) -> Result<(), ModelError> {
        self.check()
    }

    fn set_agents(&mut self, agents: &[AgentId]) -> Result<(), ModelError> {
        self.check()?;
        if let Some(&max) = agents.iter().max() {
            self.grow_to(max);
        }
        Ok(())
    }

    fn process_experiences(&mut self, experiences: &[Experience]) -> Result<(), ModelError> {
        self.check()?;
        if let Some(max) = highest_experienced(experiences) {
            self.grow_to(max);
        }

        for e in experiences {
            self.outcome_sums[e.agent] += e.outcome;
            self.outcome_counts[e.agent] += 1;
        }
        Ok(())
    }

    fn process_opinions(&mut self, opinions: &[Opinion]) -> Result<(), ModelError> {
        self.check()?;
        if let Some(max) = highest_mentioned(opinions) {
            self.grow_to(max);
        }

        for o in opinions {
            self.opinions[(o.reporter, o.subject)] = Some(o.degree);
        }
        Ok(())
    }

    fn calculate_trust(&mut self) -> Result<(), ModelError> {
        // computed lazily in get_trust
        self.check()
    }

    fn get_trust(&self, _service: ServiceId) -> Result<TrustMap, ModelError> {
        self.check()?;
        let mut trust = TrustMap::new();

        for (agent, &count) in self.outcome_counts.iter() {
            let reputation = self.reputation(agent);
            let w_e = f64::from(count.min(EXPERIENCE_SATURATION)) / f64::from(EXPERIENCE_SATURATION);
            let w_r = if reputation.is_some() { 1.0 - w_e } else { 0.0 };
            let direct = if count > 0 {
                self.outcome_sums[agent] / f64::from(count)
            } else {
                0.0
            };

            let value = match reputation {
                Some(rep) if w_e > 0.0 && w_r > 0.0 => w_e * direct + w_r * rep,
                Some(rep) if w_e == 0.0 => rep,
                _ if w_e > 0.0 => direct,
                _ => continue,
            };
            trust.insert(agent, value);
        }

        Ok(trust)
    }
}
