//! Tuples exchanged between scenarios and trust models
//!
//! Each tuple is an immutable value created by the scenario (or by the
//! model, for opinion requests) and consumed within the same tick.

use serde::{Deserialize, Serialize};

/// Agent identifier; non-negative, neither contiguous nor bounded in advance
pub type AgentId = usize;

/// Service identifier
pub type ServiceId = usize;

/// Simulation tick
pub type Tick = u32;

/// Outcome of an interaction with `agent` for `service`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub agent: AgentId,
    pub service: ServiceId,
    pub time: Tick,
    /// Outcome quality in [0, 1]
    pub outcome: f64,
}

impl Experience {
    pub fn new(agent: AgentId, service: ServiceId, time: Tick, outcome: f64) -> Self {
        Self {
            agent,
            service,
            time,
            outcome,
        }
    }
}

/// Testimony of `reporter` about `subject` for `service`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Opinion {
    pub reporter: AgentId,
    pub subject: AgentId,
    pub service: ServiceId,
    pub time: Tick,
    /// Reported trust degree in [0, 1]
    pub degree: f64,
}

impl Opinion {
    pub fn new(
        reporter: AgentId,
        subject: AgentId,
        service: ServiceId,
        time: Tick,
        degree: f64,
    ) -> Self {
        Self {
            reporter,
            subject,
            service,
            time,
            degree,
        }
    }

    /// Same testimony with a different degree
    pub fn with_degree(mut self, degree: f64) -> Self {
        self.degree = degree;
        self
    }
}

/// Request by a trust model for `reporter`'s opinion about `subject`
///
/// Ordered by reporter, then subject, then service, so request sets
/// iterate deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpinionRequest {
    pub reporter: AgentId,
    pub subject: AgentId,
    pub service: ServiceId,
}

impl OpinionRequest {
    pub fn new(reporter: AgentId, subject: AgentId, service: ServiceId) -> Self {
        Self {
            reporter,
            subject,
            service,
        }
    }
}

/// Highest agent id mentioned by a batch of experiences
pub fn highest_experienced(experiences: &[Experience]) -> Option<AgentId> {
    experiences.iter().map(|e| e.agent).max()
}

/// Highest agent id mentioned by a batch of opinions, reporter or subject
pub fn highest_mentioned(opinions: &[Opinion]) -> Option<AgentId> {
    opinions
        .iter()
        .map(|o| o.reporter.max(o.subject))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_request_ordering() {
        let mut requests = BTreeSet::new();
        requests.insert(OpinionRequest::new(2, 0, 0));
        requests.insert(OpinionRequest::new(0, 3, 1));
        requests.insert(OpinionRequest::new(0, 3, 0));

        let ordered: Vec<_> = requests.into_iter().collect();
        assert_eq!(ordered[0], OpinionRequest::new(0, 3, 0));
        assert_eq!(ordered[1], OpinionRequest::new(0, 3, 1));
        assert_eq!(ordered[2], OpinionRequest::new(2, 0, 0));
    }

    #[test]
    fn test_highest_ids() {
        let experiences = vec![Experience::new(4, 0, 1, 0.5), Experience::new(9, 0, 1, 0.1)];
        let opinions = vec![Opinion::new(11, 2, 0, 1, 0.3), Opinion::new(1, 7, 0, 1, 0.9)];

        assert_eq!(highest_experienced(&experiences), Some(9));
        assert_eq!(highest_mentioned(&opinions), Some(11));
        assert_eq!(highest_experienced(&[]), None);
    }

    #[test]
    fn test_opinion_with_degree() {
        let opinion = Opinion::new(1, 2, 0, 5, 0.25).with_degree(0.75);
        assert_eq!(opinion.reporter, 1);
        assert_eq!(opinion.degree, 0.75);
    }
}
