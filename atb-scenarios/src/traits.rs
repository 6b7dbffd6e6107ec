//! Common traits for scenarios

use std::collections::{BTreeMap, BTreeSet};

use atb_core::{AgentId, Experience, Opinion, OpinionRequest, RandomError, ServiceId, Tick};
use thiserror::Error;

/// Ground-truth capability per agent
pub type CapabilityMap = BTreeMap<AgentId, f64>;

/// Errors from scenario operations
#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("Scenario setting {field} {constraint}, but was {value}")]
    Config {
        field: &'static str,
        constraint: &'static str,
        value: String,
    },

    #[error("Random draw failed: {0}")]
    Random(#[from] RandomError),

    #[error("Unknown service {0}")]
    UnknownService(ServiceId),
}

/// Synthetic environment producing experiences, opinions and ground truth
pub trait Scenario {
    /// Scenario name, used in logs and output files
    fn name(&self) -> &'static str;

    fn set_current_time(&mut self, time: Tick);

    fn agents(&self) -> &[AgentId];

    fn services(&self) -> &[ServiceId];

    /// Hidden capabilities for `service`
    fn capabilities(&self, service: ServiceId) -> Result<&CapabilityMap, ScenarioError>;

    fn generate_opinions(&mut self) -> Result<Vec<Opinion>, ScenarioError>;

    fn generate_experiences(&mut self) -> Result<Vec<Experience>, ScenarioError>;
}

/// Scenario where the trust model decides whom it interacts with
pub trait InteractionPartnerSelection: Scenario {
    /// Partners for the upcoming experiences; invalid ids are ignored
    fn set_interaction_partners(&mut self, partners: &BTreeMap<ServiceId, AgentId>);
}

/// Scenario where the trust model decides whose opinions it receives
pub trait OpinionProviderSelection: InteractionPartnerSelection {
    /// Requests for the upcoming opinions; invalid requests are ignored
    fn set_opinion_requests(&mut self, requests: &BTreeSet<OpinionRequest>);
}
