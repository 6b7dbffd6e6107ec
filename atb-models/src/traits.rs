//! Common traits for trust models

use std::collections::{BTreeMap, BTreeSet};

use atb_core::{
    AgentId, Experience, Opinion, OpinionRequest, ParamError, Params, RandomError, ServiceId, Tick,
};
use thiserror::Error;

/// Errors from trust model operations
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Trust model {0} used before initialization")]
    Uninitialized(&'static str),

    #[error("Invalid parameters: {0}")]
    Params(#[from] ParamError),

    #[error("Random draw failed: {0}")]
    Random(#[from] RandomError),

    #[error("Negative value at {agent} => {value:.2}. Only positive values are allowed.")]
    NegativeTrust { agent: AgentId, value: f64 },
}

/// Trust estimates for one service, keyed by agent
pub type TrustMap = BTreeMap<AgentId, f64>;

/// Algorithm that turns experiences and opinions into trust estimates
///
/// Lifecycle: `initialize` once, then per tick any number of
/// `process_*` calls followed by `calculate_trust` and `get_trust`.
/// Every other call before `initialize` fails with
/// [`ModelError::Uninitialized`].
pub trait TrustModel {
    /// Model name, used in logs and output files
    fn name(&self) -> &'static str;

    /// Validate and apply positional parameters
    fn initialize(&mut self, params: &Params) -> Result<(), ModelError>;

    /// Current simulation tick
    fn set_current_time(&mut self, time: Tick) -> Result<(), ModelError>;

    /// Agents present in the scenario this tick
    fn set_agents(&mut self, _agents: &[AgentId]) -> Result<(), ModelError> {
        Ok(())
    }

    /// Services present in the scenario this tick
    fn set_services(&mut self, _services: &[ServiceId]) -> Result<(), ModelError> {
        Ok(())
    }

    fn process_experiences(&mut self, experiences: &[Experience]) -> Result<(), ModelError>;

    fn process_opinions(&mut self, opinions: &[Opinion]) -> Result<(), ModelError>;

    /// Fold the data received this tick into the estimates
    fn calculate_trust(&mut self) -> Result<(), ModelError>;

    /// Trust estimates for `service`; agents without evidence may be absent
    fn get_trust(&self, service: ServiceId) -> Result<TrustMap, ModelError>;
}

/// Trust model that also chooses whom to interact with
pub trait SelectingInteractionPartners: TrustModel {
    /// One partner per service; services without a candidate are absent
    fn interaction_partners(
        &mut self,
        services: &[ServiceId],
    ) -> Result<BTreeMap<ServiceId, AgentId>, ModelError>;
}

/// Trust model that also chooses whose opinions it wants
pub trait SelectingOpinionProviders: SelectingInteractionPartners {
    fn opinion_requests(&mut self) -> Result<BTreeSet<OpinionRequest>, ModelError>;
}
