//! Decision making on top of any trust model
//!
//! - [`SelectingPartners`] picks one interaction partner per service
//! - [`SelectingProviders`] additionally asks for opinions about agents it
//!   has little experience with
//!
//! Both wrappers take their settings as trailing parameters after the
//! wrapped model's own.

use std::collections::{BTreeMap, BTreeSet};

use atb_core::{
    AgentId, AgentVec, Experience, Opinion, OpinionRequest, Params, RandomSource, ServiceId, Tick,
    NON_NEGATIVE_INT, UNIT_INTERVAL,
};
use tracing::debug;

use crate::traits::{
    ModelError, SelectingInteractionPartners, SelectingOpinionProviders, TrustMap, TrustModel,
};

/// Trust values below this count as zero when exploring
pub const ZERO_TRUST: f64 = 0.0001;

/// Default interaction count below which opinions are requested
pub const DEFAULT_MIN_EXPERIENCES: u32 = 3;

/// Agent with the highest trust; ties go to the lowest id
pub fn maximal(trust: &TrustMap) -> Option<AgentId> {
    let mut best: Option<(AgentId, f64)> = None;
    for (&agent, &value) in trust {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, max)) if value <= max => {}
            _ => best = Some((agent, value)),
        }
    }
    best.map(|(agent, _)| agent)
}

/// Draw an agent with probability proportional to `trust ^ power`
///
/// Trust values need not sum to one but must be non-negative. If every
/// weight is zero the draw is uniform.
pub fn probabilistic_powered(
    trust: &TrustMap,
    power: f64,
    random: &mut RandomSource,
) -> Result<Option<AgentId>, ModelError> {
    let mut weights = BTreeMap::new();
    let mut sum = 0.0;

    for (&agent, &value) in trust {
        if value < 0.0 {
            return Err(ModelError::NegativeTrust { agent, value });
        }
        let weight = value.powf(power);
        weights.insert(agent, weight);
        sum += weight;
    }

    if weights.is_empty() {
        return Ok(None);
    }

    let uniform = 1.0 / weights.len() as f64;
    for weight in weights.values_mut() {
        *weight = if sum > 0.0 { *weight / sum } else { uniform };
    }

    Ok(random.from_weights(&weights)?)
}

/// How a partner is picked from the trust estimates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PartnerPolicy {
    /// Always the most trusted agent
    Maximal,
    /// Proportional to trust; with probability `explore` uniformly among
    /// agents whose trust is effectively zero
    Probabilistic { explore: f64 },
}

/// Trust model with interaction-partner selection
///
/// Trailing parameters: `[probabilistic: bool, explore: [0, 1]]`.
#[derive(Debug, Clone)]
pub struct SelectingPartners<M> {
    inner: M,
    random: RandomSource,
    policy: Option<PartnerPolicy>,
}

impl<M: TrustModel> SelectingPartners<M> {
    pub fn new(inner: M, random: RandomSource) -> Self {
        Self {
            inner,
            random,
            policy: None,
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn policy(&self) -> Option<PartnerPolicy> {
        self.policy
    }

    fn select(&mut self, policy: PartnerPolicy, trust: &TrustMap) -> Result<Option<AgentId>, ModelError> {
        match policy {
            PartnerPolicy::Maximal => Ok(maximal(trust)),
            PartnerPolicy::Probabilistic { explore } => {
                if self.random.next_double() < explore {
                    let unknown: TrustMap = trust
                        .iter()
                        .filter(|(_, value)| **value < ZERO_TRUST)
                        .map(|(&agent, _)| (agent, 1.0))
                        .collect();
                    if !unknown.is_empty() {
                        return probabilistic_powered(&unknown, 1.0, &mut self.random);
                    }
                }
                probabilistic_powered(trust, 1.0, &mut self.random)
            }
        }
    }
}

impl<M: TrustModel> TrustModel for SelectingPartners<M> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn initialize(&mut self, params: &Params) -> Result<(), ModelError> {
        let (own, _) = params.split_tail(2)?;
        let n = params.len();
        let probabilistic = params.flag(n - 2)?;
        let explore = params.float(n - 1, UNIT_INTERVAL)?;

        self.inner.initialize(&own)?;
        self.policy = Some(if probabilistic {
            PartnerPolicy::Probabilistic { explore }
        } else {
            PartnerPolicy::Maximal
        });
        Ok(())
    }

    fn set_current_time(&mut self, time: Tick) -> Result<(), ModelError> {
        self.inner.set_current_time(time)
    }

    fn set_agents(&mut self, agents: &[AgentId]) -> Result<(), ModelError> {
        self.inner.set_agents(agents)
    }

    fn set_services(&mut self, services: &[ServiceId]) -> Result<(), ModelError> {
        self.inner.set_services(services)
    }

    fn process_experiences(&mut self, experiences: &[Experience]) -> Result<(), ModelError> {
        self.inner.process_experiences(experiences)
    }

    fn process_opinions(&mut self, opinions: &[Opinion]) -> Result<(), ModelError> {
        self.inner.process_opinions(opinions)
    }

    fn calculate_trust(&mut self) -> Result<(), ModelError> {
        self.inner.calculate_trust()
    }

    fn get_trust(&self, service: ServiceId) -> Result<TrustMap, ModelError> {
        self.inner.get_trust(service)
    }
}

impl<M: TrustModel> SelectingInteractionPartners for SelectingPartners<M> {
    fn interaction_partners(
        &mut self,
        services: &[ServiceId],
    ) -> Result<BTreeMap<ServiceId, AgentId>, ModelError> {
        let policy = self.policy.ok_or(ModelError::Uninitialized(self.inner.name()))?;
        let mut partners = BTreeMap::new();

        for &service in services {
            let trust = self.inner.get_trust(service)?;
            match self.select(policy, &trust)? {
                Some(agent) => {
                    partners.insert(service, agent);
                }
                None => debug!(service, "No candidate partner"),
            }
        }

        Ok(partners)
    }
}

/// Trust model with partner and opinion-provider selection
///
/// Trailing parameter, after the partner settings: `[min_experiences: int ≥ 0]`.
#[derive(Debug, Clone)]
pub struct SelectingProviders<M> {
    partners: SelectingPartners<M>,
    min_experiences: Option<u32>,
    agents: Vec<AgentId>,
    services: Vec<ServiceId>,
    interactions: AgentVec<u32>,
}

impl<M: TrustModel> SelectingProviders<M> {
    pub fn new(inner: M, random: RandomSource) -> Self {
        Self {
            partners: SelectingPartners::new(inner, random),
            min_experiences: None,
            agents: Vec::new(),
            services: Vec::new(),
            interactions: AgentVec::new(0, 0),
        }
    }

    pub fn inner(&self) -> &M {
        self.partners.inner()
    }
}

impl<M: TrustModel> TrustModel for SelectingProviders<M> {
    fn name(&self) -> &'static str {
        self.partners.name()
    }

    fn initialize(&mut self, params: &Params) -> Result<(), ModelError> {
        let (own, _) = params.split_tail(1)?;
        let min = params.int(params.len() - 1, NON_NEGATIVE_INT)?;

        self.partners.initialize(&own)?;
        self.min_experiences = Some(u32::try_from(min).unwrap_or(u32::MAX));
        Ok(())
    }

    fn set_current_time(&mut self, time: Tick) -> Result<(), ModelError> {
        self.partners.set_current_time(time)
    }

    fn set_agents(&mut self, agents: &[AgentId]) -> Result<(), ModelError> {
        self.partners.set_agents(agents)?;
        self.agents = agents.to_vec();
        Ok(())
    }

    fn set_services(&mut self, services: &[ServiceId]) -> Result<(), ModelError> {
        self.partners.set_services(services)?;
        self.services = services.to_vec();
        Ok(())
    }

    fn process_experiences(&mut self, experiences: &[Experience]) -> Result<(), ModelError> {
        self.partners.process_experiences(experiences)?;
        for e in experiences {
            self.interactions.grow_to(e.agent);
            self.interactions[e.agent] += 1;
        }
        Ok(())
    }

    fn process_opinions(&mut self, opinions: &[Opinion]) -> Result<(), ModelError> {
        self.partners.process_opinions(opinions)
    }

    fn calculate_trust(&mut self) -> Result<(), ModelError> {
        self.partners.calculate_trust()
    }

    fn get_trust(&self, service: ServiceId) -> Result<TrustMap, ModelError> {
        self.partners.get_trust(service)
    }
}

impl<M: TrustModel> SelectingInteractionPartners for SelectingProviders<M> {
    fn interaction_partners(
        &mut self,
        services: &[ServiceId],
    ) -> Result<BTreeMap<ServiceId, AgentId>, ModelError> {
        self.partners.interaction_partners(services)
    }
}

impl<M: TrustModel> SelectingOpinionProviders for SelectingProviders<M> {
    fn opinion_requests(&mut self) -> Result<BTreeSet<OpinionRequest>, ModelError> {
        let min = self
            .min_experiences
            .ok_or(ModelError::Uninitialized(self.partners.name()))?;
        let mut requests = BTreeSet::new();

        for &subject in &self.agents {
            let known = self.interactions.get(subject).copied().unwrap_or(0);
            if known >= min {
                continue;
            }
            for &reporter in self.agents.iter().filter(|&&r| r != subject) {
                for &service in &self.services {
                    requests.insert(OpinionRequest::new(reporter, subject, service));
                }
            }
        }

        Ok(requests)
    }
}
