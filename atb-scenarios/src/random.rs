//! Random scenarios
//!
//! A fixed population with uniformly drawn capabilities:
//! - every non-silent agent gives opinions about every agent, each a noisy
//!   view of the true capability passed through its deception model
//! - plain variant: one interaction per tick, cycling through a random
//!   subset of partners
//! - selection variants: the trust model picks partners, and optionally
//!   which opinions it receives

use std::collections::{BTreeMap, BTreeSet};

use atb_core::{AgentId, Experience, Opinion, OpinionRequest, RandomSource, ServiceId, Tick};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::deception::{assign_kind, DeceptionKind, DeceptionModel};
use crate::traits::{
    CapabilityMap, InteractionPartnerSelection, OpinionProviderSelection, Scenario, ScenarioError,
};

/// Allowed deviation of the deception shares from one
pub const SHARE_TOLERANCE: f64 = 0.001;

/// Shares of the population per deception kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeceptionMix {
    pub truthful: f64,
    pub silent: f64,
    pub positive: f64,
    pub negative: f64,
    pub complementary: f64,
    pub random: f64,
}

impl Default for DeceptionMix {
    fn default() -> Self {
        Self {
            truthful: 1.0,
            silent: 0.0,
            positive: 0.0,
            negative: 0.0,
            complementary: 0.0,
            random: 0.0,
        }
    }
}

impl DeceptionMix {
    /// Shares in assignment order
    pub fn shares(&self) -> [(DeceptionKind, f64); 6] {
        [
            (DeceptionKind::Complementary, self.complementary),
            (DeceptionKind::NegativeExaggeration, self.negative),
            (DeceptionKind::PositiveExaggeration, self.positive),
            (DeceptionKind::Random, self.random),
            (DeceptionKind::Silent, self.silent),
            (DeceptionKind::Truthful, self.truthful),
        ]
    }

    pub fn total(&self) -> f64 {
        self.shares().iter().map(|(_, share)| share).sum()
    }
}

/// Random scenario configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RandomConfig {
    pub num_agents: usize,
    pub num_services: usize,
    /// Standard deviation of interaction outcomes around the capability
    pub experience_sd: f64,
    /// Standard deviation of believed degrees around the capability
    pub opinion_sd: f64,
    pub deception: DeceptionMix,
    pub positive_kappa: f64,
    pub negative_kappa: f64,
    /// Share of agents the plain variant interacts with
    pub interaction_density: f64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            num_agents: 100,
            num_services: 1,
            experience_sd: 0.1,
            opinion_sd: 0.05,
            deception: DeceptionMix::default(),
            positive_kappa: 0.25,
            negative_kappa: 0.25,
            interaction_density: 1.0,
        }
    }
}

fn violation(field: &'static str, constraint: &'static str, value: impl ToString) -> ScenarioError {
    ScenarioError::Config {
        field,
        constraint,
        value: value.to_string(),
    }
}

impl RandomConfig {
    pub fn with_agents(mut self, num_agents: usize) -> Self {
        self.num_agents = num_agents;
        self
    }

    pub fn with_deception(mut self, deception: DeceptionMix) -> Self {
        self.deception = deception;
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.interaction_density = density;
        self
    }

    /// Check every setting against its allowed range
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.num_agents < 1 {
            return Err(violation("num_agents", "must be at least 1", self.num_agents));
        }
        if self.num_services < 1 {
            return Err(violation("num_services", "must be at least 1", self.num_services));
        }
        for (field, sd) in [("experience_sd", self.experience_sd), ("opinion_sd", self.opinion_sd)] {
            if !(sd >= 0.0) {
                return Err(violation(field, "must be non-negative", format!("{:.2}", sd)));
            }
        }
        for (field, value) in [
            ("positive_kappa", self.positive_kappa),
            ("negative_kappa", self.negative_kappa),
            ("interaction_density", self.interaction_density),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(violation(
                    field,
                    "must be between 0 and 1 inclusively",
                    format!("{:.2}", value),
                ));
            }
        }
        if let Some((_, share)) = self
            .deception
            .shares()
            .into_iter()
            .find(|(_, share)| !(0.0..=1.0).contains(share))
        {
            return Err(violation(
                "deception",
                "shares must be between 0 and 1 inclusively",
                format!("{:.2}", share),
            ));
        }
        let total = self.deception.total();
        if (1.0 - total).abs() > SHARE_TOLERANCE {
            return Err(violation("deception", "shares must sum to 1.00", format!("{:.2}", total)));
        }
        Ok(())
    }
}

/// Random scenario with a fixed interaction schedule
#[derive(Debug, Clone)]
pub struct RandomScenario {
    config: RandomConfig,
    random: RandomSource,
    time: Tick,
    agents: Vec<AgentId>,
    services: Vec<ServiceId>,
    /// Capabilities, one map per service
    capabilities: Vec<CapabilityMap>,
    /// Deception model per reporting agent; silent agents are absent
    deception: BTreeMap<AgentId, DeceptionModel>,
    partners: Vec<AgentId>,
}

impl RandomScenario {
    pub fn new(config: RandomConfig, mut random: RandomSource) -> Result<Self, ScenarioError> {
        config.validate()?;

        let agents: Vec<AgentId> = (0..config.num_agents).collect();
        let services: Vec<ServiceId> = (0..config.num_services).collect();
        let mut capabilities = vec![CapabilityMap::new(); services.len()];
        let mut deception = BTreeMap::new();
        let shares = config.deception.shares();

        for &agent in &agents {
            for caps in capabilities.iter_mut() {
                caps.insert(agent, random.next_double_from_to(0.0, 1.0));
            }

            let kind = assign_kind(agent, config.num_agents, &shares).ok_or_else(|| {
                violation("deception", "shares must cover every agent", format!("agent {}", agent))
            })?;
            if let Some(model) =
                DeceptionModel::for_kind(kind, config.positive_kappa, config.negative_kappa)
            {
                deception.insert(agent, model);
            }
        }

        let partners = random.choose_random(&agents, config.interaction_density);

        info!(
            agents = agents.len(),
            services = services.len(),
            reporters = deception.len(),
            partners = partners.len(),
            "Random scenario ready"
        );

        Ok(Self {
            config,
            random,
            time: 0,
            agents,
            services,
            capabilities,
            deception,
            partners,
        })
    }

    pub fn config(&self) -> &RandomConfig {
        &self.config
    }

    pub fn deception_model(&self, agent: AgentId) -> Option<&DeceptionModel> {
        self.deception.get(&agent)
    }

    /// Agents the plain variant interacts with, in schedule order
    pub fn partners(&self) -> &[AgentId] {
        &self.partners
    }

    fn is_agent(&self, agent: AgentId) -> bool {
        agent < self.agents.len()
    }

    fn is_service(&self, service: ServiceId) -> bool {
        service < self.services.len()
    }

    /// Opinion of `reporter` about `subject`; `None` if the reporter is silent
    fn opinion(
        &mut self,
        reporter: AgentId,
        subject: AgentId,
        service: ServiceId,
    ) -> Result<Option<Opinion>, ScenarioError> {
        let Some(model) = self.deception.get(&reporter).copied() else {
            return Ok(None);
        };

        let capability = self.capabilities[service][&subject];
        let believed = self.random.next_unit_tnd(capability, self.config.opinion_sd)?;
        let degree = model.apply(believed, &mut self.random);

        Ok(Some(Opinion::new(reporter, subject, service, self.time, degree)))
    }

    fn experience(&mut self, agent: AgentId, service: ServiceId) -> Result<Experience, ScenarioError> {
        let capability = self.capabilities[service][&agent];
        let outcome = self.random.next_unit_tnd(capability, self.config.experience_sd)?;
        Ok(Experience::new(agent, service, self.time, outcome))
    }
}

impl Scenario for RandomScenario {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn set_current_time(&mut self, time: Tick) {
        self.time = time;
    }

    fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    fn services(&self) -> &[ServiceId] {
        &self.services
    }

    fn capabilities(&self, service: ServiceId) -> Result<&CapabilityMap, ScenarioError> {
        self.capabilities
            .get(service)
            .ok_or(ScenarioError::UnknownService(service))
    }

    fn generate_opinions(&mut self) -> Result<Vec<Opinion>, ScenarioError> {
        let mut opinions = Vec::new();
        for reporter in 0..self.agents.len() {
            for subject in 0..self.agents.len() {
                for service in 0..self.services.len() {
                    if let Some(opinion) = self.opinion(reporter, subject, service)? {
                        opinions.push(opinion);
                    }
                }
            }
        }
        Ok(opinions)
    }

    fn generate_experiences(&mut self) -> Result<Vec<Experience>, ScenarioError> {
        if self.partners.is_empty() {
            return Ok(Vec::new());
        }

        let agent = self.partners[self.time as usize % self.partners.len()];
        let mut experiences = Vec::with_capacity(self.services.len());
        for service in 0..self.services.len() {
            experiences.push(self.experience(agent, service)?);
        }
        Ok(experiences)
    }
}

/// Random scenario where the trust model picks interaction partners
#[derive(Debug, Clone)]
pub struct RandomWithPartners {
    base: RandomScenario,
    selected: BTreeMap<ServiceId, AgentId>,
}

impl RandomWithPartners {
    pub fn new(config: RandomConfig, random: RandomSource) -> Result<Self, ScenarioError> {
        Ok(Self {
            base: RandomScenario::new(config, random)?,
            selected: BTreeMap::new(),
        })
    }

    pub fn base(&self) -> &RandomScenario {
        &self.base
    }
}

impl Scenario for RandomWithPartners {
    fn name(&self) -> &'static str {
        "Random with partner selection"
    }

    fn set_current_time(&mut self, time: Tick) {
        self.base.set_current_time(time);
    }

    fn agents(&self) -> &[AgentId] {
        self.base.agents()
    }

    fn services(&self) -> &[ServiceId] {
        self.base.services()
    }

    fn capabilities(&self, service: ServiceId) -> Result<&CapabilityMap, ScenarioError> {
        self.base.capabilities(service)
    }

    fn generate_opinions(&mut self) -> Result<Vec<Opinion>, ScenarioError> {
        self.base.generate_opinions()
    }

    fn generate_experiences(&mut self) -> Result<Vec<Experience>, ScenarioError> {
        let selected = std::mem::take(&mut self.selected);
        let mut experiences = Vec::with_capacity(selected.len());

        for (service, agent) in selected {
            if !self.base.is_agent(agent) || !self.base.is_service(service) {
                debug!(service, agent, "Ignoring invalid partner selection");
                continue;
            }
            experiences.push(self.base.experience(agent, service)?);
        }
        Ok(experiences)
    }
}

impl InteractionPartnerSelection for RandomWithPartners {
    fn set_interaction_partners(&mut self, partners: &BTreeMap<ServiceId, AgentId>) {
        self.selected = partners.clone();
    }
}

/// Random scenario where the trust model also picks whose opinions it gets
#[derive(Debug, Clone)]
pub struct RandomWithProviders {
    inner: RandomWithPartners,
    requests: BTreeSet<OpinionRequest>,
}

impl RandomWithProviders {
    pub fn new(config: RandomConfig, random: RandomSource) -> Result<Self, ScenarioError> {
        Ok(Self {
            inner: RandomWithPartners::new(config, random)?,
            requests: BTreeSet::new(),
        })
    }

    pub fn base(&self) -> &RandomScenario {
        self.inner.base()
    }
}

impl Scenario for RandomWithProviders {
    fn name(&self) -> &'static str {
        "Random with opinion provider selection"
    }

    fn set_current_time(&mut self, time: Tick) {
        self.inner.set_current_time(time);
    }

    fn agents(&self) -> &[AgentId] {
        self.inner.agents()
    }

    fn services(&self) -> &[ServiceId] {
        self.inner.services()
    }

    fn capabilities(&self, service: ServiceId) -> Result<&CapabilityMap, ScenarioError> {
        self.inner.capabilities(service)
    }

    fn generate_opinions(&mut self) -> Result<Vec<Opinion>, ScenarioError> {
        let requests = std::mem::take(&mut self.requests);
        let base = &mut self.inner.base;
        let mut opinions = Vec::with_capacity(requests.len());

        for request in requests {
            let valid = base.is_agent(request.reporter)
                && base.is_agent(request.subject)
                && base.is_service(request.service);
            if !valid {
                debug!(?request, "Ignoring invalid opinion request");
                continue;
            }
            if let Some(opinion) = base.opinion(request.reporter, request.subject, request.service)? {
                opinions.push(opinion);
            }
        }
        Ok(opinions)
    }

    fn generate_experiences(&mut self) -> Result<Vec<Experience>, ScenarioError> {
        self.inner.generate_experiences()
    }
}

impl InteractionPartnerSelection for RandomWithProviders {
    fn set_interaction_partners(&mut self, partners: &BTreeMap<ServiceId, AgentId>) {
        self.inner.set_interaction_partners(partners);
    }
}

impl OpinionProviderSelection for RandomWithProviders {
    fn set_opinion_requests(&mut self, requests: &BTreeSet<OpinionRequest>) {
        self.requests = requests.clone();
    }
}
