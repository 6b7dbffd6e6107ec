//! Evaluation protocol
//!
//! Wires a trust model, a scenario and metrics together and advances the
//! simulation one tick at a time:
//! - the evaluation mode is chosen once, from the capabilities of the
//!   model, the scenario and the supplied metrics
//! - every tick runs a fixed, strictly sequential pipeline
//! - scores are stored per metric role and service, and pulled by callers
//!   (or subscribers) once the tick is complete

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use atb_core::{AgentId, OpinionRequest, ServiceId, Tick};
use atb_models::{
    ModelError, SelectingInteractionPartners, SelectingOpinionProviders, TrustModel,
};
use atb_scenarios::{
    InteractionPartnerSelection, OpinionProviderSelection, Scenario, ScenarioError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::metrics::{AccuracyMetric, OpinionCostMetric, UtilityMetric};

/// Errors from protocol construction, stepping and queries
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Cannot evaluate a {model} trust model on a {scenario} scenario with metrics [{metrics}]")]
    CapabilityMismatch {
        model: Capability,
        scenario: Capability,
        metrics: String,
    },

    #[error("Invalid query for metric '{role}' and service '{service}'")]
    InvalidQuery { role: MetricRole, service: ServiceId },

    #[error("Trust model error: {0}")]
    Model(#[from] ModelError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),
}

/// Decision-making capability of a model or a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Plain,
    SelectingPartners,
    SelectingProviders,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Capability::Plain => "plain",
            Capability::SelectingPartners => "partner-selecting",
            Capability::SelectingProviders => "provider-selecting",
        };
        f.write_str(label)
    }
}

/// Role a metric plays in the evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricRole {
    Accuracy,
    Utility,
    OpinionCost,
}

impl fmt::Display for MetricRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MetricRole::Accuracy => "accuracy",
            MetricRole::Utility => "utility",
            MetricRole::OpinionCost => "opinion_cost",
        };
        f.write_str(label)
    }
}

/// Trust model together with its decision-making capability
pub enum ModelHandle {
    Plain(Box<dyn TrustModel>),
    SelectingPartners(Box<dyn SelectingInteractionPartners>),
    SelectingProviders(Box<dyn SelectingOpinionProviders>),
}

impl ModelHandle {
    pub fn plain(model: impl TrustModel + 'static) -> Self {
        ModelHandle::Plain(Box::new(model))
    }

    pub fn partners(model: impl SelectingInteractionPartners + 'static) -> Self {
        ModelHandle::SelectingPartners(Box::new(model))
    }

    pub fn providers(model: impl SelectingOpinionProviders + 'static) -> Self {
        ModelHandle::SelectingProviders(Box::new(model))
    }

    pub fn capability(&self) -> Capability {
        match self {
            ModelHandle::Plain(_) => Capability::Plain,
            ModelHandle::SelectingPartners(_) => Capability::SelectingPartners,
            ModelHandle::SelectingProviders(_) => Capability::SelectingProviders,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelHandle::Plain(m) => m.name(),
            ModelHandle::SelectingPartners(m) => m.name(),
            ModelHandle::SelectingProviders(m) => m.name(),
        }
    }
}

/// Scenario together with its decision-making capability
pub enum ScenarioHandle {
    Plain(Box<dyn Scenario>),
    SelectingPartners(Box<dyn InteractionPartnerSelection>),
    SelectingProviders(Box<dyn OpinionProviderSelection>),
}

impl ScenarioHandle {
    pub fn plain(scenario: impl Scenario + 'static) -> Self {
        ScenarioHandle::Plain(Box::new(scenario))
    }

    pub fn partners(scenario: impl InteractionPartnerSelection + 'static) -> Self {
        ScenarioHandle::SelectingPartners(Box::new(scenario))
    }

    pub fn providers(scenario: impl OpinionProviderSelection + 'static) -> Self {
        ScenarioHandle::SelectingProviders(Box::new(scenario))
    }

    pub fn capability(&self) -> Capability {
        match self {
            ScenarioHandle::Plain(_) => Capability::Plain,
            ScenarioHandle::SelectingPartners(_) => Capability::SelectingPartners,
            ScenarioHandle::SelectingProviders(_) => Capability::SelectingProviders,
        }
    }
}

/// Metrics supplied to the protocol
#[derive(Default)]
pub struct MetricSet {
    pub accuracy: Option<Box<dyn AccuracyMetric>>,
    pub utility: Option<Box<dyn UtilityMetric>>,
    pub opinion_cost: Option<Box<dyn OpinionCostMetric>>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accuracy(mut self, metric: impl AccuracyMetric + 'static) -> Self {
        self.accuracy = Some(Box::new(metric));
        self
    }

    pub fn with_utility(mut self, metric: impl UtilityMetric + 'static) -> Self {
        self.utility = Some(Box::new(metric));
        self
    }

    pub fn with_opinion_cost(mut self, metric: impl OpinionCostMetric + 'static) -> Self {
        self.opinion_cost = Some(Box::new(metric));
        self
    }

    fn describe(&self) -> String {
        let mut names = Vec::new();
        if let Some(m) = &self.accuracy {
            names.push(m.name());
        }
        if let Some(m) = &self.utility {
            names.push(m.name());
        }
        if let Some(m) = &self.opinion_cost {
            names.push(m.name());
        }
        names.join(", ")
    }
}

/// Evaluation mode, as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    NoDecisions,
    Utility,
    OpinionCost,
}

impl ModeKind {
    /// Metric roles this mode produces, in scoring order
    pub fn roles(&self) -> &'static [MetricRole] {
        match self {
            ModeKind::NoDecisions => &[MetricRole::Accuracy],
            ModeKind::Utility => &[MetricRole::Accuracy, MetricRole::Utility],
            ModeKind::OpinionCost => &[
                MetricRole::Accuracy,
                MetricRole::Utility,
                MetricRole::OpinionCost,
            ],
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModeKind::NoDecisions => "no decisions",
            ModeKind::Utility => "utility",
            ModeKind::OpinionCost => "opinion cost",
        };
        f.write_str(label)
    }
}

/// Latest score for a metric role and service
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    /// Tick that produced the value
    pub tick: Tick,
    pub value: f64,
}

/// Receives a notification after every completed tick
pub trait MetricSubscriber {
    fn update(&mut self, protocol: &EvaluationProtocol);
}

/// Logs every score produced in the tick that just completed
#[derive(Debug, Default)]
pub struct TickLogger;

impl MetricSubscriber for TickLogger {
    fn update(&mut self, protocol: &EvaluationProtocol) {
        let Some(tick) = protocol.current_tick() else {
            return;
        };
        for (role, service, score) in protocol.scores() {
            if score.tick == tick {
                debug!(tick, %role, service, value = score.value, "Score");
            }
        }
    }
}

/// Metric prototype plus the instances spawned from it, one per service
struct PerService<T: ?Sized> {
    prototype: Box<T>,
    instances: BTreeMap<ServiceId, Box<T>>,
}

impl<T: ?Sized> PerService<T> {
    fn new(prototype: Box<T>) -> Self {
        Self {
            prototype,
            instances: BTreeMap::new(),
        }
    }

    fn instance(&mut self, service: ServiceId, spawn: impl FnOnce(&T) -> Box<T>) -> &mut T {
        let prototype = &*self.prototype;
        &mut **self
            .instances
            .entry(service)
            .or_insert_with(|| spawn(prototype))
    }
}

enum Mode {
    NoDecisions {
        model: Box<dyn TrustModel>,
        scenario: Box<dyn Scenario>,
    },
    Utility {
        model: Box<dyn SelectingInteractionPartners>,
        scenario: Box<dyn InteractionPartnerSelection>,
        utility: PerService<dyn UtilityMetric>,
    },
    OpinionCost {
        model: Box<dyn SelectingOpinionProviders>,
        scenario: Box<dyn OpinionProviderSelection>,
        utility: PerService<dyn UtilityMetric>,
        opinion_cost: PerService<dyn OpinionCostMetric>,
    },
}

type Results = BTreeMap<(MetricRole, ServiceId), Score>;

/// Tick-driven evaluation of one trust model on one scenario
pub struct EvaluationProtocol {
    mode: Mode,
    model_name: &'static str,
    scenario_name: &'static str,
    accuracy: PerService<dyn AccuracyMetric>,
    metric_names: BTreeMap<MetricRole, &'static str>,
    results: Results,
    subscribers: Vec<Box<dyn MetricSubscriber>>,
    current_tick: Option<Tick>,
}

impl EvaluationProtocol {
    /// Select the evaluation mode for the given collaborators
    ///
    /// Succeeds only for matching capability levels with exactly the
    /// metrics that mode needs.
    pub fn new(
        model: ModelHandle,
        scenario: ScenarioHandle,
        metrics: MetricSet,
    ) -> Result<Self, ProtocolError> {
        let mismatch = |model: &ModelHandle, scenario: &ScenarioHandle, metrics: &MetricSet| {
            ProtocolError::CapabilityMismatch {
                model: model.capability(),
                scenario: scenario.capability(),
                metrics: metrics.describe(),
            }
        };

        let model_name = model.name();
        let mut metric_names = BTreeMap::new();

        let (mode, accuracy, scenario_name) = match (model, scenario, metrics) {
            (
                ModelHandle::Plain(model),
                ScenarioHandle::Plain(scenario),
                MetricSet {
                    accuracy: Some(accuracy),
                    utility: None,
                    opinion_cost: None,
                },
            ) => {
                let name = scenario.name();
                metric_names.insert(MetricRole::Accuracy, accuracy.name());
                (Mode::NoDecisions { model, scenario }, accuracy, name)
            }
            (
                ModelHandle::SelectingPartners(model),
                ScenarioHandle::SelectingPartners(scenario),
                MetricSet {
                    accuracy: Some(accuracy),
                    utility: Some(utility),
                    opinion_cost: None,
                },
            ) => {
                let name = scenario.name();
                metric_names.insert(MetricRole::Accuracy, accuracy.name());
                metric_names.insert(MetricRole::Utility, utility.name());
                let mode = Mode::Utility {
                    model,
                    scenario,
                    utility: PerService::new(utility),
                };
                (mode, accuracy, name)
            }
            (
                ModelHandle::SelectingProviders(model),
                ScenarioHandle::SelectingProviders(scenario),
                MetricSet {
                    accuracy: Some(accuracy),
                    utility: Some(utility),
                    opinion_cost: Some(opinion_cost),
                },
            ) => {
                let name = scenario.name();
                metric_names.insert(MetricRole::Accuracy, accuracy.name());
                metric_names.insert(MetricRole::Utility, utility.name());
                metric_names.insert(MetricRole::OpinionCost, opinion_cost.name());
                let mode = Mode::OpinionCost {
                    model,
                    scenario,
                    utility: PerService::new(utility),
                    opinion_cost: PerService::new(opinion_cost),
                };
                (mode, accuracy, name)
            }
            (model, scenario, metrics) => return Err(mismatch(&model, &scenario, &metrics)),
        };

        let protocol = Self {
            mode,
            model_name,
            scenario_name,
            accuracy: PerService::new(accuracy),
            metric_names,
            results: Results::new(),
            subscribers: Vec::new(),
            current_tick: None,
        };

        info!(
            model = model_name,
            scenario = scenario_name,
            mode = %protocol.mode(),
            "Evaluation protocol ready"
        );

        Ok(protocol)
    }

    pub fn mode(&self) -> ModeKind {
        match self.mode {
            Mode::NoDecisions { .. } => ModeKind::NoDecisions,
            Mode::Utility { .. } => ModeKind::Utility,
            Mode::OpinionCost { .. } => ModeKind::OpinionCost,
        }
    }

    pub fn trust_model_name(&self) -> &'static str {
        self.model_name
    }

    pub fn scenario_name(&self) -> &'static str {
        self.scenario_name
    }

    /// Name of the metric playing `role`, if the mode uses one
    pub fn metric_name(&self, role: MetricRole) -> Option<&'static str> {
        self.metric_names.get(&role).copied()
    }

    /// Services of the scenario
    pub fn services(&self) -> &[ServiceId] {
        match &self.mode {
            Mode::NoDecisions { scenario, .. } => scenario.services(),
            Mode::Utility { scenario, .. } => scenario.services(),
            Mode::OpinionCost { scenario, .. } => scenario.services(),
        }
    }

    /// Last completed tick
    pub fn current_tick(&self) -> Option<Tick> {
        self.current_tick
    }

    pub fn subscribe(&mut self, subscriber: impl MetricSubscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Latest value of `role` for `service`
    pub fn result(&self, role: MetricRole, service: ServiceId) -> Result<f64, ProtocolError> {
        self.score(role, service).map(|score| score.value)
    }

    /// Latest value of `role` for `service`, with the tick that produced it
    pub fn score(&self, role: MetricRole, service: ServiceId) -> Result<Score, ProtocolError> {
        self.results
            .get(&(role, service))
            .copied()
            .ok_or(ProtocolError::InvalidQuery { role, service })
    }

    /// Every stored score
    pub fn scores(&self) -> impl Iterator<Item = (MetricRole, ServiceId, Score)> + '_ {
        self.results
            .iter()
            .map(|(&(role, service), &score)| (role, service, score))
    }

    /// Run one tick, then notify subscribers
    pub fn step(&mut self, tick: Tick) -> Result<(), ProtocolError> {
        let Self {
            mode,
            accuracy,
            results,
            ..
        } = self;

        match mode {
            Mode::NoDecisions { model, scenario } => {
                let services = convey(&mut **model, &mut **scenario, tick)?;
                exchange_opinions(&mut **model, &mut **scenario)?;
                exchange_experiences(&mut **model, &mut **scenario)?;
                model.calculate_trust()?;

                score_accuracy(&**model, &**scenario, &services, accuracy, results, tick)?;
            }
            Mode::Utility {
                model,
                scenario,
                utility,
            } => {
                let services = convey(&mut **model, &mut **scenario, tick)?;
                exchange_opinions(&mut **model, &mut **scenario)?;

                let partners = model.interaction_partners(&services)?;
                scenario.set_interaction_partners(&partners);

                exchange_experiences(&mut **model, &mut **scenario)?;
                model.calculate_trust()?;

                score_accuracy(&**model, &**scenario, &services, accuracy, results, tick)?;
                score_utility(&**scenario, &services, &partners, utility, results, tick)?;
            }
            Mode::OpinionCost {
                model,
                scenario,
                utility,
                opinion_cost,
            } => {
                let services = convey(&mut **model, &mut **scenario, tick)?;

                let requests = model.opinion_requests()?;
                scenario.set_opinion_requests(&requests);
                debug!(tick, requests = requests.len(), "Opinion requests");

                exchange_opinions(&mut **model, &mut **scenario)?;

                let partners = model.interaction_partners(&services)?;
                scenario.set_interaction_partners(&partners);

                exchange_experiences(&mut **model, &mut **scenario)?;
                model.calculate_trust()?;

                score_accuracy(&**model, &**scenario, &services, accuracy, results, tick)?;
                score_utility(&**scenario, &services, &partners, utility, results, tick)?;
                score_opinion_cost(
                    scenario.agents(),
                    &services,
                    &requests,
                    opinion_cost,
                    results,
                    tick,
                );
            }
        }

        self.current_tick = Some(tick);

        let mut subscribers = std::mem::take(&mut self.subscribers);
        for subscriber in subscribers.iter_mut() {
            subscriber.update(self);
        }
        self.subscribers = subscribers;

        Ok(())
    }
}

/// Propagate time, services and agents; returns the services
fn convey<M, S>(model: &mut M, scenario: &mut S, tick: Tick) -> Result<Vec<ServiceId>, ProtocolError>
where
    M: TrustModel + ?Sized,
    S: Scenario + ?Sized,
{
    model.set_current_time(tick)?;
    scenario.set_current_time(tick);

    let services = scenario.services().to_vec();
    model.set_services(&services)?;
    model.set_agents(scenario.agents())?;
    Ok(services)
}

fn exchange_opinions<M, S>(model: &mut M, scenario: &mut S) -> Result<(), ProtocolError>
where
    M: TrustModel + ?Sized,
    S: Scenario + ?Sized,
{
    let opinions = scenario.generate_opinions()?;
    debug!(opinions = opinions.len(), "Conveying opinions");
    model.process_opinions(&opinions)?;
    Ok(())
}

fn exchange_experiences<M, S>(model: &mut M, scenario: &mut S) -> Result<(), ProtocolError>
where
    M: TrustModel + ?Sized,
    S: Scenario + ?Sized,
{
    let experiences = scenario.generate_experiences()?;
    debug!(experiences = experiences.len(), "Conveying experiences");
    model.process_experiences(&experiences)?;
    Ok(())
}

fn score_accuracy<M, S>(
    model: &M,
    scenario: &S,
    services: &[ServiceId],
    accuracy: &mut PerService<dyn AccuracyMetric>,
    results: &mut Results,
    tick: Tick,
) -> Result<(), ProtocolError>
where
    M: TrustModel + ?Sized,
    S: Scenario + ?Sized,
{
    for &service in services {
        let capabilities = scenario.capabilities(service)?;
        let trust = model.get_trust(service)?;
        let value = accuracy
            .instance(service, |m| m.spawn())
            .evaluate(&trust, capabilities);
        results.insert((MetricRole::Accuracy, service), Score { tick, value });
    }
    Ok(())
}

fn score_utility<S>(
    scenario: &S,
    services: &[ServiceId],
    partners: &BTreeMap<ServiceId, AgentId>,
    utility: &mut PerService<dyn UtilityMetric>,
    results: &mut Results,
    tick: Tick,
) -> Result<(), ProtocolError>
where
    S: Scenario + ?Sized,
{
    for &service in services {
        let Some(&agent) = partners.get(&service) else {
            continue;
        };
        let capabilities = scenario.capabilities(service)?;
        let value = utility
            .instance(service, |m| m.spawn())
            .evaluate(capabilities, agent);
        results.insert((MetricRole::Utility, service), Score { tick, value });
    }
    Ok(())
}

fn score_opinion_cost(
    agents: &[AgentId],
    services: &[ServiceId],
    requests: &BTreeSet<OpinionRequest>,
    opinion_cost: &mut PerService<dyn OpinionCostMetric>,
    results: &mut Results,
    tick: Tick,
) {
    for &service in services {
        let value = opinion_cost
            .instance(service, |m| m.spawn())
            .evaluate(agents, services, requests);
        results.insert((MetricRole::OpinionCost, service), Score { tick, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{DefaultOpinionCost, KendallsTauA, NormalizedUtility};
    use atb_core::{params, RandomSource};
    use atb_models::{SelectingPartners, SelectingProviders, Simple};
    use atb_scenarios::{RandomConfig, RandomScenario, RandomWithPartners, RandomWithProviders};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config() -> RandomConfig {
        RandomConfig::default().with_agents(5)
    }

    fn simple() -> Simple {
        let mut model = Simple::new();
        model.initialize(&params![]).unwrap();
        model
    }

    fn selecting_simple() -> SelectingPartners<Simple> {
        let mut model = SelectingPartners::new(Simple::new(), RandomSource::new(1));
        model.initialize(&params![false, 0.0]).unwrap();
        model
    }

    fn no_decisions() -> EvaluationProtocol {
        let scenario = RandomScenario::new(config(), RandomSource::new(1)).unwrap();
        EvaluationProtocol::new(
            ModelHandle::plain(simple()),
            ScenarioHandle::plain(scenario),
            MetricSet::new().with_accuracy(KendallsTauA),
        )
        .unwrap()
    }

    #[test]
    fn test_no_decisions_mode() {
        let mut protocol = no_decisions();
        assert_eq!(protocol.mode(), ModeKind::NoDecisions);
        assert_eq!(protocol.trust_model_name(), "Simple");
        assert_eq!(protocol.scenario_name(), "Random");

        protocol.step(1).unwrap();
        let accuracy = protocol.result(MetricRole::Accuracy, 0).unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
        assert_eq!(protocol.current_tick(), Some(1));
    }

    #[test]
    fn test_invalid_query() {
        let mut protocol = no_decisions();
        protocol.step(1).unwrap();

        let err = protocol.result(MetricRole::Utility, 0).unwrap_err();
        assert_eq!(err.to_string(), "Invalid query for metric 'utility' and service '0'");
        assert!(protocol.result(MetricRole::Accuracy, 4).is_err());
    }

    #[test]
    fn test_partner_model_needs_partner_scenario() {
        let scenario = RandomScenario::new(config(), RandomSource::new(1)).unwrap();
        let result = EvaluationProtocol::new(
            ModelHandle::partners(selecting_simple()),
            ScenarioHandle::plain(scenario),
            MetricSet::new()
                .with_accuracy(KendallsTauA)
                .with_utility(NormalizedUtility),
        );

        match result {
            Err(ProtocolError::CapabilityMismatch { model, scenario, .. }) => {
                assert_eq!(model, Capability::SelectingPartners);
                assert_eq!(scenario, Capability::Plain);
            }
            _ => panic!("expected a capability mismatch"),
        }
    }

    #[test]
    fn test_missing_metric_is_a_mismatch() {
        let scenario = RandomWithPartners::new(config(), RandomSource::new(1)).unwrap();
        let result = EvaluationProtocol::new(
            ModelHandle::partners(selecting_simple()),
            ScenarioHandle::partners(scenario),
            MetricSet::new().with_accuracy(KendallsTauA),
        );
        assert!(matches!(result, Err(ProtocolError::CapabilityMismatch { .. })));
    }

    #[test]
    fn test_utility_mode() {
        let scenario = RandomWithPartners::new(config(), RandomSource::new(1)).unwrap();
        let mut protocol = EvaluationProtocol::new(
            ModelHandle::partners(selecting_simple()),
            ScenarioHandle::partners(scenario),
            MetricSet::new()
                .with_accuracy(KendallsTauA)
                .with_utility(NormalizedUtility),
        )
        .unwrap();
        assert_eq!(protocol.mode(), ModeKind::Utility);

        for tick in 1..=3 {
            protocol.step(tick).unwrap();
        }

        let score = protocol.score(MetricRole::Utility, 0).unwrap();
        assert_eq!(score.tick, 3);
        assert!((0.0..=1.0).contains(&score.value));
        assert_eq!(protocol.metric_name(MetricRole::Utility), Some("Normalized utility"));
    }

    #[test]
    fn test_opinion_cost_mode() {
        let mut model = SelectingProviders::new(Simple::new(), RandomSource::new(1));
        model.initialize(&params![false, 0.0, 3]).unwrap();
        let scenario = RandomWithProviders::new(config(), RandomSource::new(1)).unwrap();

        let mut protocol = EvaluationProtocol::new(
            ModelHandle::providers(model),
            ScenarioHandle::providers(scenario),
            MetricSet::new()
                .with_accuracy(KendallsTauA)
                .with_utility(NormalizedUtility)
                .with_opinion_cost(DefaultOpinionCost),
        )
        .unwrap();
        assert_eq!(protocol.mode(), ModeKind::OpinionCost);

        protocol.step(1).unwrap();
        // nothing is known yet, so every possible opinion is requested
        assert_eq!(protocol.result(MetricRole::OpinionCost, 0).unwrap(), 1.0);
        assert!(protocol.result(MetricRole::Utility, 0).is_ok());
    }

    struct Recorder(Rc<RefCell<Vec<(Tick, f64)>>>);

    impl MetricSubscriber for Recorder {
        fn update(&mut self, protocol: &EvaluationProtocol) {
            let tick = protocol.current_tick().unwrap();
            let value = protocol.result(MetricRole::Accuracy, 0).unwrap();
            self.0.borrow_mut().push((tick, value));
        }
    }

    #[test]
    fn test_subscribers_pull_after_each_tick() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut protocol = no_decisions();
        protocol.subscribe(Recorder(Rc::clone(&seen)));
        protocol.subscribe(TickLogger);

        protocol.step(1).unwrap();
        protocol.step(2).unwrap();

        let ticks: Vec<_> = seen.borrow().iter().map(|(t, _)| *t).collect();
        assert_eq!(ticks, vec![1, 2]);
    }
}
