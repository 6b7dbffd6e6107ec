//! Experiment files
//!
//! An experiment names a trust model, a scenario and metrics in TOML and
//! is turned into a ready-to-run [`EvaluationProtocol`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use atb_core::{Params, RandomSource};
use atb_models::{EigenTrust, SelectingPartners, SelectingProviders, Simple, Travos, TrustModel};
use atb_runtime::{
    CumulativeNormalizedUtility, DefaultOpinionCost, EvaluationProtocol, KendallsTauA, MetricSet,
    ModelHandle, NormalizedUtility, ScenarioHandle,
};
use atb_scenarios::{RandomConfig, RandomScenario, RandomWithPartners, RandomWithProviders};

/// A complete experiment definition
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Experiment {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    pub model: ModelSection,
    pub scenario: ScenarioSection,
    #[serde(default)]
    pub metrics: MetricsSection,
}

fn default_ticks() -> u32 {
    100
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    EigenTrust,
    Travos,
    Simple,
}

/// Which decisions the model makes itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decisions {
    #[default]
    None,
    Partners,
    Providers,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSection {
    pub kind: ModelKind,
    #[serde(default)]
    pub params: Params,
    #[serde(default)]
    pub decisions: Decisions,
    /// `[probabilistic, explore_threshold]`, used with partner selection
    #[serde(default)]
    pub selection: Params,
    /// `[min_experiences]`, used with provider selection
    #[serde(default)]
    pub providers: Params,
}

impl ModelSection {
    /// Model parameters followed by the settings of the chosen wrappers
    pub fn full_params(&self) -> Params {
        let mut values = self.params.values().to_vec();
        if self.decisions != Decisions::None {
            values.extend_from_slice(self.selection.values());
        }
        if self.decisions == Decisions::Providers {
            values.extend_from_slice(self.providers.values());
        }
        Params::new(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Random,
    RandomPartners,
    RandomProviders,
}

/// `kind` plus the scenario settings, side by side in one table
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "toml::Table")]
pub struct ScenarioSection {
    pub kind: ScenarioKind,
    pub config: RandomConfig,
}

impl TryFrom<toml::Table> for ScenarioSection {
    type Error = toml::de::Error;

    // serde's deny_unknown_fields does not combine with flatten
    fn try_from(mut table: toml::Table) -> Result<Self, Self::Error> {
        let kind: ScenarioKind = table
            .remove("kind")
            .ok_or_else(|| <toml::de::Error as serde::de::Error>::missing_field("kind"))?
            .try_into()?;
        let config: RandomConfig = toml::Value::Table(table).try_into()?;
        Ok(Self { kind, config })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyKind {
    #[default]
    KendallsTauA,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    Normalized,
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpinionCostKind {
    Default,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default)]
    pub accuracy: AccuracyKind,
    pub utility: Option<UtilityKind>,
    pub opinion_cost: Option<OpinionCostKind>,
}

impl Experiment {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read experiment {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid experiment {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Build the collaborators and the protocol that evaluates them
    pub fn build(&self) -> Result<EvaluationProtocol> {
        let model = self.model_handle().context("Failed to set up the trust model")?;
        let scenario = self
            .scenario_handle()
            .context("Failed to set up the scenario")?;

        let protocol = EvaluationProtocol::new(model, scenario, self.metric_set())?;
        Ok(protocol)
    }

    fn model_handle(&self) -> Result<ModelHandle> {
        let section = &self.model;
        let params = section.full_params();

        match section.kind {
            ModelKind::EigenTrust => {
                let model = EigenTrust::new(RandomSource::new(self.seed));
                wrap(model, section.decisions, &params, self.seed)
            }
            ModelKind::Travos => {
                let model = Travos::new(RandomSource::new(self.seed));
                wrap(model, section.decisions, &params, self.seed)
            }
            ModelKind::Simple => wrap(Simple::new(), section.decisions, &params, self.seed),
        }
    }

    fn scenario_handle(&self) -> Result<ScenarioHandle> {
        let config = self.scenario.config.clone();
        let random = RandomSource::new(self.seed);

        let handle = match self.scenario.kind {
            ScenarioKind::Random => ScenarioHandle::plain(RandomScenario::new(config, random)?),
            ScenarioKind::RandomPartners => {
                ScenarioHandle::partners(RandomWithPartners::new(config, random)?)
            }
            ScenarioKind::RandomProviders => {
                ScenarioHandle::providers(RandomWithProviders::new(config, random)?)
            }
        };
        Ok(handle)
    }

    fn metric_set(&self) -> MetricSet {
        let mut metrics = match self.metrics.accuracy {
            AccuracyKind::KendallsTauA => MetricSet::new().with_accuracy(KendallsTauA),
        };

        metrics = match self.metrics.utility {
            Some(UtilityKind::Normalized) => metrics.with_utility(NormalizedUtility),
            Some(UtilityKind::Cumulative) => {
                metrics.with_utility(CumulativeNormalizedUtility::default())
            }
            None => metrics,
        };

        match self.metrics.opinion_cost {
            Some(OpinionCostKind::Default) => metrics.with_opinion_cost(DefaultOpinionCost),
            None => metrics,
        }
    }
}

/// Selection wrappers draw from their own stream, offset from the model's
fn selection_seed(seed: u64) -> u64 {
    seed.wrapping_add(1)
}

fn wrap<M>(model: M, decisions: Decisions, params: &Params, seed: u64) -> Result<ModelHandle>
where
    M: TrustModel + 'static,
{
    let handle = match decisions {
        Decisions::None => {
            let mut model = model;
            model.initialize(params)?;
            ModelHandle::plain(model)
        }
        Decisions::Partners => {
            let mut model = SelectingPartners::new(model, RandomSource::new(selection_seed(seed)));
            model.initialize(params)?;
            ModelHandle::partners(model)
        }
        Decisions::Providers => {
            let mut model = SelectingProviders::new(model, RandomSource::new(selection_seed(seed)));
            model.initialize(params)?;
            ModelHandle::providers(model)
        }
    };
    Ok(handle)
}
