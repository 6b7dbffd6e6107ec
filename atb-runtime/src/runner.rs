//! Batch runner
//!
//! Drives a protocol for a number of ticks and collects every score the
//! protocol produced into [`EvaluationData`].

use atb_core::{ServiceId, Tick};
use serde::Serialize;
use tracing::{info, warn};

use crate::protocol::{EvaluationProtocol, MetricRole, ProtocolError};

/// One score at one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub tick: Tick,
    pub role: MetricRole,
    /// Name of the metric that produced the value
    pub metric: String,
    pub service: ServiceId,
    pub value: f64,
}

/// Readings of a run, with what produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationData {
    pub trust_model: String,
    pub scenario: String,
    pub seed: u64,
    /// Ticks that completed
    pub ticks: Tick,
    pub readings: Vec<Reading>,
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn file_token(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<String>()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

impl EvaluationData {
    pub fn readings_for(&self, role: MetricRole, service: ServiceId) -> impl Iterator<Item = &Reading> {
        self.readings
            .iter()
            .filter(move |r| r.role == role && r.service == service)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One row per reading, with a header
    pub fn to_csv(&self) -> String {
        let mut out = String::from("seed,tick,role,metric,service,value,trust_model,scenario\n");
        for r in &self.readings {
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                self.seed,
                r.tick,
                r.role,
                csv_field(&r.metric),
                r.service,
                r.value,
                csv_field(&self.trust_model),
                csv_field(&self.scenario),
            ));
        }
        out
    }

    /// `<Scenario>-<TrustModel>-<seed>`, for output file names
    pub fn file_stem(&self) -> String {
        format!(
            "{}-{}-{}",
            file_token(&self.scenario),
            file_token(&self.trust_model),
            self.seed
        )
    }
}

/// Runs a protocol and records its scores
pub struct Runner {
    protocol: EvaluationProtocol,
    seed: u64,
}

impl Runner {
    pub fn new(protocol: EvaluationProtocol, seed: u64) -> Self {
        Self { protocol, seed }
    }

    pub fn protocol(&self) -> &EvaluationProtocol {
        &self.protocol
    }

    /// Step ticks `1..=ticks`, reading every score produced in each tick
    pub fn run(&mut self, ticks: Tick) -> Result<EvaluationData, ProtocolError> {
        let mut data = EvaluationData {
            trust_model: self.protocol.trust_model_name().to_string(),
            scenario: self.protocol.scenario_name().to_string(),
            seed: self.seed,
            ticks: 0,
            readings: Vec::new(),
        };

        info!(
            model = %data.trust_model,
            scenario = %data.scenario,
            seed = self.seed,
            ticks,
            "Starting evaluation"
        );

        for tick in 1..=ticks {
            if let Err(e) = self.protocol.step(tick) {
                warn!(tick, "Evaluation stopped: {}", e);
                return Err(e);
            }
            self.collect(tick, &mut data);
            data.ticks = tick;
        }

        info!(readings = data.readings.len(), "Evaluation complete");
        Ok(data)
    }

    fn collect(&self, tick: Tick, data: &mut EvaluationData) {
        let services = self.protocol.services().to_vec();

        for &role in self.protocol.mode().roles() {
            let metric = self.protocol.metric_name(role).unwrap_or_default();
            for &service in &services {
                // utility is only scored when a partner was chosen
                let Ok(score) = self.protocol.score(role, service) else {
                    continue;
                };
                if score.tick != tick {
                    continue;
                }
                data.readings.push(Reading {
                    tick,
                    role,
                    metric: metric.to_string(),
                    service,
                    value: score.value,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> EvaluationData {
        EvaluationData {
            trust_model: "EigenTrust".into(),
            scenario: "Random with partner selection".into(),
            seed: 7,
            ticks: 1,
            readings: vec![
                Reading {
                    tick: 1,
                    role: MetricRole::Accuracy,
                    metric: "Kendall's Tau-A".into(),
                    service: 0,
                    value: 0.75,
                },
                Reading {
                    tick: 1,
                    role: MetricRole::Utility,
                    metric: "Normalized utility".into(),
                    service: 0,
                    value: 0.5,
                },
            ],
        }
    }

    #[test]
    fn test_csv() {
        let csv = data().to_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "7,1,accuracy,Kendall's Tau-A,0,0.75,EigenTrust,Random with partner selection"
        );
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\","), "\"say \"\"hi\"\",\"");
    }

    #[test]
    fn test_json() {
        let json: serde_json::Value = serde_json::from_str(&data().to_json().unwrap()).unwrap();
        assert_eq!(json["seed"], 7);
        assert_eq!(json["readings"][1]["role"], "utility");
        assert_eq!(json["readings"][0]["metric"], "Kendall's Tau-A");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(data().file_stem(), "RandomWithPartnerSelection-EigenTrust-7");
    }

    #[test]
    fn test_readings_for() {
        let data = data();
        assert_eq!(data.readings_for(MetricRole::Utility, 0).count(), 1);
        assert_eq!(data.readings_for(MetricRole::OpinionCost, 0).count(), 0);
    }
}
