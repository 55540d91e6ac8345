use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::super::domain::{AggregatedZipMetrics, ZipCode};
use super::{DealScore, ScenarioId, ScenarioProfile, ScoringEngine, ScoringError};

/// Full replacement set of scores produced by one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringBatch {
    pub scenarios: Vec<ScenarioId>,
    pub scores: Vec<DealScore>,
    pub failures: Vec<ScoringFailure>,
}

/// A scenario that was rejected without affecting the rest of the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringFailure {
    pub scenario: String,
    pub reason: String,
}

impl ScoringEngine {
    /// Score every ZIP under every requested scenario.
    ///
    /// Scores are ordered by ZIP, then by the order scenarios were requested. Identifiers
    /// that normalize to the same scenario are scored once.
    pub fn score_all<S: AsRef<str>>(
        &self,
        metrics_by_zip: &BTreeMap<ZipCode, AggregatedZipMetrics>,
        scenarios: &[S],
    ) -> ScoringBatch {
        let mut profiles: Vec<&ScenarioProfile> = Vec::new();
        let mut failures = Vec::new();

        for raw in scenarios {
            let raw = raw.as_ref();
            match self.resolve(raw) {
                Ok(profile) => {
                    if !profiles.iter().any(|known| known.id == profile.id) {
                        profiles.push(profile);
                    }
                }
                Err(err @ ScoringError::InvalidScenario { .. }) => {
                    warn!(scenario = raw, "skipping scenario: {err}");
                    failures.push(ScoringFailure {
                        scenario: raw.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let scenarios = profiles.iter().map(|profile| profile.id.clone()).collect();
        let profiles = &profiles;
        let scores = metrics_by_zip
            .values()
            .flat_map(move |metrics| {
                profiles.iter().map(move |profile| DealScore {
                    zip_code: metrics.zip_code.clone(),
                    scenario: profile.id.clone(),
                    score: super::score_profile(profile, metrics),
                    metrics_snapshot: metrics.clone(),
                })
            })
            .collect();

        ScoringBatch {
            scenarios,
            scores,
            failures,
        }
    }
}
