mod batch;
pub mod rubric;

pub use batch::{ScoringBatch, ScoringFailure};
pub use rubric::{
    MetricReading, MetricRule, MetricWeighting, RubricError, ScenarioId, ScenarioProfile,
    ScoredMetric, ScoringRubric, Tier,
};

use serde::{Deserialize, Serialize};

use super::domain::{AggregatedZipMetrics, ZipCode};

/// Stateless scorer applying a rubric to aggregated ZIP metrics.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    rubric: ScoringRubric,
}

impl ScoringEngine {
    pub fn new(rubric: ScoringRubric) -> Self {
        Self { rubric }
    }

    pub fn rubric(&self) -> &ScoringRubric {
        &self.rubric
    }

    /// Resolve a caller-supplied scenario string (case-insensitive) against the rubric.
    pub fn resolve(&self, scenario: &str) -> Result<&ScenarioProfile, ScoringError> {
        let id = ScenarioId::new(scenario);
        self.rubric
            .profile(&id)
            .ok_or_else(|| ScoringError::InvalidScenario {
                scenario: scenario.to_string(),
            })
    }

    /// Integer score in `0..=100`.
    ///
    /// Metrics without data contribute nothing and the remaining weights are not
    /// renormalized, so missing data lowers the total.
    pub fn score(
        &self,
        metrics: &AggregatedZipMetrics,
        scenario: &str,
    ) -> Result<u8, ScoringError> {
        let profile = self.resolve(scenario)?;
        Ok(score_profile(profile, metrics))
    }

    /// Per-metric contributions behind a score, for audit views.
    pub fn breakdown(
        &self,
        metrics: &AggregatedZipMetrics,
        scenario: &str,
    ) -> Result<Vec<ScoreComponent>, ScoringError> {
        let profile = self.resolve(scenario)?;
        Ok(components(profile, metrics))
    }

    pub fn deal_score(
        &self,
        metrics: &AggregatedZipMetrics,
        scenario: &str,
    ) -> Result<DealScore, ScoringError> {
        let profile = self.resolve(scenario)?;
        Ok(DealScore {
            zip_code: metrics.zip_code.clone(),
            scenario: profile.id.clone(),
            score: score_profile(profile, metrics),
            metrics_snapshot: metrics.clone(),
        })
    }
}

fn components(profile: &ScenarioProfile, metrics: &AggregatedZipMetrics) -> Vec<ScoreComponent> {
    profile
        .metrics
        .iter()
        .map(|weighting| {
            let sub_score = weighting
                .metric
                .reading(metrics)
                .map(|reading| weighting.rule.sub_score(reading));
            ScoreComponent {
                metric: weighting.metric,
                sub_score,
                weight: weighting.weight,
                contribution: sub_score.unwrap_or(0.0) * weighting.weight,
            }
        })
        .collect()
}

fn score_profile(profile: &ScenarioProfile, metrics: &AggregatedZipMetrics) -> u8 {
    let total: f64 = components(profile, metrics)
        .iter()
        .map(|component| component.contribution)
        .sum();

    // `as` truncates toward zero and maps NaN to 0.
    total.clamp(0.0, 100.0) as u8
}

/// One metric's share of a scenario score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub metric: ScoredMetric,
    pub sub_score: Option<f64>,
    pub weight: f64,
    pub contribution: f64,
}

/// Score of one ZIP code under one scenario, with the metrics it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealScore {
    pub zip_code: ZipCode,
    pub scenario: ScenarioId,
    pub score: u8,
    pub metrics_snapshot: AggregatedZipMetrics,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("invalid scenario '{scenario}'")]
    InvalidScenario { scenario: String },
}
