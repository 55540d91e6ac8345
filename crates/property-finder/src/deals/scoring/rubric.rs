use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};

use super::super::domain::AggregatedZipMetrics;

/// Normalized scenario identifier (`S1`, `S2`, ...). Lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScenarioId(String);

impl ScenarioId {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ScenarioId {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<ScenarioId> for String {
    fn from(value: ScenarioId) -> Self {
        value.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metrics that participate in the weighted deal score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoredMetric {
    PermitCount,
    RentGrowth,
    ValueGrowth,
    NewsCount,
    FloodFlag,
    Income,
}

impl ScoredMetric {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::PermitCount,
            Self::RentGrowth,
            Self::ValueGrowth,
            Self::NewsCount,
            Self::FloodFlag,
            Self::Income,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PermitCount => "permit_count",
            Self::RentGrowth => "rent_growth",
            Self::ValueGrowth => "value_growth",
            Self::NewsCount => "news_count",
            Self::FloodFlag => "flood_flag",
            Self::Income => "income",
        }
    }

    /// Reading for this metric, or `None` when the aggregate has no data for it.
    pub fn reading(self, metrics: &AggregatedZipMetrics) -> Option<MetricReading> {
        match self {
            Self::PermitCount => Some(MetricReading::Numeric(f64::from(metrics.permit_count))),
            Self::RentGrowth => metrics.rent_growth.map(MetricReading::Numeric),
            Self::ValueGrowth => metrics.value_growth.map(MetricReading::Numeric),
            Self::NewsCount => Some(MetricReading::Numeric(f64::from(metrics.news_count))),
            Self::FloodFlag => Some(MetricReading::Flag(metrics.flood_flag)),
            Self::Income => metrics.income.map(MetricReading::Numeric),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricReading {
    Numeric(f64),
    Flag(bool),
}

impl MetricReading {
    fn as_number(self) -> f64 {
        match self {
            Self::Numeric(value) => value,
            Self::Flag(true) => 1.0,
            Self::Flag(false) => 0.0,
        }
    }

    fn as_flag(self) -> bool {
        match self {
            Self::Numeric(value) => value != 0.0,
            Self::Flag(flag) => flag,
        }
    }
}

/// One band of a step function: values at or above `threshold` earn `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: f64,
    pub score: f64,
}

/// How a single metric reading is turned into a 0-100 sub-score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricRule {
    /// Descending bands, first match wins; `floor` applies below the last band.
    Tiered { tiers: Vec<Tier>, floor: f64 },
    /// Two outcomes for a boolean hazard flag.
    Flag { clear: f64, flagged: f64 },
    /// Metric is ignored by the scenario and always earns the same score.
    Constant { score: f64 },
}

impl MetricRule {
    pub fn sub_score(&self, reading: MetricReading) -> f64 {
        match self {
            Self::Tiered { tiers, floor } => {
                let value = reading.as_number();
                tiers
                    .iter()
                    .find(|tier| value >= tier.threshold)
                    .map(|tier| tier.score)
                    .unwrap_or(*floor)
            }
            Self::Flag { clear, flagged } => {
                if reading.as_flag() {
                    *flagged
                } else {
                    *clear
                }
            }
            Self::Constant { score } => *score,
        }
    }

    fn tiered(thresholds: [f64; 4]) -> Self {
        let scores = [100.0, 80.0, 60.0, 40.0];
        Self::Tiered {
            tiers: thresholds
                .iter()
                .zip(scores)
                .map(|(threshold, score)| Tier {
                    threshold: *threshold,
                    score,
                })
                .collect(),
            floor: 20.0,
        }
    }

    fn scores(&self) -> Vec<f64> {
        match self {
            Self::Tiered { tiers, floor } => tiers
                .iter()
                .map(|tier| tier.score)
                .chain(std::iter::once(*floor))
                .collect(),
            Self::Flag { clear, flagged } => vec![*clear, *flagged],
            Self::Constant { score } => vec![*score],
        }
    }
}

/// Weight and rule for one metric inside a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricWeighting {
    pub metric: ScoredMetric,
    pub weight: f64,
    pub rule: MetricRule,
}

/// An investment strategy: the metrics it cares about and how much.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioProfile {
    pub id: ScenarioId,
    pub label: String,
    pub metrics: Vec<MetricWeighting>,
}

impl ScenarioProfile {
    pub fn weight_of(&self, metric: ScoredMetric) -> f64 {
        self.metrics
            .iter()
            .find(|weighting| weighting.metric == metric)
            .map(|weighting| weighting.weight)
            .unwrap_or(0.0)
    }

    pub fn total_weight(&self) -> f64 {
        self.metrics.iter().map(|weighting| weighting.weight).sum()
    }
}

/// Complete table of scenarios. The standard rubric mirrors the S1/S2/S3 strategies; a
/// replacement rubric can be loaded from JSON without code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRubric {
    pub scenarios: Vec<ScenarioProfile>,
}

impl ScoringRubric {
    pub fn standard() -> Self {
        Self {
            scenarios: vec![
                standard_profile(
                    "S1",
                    "Conservative",
                    [0.25, 0.20, 0.20, 0.15, 0.10, 0.10],
                    StandardBands {
                        permit_count: [50.0, 30.0, 20.0, 10.0],
                        rent_growth: [8.0, 6.0, 4.0, 2.0],
                        value_growth: [10.0, 7.0, 5.0, 3.0],
                        news_count: [20.0, 15.0, 10.0, 5.0],
                        flood: MetricRule::Flag {
                            clear: 100.0,
                            flagged: 0.0,
                        },
                        income: MetricRule::tiered([80_000.0, 60_000.0, 45_000.0, 35_000.0]),
                    },
                ),
                standard_profile(
                    "S2",
                    "Balanced",
                    [0.20, 0.25, 0.25, 0.20, 0.05, 0.05],
                    StandardBands {
                        permit_count: [60.0, 40.0, 25.0, 15.0],
                        rent_growth: [10.0, 7.0, 5.0, 3.0],
                        value_growth: [12.0, 9.0, 6.0, 4.0],
                        news_count: [25.0, 18.0, 12.0, 6.0],
                        flood: MetricRule::Flag {
                            clear: 100.0,
                            flagged: 20.0,
                        },
                        income: MetricRule::tiered([70_000.0, 55_000.0, 40_000.0, 30_000.0]),
                    },
                ),
                standard_profile(
                    "S3",
                    "Aggressive",
                    [0.15, 0.30, 0.30, 0.25, 0.00, 0.00],
                    StandardBands {
                        permit_count: [80.0, 50.0, 30.0, 15.0],
                        rent_growth: [15.0, 10.0, 7.0, 4.0],
                        value_growth: [18.0, 12.0, 8.0, 5.0],
                        news_count: [30.0, 20.0, 15.0, 8.0],
                        flood: MetricRule::Constant { score: 100.0 },
                        income: MetricRule::Constant { score: 100.0 },
                    },
                ),
            ],
        }
    }

    /// Load and validate a rubric from JSON.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RubricError> {
        let rubric: Self = serde_json::from_reader(reader)?;
        rubric.validate()?;
        Ok(rubric)
    }

    pub fn profile(&self, scenario: &ScenarioId) -> Option<&ScenarioProfile> {
        self.scenarios.iter().find(|profile| &profile.id == scenario)
    }

    pub fn scenario_ids(&self) -> Vec<ScenarioId> {
        self.scenarios
            .iter()
            .map(|profile| profile.id.clone())
            .collect()
    }

    /// Structural checks. Weight totals are left to the rubric author.
    pub fn validate(&self) -> Result<(), RubricError> {
        if self.scenarios.is_empty() {
            return Err(RubricError::Empty);
        }

        for (index, profile) in self.scenarios.iter().enumerate() {
            if self.scenarios[..index]
                .iter()
                .any(|other| other.id == profile.id)
            {
                return Err(RubricError::DuplicateScenario(profile.id.clone()));
            }

            for weighting in &profile.metrics {
                let metric = weighting.metric.label();
                if !(0.0..=1.0).contains(&weighting.weight) {
                    return Err(RubricError::WeightOutOfRange {
                        scenario: profile.id.clone(),
                        metric,
                        weight: weighting.weight,
                    });
                }

                if weighting
                    .rule
                    .scores()
                    .iter()
                    .any(|score| !(0.0..=100.0).contains(score))
                {
                    return Err(RubricError::ScoreOutOfRange {
                        scenario: profile.id.clone(),
                        metric,
                    });
                }

                if let MetricRule::Tiered { tiers, floor } = &weighting.rule {
                    let descending = tiers
                        .windows(2)
                        .all(|pair| pair[0].threshold > pair[1].threshold);
                    if !descending {
                        return Err(RubricError::UnorderedTiers {
                            scenario: profile.id.clone(),
                            metric,
                        });
                    }

                    // A higher reading must never earn a lower sub-score.
                    let non_increasing = tiers
                        .windows(2)
                        .all(|pair| pair[0].score >= pair[1].score)
                        && tiers
                            .last()
                            .map(|last| *floor <= last.score)
                            .unwrap_or(true);
                    if !non_increasing {
                        return Err(RubricError::NonMonotoneScores {
                            scenario: profile.id.clone(),
                            metric,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for ScoringRubric {
    fn default() -> Self {
        Self::standard()
    }
}

struct StandardBands {
    permit_count: [f64; 4],
    rent_growth: [f64; 4],
    value_growth: [f64; 4],
    news_count: [f64; 4],
    flood: MetricRule,
    income: MetricRule,
}

fn standard_profile(
    id: &str,
    label: &str,
    weights: [f64; 6],
    bands: StandardBands,
) -> ScenarioProfile {
    let rules = [
        MetricRule::tiered(bands.permit_count),
        MetricRule::tiered(bands.rent_growth),
        MetricRule::tiered(bands.value_growth),
        MetricRule::tiered(bands.news_count),
        bands.flood,
        bands.income,
    ];

    ScenarioProfile {
        id: ScenarioId::new(id),
        label: label.to_string(),
        metrics: ScoredMetric::ordered()
            .into_iter()
            .zip(weights)
            .zip(rules)
            .map(|((metric, weight), rule)| MetricWeighting {
                metric,
                weight,
                rule,
            })
            .collect(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RubricError {
    #[error("invalid rubric JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("rubric defines no scenarios")]
    Empty,
    #[error("scenario {0} is defined more than once")]
    DuplicateScenario(ScenarioId),
    #[error("{scenario}/{metric}: weight {weight} must be between 0 and 1")]
    WeightOutOfRange {
        scenario: ScenarioId,
        metric: &'static str,
        weight: f64,
    },
    #[error("{scenario}/{metric}: sub-scores must be between 0 and 100")]
    ScoreOutOfRange {
        scenario: ScenarioId,
        metric: &'static str,
    },
    #[error("{scenario}/{metric}: tier thresholds must be strictly descending")]
    UnorderedTiers {
        scenario: ScenarioId,
        metric: &'static str,
    },
    #[error("{scenario}/{metric}: sub-scores must not rise as thresholds fall")]
    NonMonotoneScores {
        scenario: ScenarioId,
        metric: &'static str,
    },
}
