use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{AggregatedZipMetrics, ZipCode};
use super::scoring::{ScenarioId, ScoringFailure};
use super::store::ScoreGeneration;

/// Column used to rank the deal listing. Every ordering is descending with missing
/// values last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Score,
    RentGrowth,
    ValueGrowth,
    PermitCount,
    Income,
    NewsCount,
    FloodFlag,
}

impl SortKey {
    /// Unrecognized keys fall back to rent growth.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "score" => Self::Score,
            "value_growth" => Self::ValueGrowth,
            "permit_count" => Self::PermitCount,
            "income" => Self::Income,
            "news_count" => Self::NewsCount,
            "flood_flag" => Self::FloodFlag,
            _ => Self::RentGrowth,
        }
    }
}

pub const DEFAULT_LISTING_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealQuery {
    pub scenario: Option<ScenarioId>,
    pub min_score: Option<u8>,
    pub sort_by: SortKey,
    pub limit: usize,
}

impl Default for DealQuery {
    fn default() -> Self {
        Self {
            scenario: None,
            min_score: None,
            sort_by: SortKey::Score,
            limit: DEFAULT_LISTING_LIMIT,
        }
    }
}

/// One ZIP code in the deal listing with its scores across scenarios.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealListing {
    #[serde(flatten)]
    pub metrics: AggregatedZipMetrics,
    pub scores: BTreeMap<ScenarioId, u8>,
    pub best_score: Option<u8>,
    pub best_scenario: Option<ScenarioId>,
}

/// Result of a batch scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringRunSummary {
    pub status: RunStatus,
    pub generation: u64,
    pub total_deals_scored: usize,
    pub zip_codes: usize,
    pub scenarios: Vec<ScenarioId>,
    pub failures: Vec<ScoringFailure>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Partial,
}

pub(crate) fn build_listings(generation: &ScoreGeneration, query: &DealQuery) -> Vec<DealListing> {
    let mut rows: BTreeMap<&ZipCode, DealListing> = BTreeMap::new();
    for score in &generation.scores {
        let row = rows.entry(&score.zip_code).or_insert_with(|| DealListing {
            metrics: score.metrics_snapshot.clone(),
            scores: BTreeMap::new(),
            best_score: None,
            best_scenario: None,
        });
        row.scores.insert(score.scenario.clone(), score.score);
    }

    let mut listings: Vec<DealListing> = rows
        .into_values()
        .filter_map(|mut row| {
            let best = match &query.scenario {
                Some(scenario) => row
                    .scores
                    .get(scenario)
                    .map(|score| (scenario.clone(), *score))?,
                None => best_of(&row.scores)?,
            };
            row.best_scenario = Some(best.0);
            row.best_score = Some(best.1);
            Some(row)
        })
        .filter(|row| match query.min_score {
            Some(min) => row.best_score.map(|score| score >= min).unwrap_or(false),
            None => true,
        })
        .collect();

    listings.sort_by(|left, right| compare_for(query.sort_by, left, right));
    listings.truncate(query.limit);
    listings
}

// Highest score wins; ties go to the scenario that sorts first.
fn best_of(scores: &BTreeMap<ScenarioId, u8>) -> Option<(ScenarioId, u8)> {
    let mut best: Option<(&ScenarioId, u8)> = None;
    for (scenario, score) in scores {
        if best.map(|(_, current)| *score > current).unwrap_or(true) {
            best = Some((scenario, *score));
        }
    }
    best.map(|(scenario, score)| (scenario.clone(), score))
}

fn compare_for(key: SortKey, left: &DealListing, right: &DealListing) -> Ordering {
    let (l, r) = (&left.metrics, &right.metrics);
    match key {
        SortKey::Score => descending_nulls_last(
            left.best_score.map(f64::from),
            right.best_score.map(f64::from),
        ),
        SortKey::RentGrowth => descending_nulls_last(l.rent_growth, r.rent_growth),
        SortKey::ValueGrowth => descending_nulls_last(l.value_growth, r.value_growth),
        SortKey::PermitCount => r.permit_count.cmp(&l.permit_count),
        SortKey::Income => descending_nulls_last(l.income, r.income),
        SortKey::NewsCount => r.news_count.cmp(&l.news_count),
        SortKey::FloodFlag => r.flood_flag.cmp(&l.flood_flag),
    }
}

fn descending_nulls_last(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(l), Some(r)) => r.total_cmp(&l),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
