use super::common::*;

use crate::deals::aggregation::MetricsAggregator;
use crate::deals::listing::{build_listings, DealQuery, SortKey, DEFAULT_LISTING_LIMIT};
use crate::deals::scoring::{ScenarioId, ScoringEngine};
use crate::deals::store::ScoreGeneration;

fn generation() -> ScoreGeneration {
    let metrics = MetricsAggregator::default().aggregate_all(&market_observations(), as_of());
    let batch = ScoringEngine::default().score_all(&metrics, &["S1", "S2", "S3"]);
    ScoreGeneration {
        generation: 1,
        as_of: Some(as_of()),
        scores: batch.scores,
    }
}

fn zips(listings: &[crate::deals::listing::DealListing]) -> Vec<&str> {
    listings
        .iter()
        .map(|listing| listing.metrics.zip_code.as_str())
        .collect()
}

#[test]
fn default_query_ranks_by_best_score() {
    let listings = build_listings(&generation(), &DealQuery::default());

    assert_eq!(zips(&listings), vec!["07030", "08608", "07302"]);

    let top = &listings[0];
    assert_eq!(top.scores.len(), 3);
    assert_eq!(top.best_score, Some(100));
    assert_eq!(top.best_scenario, Some(ScenarioId::new("S1")));
}

#[test]
fn scenario_filter_reports_that_scenarios_score() {
    let query = DealQuery {
        scenario: Some(ScenarioId::new("S3")),
        ..DealQuery::default()
    };

    let listings = build_listings(&generation(), &query);

    assert_eq!(listings.len(), 3);
    for listing in &listings {
        assert_eq!(listing.best_scenario, Some(ScenarioId::new("S3")));
        assert_eq!(
            listing.best_score,
            listing.scores.get(&ScenarioId::new("S3")).copied()
        );
    }
}

#[test]
fn min_score_drops_weaker_deals() {
    let query = DealQuery {
        min_score: Some(50),
        ..DealQuery::default()
    };

    let listings = build_listings(&generation(), &query);

    assert_eq!(zips(&listings), vec!["07030"]);
}

#[test]
fn metric_sorts_place_missing_values_last() {
    let query = DealQuery {
        sort_by: SortKey::RentGrowth,
        ..DealQuery::default()
    };

    let listings = build_listings(&generation(), &query);

    assert_eq!(zips(&listings), vec!["07030", "08608", "07302"]);
    assert!(listings[2].metrics.rent_growth.is_none());
}

#[test]
fn flood_sort_surfaces_flagged_zips_first() {
    let query = DealQuery {
        sort_by: SortKey::FloodFlag,
        ..DealQuery::default()
    };

    let listings = build_listings(&generation(), &query);

    assert_eq!(listings[0].metrics.zip_code.as_str(), "08608");
}

#[test]
fn limit_truncates_after_sorting() {
    let query = DealQuery {
        limit: 1,
        sort_by: SortKey::PermitCount,
        ..DealQuery::default()
    };

    let listings = build_listings(&generation(), &query);

    assert_eq!(zips(&listings), vec!["07030"]);
}

#[test]
fn unknown_sort_key_falls_back_to_rent_growth() {
    assert_eq!(SortKey::parse("cap_rate"), SortKey::RentGrowth);
    assert_eq!(SortKey::parse(" Income "), SortKey::Income);
    assert_eq!(SortKey::parse("score"), SortKey::Score);
    assert_eq!(DealQuery::default().limit, DEFAULT_LISTING_LIMIT);
}

#[test]
fn empty_generation_lists_nothing() {
    let empty = ScoreGeneration {
        generation: 0,
        as_of: None,
        scores: Vec::new(),
    };

    assert!(build_listings(&empty, &DealQuery::default()).is_empty());
}

#[test]
fn listing_serializes_metrics_inline() {
    let listings = build_listings(&generation(), &DealQuery::default());

    let value = serde_json::to_value(&listings[0]).expect("serializes");

    assert_eq!(value["zip_code"], serde_json::json!("07030"));
    assert_eq!(value["scores"]["S1"], serde_json::json!(100));
    assert_eq!(value["best_scenario"], serde_json::json!("S1"));
}
