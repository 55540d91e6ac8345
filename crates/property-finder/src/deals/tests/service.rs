use std::sync::Arc;
use std::thread;

use super::common::*;

use crate::deals::aggregation::AggregationWindows;
use crate::deals::listing::{DealQuery, RunStatus};
use crate::deals::scoring::{ScenarioId, ScoringError, ScoringRubric};
use crate::deals::service::{DealScoringService, DealServiceError};
use crate::deals::store::{InMemoryScoreStore, ScoreStore, StoreError};

#[test]
fn run_batch_publishes_every_zip_scenario_pair() {
    let (service, store) = build_service();

    let summary = service.run_batch(as_of(), None).expect("batch runs");

    assert_eq!(summary.status, RunStatus::Success);
    assert_eq!(summary.generation, 1);
    assert_eq!(summary.zip_codes, 3);
    assert_eq!(summary.total_deals_scored, 9);
    assert_eq!(summary.message, "Successfully scored 9 deals");

    let current = store.current().expect("store readable");
    assert_eq!(current.generation, 1);
    assert_eq!(current.as_of, Some(as_of()));
    assert_eq!(current.scores.len(), 9);
}

#[test]
fn rerunning_replaces_the_generation_with_identical_scores() {
    let (service, store) = build_service();

    service.run_batch(as_of(), None).expect("first run");
    let first = store.current().expect("store readable");
    service.run_batch(as_of(), None).expect("second run");
    let second = store.current().expect("store readable");

    assert_eq!(second.generation, first.generation + 1);
    assert_eq!(second.scores, first.scores);
}

#[test]
fn partial_run_reports_rejected_scenarios() {
    let (service, _) = build_service();
    let requested = vec!["s2".to_string(), "S7".to_string()];

    let summary = service
        .run_batch(as_of(), Some(requested.as_slice()))
        .expect("partial run succeeds");

    assert_eq!(summary.status, RunStatus::Partial);
    assert_eq!(summary.scenarios, vec![ScenarioId::new("S2")]);
    assert_eq!(summary.total_deals_scored, 3);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].scenario, "S7");
}

#[test]
fn run_without_valid_scenarios_keeps_the_previous_generation() {
    let (service, store) = build_service();
    service.run_batch(as_of(), None).expect("seed run");

    let requested = vec!["S8".to_string(), "S9".to_string()];
    let err = service
        .run_batch(as_of(), Some(requested.as_slice()))
        .expect_err("nothing to score");

    assert!(matches!(err, DealServiceError::NoValidScenarios { .. }));
    assert!(err.to_string().contains("S8, S9"));
    assert_eq!(store.current().expect("store readable").generation, 1);
}

#[test]
fn unavailable_source_surfaces_store_error() {
    let service = DealScoringService::new(
        Arc::new(OfflineObservations),
        Arc::new(InMemoryScoreStore::default()),
        ScoringRubric::standard(),
        AggregationWindows::default(),
        vec!["S1".to_string()],
    );

    let err = service.run_batch(as_of(), None).expect_err("source offline");

    assert!(matches!(
        err,
        DealServiceError::Store(StoreError::Unavailable(_))
    ));
}

#[test]
fn deals_validates_the_scenario_filter() {
    let (service, _) = build_service();
    service.run_batch(as_of(), None).expect("batch runs");

    let query = DealQuery {
        scenario: Some(ScenarioId::new("S5")),
        ..DealQuery::default()
    };

    assert!(matches!(
        service.deals(&query),
        Err(DealServiceError::Scoring(ScoringError::InvalidScenario { .. }))
    ));
}

#[test]
fn deal_detail_finds_scored_zip_only() {
    let (service, _) = build_service();
    assert!(service
        .deal(&zip("07030"))
        .expect("store readable")
        .is_none());

    service.run_batch(as_of(), None).expect("batch runs");

    let listing = service
        .deal(&zip("07030"))
        .expect("store readable")
        .expect("zip scored");
    assert_eq!(listing.scores.len(), 3);
    assert!(service
        .deal(&zip("99999"))
        .expect("store readable")
        .is_none());
}

#[test]
fn readers_never_observe_a_mixed_generation() {
    let (service, store) = build_service();
    service.run_batch(as_of(), None).expect("seed run");

    let writer = {
        let service = service.clone();
        thread::spawn(move || {
            for offset in 0..20u64 {
                let day = as_of() - chrono::Days::new(offset * 30);
                service.run_batch(day, None).expect("batch runs");
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let current = store.current().expect("store readable");
                    let as_of = current.as_of.expect("seeded generation");
                    let metrics = service.aggregate(as_of).expect("source readable");
                    let expected = service.engine().score_all(&metrics, &["S1", "S2", "S3"]);
                    assert_eq!(current.scores, expected.scores);
                }
            })
        })
        .collect();

    writer.join().expect("writer finished");
    for reader in readers {
        reader.join().expect("reader finished");
    }
    assert_eq!(store.current().expect("store readable").generation, 21);
}
