use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::deals::aggregation::AggregationWindows;
use crate::deals::domain::{AggregatedZipMetrics, MetricKind, MetricObservation, ZipCode};
use crate::deals::scoring::ScoringRubric;
use crate::deals::service::DealScoringService;
use crate::deals::store::{
    InMemoryObservationStore, InMemoryScoreStore, ObservationSource, StoreError,
};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn as_of() -> NaiveDate {
    date(2025, 6, 30)
}

pub(super) fn zip(raw: &str) -> ZipCode {
    ZipCode::parse(raw).expect("valid zip")
}

pub(super) fn obs(zip_code: &str, kind: MetricKind, on: NaiveDate, value: f64) -> MetricObservation {
    MetricObservation::new(zip(zip_code), kind, on, value).expect("finite value")
}

/// Strong market: top-tier S1 readings across the board.
pub(super) fn hoboken_metrics() -> AggregatedZipMetrics {
    AggregatedZipMetrics {
        zip_code: zip("07030"),
        permit_count: 55,
        rent_index: Some(3_400.0),
        home_value_index: Some(720_000.0),
        income: Some(90_000.0),
        population: Some(58_000.0),
        rent_growth: Some(9.0),
        value_growth: Some(11.0),
        flood_flag: false,
        news_count: 22,
    }
}

/// Middling market with a flood history.
pub(super) fn trenton_metrics() -> AggregatedZipMetrics {
    AggregatedZipMetrics {
        zip_code: zip("08608"),
        permit_count: 12,
        rent_index: Some(1_500.0),
        home_value_index: Some(210_000.0),
        income: Some(38_000.0),
        population: Some(9_000.0),
        rent_growth: Some(3.0),
        value_growth: Some(4.0),
        flood_flag: true,
        news_count: 6,
    }
}

/// Observation set for three ZIPs: one strong, one weak, one with a single rent point.
pub(super) fn market_observations() -> Vec<MetricObservation> {
    let mut observations = Vec::new();

    for month in 1..=6 {
        observations.push(obs(
            "07030",
            MetricKind::RentIndex,
            date(2025, month, 1),
            3_000.0 + 50.0 * f64::from(month),
        ));
        observations.push(obs(
            "07030",
            MetricKind::HomeValueIndex,
            date(2025, month, 1),
            650_000.0 + 15_000.0 * f64::from(month),
        ));
    }
    for day in 1..=25 {
        observations.push(obs("07030", MetricKind::NewsCount, date(2025, 6, day), 1.0));
    }
    for week in 0..52 {
        let on = date(2024, 7, 1) + chrono::Days::new(week * 7);
        observations.push(obs("07030", MetricKind::PermitCount, on, 1.0));
    }
    observations.push(obs("07030", MetricKind::Income, date(2024, 1, 1), 92_000.0));
    observations.push(obs("07030", MetricKind::FloodFlag, date(2024, 1, 1), 0.0));

    observations.push(obs("08608", MetricKind::RentIndex, date(2024, 8, 1), 1_500.0));
    observations.push(obs("08608", MetricKind::RentIndex, date(2025, 5, 1), 1_550.0));
    observations.push(obs("08608", MetricKind::Income, date(2024, 1, 1), 38_000.0));
    observations.push(obs("08608", MetricKind::FloodFlag, date(2023, 9, 1), 1.0));
    observations.push(obs("08608", MetricKind::PermitCount, date(2025, 3, 3), 1.0));

    observations.push(obs("07302", MetricKind::RentIndex, date(2025, 4, 1), 2_900.0));

    observations
}

pub(super) type MemoryService = DealScoringService<InMemoryObservationStore, InMemoryScoreStore>;

pub(super) fn build_service() -> (Arc<MemoryService>, Arc<InMemoryScoreStore>) {
    let observations = Arc::new(InMemoryObservationStore::new(market_observations()));
    let store = Arc::new(InMemoryScoreStore::default());
    let service = DealScoringService::new(
        observations,
        store.clone(),
        ScoringRubric::standard(),
        AggregationWindows::default(),
        vec!["S1".to_string(), "S2".to_string(), "S3".to_string()],
    );
    (Arc::new(service), store)
}

pub(super) struct OfflineObservations;

impl ObservationSource for OfflineObservations {
    fn observations(&self) -> Result<Vec<MetricObservation>, StoreError> {
        Err(StoreError::Unavailable("warehouse offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
