//! ZIP-level deal scoring: observation aggregation, scenario scoring, batch publication,
//! and the ranked deal listing.

pub mod aggregation;
pub mod domain;
pub mod import;
pub mod listing;
pub mod router;
pub mod scoring;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use aggregation::{AggregationWindows, MetricsAggregator};
pub use domain::{AggregatedZipMetrics, MetricKind, MetricObservation, ObservationError, ZipCode};
pub use import::{ObservationImportError, ObservationImporter};
pub use listing::{
    DealListing, DealQuery, RunStatus, ScoringRunSummary, SortKey, DEFAULT_LISTING_LIMIT,
};
pub use router::deal_router;
pub use scoring::{
    DealScore, ScenarioId, ScoreComponent, ScoringBatch, ScoringEngine, ScoringError,
    ScoringFailure, ScoringRubric,
};
pub use service::{DealScoringService, DealServiceError};
pub use store::{
    InMemoryObservationStore, InMemoryScoreStore, ObservationSource, ScoreGeneration,
    ScoreStore, StoreError,
};
