use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use super::aggregation::{AggregationWindows, MetricsAggregator};
use super::domain::{AggregatedZipMetrics, ZipCode};
use super::listing::{build_listings, DealListing, DealQuery, RunStatus, ScoringRunSummary};
use super::scoring::{ScoringEngine, ScoringError, ScoringRubric};
use super::store::{ObservationSource, ScoreGeneration, ScoreStore, StoreError};

/// Service composing the observation source, aggregator, scoring engine, and score store.
pub struct DealScoringService<O, S> {
    observations: Arc<O>,
    store: Arc<S>,
    aggregator: MetricsAggregator,
    engine: Arc<ScoringEngine>,
    default_scenarios: Vec<String>,
}

impl<O, S> DealScoringService<O, S>
where
    O: ObservationSource + 'static,
    S: ScoreStore + 'static,
{
    pub fn new(
        observations: Arc<O>,
        store: Arc<S>,
        rubric: ScoringRubric,
        windows: AggregationWindows,
        default_scenarios: Vec<String>,
    ) -> Self {
        Self {
            observations,
            store,
            aggregator: MetricsAggregator::new(windows),
            engine: Arc::new(ScoringEngine::new(rubric)),
            default_scenarios,
        }
    }

    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn default_scenarios(&self) -> &[String] {
        &self.default_scenarios
    }

    /// Aggregate every known ZIP as of `as_of`.
    pub fn aggregate(
        &self,
        as_of: NaiveDate,
    ) -> Result<BTreeMap<ZipCode, AggregatedZipMetrics>, DealServiceError> {
        let observations = self.observations.observations()?;
        Ok(self.aggregator.aggregate_all(&observations, as_of))
    }

    /// Score every ZIP under every scenario and publish the result as a new generation.
    ///
    /// Rejected scenarios are reported in the summary; the run only fails when no requested
    /// scenario is valid, in which case the current generation is left untouched.
    pub fn run_batch(
        &self,
        as_of: NaiveDate,
        scenarios: Option<&[String]>,
    ) -> Result<ScoringRunSummary, DealServiceError> {
        let scenarios = scenarios.unwrap_or(self.default_scenarios.as_slice());
        let metrics_by_zip = self.aggregate(as_of)?;
        let batch = self.engine.score_all(&metrics_by_zip, scenarios);

        if batch.scenarios.is_empty() {
            let rejected = batch
                .failures
                .iter()
                .map(|failure| failure.scenario.clone())
                .collect::<Vec<_>>()
                .join(", ");
            warn!(%rejected, "scoring run aborted: no valid scenarios");
            return Err(DealServiceError::NoValidScenarios { rejected });
        }

        let total = batch.scores.len();
        let generation = self.store.replace_generation(as_of, batch.scores)?;

        let status = if batch.failures.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::Partial
        };

        info!(
            generation = generation.generation,
            %as_of,
            zip_codes = metrics_by_zip.len(),
            scores = total,
            failures = batch.failures.len(),
            "published deal score generation"
        );

        Ok(ScoringRunSummary {
            status,
            generation: generation.generation,
            total_deals_scored: total,
            zip_codes: metrics_by_zip.len(),
            scenarios: batch.scenarios,
            failures: batch.failures,
            message: format!("Successfully scored {total} deals"),
        })
    }

    pub fn current_generation(&self) -> Result<Arc<ScoreGeneration>, DealServiceError> {
        Ok(self.store.current()?)
    }

    /// Ranked listing over the current generation.
    pub fn deals(&self, query: &DealQuery) -> Result<Vec<DealListing>, DealServiceError> {
        let generation = self.store.current()?;
        if let Some(scenario) = &query.scenario {
            self.engine.resolve(scenario.as_str())?;
        }
        Ok(build_listings(&generation, query))
    }

    /// Listing row for a single ZIP code, if it was scored in the current generation.
    pub fn deal(&self, zip_code: &ZipCode) -> Result<Option<DealListing>, DealServiceError> {
        let generation = self.store.current()?;
        let query = DealQuery {
            limit: usize::MAX,
            ..DealQuery::default()
        };
        Ok(build_listings(&generation, &query)
            .into_iter()
            .find(|listing| &listing.metrics.zip_code == zip_code))
    }
}

/// Error raised by the deal scoring service.
#[derive(Debug, thiserror::Error)]
pub enum DealServiceError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no valid scenarios requested (rejected: {rejected})")]
    NoValidScenarios { rejected: String },
}
