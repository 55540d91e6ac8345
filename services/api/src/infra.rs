use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use property_finder::config::ScoringConfig;
use property_finder::deals::{
    DealScoringService, InMemoryObservationStore, InMemoryScoreStore, MetricObservation,
    ObservationImporter, ScoringRubric,
};
use property_finder::error::AppError;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type ApiDealService = DealScoringService<InMemoryObservationStore, InMemoryScoreStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Standard rubric unless a JSON override is configured.
pub(crate) fn load_rubric(path: Option<&Path>) -> Result<ScoringRubric, AppError> {
    match path {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            let rubric = ScoringRubric::from_reader(file)?;
            info!(path = %path.display(), scenarios = rubric.scenarios.len(), "loaded scoring rubric");
            Ok(rubric)
        }
        None => Ok(ScoringRubric::standard()),
    }
}

pub(crate) fn load_observations(path: Option<&Path>) -> Result<Vec<MetricObservation>, AppError> {
    match path {
        Some(path) => {
            let observations = ObservationImporter::from_path(path)?;
            info!(path = %path.display(), rows = observations.len(), "imported observations");
            Ok(observations)
        }
        None => Ok(Vec::new()),
    }
}

pub(crate) fn build_deal_service(
    config: &ScoringConfig,
    observations: Vec<MetricObservation>,
) -> Result<Arc<ApiDealService>, AppError> {
    let rubric = load_rubric(config.rubric_path.as_deref())?;
    Ok(Arc::new(DealScoringService::new(
        Arc::new(InMemoryObservationStore::new(observations)),
        Arc::new(InMemoryScoreStore::default()),
        rubric,
        config.windows,
        config.scenarios.clone(),
    )))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_reports_the_raw_value() {
        assert_eq!(
            parse_date(" 2025-06-30 "),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date"))
        );
        let err = parse_date("06/30/2025").expect_err("wrong format");
        assert!(err.contains("06/30/2025"));
    }

    #[test]
    fn missing_paths_fall_back_to_defaults() {
        assert_eq!(load_rubric(None).expect("standard"), ScoringRubric::standard());
        assert!(load_observations(None).expect("empty").is_empty());
    }

    #[test]
    fn unreadable_rubric_is_an_io_error() {
        let err = load_rubric(Some(Path::new("/nonexistent/rubric.json"))).expect_err("missing");
        assert!(matches!(err, AppError::Io(_)));
    }
}
