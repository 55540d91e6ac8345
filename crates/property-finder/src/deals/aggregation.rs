use std::collections::BTreeMap;

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{AggregatedZipMetrics, MetricKind, MetricObservation, ZipCode};

/// Trailing windows applied when collapsing a ZIP's time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationWindows {
    pub growth_months: u32,
    pub permit_months: u32,
    pub news_days: u32,
}

impl Default for AggregationWindows {
    fn default() -> Self {
        Self {
            growth_months: 12,
            permit_months: 12,
            news_days: 30,
        }
    }
}

/// Collapses raw observations into the latest-value and growth view used for scoring.
#[derive(Debug, Clone, Default)]
pub struct MetricsAggregator {
    windows: AggregationWindows,
}

impl MetricsAggregator {
    pub fn new(windows: AggregationWindows) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> AggregationWindows {
        self.windows
    }

    /// Aggregate the observations belonging to `zip_code` as of the given date.
    ///
    /// Observations for other ZIP codes and observations dated after `as_of` are ignored, so
    /// the result only depends on the observation set and the evaluation date.
    pub fn aggregate(
        &self,
        zip_code: &ZipCode,
        observations: &[MetricObservation],
        as_of: NaiveDate,
    ) -> AggregatedZipMetrics {
        let relevant: Vec<&MetricObservation> = observations
            .iter()
            .filter(|observation| {
                &observation.zip_code == zip_code && observation.metric_date <= as_of
            })
            .collect();

        let growth_start = months_before(as_of, self.windows.growth_months);
        let permit_start = months_before(as_of, self.windows.permit_months);
        let news_start = days_before(as_of, self.windows.news_days);

        let metrics = AggregatedZipMetrics {
            zip_code: zip_code.clone(),
            permit_count: count_since(&relevant, MetricKind::PermitCount, permit_start),
            rent_index: latest_value(&relevant, MetricKind::RentIndex),
            home_value_index: latest_value(&relevant, MetricKind::HomeValueIndex),
            income: latest_value(&relevant, MetricKind::Income),
            population: latest_value(&relevant, MetricKind::Population),
            rent_growth: range_growth(&relevant, MetricKind::RentIndex, growth_start),
            value_growth: range_growth(&relevant, MetricKind::HomeValueIndex, growth_start),
            flood_flag: latest_value(&relevant, MetricKind::FloodFlag)
                .map(|status| status != 0.0)
                .unwrap_or(false),
            news_count: count_since(&relevant, MetricKind::NewsCount, news_start),
        };

        debug!(
            zip_code = %zip_code,
            observations = relevant.len(),
            permit_count = metrics.permit_count,
            news_count = metrics.news_count,
            "aggregated zip metrics"
        );

        metrics
    }

    /// Aggregate every ZIP code present in `observations`, keyed and ordered by ZIP.
    pub fn aggregate_all(
        &self,
        observations: &[MetricObservation],
        as_of: NaiveDate,
    ) -> BTreeMap<ZipCode, AggregatedZipMetrics> {
        let mut by_zip: BTreeMap<ZipCode, Vec<MetricObservation>> = BTreeMap::new();
        for observation in observations {
            by_zip
                .entry(observation.zip_code.clone())
                .or_default()
                .push(observation.clone());
        }

        by_zip
            .into_iter()
            .map(|(zip_code, series)| {
                let metrics = self.aggregate(&zip_code, &series, as_of);
                (zip_code, metrics)
            })
            .collect()
    }
}

fn months_before(as_of: NaiveDate, months: u32) -> NaiveDate {
    as_of
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

fn days_before(as_of: NaiveDate, days: u32) -> NaiveDate {
    as_of
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

// Ties on the date resolve to the observation recorded last.
fn latest_value(observations: &[&MetricObservation], kind: MetricKind) -> Option<f64> {
    observations
        .iter()
        .filter(|observation| observation.metric_type == kind)
        .max_by_key(|observation| observation.metric_date)
        .map(|observation| observation.value)
}

fn count_since(observations: &[&MetricObservation], kind: MetricKind, start: NaiveDate) -> u32 {
    let count = observations
        .iter()
        .filter(|observation| observation.metric_type == kind && observation.metric_date >= start)
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Spread between the smallest and largest value in the window, relative to the smallest.
///
/// This measures the range of the series, not its direction: a series that rises and then
/// falls back still reports the full swing. Undefined with fewer than two points or a
/// non-positive baseline.
fn range_growth(
    observations: &[&MetricObservation],
    kind: MetricKind,
    start: NaiveDate,
) -> Option<f64> {
    let mut count = 0usize;
    let mut min_value = f64::INFINITY;
    let mut max_value = f64::NEG_INFINITY;

    for observation in observations
        .iter()
        .filter(|observation| observation.metric_type == kind && observation.metric_date >= start)
    {
        count += 1;
        min_value = min_value.min(observation.value);
        max_value = max_value.max(observation.value);
    }

    if count < 2 || min_value <= 0.0 {
        return None;
    }

    Some((max_value - min_value) / min_value * 100.0)
}
