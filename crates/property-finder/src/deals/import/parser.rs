use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::io::Read;

use super::super::domain::{MetricKind, MetricObservation, ObservationError, ZipCode};
use super::ObservationImportError;

#[derive(Debug, Deserialize)]
struct ObservationRow {
    #[serde(alias = "zip", alias = "geo_id")]
    zip_code: String,
    #[serde(alias = "metric")]
    metric_type: String,
    #[serde(alias = "date", alias = "published_at", alias = "issue_date")]
    metric_date: String,
    value: String,
}

impl ObservationRow {
    fn into_observation(self) -> Result<MetricObservation, ObservationError> {
        let zip_code = ZipCode::parse(&self.zip_code)?;
        let metric_type = MetricKind::parse(&self.metric_type)?;
        let metric_date = parse_date(&self.metric_date).ok_or(ObservationError::InvalidDate {
            value: self.metric_date.clone(),
        })?;
        let value = parse_value(&self.value).ok_or_else(|| ObservationError::NonFiniteValue {
            metric: metric_type,
            zip_code: zip_code.clone(),
        })?;

        MetricObservation::new(zip_code, metric_type, metric_date, value)
    }
}

pub(crate) fn parse_observations<R: Read>(
    reader: R,
) -> Result<Vec<MetricObservation>, ObservationImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut observations = Vec::new();

    let headers = csv_reader.headers()?.clone();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|position| position.line()).unwrap_or(0);
        let row: ObservationRow = record.deserialize(Some(&headers))?;
        let observation = row
            .into_observation()
            .map_err(|source| ObservationImportError::Row { line, source })?;
        observations.push(observation);
    }

    Ok(observations)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_utc().date())
}

// Flood rows arrive as booleans from hazard feeds; everything else is numeric.
fn parse_value(value: &str) -> Option<f64> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(1.0),
        "false" | "no" => Some(0.0),
        other => other.parse::<f64>().ok().filter(|parsed| parsed.is_finite()),
    }
}
