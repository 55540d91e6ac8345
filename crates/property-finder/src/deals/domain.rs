use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Five-digit US postal code, the spatial key for every aggregation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(raw: &str) -> Result<Self, ObservationError> {
        let trimmed = raw.trim();
        if trimmed.len() == 5 && trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ObservationError::InvalidZip {
                value: raw.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ZipCode {
    type Error = ObservationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZipCode> for String {
    fn from(value: ZipCode) -> Self {
        value.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Market indicators tracked per ZIP code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    RentIndex,
    HomeValueIndex,
    Income,
    Population,
    PermitCount,
    FloodFlag,
    NewsCount,
}

impl MetricKind {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::RentIndex,
            Self::HomeValueIndex,
            Self::Income,
            Self::Population,
            Self::PermitCount,
            Self::FloodFlag,
            Self::NewsCount,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RentIndex => "rent_index",
            Self::HomeValueIndex => "home_value_index",
            Self::Income => "income",
            Self::Population => "population",
            Self::PermitCount => "permit_count",
            Self::FloodFlag => "flood_flag",
            Self::NewsCount => "news_count",
        }
    }

    /// Accepts the canonical names plus the source-system aliases used by upstream feeds.
    pub fn parse(raw: &str) -> Result<Self, ObservationError> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let kind = match normalized.as_str() {
            "rent_index" | "zillow_zori" | "zori" => Self::RentIndex,
            "home_value_index" | "zillow_zhvi" | "zhvi" => Self::HomeValueIndex,
            "income" | "census_income" | "median_income" => Self::Income,
            "population" | "census_population" => Self::Population,
            "permit_count" | "permit" | "permits" => Self::PermitCount,
            "flood_flag" | "flood" | "flood_risk" => Self::FloodFlag,
            "news_count" | "news" | "news_article" => Self::NewsCount,
            _ => {
                return Err(ObservationError::UnknownMetric {
                    value: raw.to_string(),
                })
            }
        };
        Ok(kind)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One measured value for a ZIP code. Observations are never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricObservation {
    pub zip_code: ZipCode,
    pub metric_type: MetricKind,
    pub metric_date: NaiveDate,
    pub value: f64,
}

impl MetricObservation {
    pub fn new(
        zip_code: ZipCode,
        metric_type: MetricKind,
        metric_date: NaiveDate,
        value: f64,
    ) -> Result<Self, ObservationError> {
        if !value.is_finite() {
            return Err(ObservationError::NonFiniteValue {
                metric: metric_type,
                zip_code,
            });
        }

        Ok(Self {
            zip_code,
            metric_type,
            metric_date,
            value,
        })
    }
}

/// Point-in-time view of a ZIP code, recomputed on demand from its observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedZipMetrics {
    pub zip_code: ZipCode,
    pub permit_count: u32,
    pub rent_index: Option<f64>,
    pub home_value_index: Option<f64>,
    pub income: Option<f64>,
    pub population: Option<f64>,
    pub rent_growth: Option<f64>,
    pub value_growth: Option<f64>,
    pub flood_flag: bool,
    pub news_count: u32,
}

impl AggregatedZipMetrics {
    /// Record with no observed data: counts at zero, every nullable field absent.
    pub fn empty(zip_code: ZipCode) -> Self {
        Self {
            zip_code,
            permit_count: 0,
            rent_index: None,
            home_value_index: None,
            income: None,
            population: None,
            rent_growth: None,
            value_growth: None,
            flood_flag: false,
            news_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObservationError {
    #[error("'{value}' is not a five-digit ZIP code")]
    InvalidZip { value: String },
    #[error("unknown metric type '{value}'")]
    UnknownMetric { value: String },
    #[error("'{value}' is not a valid YYYY-MM-DD date")]
    InvalidDate { value: String },
    #[error("{metric} observation for {zip_code} is not a finite number")]
    NonFiniteValue { metric: MetricKind, zip_code: ZipCode },
}
