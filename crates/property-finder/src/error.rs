use crate::config::ConfigError;
use crate::deals::scoring::RubricError;
use crate::deals::{DealServiceError, ObservationImportError};
use crate::telemetry::TelemetryError;
use crate::underwriting::CalculationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Observations(ObservationImportError),
    Rubric(RubricError),
    Deals(DealServiceError),
    Calculation(CalculationError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Observations(err) => write!(f, "observation import error: {}", err),
            AppError::Rubric(err) => write!(f, "scoring rubric error: {}", err),
            AppError::Deals(err) => write!(f, "deal scoring error: {}", err),
            AppError::Calculation(err) => write!(f, "underwriting error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Observations(err) => Some(err),
            AppError::Rubric(err) => Some(err),
            AppError::Deals(err) => Some(err),
            AppError::Calculation(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Observations(_) | AppError::Rubric(_) | AppError::Calculation(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Deals(DealServiceError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Deals(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ObservationImportError> for AppError {
    fn from(value: ObservationImportError) -> Self {
        Self::Observations(value)
    }
}

impl From<RubricError> for AppError {
    fn from(value: RubricError) -> Self {
        Self::Rubric(value)
    }
}

impl From<DealServiceError> for AppError {
    fn from(value: DealServiceError) -> Self {
        Self::Deals(value)
    }
}

impl From<CalculationError> for AppError {
    fn from(value: CalculationError) -> Self {
        Self::Calculation(value)
    }
}
