//! Deal scoring and underwriting engine for ZIP-level real-estate analysis.

pub mod config;
pub mod deals;
pub mod error;
pub mod telemetry;
pub mod underwriting;
