use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::deals::AggregationWindows;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scoring: ScoringConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Aggregation windows, batch scenarios, and an optional rubric override.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub windows: AggregationWindows,
    pub scenarios: Vec<String>,
    pub rubric_path: Option<PathBuf>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            windows: AggregationWindows::default(),
            scenarios: DEFAULT_SCENARIOS.iter().map(|id| id.to_string()).collect(),
            rubric_path: None,
        }
    }
}

const DEFAULT_SCENARIOS: [&str; 3] = ["S1", "S2", "S3"];

impl ScoringConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = AggregationWindows::default();
        let windows = AggregationWindows {
            growth_months: window_var("DEAL_GROWTH_WINDOW_MONTHS", defaults.growth_months)?,
            permit_months: window_var("DEAL_PERMIT_WINDOW_MONTHS", defaults.permit_months)?,
            news_days: window_var("DEAL_NEWS_WINDOW_DAYS", defaults.news_days)?,
        };

        let scenarios = match env::var("DEAL_SCENARIOS") {
            Ok(raw) => {
                let scenarios: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect();
                if scenarios.is_empty() {
                    return Err(ConfigError::EmptyScenarioList);
                }
                scenarios
            }
            Err(_) => Self::default().scenarios,
        };

        let rubric_path = env::var("DEAL_RUBRIC_PATH")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            windows,
            scenarios,
            rubric_path,
        })
    }
}

fn window_var(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidWindow { name, value: raw }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidWindow { name: &'static str, value: String },
    EmptyScenarioList,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidWindow { name, value } => {
                write!(f, "{name} must be a positive integer (got '{value}')")
            }
            ConfigError::EmptyScenarioList => {
                write!(f, "DEAL_SCENARIOS must name at least one scenario")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidWindow { .. }
            | ConfigError::EmptyScenarioList => None,
        }
    }
}
