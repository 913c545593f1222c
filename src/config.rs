use std::env;

use thiserror::Error;

use crate::remarks::{AttemptPolicy, ProgressionPolicy};

/// Top-level configuration for the CLI.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Only needed by commands that touch Postgres.
    pub database_url: Option<String>,
    pub telemetry: TelemetryConfig,
    pub policy: ProgressionPolicy,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PROGRESSION_GPA_ATTEMPTS must be 'all' or 'latest', got '{0}'")]
    InvalidAttemptPolicy(String),
    #[error("PROGRESSION_MAX_CARRIED_FAILURES must be a non-negative integer, got '{0}'")]
    InvalidMaxCarriedFailures(String),
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let attempts = match env::var("PROGRESSION_GPA_ATTEMPTS") {
            Ok(value) => parse_attempt_policy(&value)?,
            Err(_) => AttemptPolicy::default(),
        };
        let max_carried_failures = match env::var("PROGRESSION_MAX_CARRIED_FAILURES") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidMaxCarriedFailures(value))?,
            Err(_) => 0,
        };

        Ok(Self {
            database_url,
            telemetry: TelemetryConfig { log_level },
            policy: ProgressionPolicy {
                attempts,
                max_carried_failures,
            },
        })
    }
}

fn parse_attempt_policy(value: &str) -> Result<AttemptPolicy, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "all" | "all-attempts" => Ok(AttemptPolicy::AllAttempts),
        "latest" | "latest-attempt" => Ok(AttemptPolicy::LatestAttempt),
        _ => Err(ConfigError::InvalidAttemptPolicy(value.to_string())),
    }
}
