/**
 * Define `EnvironmentType` enum and implements various traits for it.
 *
 * The `EnvironmentType` enum represents different types of environments:
 * - `development` (also aliased as 'dev')
 * - `staging` (also aliased as 'stg')
 * - `production` (also aliased as 'prod')
 *
 * Anything else is treated as production.
 */
use std::env;

use serde::Deserialize;
use slog::Level;

/// environment variable selecting the run mode
pub(crate) const ENVIRONMENT_VARIABLE: &str = "PUBIP_ENVIRONMENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub(crate) enum EnvironmentType {
    Development,
    Staging,
    Production,
}

impl EnvironmentType {
    /**
     * The environment selected by `PUBIP_ENVIRONMENT`, production if unset.
     */
    pub fn current() -> Self {
        env::var(ENVIRONMENT_VARIABLE)
            .map(EnvironmentType::from)
            .unwrap_or(EnvironmentType::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentType::Development => "development",
            EnvironmentType::Staging => "staging",
            EnvironmentType::Production => "production",
        }
    }

    /**
     * Log level used when none is configured, or the configured one is invalid.
     */
    pub fn default_log_level(&self) -> Level {
        match self {
            EnvironmentType::Development => Level::Debug,
            EnvironmentType::Staging | EnvironmentType::Production => Level::Warning,
        }
    }
}

impl From<String> for EnvironmentType {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => EnvironmentType::Development,
            "staging" | "stg" => EnvironmentType::Staging,
            _ => EnvironmentType::Production,
        }
    }
}
