use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors};

const CONFIG_DIR: &str = "config";
const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration.
///
/// Loaded from built-in defaults, optional files under `config/`, and
/// `APP__`-prefixed environment variables, in that order of precedence.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Flat delivery fee added to every order total. Fixed at deployment,
    /// not user-editable.
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: Decimal,

    /// Query used for the automatic store search on the first position fix.
    #[validate(length(min = 1, message = "default_search_query must not be empty"))]
    #[serde(default = "default_search_query")]
    pub default_search_query: String,

    /// Side length, in degrees, of the region covered by a nearby-store
    /// search (0.05 is roughly 5 km).
    #[serde(default = "default_search_span_degrees")]
    pub default_search_span_degrees: f64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_delivery_fee() -> Decimal {
    dec!(2.99)
}

fn default_search_query() -> String {
    "grocery store".to_string()
}

fn default_search_span_degrees() -> f64 {
    0.05
}

impl AppConfig {
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            delivery_fee: default_delivery_fee(),
            default_search_query: default_search_query(),
            default_search_span_degrees: default_search_span_degrees(),
        }
    }

    /// Constraints the `validator` derive cannot express.
    pub fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.delivery_fee < Decimal::ZERO {
            let mut err = ValidationError::new("delivery_fee");
            err.message = Some("delivery_fee must not be negative".into());
            errors.add("delivery_fee", err);
        }

        if !self.default_search_span_degrees.is_finite() || self.default_search_span_degrees <= 0.0
        {
            let mut err = ValidationError::new("default_search_span_degrees");
            err.message = Some("default_search_span_degrees must be a positive finite value".into());
            errors.add("default_search_span_degrees", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Loads configuration for the environment named by `RUN_ENV`/`APP_ENV`.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://grocerygo.db?mode=rwc")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("delivery_fee", "2.99")?
        .set_default("default_search_query", "grocery store")?
        .set_default("default_search_span_degrees", 0.05)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate()?;
    app_config.validate_additional_constraints()?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        assert!(cfg.validate().is_ok());
        assert!(cfg.validate_additional_constraints().is_ok());
        assert_eq!(cfg.delivery_fee, dec!(2.99));
        assert_eq!(cfg.default_search_query, "grocery store");
    }

    #[test]
    fn negative_delivery_fee_rejected() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        cfg.delivery_fee = dec!(-1.00);
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn zero_search_span_rejected() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        cfg.default_search_span_degrees = 0.0;
        assert!(cfg.validate_additional_constraints().is_err());
    }
}
