//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;
use workspace_query_core::EngineTiming;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where answers for `ask` come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SynthesizerMode {
    /// Local canned templates, no network call.
    Mock,
    /// An external text-generation service.
    Delegated,
}

impl std::str::FromStr for SynthesizerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "delegated" | "openai" => Ok(Self::Delegated),
            other => Err(format!("'{}' is not one of: mock, delegated", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub synthesizer_mode: SynthesizerMode,
    pub openai_api_key: Option<String>,
    pub synth_model: String,
    pub timing: EngineTiming,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Load Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        // --- Load Synthesizer Settings ---
        let synthesizer_mode = match lookup("SYNTHESIZER_MODE") {
            Some(value) => value
                .parse::<SynthesizerMode>()
                .map_err(|e| ConfigError::InvalidValue("SYNTHESIZER_MODE".to_string(), e))?,
            None => SynthesizerMode::Mock,
        };
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        let synth_model = lookup("SYNTH_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        // --- Load Simulated Latencies ---
        let defaults = EngineTiming::default();
        let timing = EngineTiming {
            search_delay: millis(&lookup, "SEARCH_DELAY_MS", defaults.search_delay)?,
            ask_delay: millis(&lookup, "ASK_DELAY_MS", defaults.ask_delay)?,
            status_interval: millis(&lookup, "STATUS_INTERVAL_MS", defaults.status_interval)?,
        };
        if timing.status_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "STATUS_INTERVAL_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            synthesizer_mode,
            openai_api_key,
            synth_model,
            timing,
        })
    }
}

fn millis<F>(lookup: &F, name: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}
