#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::core::ranking::DEFAULT_TOP_N;
use crate::utils::error::{MatcherError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, Validate};

pub use toml_config::MatcherConfig;

/// Environment variable holding the scoring service credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Upper bound on concurrent scoring requests, to stay under service rate limits.
pub const MAX_CONCURRENT_LIMIT: usize = 8;

/// Knobs the matching pipeline reads on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_concurrent: usize,
    pub request_timeout_seconds: u64,
    pub top_n: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            request_timeout_seconds: 60,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl ConfigProvider for PipelineSettings {
    fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    fn request_timeout_seconds(&self) -> u64 {
        self.request_timeout_seconds
    }

    fn top_n(&self) -> usize {
        self.top_n
    }
}

impl Validate for PipelineSettings {
    fn validate(&self) -> Result<()> {
        validate_range("scoring.max_concurrent", self.max_concurrent, 1, MAX_CONCURRENT_LIMIT)?;
        validate_positive_number(
            "scoring.request_timeout_seconds",
            self.request_timeout_seconds as usize,
            1,
        )?;
        validate_positive_number("report.top_n", self.top_n, 1)?;
        Ok(())
    }
}

/// Reads the scoring credential, loading a `.env` file first if one exists.
///
/// A missing or blank key is fatal: call this once before any run starts.
pub fn api_key_from_env() -> Result<String> {
    dotenvy::dotenv().ok();
    api_key_from_var(API_KEY_VAR)
}

fn api_key_from_var(variable: &str) -> Result<String> {
    match std::env::var(variable) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(MatcherError::ServiceAuth {
            variable: variable.to_string(),
        }),
    }
}
