use crate::adapters::directory::cards::CardLayout;
use crate::config::{PipelineSettings, MAX_CONCURRENT_LIMIT};
use crate::utils::error::{MatcherError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_regex,
    validate_url, Validate,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

static ENV_VAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const FACULTY_CARDS_KIND: &str = "faculty-cards";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub scoring: ScoringConfig,
    pub report: ReportConfig,
    pub directory: DirectoryConfig,
    pub adapters: Vec<AdapterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub model: String,
    pub api_base: String,
    pub request_timeout_seconds: u64,
    pub max_concurrent: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let settings = PipelineSettings::default();
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_seconds: settings.request_timeout_seconds,
            max_concurrent: settings.max_concurrent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: PipelineSettings::default().top_n,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub fetch_timeout_seconds: u64,
    pub user_agent: String,
    /// Adapter used when no `url_pattern` matches the directory URL.
    pub default_adapter: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_seconds: 20,
            user_agent: format!("faculty-match/{}", env!("CARGO_PKG_VERSION")),
            default_adapter: FACULTY_CARDS_KIND.to_string(),
        }
    }
}

/// One configured directory site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub name: String,
    #[serde(default = "default_adapter_kind")]
    pub kind: String,
    pub url_pattern: Option<String>,
    #[serde(default)]
    pub layout: CardLayout,
}

fn default_adapter_kind() -> String {
    FACULTY_CARDS_KIND.to_string()
}

impl MatcherConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| MatcherError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            max_concurrent: self.scoring.max_concurrent,
            request_timeout_seconds: self.scoring.request_timeout_seconds,
            top_n: self.report.top_n,
        }
    }
}

impl Validate for MatcherConfig {
    fn validate(&self) -> Result<()> {
        validate_url("scoring.api_base", &self.scoring.api_base)?;
        validate_non_empty_string("scoring.model", &self.scoring.model)?;
        validate_range(
            "scoring.max_concurrent",
            self.scoring.max_concurrent,
            1,
            MAX_CONCURRENT_LIMIT,
        )?;
        validate_positive_number(
            "scoring.request_timeout_seconds",
            self.scoring.request_timeout_seconds as usize,
            1,
        )?;
        validate_positive_number("report.top_n", self.report.top_n, 1)?;
        validate_positive_number(
            "directory.fetch_timeout_seconds",
            self.directory.fetch_timeout_seconds as usize,
            1,
        )?;

        let mut names = HashSet::new();
        for adapter in &self.adapters {
            validate_non_empty_string("adapters.name", &adapter.name)?;
            if !names.insert(adapter.name.as_str()) {
                return Err(MatcherError::InvalidConfigValue {
                    field: "adapters.name".to_string(),
                    value: adapter.name.clone(),
                    reason: "Adapter names must be unique".to_string(),
                });
            }
            if adapter.kind != FACULTY_CARDS_KIND {
                return Err(MatcherError::InvalidConfigValue {
                    field: format!("adapters.{}.kind", adapter.name),
                    value: adapter.kind.clone(),
                    reason: format!("Unsupported adapter kind. Valid kinds: {}", FACULTY_CARDS_KIND),
                });
            }
            if let Some(pattern) = &adapter.url_pattern {
                validate_regex(&format!("adapters.{}.url_pattern", adapter.name), pattern)?;
            }
            adapter.layout.validate()?;
        }

        let default_known = self.directory.default_adapter == FACULTY_CARDS_KIND
            || names.contains(self.directory.default_adapter.as_str());
        if !default_known {
            return Err(MatcherError::InvalidConfigValue {
                field: "directory.default_adapter".to_string(),
                value: self.directory.default_adapter.clone(),
                reason: "No adapter with this name is configured".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = MatcherConfig::from_toml_str("").unwrap();

        assert_eq!(config.scoring.model, "gpt-4o-mini");
        assert_eq!(config.report.top_n, 10);
        assert!(config.adapters.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[scoring]
model = "gpt-4o"
api_base = "https://llm.example.com/v1"
request_timeout_seconds = 30
max_concurrent = 6

[report]
top_n = 5

[directory]
fetch_timeout_seconds = 15
default_adapter = "iitb-cse"

[[adapters]]
name = "iitb-cse"
url_pattern = '^https://www\.cse\.iitb\.ac\.in/'

[[adapters]]
name = "people-grid"
url_pattern = 'example\.edu/people'

[adapters.layout]
card = "li.person"
name = "span.person-name"
link = "a"
research = "p.interests"
"#;

        let config = MatcherConfig::from_toml_str(toml_content).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline_settings().max_concurrent, 6);
        assert_eq!(config.pipeline_settings().top_n, 5);
        assert_eq!(config.adapters.len(), 2);
        assert_eq!(config.adapters[0].layout, CardLayout::default());
        assert_eq!(config.adapters[1].layout.card, "li.person");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FACULTY_MATCH_TEST_API_BASE", "https://proxy.example.com/v1");

        let toml_content = r#"
[scoring]
api_base = "${FACULTY_MATCH_TEST_API_BASE}"
"#;

        let config = MatcherConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.scoring.api_base, "https://proxy.example.com/v1");

        std::env::remove_var("FACULTY_MATCH_TEST_API_BASE");
    }

    #[test]
    fn test_concurrency_must_be_bounded() {
        let config = MatcherConfig::from_toml_str("[scoring]\nmax_concurrent = 50\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_default_adapter_is_rejected() {
        let config =
            MatcherConfig::from_toml_str("[directory]\ndefault_adapter = \"missing\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_url_pattern_is_rejected() {
        let toml_content = r#"
[[adapters]]
name = "broken"
url_pattern = "(unclosed"
"#;
        let config = MatcherConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let result = MatcherConfig::from_toml_str("[scoring\nmodel = ");
        assert!(matches!(result, Err(MatcherError::ConfigParse { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[report]\ntop_n = 3\n")
            .unwrap();

        let config = MatcherConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.report.top_n, 3);
    }
}
