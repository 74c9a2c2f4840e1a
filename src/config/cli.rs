use crate::config::toml_config::MatcherConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "faculty-match")]
#[command(about = "Rank faculty directory entries by research fit with a resume")]
#[command(version)]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "FACULTY_MATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// PDF resume to match; with --directory, runs once without prompting
    #[arg(short, long)]
    pub resume: Option<String>,

    /// Faculty directory URL; with --resume, runs once without prompting
    #[arg(short, long)]
    pub directory: Option<String>,

    /// Use this adapter instead of picking one from the directory URL
    #[arg(short, long)]
    pub adapter: Option<String>,

    /// Number of matches to show
    #[arg(long)]
    pub top: Option<usize>,

    /// Maximum concurrent scoring requests
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Write the full ranked list of each run to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage after each phase")]
    pub monitor: bool,
}

impl CliConfig {
    /// Loads the config file (or defaults), applies flag overrides and validates.
    pub fn matcher_config(&self) -> Result<MatcherConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                MatcherConfig::from_file(path)?
            }
            None => MatcherConfig::default(),
        };

        if let Some(top) = self.top {
            config.report.top_n = top;
        }
        if let Some(concurrency) = self.concurrency {
            config.scoring.max_concurrent = concurrency;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn is_one_shot(&self) -> bool {
        self.resume.is_some() && self.directory.is_some()
    }
}
