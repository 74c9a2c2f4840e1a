pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::{MatcherConfig, PipelineSettings};

pub use adapters::{AdapterRegistry, ChatClient, LlmMatchScorer, PdfResumeSource};
pub use core::pipeline::MatchingPipeline;
pub use domain::model::{MatchReport, ProfessorRecord, ScoredMatch};
pub use utils::error::{MatcherError, Result};
