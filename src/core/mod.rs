pub mod pipeline;
pub mod ranking;
pub mod report;

pub use crate::domain::model::{MatchReport, ProfessorRecord, ScoreResult, ScoredMatch};
pub use crate::domain::ports::{
    ConfigProvider, DirectoryAdapter, MatchScorer, PageRenderer, RenderSession, ResumeSource,
};
pub use crate::utils::error::Result;
