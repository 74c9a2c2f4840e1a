use crate::domain::model::{DirectoryListing, ResumeText, ScoreResult};
use crate::utils::error::{DirectoryError, ResumeError, ScoringError};
use async_trait::async_trait;
use url::Url;

/// Turns a resume file into plain text.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    async fn parse(&self, path: &str) -> Result<ResumeText, ResumeError>;
}

/// Extracts professor records from one kind of directory site.
#[async_trait]
pub trait DirectoryAdapter: Send + Sync {
    fn name(&self) -> &str;

    async fn scrape(&self, directory_url: &Url) -> Result<DirectoryListing, DirectoryError>;
}

/// Scores one professor's research text against a resume.
#[async_trait]
pub trait MatchScorer: Send + Sync {
    async fn score(
        &self,
        resume_text: &str,
        research_text: &str,
    ) -> Result<ScoreResult, ScoringError>;
}

/// Opens rendering sessions for directory pages.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn open(&self) -> Result<Box<dyn RenderSession>, DirectoryError>;
}

/// One exclusive rendering session. Callers must `close` it on every path.
#[async_trait]
pub trait RenderSession: Send {
    /// Loads `url` and returns the rendered markup.
    async fn load(&mut self, url: &Url) -> Result<String, DirectoryError>;

    async fn close(self: Box<Self>);
}

pub trait ConfigProvider: Send + Sync {
    fn max_concurrent(&self) -> usize;
    fn request_timeout_seconds(&self) -> u64;
    fn top_n(&self) -> usize;
}
