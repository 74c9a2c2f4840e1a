use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Plain text of a candidate's resume. Created once per run, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeText(String);

impl ResumeText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl Deref for ResumeText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

/// One professor as extracted from a directory page.
///
/// Only constructible through [`ProfessorRecord::new`], which enforces a
/// non-empty name and an absolute http(s) profile URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfessorRecord {
    name: String,
    profile_url: String,
    research_text: String,
}

impl ProfessorRecord {
    pub fn new(
        name: impl Into<String>,
        profile_url: impl Into<String>,
        research_text: impl Into<String>,
    ) -> Result<Self, String> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err("professor name is empty".to_string());
        }

        let profile_url = profile_url.into();
        match url::Url::parse(&profile_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(format!(
                    "profile URL '{}' has unsupported scheme '{}'",
                    profile_url,
                    parsed.scheme()
                ))
            }
            Err(e) => {
                return Err(format!(
                    "profile URL '{}' is not absolute: {}",
                    profile_url, e
                ))
            }
        }

        Ok(Self {
            name,
            profile_url,
            research_text: research_text.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    pub fn research_text(&self) -> &str {
        &self.research_text
    }
}

/// A directory card that could not be turned into a [`ProfessorRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCard {
    /// Zero-based position of the card in document order.
    pub position: usize,
    pub reason: String,
}

/// Output of one directory scrape, in document order.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    pub records: Vec<ProfessorRecord>,
    pub skipped: Vec<SkippedCard>,
}

/// Validated response of the scoring service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub summary: String,
}

impl ScoreResult {
    pub const MAX_SCORE: u8 = 10;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredMatch {
    pub name: String,
    pub research_text: String,
    pub summary: String,
    pub score: u8,
}

impl ScoredMatch {
    pub fn new(record: &ProfessorRecord, result: ScoreResult) -> Self {
        Self {
            name: record.name().to_string(),
            research_text: record.research_text().to_string(),
            summary: result.summary,
            score: result.score,
        }
    }
}

/// A professor whose scoring call failed; kept for reporting only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringFailure {
    pub name: String,
    pub reason: String,
}

/// Ranked outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    /// Every successful match, score descending, directory order on ties.
    pub ranked: Vec<ScoredMatch>,
    pub top_n: usize,
    pub total_records: usize,
    pub failures: Vec<ScoringFailure>,
    pub skipped_cards: Vec<SkippedCard>,
    /// Set when the run stopped submitting work before every record was scored.
    pub cancelled: bool,
    pub generated_at: DateTime<Utc>,
}

impl MatchReport {
    /// The size-bounded list presented to the operator.
    pub fn top(&self) -> &[ScoredMatch] {
        let n = self.top_n.min(self.ranked.len());
        &self.ranked[..n]
    }

    pub fn scored_count(&self) -> usize {
        self.ranked.len()
    }
}
