pub mod client;
pub mod prompts;

use crate::domain::model::ScoreResult;
use crate::domain::ports::MatchScorer;
use crate::utils::error::ScoringError;
use async_trait::async_trait;
use client::{strip_json_fences, ChatClient};
use prompts::{build_match_prompt, MATCH_SYSTEM_PROMPT};
use serde_json::Value;

/// Scores resume/research pairs with a language model.
pub struct LlmMatchScorer {
    client: ChatClient,
}

impl LlmMatchScorer {
    pub fn new(client: ChatClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MatchScorer for LlmMatchScorer {
    async fn score(
        &self,
        resume_text: &str,
        research_text: &str,
    ) -> Result<ScoreResult, ScoringError> {
        let prompt = build_match_prompt(resume_text, research_text);
        let content = self.client.complete_json(MATCH_SYSTEM_PROMPT, &prompt).await?;
        parse_score_response(&content)
    }
}

/// Decodes and validates a scoring response.
///
/// The score must be a JSON integer in `0..=10`. Strings, fractions and
/// out-of-range values are rejected rather than coerced.
pub fn parse_score_response(content: &str) -> Result<ScoreResult, ScoringError> {
    let malformed = |reason: String| ScoringError::MalformedResponse { reason };

    let value: Value = serde_json::from_str(strip_json_fences(content))
        .map_err(|e| malformed(format!("response is not JSON: {}", e)))?;
    let Value::Object(mut fields) = value else {
        return Err(malformed("response is not a JSON object".to_string()));
    };

    let score = match fields.remove("score") {
        None | Some(Value::Null) => return Err(malformed("score is missing".to_string())),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| malformed(format!("score {} is not an integer", n)))?,
        Some(other) => return Err(malformed(format!("score {} is not an integer", other))),
    };

    if !(0..=i64::from(ScoreResult::MAX_SCORE)).contains(&score) {
        return Err(malformed(format!(
            "score {} is outside 0-{}",
            score,
            ScoreResult::MAX_SCORE
        )));
    }

    let summary = match fields.remove("research_summary") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::String(_)) => return Err(malformed("research_summary is empty".to_string())),
        None | Some(Value::Null) => {
            return Err(malformed("research_summary is missing".to_string()))
        }
        Some(_) => return Err(malformed("research_summary is not a string".to_string())),
    };

    Ok(ScoreResult {
        score: score as u8,
        summary,
    })
}
