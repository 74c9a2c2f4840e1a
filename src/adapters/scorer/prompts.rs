/// Role instruction sent as the system message of every scoring call.
pub const MATCH_SYSTEM_PROMPT: &str = "You are an expert academic recruiter. Your task is to evaluate \
    the match between a candidate's resume and a professor's research interests.";

pub fn build_match_prompt(resume_text: &str, research_text: &str) -> String {
    format!(
        r#"Here is the candidate's resume:
---RESUME START---
{resume_text}
---RESUME END---

Here is the professor's research interests:
---RESEARCH START---
{research_text}
---RESEARCH END---

Please perform two tasks:
1. Briefly summarize the professor's research area in one or two sentences.
2. Provide a match score from 0 (no match) to 10 (perfect match) based on how
   well the candidate's skills and experience in their resume align with the
   professor's research area.

Respond *only* in the following JSON format:
{{
  "score": <integer from 0 to 10>,
  "research_summary": "<one_or_two_sentence_summary>"
}}"#
    )
}
