use crate::domain::model::MatchReport;
use crate::utils::error::Result;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: usize,
    name: &'a str,
    score: u8,
    summary: &'a str,
    research_text: &'a str,
}

/// Human-readable top-N listing for the terminal.
pub fn render_top(report: &MatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- TOP {} PROFESSOR MATCHES ---", report.top().len());

    for (i, m) in report.top().iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "#{}: {}", i + 1, m.name);
        let _ = writeln!(out, "  - Research Area: {}", m.research_text);
        let _ = writeln!(out, "  - Summary: {}", m.summary);
        let _ = writeln!(out, "  - Match Score: {}/10", m.score);
    }

    let _ = writeln!(out);
    let _ = write!(
        out,
        "Scored {} of {} professors",
        report.scored_count(),
        report.total_records
    );
    if !report.failures.is_empty() {
        let _ = write!(out, ", {} failed", report.failures.len());
    }
    if !report.skipped_cards.is_empty() {
        let _ = write!(out, ", {} directory entries skipped", report.skipped_cards.len());
    }
    if report.cancelled {
        let _ = write!(out, " (cancelled early)");
    }
    let _ = writeln!(out, ".");

    for failure in &report.failures {
        let _ = writeln!(out, "  ! {}: {}", failure.name, failure.reason);
    }

    out
}

/// Writes the full ranked list of one run to a CSV file.
pub fn export_csv<P: AsRef<Path>>(report: &MatchReport, path: P) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for (i, m) in report.ranked.iter().enumerate() {
        writer.serialize(CsvRow {
            rank: i + 1,
            name: &m.name,
            score: m.score,
            summary: &m.summary,
            research_text: &m.research_text,
        })?;
    }
    writer.flush()?;
    Ok(())
}
