use crate::core::ranking::rank_matches;
use crate::domain::model::{
    DirectoryListing, MatchReport, ProfessorRecord, ScoreResult, ScoredMatch, ScoringFailure,
};
use crate::domain::ports::{ConfigProvider, DirectoryAdapter, MatchScorer, ResumeSource};
use crate::utils::error::{DirectoryError, MatcherError, Result, ScoringError};
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;
use futures::future;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Resume → directory → per-professor scoring → ranking.
///
/// Holds no state between runs; every call to [`MatchingPipeline::run`] starts
/// from scratch.
pub struct MatchingPipeline<C: ConfigProvider> {
    resume_source: Arc<dyn ResumeSource>,
    adapter: Arc<dyn DirectoryAdapter>,
    scorer: Arc<dyn MatchScorer>,
    config: C,
    monitor: SystemMonitor,
}

impl<C: ConfigProvider> MatchingPipeline<C> {
    pub fn new(
        resume_source: Arc<dyn ResumeSource>,
        adapter: Arc<dyn DirectoryAdapter>,
        scorer: Arc<dyn MatchScorer>,
        config: C,
    ) -> Self {
        Self {
            resume_source,
            adapter,
            scorer,
            config,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = SystemMonitor::new(enabled);
        self
    }

    pub async fn run(&self, resume_path: &str, directory_url: &str) -> Result<MatchReport> {
        self.run_with_cancel(resume_path, directory_url, &CancellationToken::new())
            .await
    }

    /// Like [`MatchingPipeline::run`], but stops submitting new scoring calls
    /// once `cancel` fires. In-flight calls finish or hit the request timeout.
    pub async fn run_with_cancel(
        &self,
        resume_path: &str,
        directory_url: &str,
        cancel: &CancellationToken,
    ) -> Result<MatchReport> {
        tracing::info!("Parsing resume: {}", resume_path);
        let resume_text = self.resume_source.parse(resume_path).await?;
        tracing::info!("Resume parsed ({} chars)", resume_text.len());
        self.monitor.log_stats("resume");

        let url = Url::parse(directory_url.trim()).map_err(|e| DirectoryError::NavigationError {
            url: directory_url.to_string(),
            message: format!("invalid URL: {}", e),
        })?;

        tracing::info!("Scraping directory {} with adapter '{}'", url, self.adapter.name());
        let DirectoryListing { records, skipped } = self.adapter.scrape(&url).await?;
        if records.is_empty() && skipped.is_empty() {
            return Err(DirectoryError::NoRecordsFound {
                url: url.to_string(),
            }
            .into());
        }
        for card in &skipped {
            tracing::warn!("Skipped directory card #{}: {}", card.position + 1, card.reason);
        }
        tracing::info!(
            "Directory yielded {} professors ({} cards skipped)",
            records.len(),
            skipped.len()
        );
        self.monitor.log_stats("directory");

        let outcomes = self.score_all(&resume_text, &records, cancel).await;
        let attempted = outcomes.len();
        let cancelled = attempted < records.len();
        self.monitor.log_stats("scoring");

        let mut matches = Vec::new();
        let mut failures = Vec::new();
        for (index, outcome) in outcomes {
            let record = &records[index];
            match outcome {
                Ok(result) => matches.push(ScoredMatch::new(record, result)),
                Err(e) => {
                    tracing::warn!("Could not score {}: {}", record.name(), e);
                    failures.push(ScoringFailure {
                        name: record.name().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if matches.is_empty() {
            if cancelled {
                return Err(MatcherError::Cancelled);
            }
            return Err(MatcherError::NoScoresProduced {
                attempted,
                failed: failures.len(),
            });
        }

        if cancelled {
            tracing::warn!(
                "Run cancelled after {} of {} professors",
                attempted,
                records.len()
            );
        }
        tracing::info!(
            "Scored {} professors, {} failed. Ranking results...",
            matches.len(),
            failures.len()
        );
        self.monitor.log_final_stats();

        Ok(MatchReport {
            ranked: rank_matches(matches),
            top_n: self.config.top_n(),
            total_records: records.len(),
            failures,
            skipped_cards: skipped,
            cancelled,
            generated_at: Utc::now(),
        })
    }

    /// Scores records with at most `max_concurrent` calls in flight.
    ///
    /// Results come back sorted by record index so callers see directory
    /// order regardless of completion order.
    async fn score_all(
        &self,
        resume_text: &str,
        records: &[ProfessorRecord],
        cancel: &CancellationToken,
    ) -> Vec<(usize, std::result::Result<ScoreResult, ScoringError>)> {
        let limit = self.config.max_concurrent().max(1);
        let timeout_secs = self.config.request_timeout_seconds();
        let timeout = Duration::from_secs(timeout_secs);
        let total = records.len();

        let mut outcomes: Vec<_> = stream::iter(records.iter().enumerate())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|(index, record)| async move {
                tracing::info!("Processing {}/{}: {}", index + 1, total, record.name());
                let outcome =
                    match tokio::time::timeout(timeout, self.scorer.score(resume_text, record.research_text()))
                        .await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => Err(ScoringError::Timeout {
                            seconds: timeout_secs,
                        }),
                    };
                (index, outcome)
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineSettings;
    use crate::domain::model::{ResumeText, SkippedCard};
    use crate::utils::error::ResumeError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeResume;

    #[async_trait]
    impl ResumeSource for FakeResume {
        async fn parse(&self, path: &str) -> std::result::Result<ResumeText, ResumeError> {
            if !path.ends_with(".pdf") {
                return Err(ResumeError::UnsupportedFormat {
                    path: path.to_string(),
                    extension: "docx".to_string(),
                });
            }
            Ok(ResumeText::new("Rust, distributed systems, compilers"))
        }
    }

    struct FakeDirectory {
        listing: DirectoryListing,
        calls: AtomicUsize,
    }

    impl FakeDirectory {
        fn with_professors(names: &[&str]) -> Self {
            let records = names
                .iter()
                .map(|n| {
                    ProfessorRecord::new(
                        *n,
                        format!("https://example.edu/faculty/{}", n.to_lowercase()),
                        format!("{} research", n),
                    )
                    .unwrap()
                })
                .collect();
            Self {
                listing: DirectoryListing {
                    records,
                    skipped: Vec::new(),
                },
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DirectoryAdapter for FakeDirectory {
        fn name(&self) -> &str {
            "fake"
        }

        async fn scrape(&self, _url: &Url) -> std::result::Result<DirectoryListing, DirectoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.listing.clone())
        }
    }

    /// Scores keyed by research text; missing keys fail as malformed.
    struct FakeScorer {
        scores: HashMap<String, u8>,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FakeScorer {
        fn new(scores: &[(&str, u8)]) -> Self {
            Self {
                scores: scores
                    .iter()
                    .map(|(name, score)| (format!("{} research", name), *score))
                    .collect(),
                delay: Duration::from_millis(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl MatchScorer for FakeScorer {
        async fn score(
            &self,
            _resume_text: &str,
            research_text: &str,
        ) -> std::result::Result<ScoreResult, ScoringError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.scores.get(research_text) {
                Some(score) => Ok(ScoreResult {
                    score: *score,
                    summary: format!("Summary of {}", research_text),
                }),
                None => Err(ScoringError::MalformedResponse {
                    reason: "score is not an integer".to_string(),
                }),
            }
        }
    }

    fn settings() -> PipelineSettings {
        PipelineSettings {
            max_concurrent: 4,
            request_timeout_seconds: 5,
            top_n: 10,
        }
    }

    fn pipeline(
        directory: Arc<FakeDirectory>,
        scorer: Arc<FakeScorer>,
        settings: PipelineSettings,
    ) -> MatchingPipeline<PipelineSettings> {
        MatchingPipeline::new(Arc::new(FakeResume), directory, scorer, settings)
    }

    #[tokio::test]
    async fn test_ranking_keeps_directory_order_on_ties() {
        let directory = Arc::new(FakeDirectory::with_professors(&["A", "B", "C", "D"]));
        let scorer = Arc::new(FakeScorer::new(&[("A", 5), ("B", 5), ("C", 8), ("D", 5)]));

        let report = pipeline(directory, scorer, settings())
            .run("cv.pdf", "https://example.edu/people")
            .await
            .unwrap();

        let order: Vec<(&str, u8)> = report.top().iter().map(|m| (m.name.as_str(), m.score)).collect();
        assert_eq!(order, vec![("C", 8), ("A", 5), ("B", 5), ("D", 5)]);
    }

    #[tokio::test]
    async fn test_report_is_truncated_to_top_n() {
        let names: Vec<String> = (0..12).map(|i| format!("P{:02}", i)).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let scores: Vec<(&str, u8)> = name_refs.iter().enumerate().map(|(i, n)| (*n, (i % 11) as u8)).collect();

        let directory = Arc::new(FakeDirectory::with_professors(&name_refs));
        let scorer = Arc::new(FakeScorer::new(&scores));

        let report = pipeline(directory, scorer, settings())
            .run("cv.pdf", "https://example.edu/people")
            .await
            .unwrap();

        assert_eq!(report.top().len(), 10);
        assert_eq!(report.ranked.len(), 12);
        assert!(report.top().windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(report.top()[0].score, 10);
    }

    #[tokio::test]
    async fn test_failed_scores_are_skipped_and_recorded() {
        let directory = Arc::new(FakeDirectory::with_professors(&["A", "B", "C"]));
        // B has no score and fails
        let scorer = Arc::new(FakeScorer::new(&[("A", 3), ("C", 9)]));

        let report = pipeline(directory, scorer, settings())
            .run("cv.pdf", "https://example.edu/people")
            .await
            .unwrap();

        let names: Vec<&str> = report.ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["C", "A"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "B");
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_all_failures_yield_no_scores_produced() {
        let directory = Arc::new(FakeDirectory::with_professors(&["A", "B"]));
        let scorer = Arc::new(FakeScorer::new(&[]));

        let result = pipeline(directory, scorer, settings())
            .run("cv.pdf", "https://example.edu/people")
            .await;

        assert!(matches!(
            result,
            Err(MatcherError::NoScoresProduced {
                attempted: 2,
                failed: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_resume_never_reaches_directory() {
        let directory = Arc::new(FakeDirectory::with_professors(&["A"]));
        let scorer = Arc::new(FakeScorer::new(&[("A", 4)]));

        let result = pipeline(directory.clone(), scorer, settings())
            .run("cv.docx", "https://example.edu/people")
            .await;

        assert!(matches!(
            result,
            Err(MatcherError::Input(ResumeError::UnsupportedFormat { .. }))
        ));
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_directory_is_an_error() {
        let directory = Arc::new(FakeDirectory::with_professors(&[]));
        let scorer = Arc::new(FakeScorer::new(&[]));

        let result = pipeline(directory, scorer, settings())
            .run("cv.pdf", "https://example.edu/people")
            .await;

        assert!(matches!(
            result,
            Err(MatcherError::Directory(DirectoryError::NoRecordsFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_all_cards_skipped_yields_no_scores() {
        let directory = Arc::new(FakeDirectory {
            listing: DirectoryListing {
                records: Vec::new(),
                skipped: vec![SkippedCard {
                    position: 0,
                    reason: "missing name".to_string(),
                }],
            },
            calls: AtomicUsize::new(0),
        });
        let scorer = Arc::new(FakeScorer::new(&[]));

        let result = pipeline(directory, scorer, settings())
            .run("cv.pdf", "https://example.edu/people")
            .await;

        assert!(matches!(
            result,
            Err(MatcherError::NoScoresProduced { attempted: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_directory_url() {
        let directory = Arc::new(FakeDirectory::with_professors(&["A"]));
        let scorer = Arc::new(FakeScorer::new(&[("A", 1)]));

        let result = pipeline(directory, scorer, settings())
            .run("cv.pdf", "not a url")
            .await;

        assert!(matches!(
            result,
            Err(MatcherError::Directory(DirectoryError::NavigationError { .. }))
        ));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let names: Vec<String> = (0..9).map(|i| format!("P{}", i)).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let scores: Vec<(&str, u8)> = name_refs.iter().map(|n| (*n, 5)).collect();

        let directory = Arc::new(FakeDirectory::with_professors(&name_refs));
        let scorer = Arc::new(FakeScorer::new(&scores).with_delay(Duration::from_millis(20)));
        let mut limited = settings();
        limited.max_concurrent = 3;

        let report = pipeline(directory, scorer.clone(), limited)
            .run("cv.pdf", "https://example.edu/people")
            .await
            .unwrap();

        assert_eq!(report.ranked.len(), 9);
        assert!(scorer.peak.load(Ordering::SeqCst) <= 3);
        let names: Vec<&str> = report.ranked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, name_refs);
    }

    #[tokio::test]
    async fn test_slow_scoring_times_out_as_failure() {
        let directory = Arc::new(FakeDirectory::with_professors(&["A"]));
        let scorer = Arc::new(FakeScorer::new(&[("A", 6)]).with_delay(Duration::from_secs(3)));
        let mut quick = settings();
        quick.request_timeout_seconds = 1;

        let result = pipeline(directory, scorer, quick)
            .run("cv.pdf", "https://example.edu/people")
            .await;

        assert!(matches!(result, Err(MatcherError::NoScoresProduced { failed: 1, .. })));
    }

    #[tokio::test]
    async fn test_cancelled_before_scoring() {
        let directory = Arc::new(FakeDirectory::with_professors(&["A", "B"]));
        let scorer = Arc::new(FakeScorer::new(&[("A", 6), ("B", 2)]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = pipeline(directory, scorer.clone(), settings())
            .run_with_cancel("cv.pdf", "https://example.edu/people", &cancel)
            .await;

        assert!(matches!(result, Err(MatcherError::Cancelled)));
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_runs_are_independent() {
        let directory = Arc::new(FakeDirectory::with_professors(&["A", "B"]));
        let scorer = Arc::new(FakeScorer::new(&[("A", 6), ("B", 2)]));
        let pipeline = pipeline(directory, scorer, settings());

        let first = pipeline.run("cv.pdf", "https://example.edu/people").await.unwrap();
        let second = pipeline.run("cv.pdf", "https://example.edu/people").await.unwrap();

        assert_eq!(first.ranked, second.ranked);
        assert_eq!(second.ranked.len(), 2);
    }
}
