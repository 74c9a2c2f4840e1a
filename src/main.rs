use anyhow::Context;
use clap::Parser;
use faculty_match::config::{api_key_from_env, MatcherConfig};
use faculty_match::core::report::{export_csv, render_top};
use faculty_match::domain::ports::{MatchScorer, ResumeSource};
use faculty_match::utils::error::ErrorSeverity;
use faculty_match::utils::logger;
use faculty_match::{
    AdapterRegistry, ChatClient, CliConfig, LlmMatchScorer, MatcherError, MatchingPipeline,
    PdfResumeSource,
};
use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;

struct Session {
    cli: CliConfig,
    config: MatcherConfig,
    registry: AdapterRegistry,
    resume_source: Arc<dyn ResumeSource>,
    scorer: Arc<dyn MatchScorer>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let session = match build_session(cli) {
        Ok(session) => session,
        Err(e) => exit_with(&e),
    };

    if session.cli.is_one_shot() {
        let resume = session.cli.resume.clone().unwrap_or_default();
        let directory = session.cli.directory.clone().unwrap_or_default();
        if let Err(e) = session.run_once(&resume, &directory).await {
            exit_with(&e);
        }
        return Ok(());
    }

    session.interactive().await
}

fn build_session(cli: CliConfig) -> faculty_match::Result<Session> {
    let config = cli.matcher_config()?;
    // Missing credentials stop the process before any run starts.
    let api_key = api_key_from_env()?;

    let client = ChatClient::new(
        api_key,
        &config.scoring.api_base,
        config.scoring.model.clone(),
        Duration::from_secs(config.scoring.request_timeout_seconds),
    )
    .map_err(|e| MatcherError::InvalidConfigValue {
        field: "scoring".to_string(),
        value: config.scoring.api_base.clone(),
        reason: e.to_string(),
    })?;
    tracing::info!("Scoring client initialized (model: {})", client.model());

    let registry = AdapterRegistry::from_config(&config)?;
    tracing::info!("Directory adapters: {}", registry.names().join(", "));

    Ok(Session {
        cli,
        config,
        registry,
        resume_source: Arc::new(PdfResumeSource::new()),
        scorer: Arc::new(LlmMatchScorer::new(client)),
    })
}

impl Session {
    async fn run_once(&self, resume_path: &str, directory_url: &str) -> faculty_match::Result<()> {
        let adapter = match &self.cli.adapter {
            Some(name) => self.registry.get(name)?,
            None => self.registry.resolve(directory_url.trim())?,
        };

        let pipeline = MatchingPipeline::new(
            self.resume_source.clone(),
            adapter,
            self.scorer.clone(),
            self.config.pipeline_settings(),
        )
        .with_monitoring(self.cli.monitor);

        // Ctrl-C stops submitting new scoring calls for this run only.
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Cancellation requested, finishing in-flight requests...");
                    cancel.cancel();
                }
            })
        };
        let result = pipeline
            .run_with_cancel(resume_path, directory_url, &cancel)
            .await;
        watcher.abort();

        let report = result?;
        println!();
        println!("{}", render_top(&report));

        if let Some(path) = &self.cli.export {
            export_csv(&report, path)?;
            println!("📁 Full ranking saved to: {}", path.display());
        }
        Ok(())
    }

    async fn interactive(&self) -> anyhow::Result<()> {
        println!("--- Professor Matcher Initialized ---");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            let Some(directory_url) =
                prompt(&mut lines, "\n[Chat] Please paste the URL of the faculty directory: ").await?
            else {
                break;
            };
            let Some(resume_path) =
                prompt(&mut lines, "[Chat] Please enter the local file path to your PDF resume: ").await?
            else {
                break;
            };

            if let Err(e) = self.run_once(&resume_path, &directory_url).await {
                tracing::error!("❌ Run failed: {} (Category: {:?})", e, e.category());
                println!("[Chat] {}", e.user_friendly_message());
                println!("[Chat] 💡 {}", e.recovery_suggestion());
                if !e.is_retryable() {
                    exit_with(&e);
                }
                println!("[Chat] Let's try again.");
                continue;
            }

            let again = prompt(
                &mut lines,
                "\n[Chat] Would you like to check another directory? (y/n): ",
            )
            .await?;
            if !again.is_some_and(|answer| answer.eq_ignore_ascii_case("y")) {
                break;
            }
        }

        println!("[Chat] Goodbye!");
        Ok(())
    }
}

/// Prints `message` and reads one trimmed line; `None` on end of input or Ctrl-C.
async fn prompt(lines: &mut Lines<BufReader<Stdin>>, message: &str) -> anyhow::Result<Option<String>> {
    print!("{}", message);
    std::io::stdout().flush().context("failed to flush stdout")?;

    // The run's Ctrl-C watcher leaves SIGINT captured, so idle prompts listen too.
    let interrupt = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    read_line_or_interrupt(lines, interrupt).await
}

async fn read_line_or_interrupt<R, I>(lines: &mut Lines<R>, interrupt: I) -> anyhow::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
{
    tokio::select! {
        line = lines.next_line() => {
            let line = line.context("failed to read from stdin")?;
            Ok(line.map(|l| l.trim().to_string()))
        }
        _ = interrupt => {
            println!();
            Ok(None)
        }
    }
}

fn exit_with(e: &MatcherError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
