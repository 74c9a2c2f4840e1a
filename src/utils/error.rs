use thiserror::Error;

/// Failures of the resume text extraction step.
#[derive(Error, Debug)]
pub enum ResumeError {
    #[error("resume file not found: {path}")]
    NotFound { path: String },

    #[error("unsupported resume format '{extension}' for {path} (expected .pdf)")]
    UnsupportedFormat { path: String, extension: String },

    #[error("could not extract text from {path}: {message}")]
    ExtractionError { path: String, message: String },
}

/// Failures of a directory adapter for a whole scrape call.
///
/// A single malformed card is not an error; it is recorded as a
/// [`crate::domain::model::SkippedCard`] on the scrape result instead.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("could not load directory page {url}: {message}")]
    NavigationError { url: String, message: String },

    #[error("no professor entries found on {url}")]
    NoRecordsFound { url: String },

    #[error("directory page {url} did not finish rendering within {seconds}s")]
    RenderTimeout { url: String, seconds: u64 },

    #[error("no directory adapter named '{name}'")]
    UnknownAdapter { name: String },
}

/// Failure to score one professor. Never aborts a batch.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("malformed scoring response: {reason}")]
    MalformedResponse { reason: String },

    #[error("scoring service error: {message}")]
    ServiceError { message: String },

    #[error("scoring request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl From<reqwest::Error> for ScoringError {
    fn from(e: reqwest::Error) -> Self {
        ScoringError::ServiceError {
            message: e.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("Resume error: {0}")]
    Input(#[from] ResumeError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Scoring service credential missing: {variable} is not set")]
    ServiceAuth { variable: String },

    #[error("No professor could be scored ({failed} of {attempted} scoring calls failed)")]
    NoScoresProduced { attempted: usize, failed: usize },

    #[error("Run cancelled before any professor was scored")]
    Cancelled,

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report export error: {0}")]
    Export(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Directory,
    Scoring,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MatcherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MatcherError::Input(_) => ErrorCategory::Input,
            MatcherError::Directory(_) => ErrorCategory::Directory,
            MatcherError::ServiceAuth { .. }
            | MatcherError::NoScoresProduced { .. }
            | MatcherError::Cancelled => ErrorCategory::Scoring,
            MatcherError::InvalidConfigValue { .. }
            | MatcherError::ConfigParse { .. } => ErrorCategory::Configuration,
            MatcherError::Io(_) | MatcherError::Export(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MatcherError::Cancelled => ErrorSeverity::Low,
            MatcherError::Input(_)
            | MatcherError::Directory(_)
            | MatcherError::NoScoresProduced { .. } => ErrorSeverity::Medium,
            MatcherError::InvalidConfigValue { .. }
            | MatcherError::ConfigParse { .. }
            | MatcherError::Export(_) => ErrorSeverity::High,
            MatcherError::ServiceAuth { .. } | MatcherError::Io(_) => ErrorSeverity::Critical,
        }
    }

    /// Whether the driver may prompt for new inputs and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MatcherError::Input(_)
                | MatcherError::Directory(_)
                | MatcherError::NoScoresProduced { .. }
                | MatcherError::Cancelled
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MatcherError::Input(ResumeError::NotFound { path }) => {
                format!("I couldn't find a resume at '{}'.", path)
            }
            MatcherError::Input(ResumeError::UnsupportedFormat { path, .. }) => {
                format!("'{}' is not a PDF. Only .pdf resumes can be read.", path)
            }
            MatcherError::Input(ResumeError::ExtractionError { path, .. }) => {
                format!("I couldn't read any text from '{}'.", path)
            }
            MatcherError::Directory(DirectoryError::NoRecordsFound { url }) => {
                format!("I couldn't find any professors on {}.", url)
            }
            MatcherError::Directory(DirectoryError::NavigationError { url, .. }) => {
                format!("I couldn't open the directory page {}.", url)
            }
            MatcherError::Directory(DirectoryError::RenderTimeout { url, .. }) => {
                format!("The directory page {} took too long to load.", url)
            }
            MatcherError::Directory(DirectoryError::UnknownAdapter { name }) => {
                format!("There is no directory adapter called '{}'.", name)
            }
            MatcherError::ServiceAuth { variable } => {
                format!("{} environment variable not set.", variable)
            }
            MatcherError::NoScoresProduced { .. } => {
                "I wasn't able to score any professors.".to_string()
            }
            MatcherError::Cancelled => "The run was cancelled.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MatcherError::Input(ResumeError::NotFound { .. }) => {
                "Check the resume file path and try again.".to_string()
            }
            MatcherError::Input(ResumeError::UnsupportedFormat { .. }) => {
                "Export the resume to PDF and pass the .pdf path.".to_string()
            }
            MatcherError::Input(ResumeError::ExtractionError { .. }) => {
                "The PDF may be scanned, encrypted or corrupt; try a text-based PDF.".to_string()
            }
            MatcherError::Directory(DirectoryError::NoRecordsFound { .. }) => {
                "Check the URL, or update the adapter's card selectors for this site's page structure."
                    .to_string()
            }
            MatcherError::Directory(DirectoryError::NavigationError { .. }) => {
                "Check the directory URL and your network connection.".to_string()
            }
            MatcherError::Directory(DirectoryError::RenderTimeout { .. }) => {
                "Retry, or raise directory.fetch_timeout_seconds in the config.".to_string()
            }
            MatcherError::Directory(DirectoryError::UnknownAdapter { .. }) => {
                "Use one of the adapter names defined in the config file.".to_string()
            }
            MatcherError::ServiceAuth { variable } => {
                format!("Set it before running: export {}='your_key_here'", variable)
            }
            MatcherError::NoScoresProduced { .. } => {
                "Check the scoring service status and the logs for per-professor failures.".to_string()
            }
            MatcherError::Cancelled => "Start a new run when ready.".to_string(),
            MatcherError::InvalidConfigValue { .. }
            | MatcherError::ConfigParse { .. } => {
                "Fix the configuration file or command line flags.".to_string()
            }
            MatcherError::Io(_) | MatcherError::Export(_) => {
                "Check file permissions and free disk space.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, MatcherError>;
