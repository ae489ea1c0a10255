use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for a capture run
///
/// `InvalidInput`, `ProxyUnavailable` and `Config` are raised before any
/// network traffic; `Capture` ends the run after the document stage has
/// already written its outputs. `Fetch` and `SinkWrite` never abort a run,
/// they are only recorded in the outcome.
#[derive(Debug, Error)]
pub enum GrabError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("proxy {endpoint} unavailable: {reason}")]
    ProxyUnavailable { endpoint: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    SinkWrite(#[from] SinkWriteError),

    #[error(transparent)]
    Capture(#[from] CaptureError),
}

pub type Result<T> = std::result::Result<T, GrabError>;

/// Failure reported through the document fetcher's error hook
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading body of {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Failure creating or writing one of the output files
#[derive(Debug, Error)]
#[error("cannot write {}: {source}", path.display())]
pub struct SinkWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl SinkWriteError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Screenshot pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    BrowserLaunching,
    Navigating,
    WaitingVisible,
    Capturing,
    Writing,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureStage::BrowserLaunching => "launching browser",
            CaptureStage::Navigating => "navigating",
            CaptureStage::WaitingVisible => "waiting for page to become visible",
            CaptureStage::Capturing => "capturing screenshot",
            CaptureStage::Writing => "writing screenshot",
        };
        f.write_str(name)
    }
}

/// Screenshot failure, tagged with the stage it happened in
#[derive(Debug, Error)]
#[error("screenshot failed while {stage}: {source}")]
pub struct CaptureError {
    pub stage: CaptureStage,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl CaptureError {
    pub fn new(
        stage: CaptureStage,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}
