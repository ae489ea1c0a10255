use crate::error::{FetchError, GrabError};
use std::fmt;

/// What one document fetch produced
///
/// Lives only for the duration of a run; the body is dropped once the
/// persister has written it.
#[derive(Debug, Default)]
pub struct FetchResult {
    /// Raw response body, absent when no response was received
    pub body: Option<Vec<u8>>,

    /// Every anchor href in document order, duplicates kept
    pub anchors: Vec<String>,

    /// Everything that went to the error hook, in the same order
    pub errors: Vec<FetchError>,
}

impl FetchResult {
    pub fn new(body: Option<Vec<u8>>, anchors: Vec<String>, errors: Vec<FetchError>) -> Self {
        Self {
            body,
            anchors,
            errors,
        }
    }

    pub fn failed(error: FetchError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }
}

/// Result of a single capture mode
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModeStatus {
    /// Mode was not selected for this run
    #[default]
    Skipped,
    /// Mode ran and its output was written
    Succeeded,
    /// Mode ran but degraded, with the reason
    Failed(String),
}

impl ModeStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, ModeStatus::Failed(_))
    }
}

impl fmt::Display for ModeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeStatus::Skipped => f.write_str("skipped"),
            ModeStatus::Succeeded => f.write_str("ok"),
            ModeStatus::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Per-mode tally of a finished run
#[derive(Debug, Default)]
pub struct CaptureOutcome {
    pub links: ModeStatus,
    pub body: ModeStatus,
    pub screenshot: ModeStatus,

    /// Number of links written to the links file
    pub links_written: usize,

    /// Number of body bytes written
    pub body_bytes: usize,

    /// Non-fatal errors in the order they happened, only
    /// `GrabError::Fetch` and `GrabError::SinkWrite` end up here
    pub errors: Vec<GrabError>,
}

impl CaptureOutcome {
    /// True when no mode degraded
    pub fn is_clean(&self) -> bool {
        !self.links.is_failed()
            && !self.body.is_failed()
            && !self.screenshot.is_failed()
            && self.errors.is_empty()
    }

    pub fn fetch_errors(&self) -> impl Iterator<Item = &FetchError> {
        self.errors.iter().filter_map(|e| match e {
            GrabError::Fetch(e) => Some(e),
            _ => None,
        })
    }
}

impl fmt::Display for CaptureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "links: {} ({} written), body: {} ({} bytes), screenshot: {}",
            self.links, self.links_written, self.body, self.body_bytes, self.screenshot
        )
    }
}
