pub mod body;
pub mod links;

pub use body::BodyPersister;
pub use links::LinkExtractor;

use crate::error::SinkWriteError;
use crate::results::ModeStatus;
use std::fs::File;
use std::path::Path;

/// What a sink managed to write before it was closed
#[derive(Debug, Default)]
pub struct SinkReport {
    /// Links for the links sink, bytes for the body sink
    pub written: usize,
    pub errors: Vec<SinkWriteError>,
}

impl SinkReport {
    pub fn status(&self) -> ModeStatus {
        match self.errors.last() {
            None => ModeStatus::Succeeded,
            Some(last) if self.errors.len() == 1 => ModeStatus::Failed(last.to_string()),
            Some(last) => ModeStatus::Failed(format!(
                "{} write errors, last: {}",
                self.errors.len(),
                last
            )),
        }
    }
}

/// Creates `path` fresh, truncating what a previous run left behind
fn create_truncated(path: &Path) -> Result<File, SinkWriteError> {
    File::create(path).map_err(|e| SinkWriteError::new(path, e))
}
