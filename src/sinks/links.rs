use super::{SinkReport, create_truncated};
use crate::error::SinkWriteError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes every anchor that looks absolute, one per line
///
/// The filter is a plain `http` prefix check: `http`, `https` and any other
/// scheme starting with those four characters pass. No dedup, no
/// normalisation.
pub struct LinkExtractor<W: Write> {
    sink: W,
    path: PathBuf,
    written: usize,
    errors: Vec<SinkWriteError>,
}

impl LinkExtractor<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkWriteError> {
        let path = path.as_ref();
        let file = create_truncated(path)?;
        Ok(Self::new(file, path))
    }
}

impl<W: Write> LinkExtractor<W> {
    pub fn new(sink: W, path: impl Into<PathBuf>) -> Self {
        Self {
            sink,
            path: path.into(),
            written: 0,
            errors: Vec::new(),
        }
    }

    pub fn accepts(href: &str) -> bool {
        href.starts_with("http")
    }

    /// Anchor hook; a failed write is logged and the next link still goes through
    ///
    /// Each line reaches the sink before the link counts as written.
    pub fn on_anchor(&mut self, href: &str) {
        if !Self::accepts(href) {
            ::log::trace!("Skipping non-absolute link: {}", href);
            return;
        }

        let line = format!("{}\n", href);
        match self
            .sink
            .write_all(line.as_bytes())
            .and_then(|()| self.sink.flush())
        {
            Ok(()) => {
                self.written += 1;
                ::log::info!("Link detected: {}", href);
            }
            Err(e) => {
                let error = SinkWriteError::new(&self.path, e);
                ::log::error!("Unable to write link {}: {}", href, error);
                self.errors.push(error);
            }
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flushes and closes the sink
    pub fn finish(mut self) -> SinkReport {
        if let Err(e) = self.sink.flush() {
            let error = SinkWriteError::new(&self.path, e);
            ::log::error!("Unable to flush links: {}", error);
            self.errors.push(error);
        }

        ::log::info!("{} links written to {}", self.written, self.path.display());
        SinkReport {
            written: self.written,
            errors: self.errors,
        }
    }
}
