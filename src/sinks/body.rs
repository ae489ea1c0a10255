use super::{SinkReport, create_truncated};
use crate::error::SinkWriteError;
use crate::fetchers::FetchResponse;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the raw response body verbatim, at most once per run
pub struct BodyPersister<W: Write> {
    sink: W,
    path: PathBuf,
    written: Option<usize>,
    errors: Vec<SinkWriteError>,
}

impl BodyPersister<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkWriteError> {
        let path = path.as_ref();
        let file = create_truncated(path)?;
        Ok(Self::new(file, path))
    }
}

impl<W: Write> BodyPersister<W> {
    pub fn new(sink: W, path: impl Into<PathBuf>) -> Self {
        Self {
            sink,
            path: path.into(),
            written: None,
            errors: Vec::new(),
        }
    }

    /// Response hook
    pub fn on_response(&mut self, response: &FetchResponse) {
        self.write(&response.body);
    }

    pub fn write(&mut self, body: &[u8]) {
        if self.written.is_some() || !self.errors.is_empty() {
            ::log::warn!(
                "Ignoring additional body for {}, only one write per run",
                self.path.display()
            );
            return;
        }

        match self.sink.write_all(body).and_then(|()| self.sink.flush()) {
            Ok(()) => {
                self.written = Some(body.len());
                ::log::info!("HTML content written to {}", self.path.display());
            }
            Err(e) => {
                let error = SinkWriteError::new(&self.path, e);
                ::log::error!("Unable to write HTML content: {}", error);
                self.errors.push(error);
            }
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn finish(self) -> SinkReport {
        SinkReport {
            written: self.written.unwrap_or(0),
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "read-only filesystem"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_body_is_written_byte_for_byte() {
        let body = b"<html>\xff\xfe not utf-8 \r\n</html>".to_vec();
        let mut persister = BodyPersister::new(Vec::new(), "HTML.txt");
        persister.write(&body);

        assert_eq!(persister.get_ref(), &body);
        assert_eq!(persister.finish().written, body.len());
    }

    #[test]
    fn test_second_write_is_ignored() {
        let mut persister = BodyPersister::new(Vec::new(), "HTML.txt");
        persister.write(b"first");
        persister.write(b"second");

        assert_eq!(persister.get_ref(), b"first");
    }

    #[test]
    fn test_write_failure_is_recorded() {
        let mut persister = BodyPersister::new(Broken, "HTML.txt");
        persister.write(b"body");

        let report = persister.finish();
        assert_eq!(report.written, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.status().is_failed());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HTML.txt");
        std::fs::write(&path, "a much longer body from a previous run").unwrap();

        let mut persister = BodyPersister::create(&path).unwrap();
        persister.write(b"<p>new</p>");
        persister.finish();

        assert_eq!(std::fs::read(&path).unwrap(), b"<p>new</p>");
    }
}
