/// Which capture modes a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureModes {
    pub extract_links: bool,
    pub save_body: bool,
    pub take_screenshot: bool,
}

impl CaptureModes {
    /// Every mode enabled
    pub const ALL: CaptureModes = CaptureModes {
        extract_links: true,
        save_body: true,
        take_screenshot: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.extract_links && !self.save_body && !self.take_screenshot
    }

    /// An empty selection means a full capture, never a no-op run
    pub fn effective(self) -> Self {
        if self.is_empty() { Self::ALL } else { self }
    }

    /// Whether the document fetch is needed at all
    pub fn needs_document(&self) -> bool {
        self.extract_links || self.save_body
    }
}

/// One capture job, built once from the command line
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    target: String,
    modes: CaptureModes,
    proxy: Option<String>,
}

impl CaptureRequest {
    pub fn new(target: impl Into<String>, modes: CaptureModes, proxy: Option<String>) -> Self {
        Self {
            target: target.into(),
            modes,
            proxy,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// True when no mode was picked and the run falls back to a full capture
    pub fn is_default_selection(&self) -> bool {
        self.modes.is_empty()
    }

    /// Modes after the default-to-full-capture rule is applied
    pub fn modes(&self) -> CaptureModes {
        self.modes.effective()
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}
