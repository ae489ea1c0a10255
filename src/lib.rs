pub mod capturers;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod orchestrator;
pub mod parsers;
pub mod proxy;
pub mod request;
pub mod results;
pub mod sinks;

// Re-export commonly used types for convenience
pub use config::GrabConfig;
pub use error::{GrabError, Result};
pub use orchestrator::CaptureOrchestrator;
pub use request::{CaptureModes, CaptureRequest};
pub use results::CaptureOutcome;

use std::path::Path;

/// Builder for a single-page capture
pub struct Grab {
    target: String,
    modes: CaptureModes,
    proxy: Option<String>,
    config: GrabConfig,
}

impl Grab {
    /// Create a new builder for `target` with no mode picked yet
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            modes: CaptureModes::default(),
            proxy: None,
            config: GrabConfig::default().with_env_overrides(),
        }
    }

    /// Write absolute-looking links to the links file
    pub fn with_links(mut self, enabled: bool) -> Self {
        self.modes.extract_links = enabled;
        self
    }

    /// Write the raw response body to the body file
    pub fn with_html(mut self, enabled: bool) -> Self {
        self.modes.save_body = enabled;
        self
    }

    /// Take a full-page screenshot
    pub fn with_screenshot(mut self, enabled: bool) -> Self {
        self.modes.take_screenshot = enabled;
        self
    }

    /// Route the fetch and the browser through a SOCKS5 endpoint
    pub fn with_proxy(mut self, endpoint: impl Into<String>) -> Self {
        self.proxy = Some(endpoint.into());
        self
    }

    /// Set the configuration
    pub fn with_config(mut self, config: GrabConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file, `WEBDRIVER_URL` still applies on top
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let config = GrabConfig::from_file(path)?.with_env_overrides();
        Ok(self.with_config(config))
    }

    pub fn config_mut(&mut self) -> &mut GrabConfig {
        &mut self.config
    }

    /// The immutable request this builder describes
    pub fn request(&self) -> CaptureRequest {
        CaptureRequest::new(self.target.clone(), self.modes, self.proxy.clone())
    }

    /// Run the capture against a WebDriver-backed screenshot capturer
    pub async fn run(self) -> Result<CaptureOutcome> {
        let request = self.request();
        self.config.validate()?;

        CaptureOrchestrator::new(self.config).run(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_without_modes_requests_everything() {
        let request = Grab::new("http://example.onion").request();
        assert_eq!(request.modes(), CaptureModes::ALL);
        assert!(request.proxy().is_none());
    }

    #[test]
    fn test_builder_keeps_explicit_selection() {
        let request = Grab::new("http://example.onion")
            .with_html(true)
            .with_proxy("127.0.0.1:9050")
            .request();

        assert!(request.modes().save_body);
        assert!(!request.modes().extract_links);
        assert!(!request.modes().take_screenshot);
        assert_eq!(request.proxy(), Some("127.0.0.1:9050"));
    }

    #[tokio::test]
    async fn test_run_rejects_empty_url() {
        let err = Grab::new("").run().await.unwrap_err();
        assert!(matches!(err, GrabError::InvalidInput(_)));
    }
}
