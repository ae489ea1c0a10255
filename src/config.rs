use crate::error::{GrabError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default SOCKS5 endpoint of a local Tor daemon
pub const DEFAULT_PROXY: &str = "127.0.0.1:9050";

/// Configuration for a capture run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrabConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Where extracted links are written, one per line
    #[serde(default = "default_links_path")]
    pub links_path: PathBuf,

    /// Where the raw response body is written
    #[serde(default = "default_body_path")]
    pub body_path: PathBuf,

    /// Where the full-page image is written
    #[serde(default = "default_screenshot_path")]
    pub screenshot_path: PathBuf,

    /// Image quality, 100 selects lossless PNG and anything lower JPEG
    #[serde(default = "default_screenshot_quality")]
    pub screenshot_quality: u8,

    /// Upper bound on waiting for the page body to become visible
    ///
    /// When unset the browser automation layer's own default applies.
    #[serde(default)]
    pub visible_timeout_secs: Option<u64>,

    /// User agent sent with the document fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Bound on the TCP probe made against the proxy before anything runs
    #[serde(default = "default_proxy_probe_timeout_secs")]
    pub proxy_probe_timeout_secs: u64,

    /// Initial browser window width
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Initial browser window height
    #[serde(default = "default_window_height")]
    pub window_height: u32,
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_links_path() -> PathBuf {
    PathBuf::from("links.txt")
}

fn default_body_path() -> PathBuf {
    PathBuf::from("HTML.txt")
}

fn default_screenshot_path() -> PathBuf {
    PathBuf::from("screenshot.png")
}

fn default_screenshot_quality() -> u8 {
    90
}

fn default_user_agent() -> String {
    format!("grab-page/{}", env!("CARGO_PKG_VERSION"))
}

fn default_proxy_probe_timeout_secs() -> u64 {
    10
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

impl Default for GrabConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            links_path: default_links_path(),
            body_path: default_body_path(),
            screenshot_path: default_screenshot_path(),
            screenshot_quality: default_screenshot_quality(),
            visible_timeout_secs: None,
            user_agent: default_user_agent(),
            proxy_probe_timeout_secs: default_proxy_probe_timeout_secs(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl GrabConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut contents = String::new();
        File::open(path)
            .and_then(|mut file| file.read_to_string(&mut contents))
            .map_err(|e| GrabError::Config(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GrabError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the `WEBDRIVER_URL` environment override
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        self
    }

    /// Move all three output files under `dir`
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.links_path = dir.join(&self.links_path);
        self.body_path = dir.join(&self.body_path);
        self.screenshot_path = dir.join(&self.screenshot_path);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.screenshot_quality == 0 || self.screenshot_quality > 100 {
            return Err(GrabError::Config(format!(
                "screenshot_quality must be between 1 and 100, got {}",
                self.screenshot_quality
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(GrabError::Config("window size must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn visible_timeout(&self) -> Option<Duration> {
        self.visible_timeout_secs.map(Duration::from_secs)
    }

    pub fn proxy_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_probe_timeout_secs)
    }
}
