use crate::config::GrabConfig;
use crate::error::{CaptureError, CaptureStage};
use crate::proxy::ProxyTransport;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fantoccini::wd::WebDriverCompatibleCommand;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Value, json};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use url::Url;

/// Same bound fantoccini's `Wait` applies when none is given
const AUTOMATION_DEFAULT_WAIT: Duration = Duration::from_secs(30);

const VISIBLE_POLL: Duration = Duration::from_millis(250);

/// Produces a full-page image of a URL
#[allow(async_fn_in_trait)]
pub trait PageCapture {
    async fn capture(&self, url: &str, proxy: Option<&ProxyTransport>)
    -> Result<(), CaptureError>;
}

/// Headless Chrome screenshots through a WebDriver server
///
/// Each capture opens its own session and closes it again before returning,
/// whichever stage failed.
#[derive(Debug, Clone)]
pub struct ScreenshotCapturer {
    webdriver_url: String,
    output_path: PathBuf,
    quality: u8,
    visible_timeout: Option<Duration>,
    window_width: u32,
    window_height: u32,
}

impl ScreenshotCapturer {
    pub fn from_config(config: &GrabConfig) -> Self {
        Self {
            webdriver_url: config.webdriver_url.clone(),
            output_path: config.screenshot_path.clone(),
            quality: config.screenshot_quality,
            visible_timeout: config.visible_timeout(),
            window_width: config.window_width,
            window_height: config.window_height,
        }
    }

    /// Chrome options for a fresh session; the proxy can only be set here
    fn capabilities(&self, proxy: Option<&ProxyTransport>) -> serde_json::Map<String, Value> {
        let mut args = vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--hide-scrollbars".to_string(),
            format!("--window-size={},{}", self.window_width, self.window_height),
        ];
        if let Some(proxy) = proxy {
            args.push(proxy.browser_arg());
        }

        let mut caps = serde_json::Map::new();
        caps.insert("browserName".to_string(), json!("chrome"));
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps
    }

    async fn launch(&self, proxy: Option<&ProxyTransport>) -> Result<Client, CaptureError> {
        ::log::debug!("Connecting to WebDriver at {}", self.webdriver_url);
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities(proxy));
        builder
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| CaptureError::new(CaptureStage::BrowserLaunching, e))
    }

    /// Navigate, wait and capture; the image stays in memory
    async fn drive(&self, client: &Client, url: &str) -> Result<Vec<u8>, CaptureError> {
        ::log::debug!("Navigating browser to {}", url);
        client
            .goto(url)
            .await
            .map_err(|e| CaptureError::new(CaptureStage::Navigating, e))?;

        self.wait_visible(client).await?;

        ::log::debug!("Capturing full page at quality {}", self.quality);
        let image = match full_page_cdp(client, self.quality).await {
            Ok(image) => image,
            Err(e) => {
                ::log::warn!(
                    "DevTools capture unavailable ({}), resizing window for a WebDriver screenshot",
                    e
                );
                full_page_resized(client)
                    .await
                    .map_err(|e| CaptureError::new(CaptureStage::Capturing, e))?
            }
        };

        if image.is_empty() {
            return Err(CaptureError::new(
                CaptureStage::Capturing,
                "browser returned an empty image",
            ));
        }
        Ok(image)
    }

    async fn wait_visible(&self, client: &Client) -> Result<(), CaptureError> {
        let wait_error =
            |e: fantoccini::error::CmdError| CaptureError::new(CaptureStage::WaitingVisible, e);

        let wait = match self.visible_timeout {
            Some(timeout) => client.wait().at_most(timeout),
            None => client.wait(),
        };
        let body = wait
            .for_element(Locator::Css("body"))
            .await
            .map_err(wait_error)?;

        let deadline = Instant::now() + self.visible_timeout.unwrap_or(AUTOMATION_DEFAULT_WAIT);
        loop {
            if body.is_displayed().await.map_err(wait_error)? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(CaptureError::new(
                    CaptureStage::WaitingVisible,
                    "page body never became visible",
                ));
            }
            tokio::time::sleep(VISIBLE_POLL).await;
        }
    }
}

impl PageCapture for ScreenshotCapturer {
    async fn capture(
        &self,
        url: &str,
        proxy: Option<&ProxyTransport>,
    ) -> Result<(), CaptureError> {
        ::log::info!("Taking screenshot of {}", url);

        let client = self.launch(proxy).await?;
        let result = self.drive(&client, url).await;

        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close browser session: {}", e);
        }

        let image = result?;
        write_image(&self.output_path, &image)
            .map_err(|e| CaptureError::new(CaptureStage::Writing, e))?;

        ::log::info!(
            "Screenshot ({} bytes) written to {}",
            image.len(),
            self.output_path.display()
        );
        Ok(())
    }
}

/// Chrome DevTools command tunnelled through chromedriver
#[derive(Debug)]
struct CdpCommand {
    cmd: &'static str,
    params: Value,
}

impl WebDriverCompatibleCommand for CdpCommand {
    fn endpoint(
        &self,
        base_url: &Url,
        session_id: Option<&str>,
    ) -> Result<Url, url::ParseError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!(
            "session/{}/goog/cdp/execute",
            session_id.unwrap_or_default()
        ))
    }

    fn method_and_body(&self, _request_url: &Url) -> (http::Method, Option<String>) {
        let body = json!({ "cmd": self.cmd, "params": self.params });
        (http::Method::POST, Some(body.to_string()))
    }
}

/// `Page.captureScreenshot` clipped to the whole document
///
/// Quality 100 yields PNG, anything lower JPEG at that quality.
async fn full_page_cdp(
    client: &Client,
    quality: u8,
) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
    let metrics = client
        .issue_cmd(CdpCommand {
            cmd: "Page.getLayoutMetrics",
            params: json!({}),
        })
        .await?;

    let size = metrics
        .get("cssContentSize")
        .or_else(|| metrics.get("contentSize"))
        .ok_or("layout metrics carry no content size")?;
    let width = size.get("width").and_then(Value::as_f64).unwrap_or(0.0);
    let height = size.get("height").and_then(Value::as_f64).unwrap_or(0.0);

    let mut params = json!({
        "captureBeyondViewport": true,
        "fromSurface": true,
        "clip": { "x": 0, "y": 0, "width": width, "height": height, "scale": 1 },
    });
    if quality >= 100 {
        params["format"] = json!("png");
    } else {
        params["format"] = json!("jpeg");
        params["quality"] = json!(quality);
    }

    let shot = client
        .issue_cmd(CdpCommand {
            cmd: "Page.captureScreenshot",
            params,
        })
        .await?;
    let data = shot
        .get("data")
        .and_then(Value::as_str)
        .ok_or("screenshot response carries no data")?;

    Ok(STANDARD.decode(data)?)
}

/// Plain WebDriver fallback: grow the window to the document, then screenshot
async fn full_page_resized(client: &Client) -> Result<Vec<u8>, fantoccini::error::CmdError> {
    let dims = client
        .execute(
            "const e = document.documentElement; \
             return [Math.max(e.scrollWidth, document.body.scrollWidth), \
                     Math.max(e.scrollHeight, document.body.scrollHeight)];",
            vec![],
        )
        .await?;

    let as_px = |v: Option<&Value>| v.and_then(Value::as_u64).map(|n| n as u32);
    if let (Some(width), Some(height)) = (as_px(dims.get(0)), as_px(dims.get(1))) {
        if width > 0 && height > 0 {
            client.set_window_size(width, height).await?;
        }
    }

    client.screenshot().await
}

fn write_image(path: &Path, image: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path)?;
    file.write_all(image)?;
    file.flush()?;

    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn capturer() -> ScreenshotCapturer {
        ScreenshotCapturer::from_config(&GrabConfig::default())
    }

    fn wd_ok(value: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "value": value }))
    }

    /// WebDriver server that hands out session `s1` on a blank page
    async fn webdriver() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(wd_ok(json!({
                "sessionId": "s1",
                "capabilities": { "browserName": "chrome" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/url"))
            .respond_with(wd_ok(json!("about:blank")))
            .mount(&server)
            .await;
        server
    }

    /// The session must be deleted exactly once, whatever happened before
    async fn expect_teardown(server: &MockServer) {
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(wd_ok(Value::Null))
            .expect(1)
            .mount(server)
            .await;
    }

    fn capturer_for(server: &MockServer, output: &Path) -> ScreenshotCapturer {
        let config = GrabConfig {
            webdriver_url: server.uri(),
            screenshot_path: output.to_path_buf(),
            visible_timeout_secs: Some(5),
            ..GrabConfig::default()
        };
        ScreenshotCapturer::from_config(&config)
    }

    #[tokio::test]
    async fn test_navigation_failure_still_closes_session() {
        let server = webdriver().await;
        Mock::given(method("POST"))
            .and(path("/session/s1/url"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "value": {
                    "error": "unknown error",
                    "message": "net::ERR_NAME_NOT_RESOLVED",
                    "stacktrace": ""
                }
            })))
            .mount(&server)
            .await;
        expect_teardown(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("screenshot.png");
        let err = capturer_for(&server, &output)
            .capture("http://unresolvable.invalid/", None)
            .await
            .unwrap_err();

        assert_eq!(err.stage, CaptureStage::Navigating);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_full_page_capture_writes_decoded_image() {
        let server = webdriver().await;
        Mock::given(method("POST"))
            .and(path("/session/s1/url"))
            .respond_with(wd_ok(Value::Null))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s1/element"))
            .respond_with(wd_ok(json!({ "element-6066-11e4-a52e-4f735466cecf": "e1" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/s1/element/e1/displayed"))
            .respond_with(wd_ok(json!(true)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/s1/goog/cdp/execute"))
            .and(body_partial_json(json!({ "cmd": "Page.getLayoutMetrics" })))
            .respond_with(wd_ok(json!({
                "cssContentSize": { "x": 0, "y": 0, "width": 800, "height": 2000 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let image = b"\xff\xd8\xff\xe0 jpeg bytes";
        Mock::given(method("POST"))
            .and(path("/session/s1/goog/cdp/execute"))
            .and(body_partial_json(json!({
                "cmd": "Page.captureScreenshot",
                "params": {
                    "format": "jpeg",
                    "quality": 90,
                    "captureBeyondViewport": true,
                    "clip": { "width": 800.0, "height": 2000.0 }
                }
            })))
            .respond_with(wd_ok(json!({ "data": STANDARD.encode(image) })))
            .expect(1)
            .mount(&server)
            .await;
        expect_teardown(&server).await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("screenshot.png");
        capturer_for(&server, &output)
            .capture("http://example.com/", None)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), image);
    }

    #[test]
    fn test_capabilities_without_proxy() {
        let caps = capturer().capabilities(None);
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();

        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a == "--window-size=1920,1080"));
        assert!(
            !args
                .iter()
                .any(|a| a.as_str().unwrap().starts_with("--proxy-server"))
        );
    }

    #[test]
    fn test_capabilities_route_through_proxy() {
        let proxy = ProxyTransport::parse("127.0.0.1:9050").unwrap();
        let caps = capturer().capabilities(Some(&proxy));
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();

        assert!(
            args.iter()
                .any(|a| a == "--proxy-server=socks5://127.0.0.1:9050")
        );
    }

    #[test]
    fn test_cdp_endpoint_keeps_base_path() {
        let cmd = CdpCommand {
            cmd: "Page.getLayoutMetrics",
            params: json!({}),
        };
        let base = Url::parse("http://localhost:4444/wd/hub").unwrap();
        let url = cmd.endpoint(&base, Some("abc")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:4444/wd/hub/session/abc/goog/cdp/execute"
        );

        let (method, body) = cmd.method_and_body(&url);
        assert_eq!(method, http::Method::POST);
        let body: Value = serde_json::from_str(&body.unwrap()).unwrap();
        assert_eq!(body["cmd"], "Page.getLayoutMetrics");
    }

    #[test]
    fn test_write_image_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screenshot.png");
        std::fs::write(&path, vec![0u8; 4096]).unwrap();

        write_image(&path, b"\x89PNG-small").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG-small");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[tokio::test]
    async fn test_unreachable_webdriver_fails_at_launch() {
        let config = GrabConfig {
            webdriver_url: "http://127.0.0.1:9".to_string(),
            ..GrabConfig::default()
        };
        let err = ScreenshotCapturer::from_config(&config)
            .capture("http://example.com", None)
            .await
            .unwrap_err();
        assert_eq!(err.stage, CaptureStage::BrowserLaunching);
    }
}
