use crate::capturers::{PageCapture, ScreenshotCapturer};
use crate::config::GrabConfig;
use crate::error::{GrabError, Result};
use crate::fetchers::{DocumentFetcher, Hooks};
use crate::proxy::ProxyTransport;
use crate::request::{CaptureModes, CaptureRequest};
use crate::results::{CaptureOutcome, ModeStatus};
use crate::sinks::{BodyPersister, LinkExtractor, SinkReport};

/// Runs one capture: document stage first, screenshot second
///
/// Link and body failures are recorded in the outcome and the run goes on.
/// Bad input, an unreachable proxy and a failed screenshot end it with an
/// error; files already written stay where they are.
pub struct CaptureOrchestrator<C: PageCapture = ScreenshotCapturer> {
    config: GrabConfig,
    capturer: C,
}

impl CaptureOrchestrator<ScreenshotCapturer> {
    pub fn new(config: GrabConfig) -> Self {
        let capturer = ScreenshotCapturer::from_config(&config);
        Self { config, capturer }
    }
}

impl<C: PageCapture> CaptureOrchestrator<C> {
    pub fn with_capturer(config: GrabConfig, capturer: C) -> Self {
        Self { config, capturer }
    }

    pub fn config(&self) -> &GrabConfig {
        &self.config
    }

    pub fn capturer(&self) -> &C {
        &self.capturer
    }

    pub async fn run(&self, request: &CaptureRequest) -> Result<CaptureOutcome> {
        let target = request.target().trim();
        if target.is_empty() {
            return Err(GrabError::InvalidInput(
                "no URL provided, please give a URL to capture".to_string(),
            ));
        }

        if request.is_default_selection() {
            ::log::info!("No flags were chosen, capturing everything for {}", target);
        }
        let modes = request.modes();

        let proxy = match request.proxy() {
            Some(endpoint) => {
                Some(ProxyTransport::connect(endpoint, self.config.proxy_probe_timeout()).await?)
            }
            None => None,
        };

        let mut outcome = CaptureOutcome::default();

        if modes.needs_document() {
            self.capture_document(target, modes, proxy.as_ref(), &mut outcome)
                .await;
        }

        if modes.take_screenshot {
            if let Err(e) = self.capturer.capture(target, proxy.as_ref()).await {
                outcome.screenshot = ModeStatus::Failed(e.to_string());
                ::log::info!("Partial capture before failure: {}", outcome);
                return Err(e.into());
            }
            outcome.screenshot = ModeStatus::Succeeded;
            ::log::info!("Screenshot captured successfully");
        }

        ::log::info!("Capture of {} finished: {}", target, outcome);
        Ok(outcome)
    }

    /// Links and body from a single fetch; nothing here can fail the run
    async fn capture_document(
        &self,
        target: &str,
        modes: CaptureModes,
        proxy: Option<&ProxyTransport>,
        outcome: &mut CaptureOutcome,
    ) {
        let mut links = if modes.extract_links {
            match LinkExtractor::create(&self.config.links_path) {
                Ok(links) => Some(links),
                Err(e) => {
                    ::log::error!("File couldn't be created: {}", e);
                    outcome.links = ModeStatus::Failed(e.to_string());
                    outcome.errors.push(e.into());
                    None
                }
            }
        } else {
            None
        };

        let mut body = if modes.save_body {
            match BodyPersister::create(&self.config.body_path) {
                Ok(body) => Some(body),
                Err(e) => {
                    ::log::error!("File couldn't be created: {}", e);
                    outcome.body = ModeStatus::Failed(e.to_string());
                    outcome.errors.push(e.into());
                    None
                }
            }
        } else {
            None
        };

        let mut response_seen = false;

        match DocumentFetcher::new(&self.config.user_agent, proxy) {
            Ok(fetcher) => {
                let mut hooks = Hooks::new()
                    .on_response(|_| response_seen = true)
                    .on_error(|e| ::log::error!("An error occurred: {}", e));
                if let Some(links) = links.as_mut() {
                    hooks = hooks.on_anchor(move |href| links.on_anchor(href));
                }
                if let Some(body) = body.as_mut() {
                    hooks = hooks.on_response(move |response| body.on_response(response));
                }

                let fetched = fetcher.fetch(target, &mut hooks).await;
                drop(hooks);
                ::log::debug!(
                    "Document fetch of {} saw {} anchors",
                    target,
                    fetched.anchors.len()
                );
                outcome
                    .errors
                    .extend(fetched.errors.into_iter().map(GrabError::from));
            }
            Err(e) => {
                ::log::error!("An error occurred: {}", e);
                outcome.errors.push(e.into());
            }
        }

        if let Some(links) = links {
            let report = links.finish();
            outcome.links_written = report.written;
            outcome.links = mode_status(&report, response_seen);
            outcome
                .errors
                .extend(report.errors.into_iter().map(GrabError::from));
        }
        if let Some(body) = body {
            let report = body.finish();
            outcome.body_bytes = report.written;
            outcome.body = mode_status(&report, response_seen);
            outcome
                .errors
                .extend(report.errors.into_iter().map(GrabError::from));
        }
    }
}

fn mode_status(report: &SinkReport, response_seen: bool) -> ModeStatus {
    if report.errors.is_empty() && !response_seen {
        ModeStatus::Failed("no document received".to_string())
    } else {
        report.status()
    }
}
