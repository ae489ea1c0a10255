use crate::error::FetchError;
use crate::parsers::{self, html};
use crate::proxy::ProxyTransport;
use crate::results::FetchResult;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

/// A response as handed to [`FetchObserver::on_response`]
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// URL after redirects
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Raw body bytes, untouched
    pub body: Vec<u8>,
}

/// Receives the events of one document fetch
///
/// Call cardinality per fetch: `on_response` at most once, `on_anchor`
/// zero or more times after it in document order, `on_error` zero or more
/// times. None of the hooks can abort the fetch.
pub trait FetchObserver {
    fn on_anchor(&mut self, _href: &str) {}

    fn on_response(&mut self, _response: &FetchResponse) {}

    fn on_error(&mut self, _error: &FetchError) {}
}

type AnchorHook<'a> = Box<dyn FnMut(&str) + Send + 'a>;
type ResponseHook<'a> = Box<dyn FnMut(&FetchResponse) + Send + 'a>;
type ErrorHook<'a> = Box<dyn FnMut(&FetchError) + Send + 'a>;

/// Closure-based observer, hooks are registered before the fetch runs
///
/// Hooks must be `Send` so a fetch can run on a multi-threaded runtime.
#[derive(Default)]
pub struct Hooks<'a> {
    anchor: Vec<AnchorHook<'a>>,
    response: Vec<ResponseHook<'a>>,
    error: Vec<ErrorHook<'a>>,
}

impl<'a> Hooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_anchor(mut self, hook: impl FnMut(&str) + Send + 'a) -> Self {
        self.anchor.push(Box::new(hook));
        self
    }

    pub fn on_response(mut self, hook: impl FnMut(&FetchResponse) + Send + 'a) -> Self {
        self.response.push(Box::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl FnMut(&FetchError) + Send + 'a) -> Self {
        self.error.push(Box::new(hook));
        self
    }
}

impl FetchObserver for Hooks<'_> {
    fn on_anchor(&mut self, href: &str) {
        for hook in self.anchor.iter_mut() {
            hook(href);
        }
    }

    fn on_response(&mut self, response: &FetchResponse) {
        for hook in self.response.iter_mut() {
            hook(response);
        }
    }

    fn on_error(&mut self, error: &FetchError) {
        for hook in self.error.iter_mut() {
            hook(error);
        }
    }
}

/// Performs a single non-recursive GET of the target
#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    client: Client,
}

impl DocumentFetcher {
    /// Builds the HTTP client, dialing through `proxy` when given
    pub fn new(user_agent: &str, proxy: Option<&ProxyTransport>) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(user_agent).gzip(true).brotli(true);

        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy.reqwest_proxy().map_err(FetchError::Client)?);
        }

        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Fetch `url` once and report everything through `observer`
    ///
    /// Errors never propagate out of this call; they go to the error hook
    /// and are handed back in [`FetchResult::errors`].
    pub async fn fetch(
        &self,
        url: &str,
        observer: &mut (dyn FetchObserver + Send),
    ) -> FetchResult {
        ::log::debug!("GET {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(source) => {
                let error = FetchError::Transport {
                    url: url.to_string(),
                    source,
                };
                observer.on_error(&error);
                return FetchResult::failed(error);
            }
        };

        let status = response.status();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(source) => {
                let error = FetchError::Body {
                    url: final_url,
                    source,
                };
                observer.on_error(&error);
                return FetchResult::failed(error);
            }
        };

        ::log::debug!(
            "{} answered {} with {} bytes ({})",
            final_url,
            status.as_u16(),
            body.len(),
            content_type.as_deref().unwrap_or("no content type")
        );

        let response = FetchResponse {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
        };
        observer.on_response(&response);

        let anchors = if parsers::is_html(response.content_type.as_deref()) {
            html::anchors(&String::from_utf8_lossy(&response.body))
        } else {
            Vec::new()
        };
        for href in anchors.iter() {
            observer.on_anchor(href);
        }

        let mut errors = Vec::new();
        if !status.is_success() {
            let error = FetchError::Status {
                url: response.url.clone(),
                status: response.status,
            };
            observer.on_error(&error);
            errors.push(error);
        }

        FetchResult::new(Some(response.body), anchors, errors)
    }
}
