use crate::error::{GrabError, Result};
use std::time::Duration;
use tokio::net::TcpStream;
use url::{Host, Url};

/// Port assumed when a SOCKS URL carries none
const DEFAULT_SOCKS_PORT: u16 = 1080;

/// A SOCKS5 endpoint that both the document fetch and the browser dial through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTransport {
    host: Host<String>,
    port: u16,
    remote_dns: bool,
}

impl ProxyTransport {
    /// Parse `endpoint` and make sure something is listening there
    ///
    /// There is no fallback to a direct connection: any failure here ends
    /// the run before a single request leaves the machine.
    pub async fn connect(endpoint: &str, probe_timeout: Duration) -> Result<Self> {
        let transport = Self::parse(endpoint)?;
        transport.probe(probe_timeout).await?;
        ::log::info!("Routing traffic through SOCKS5 proxy {}", transport.authority());
        Ok(transport)
    }

    /// Normalise `endpoint` without touching the network
    ///
    /// Accepts `host:port`, `socks5://host:port` and `socks5h://host:port`.
    /// A bare address resolves names inside the proxy so `.onion` hosts work.
    pub fn parse(endpoint: &str) -> Result<Self> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(unavailable(endpoint, "empty proxy address"));
        }

        let with_scheme = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("socks5h://{}", endpoint)
        };

        let url = Url::parse(&with_scheme).map_err(|e| unavailable(endpoint, e))?;
        let remote_dns = match url.scheme() {
            "socks5h" => true,
            "socks5" => false,
            other => {
                return Err(unavailable(
                    endpoint,
                    format!("unsupported proxy scheme '{}', expected socks5", other),
                ));
            }
        };

        let host = url
            .host()
            .map(|h| h.to_owned())
            .ok_or_else(|| unavailable(endpoint, "missing proxy host"))?;
        let port = url.port().unwrap_or(DEFAULT_SOCKS_PORT);

        Ok(Self {
            host,
            port,
            remote_dns,
        })
    }

    async fn probe(&self, probe_timeout: Duration) -> Result<()> {
        let host = match &self.host {
            Host::Domain(domain) => domain.clone(),
            Host::Ipv4(addr) => addr.to_string(),
            Host::Ipv6(addr) => addr.to_string(),
        };

        ::log::debug!("Probing proxy {} (timeout {:?})", self.authority(), probe_timeout);
        match tokio::time::timeout(probe_timeout, TcpStream::connect((host.as_str(), self.port)))
            .await
        {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(unavailable(&self.authority(), e)),
            Err(_) => Err(unavailable(
                &self.authority(),
                format!("no answer within {:?}", probe_timeout),
            )),
        }
    }

    /// `host:port`, with IPv6 addresses bracketed
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Proxy URL handed to the HTTP client
    pub fn url(&self) -> String {
        let scheme = if self.remote_dns { "socks5h" } else { "socks5" };
        format!("{}://{}", scheme, self.authority())
    }

    pub fn reqwest_proxy(&self) -> std::result::Result<reqwest::Proxy, reqwest::Error> {
        reqwest::Proxy::all(self.url())
    }

    /// Chrome command-line switch that routes the browser through this proxy
    pub fn browser_arg(&self) -> String {
        // Chrome always resolves names through a socks5 proxy
        format!("--proxy-server=socks5://{}", self.authority())
    }
}

fn unavailable(endpoint: &str, reason: impl ToString) -> GrabError {
    GrabError::ProxyUnavailable {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_bare_address_uses_remote_dns() {
        let proxy = ProxyTransport::parse("127.0.0.1:9050").unwrap();
        assert_eq!(proxy.authority(), "127.0.0.1:9050");
        assert_eq!(proxy.url(), "socks5h://127.0.0.1:9050");
        assert_eq!(proxy.browser_arg(), "--proxy-server=socks5://127.0.0.1:9050");
    }

    #[test]
    fn test_explicit_socks5_scheme_is_kept() {
        let proxy = ProxyTransport::parse("socks5://localhost:1081").unwrap();
        assert_eq!(proxy.url(), "socks5://localhost:1081");
    }

    #[test]
    fn test_missing_port_defaults() {
        let proxy = ProxyTransport::parse("socks5h://tor.local").unwrap();
        assert_eq!(proxy.authority(), "tor.local:1080");
    }

    #[test]
    fn test_rejects_http_proxy() {
        let err = ProxyTransport::parse("http://127.0.0.1:8080").unwrap_err();
        assert!(matches!(err, GrabError::ProxyUnavailable { .. }));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(matches!(
            ProxyTransport::parse("  "),
            Err(GrabError::ProxyUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_succeeds_when_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let proxy = ProxyTransport::connect(&addr.to_string(), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(proxy.authority(), addr.to_string());
    }

    #[tokio::test]
    async fn test_connect_fails_fast_when_nothing_listens() {
        // Bind then drop to get a port that is very likely closed
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let err = ProxyTransport::connect(&addr.to_string(), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, GrabError::ProxyUnavailable { .. }));
    }
}
