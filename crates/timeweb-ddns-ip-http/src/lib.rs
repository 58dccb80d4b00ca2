// # HTTP IP Resolver
//
// Resolves the machine's public IPv4 address by asking IP-echo services.
//
// ## Fallback
//
// Endpoints are tried in order. The first one that answers with HTTP success
// and a body containing an IPv4 address wins. Anything else (connection error,
// timeout, non-2xx status, unparsable body, IPv6 address) is logged and the
// next endpoint is tried immediately, without retries.
//
// ## Response shapes
//
// Some services answer with plain text (`203.0.113.9\n`), others with a JSON
// object carrying the address in a named field (`{"ip": "203.0.113.9"}`).

use async_trait::async_trait;
use std::net::Ipv4Addr;
use std::time::Duration;
use timeweb_ddns_core::traits::IpResolver;
use timeweb_ddns_core::{Error, Result};

/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How an endpoint encodes the address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Body is the address, possibly with surrounding whitespace
    Text,
    /// Body is a JSON object; the address is in `field`
    Json { field: String },
}

/// One IP-echo service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpEndpoint {
    pub url: String,
    pub format: ResponseFormat,
}

impl IpEndpoint {
    pub fn text(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::Text,
        }
    }

    pub fn json(url: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: ResponseFormat::Json {
                field: field.into(),
            },
        }
    }
}

/// Services queried when none are configured, in priority order
pub fn default_endpoints() -> Vec<IpEndpoint> {
    vec![
        IpEndpoint::json("https://api.ipify.org?format=json", "ip"),
        IpEndpoint::text("https://wtfismyip.com/text"),
        IpEndpoint::json("https://api.myip.com/", "ip"),
    ]
}

/// IP resolver backed by a list of HTTP echo services
pub struct HttpIpResolver {
    endpoints: Vec<IpEndpoint>,
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Resolver over the default services
    pub fn new() -> Result<Self> {
        Self::with_endpoints(default_endpoints())
    }

    /// Resolver over custom services, tried in the given order
    pub fn with_endpoints(endpoints: Vec<IpEndpoint>) -> Result<Self> {
        Self::with_timeout(endpoints, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(endpoints: Vec<IpEndpoint>, timeout: Duration) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::config("At least one IP endpoint is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { endpoints, client })
    }

    pub fn endpoints(&self) -> &[IpEndpoint] {
        &self.endpoints
    }

    /// Query one endpoint
    async fn fetch(&self, endpoint: &IpEndpoint) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&endpoint.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        parse_body(&body, &endpoint.format)
    }
}

/// Extract an IPv4 address from a response body
pub fn parse_body(body: &str, format: &ResponseFormat) -> Result<Ipv4Addr> {
    let raw = match format {
        ResponseFormat::Text => body.trim().to_string(),
        ResponseFormat::Json { field } => {
            let value: serde_json::Value = serde_json::from_str(body)
                .map_err(|e| Error::http(format!("Invalid JSON response: {}", e)))?;
            value
                .get(field)
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .ok_or_else(|| Error::http(format!("Response has no '{}' field", field)))?
        }
    };

    raw.parse::<Ipv4Addr>()
        .map_err(|_| Error::http(format!("Not an IPv4 address: {}", raw)))
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve_current_ip(&self) -> Result<Ipv4Addr> {
        for endpoint in &self.endpoints {
            tracing::debug!("Querying {}", endpoint.url);
            match self.fetch(endpoint).await {
                Ok(ip) => {
                    tracing::debug!("{} reported {}", endpoint.url, ip);
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!("Could not get IP from {}: {}", endpoint.url, e);
                }
            }
        }

        Err(Error::no_ip(format!(
            "all {} IP services failed",
            self.endpoints.len()
        )))
    }
}
