//! HTTP transport collaborator

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::error::RunError;

/// Methods a step may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
    Options,
    Head,
}

impl HttpMethod {
    /// Parse a step method, case-insensitively. `option` and `options`
    /// both map to [`HttpMethod::Options`].
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "patch" => Some(Self::Patch),
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            "option" | "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            _ => None,
        }
    }

    /// Operation keys to try on a `PathItem`, in order.
    #[must_use]
    pub const fn contract_keys(self) -> &'static [&'static str] {
        match self {
            Self::Get => &["get"],
            Self::Post => &["post"],
            Self::Patch => &["patch"],
            Self::Put => &["put"],
            Self::Delete => &["delete"],
            Self::Options => &["options", "option"],
            Self::Head => &["head"],
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }

    /// Whether a request body may be sent.
    #[must_use]
    pub const fn allows_body(self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

/// Response as seen by the executor. Header names are lowercase.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Headers as a JSON object, for assertion templates.
    #[must_use]
    pub fn headers_value(&self) -> Value {
        Value::Object(
            self.headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Send(String),
}

/// Performs one network round-trip.
pub trait Transport {
    /// # Errors
    ///
    /// Returns error when the request cannot be built or sent.
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking `reqwest` transport.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(timeout: Duration) -> Result<Self, RunError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RunError::Http(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn request(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let mut req = self.client.request(method, &request.url);
        for (k, v) in &request.headers {
            if reqwest::header::HeaderValue::from_str(v).is_err() {
                return Err(TransportError::InvalidRequest(format!(
                    "header '{k}' has an invalid value"
                )));
            }
            req = req.header(k, v);
        }
        if let Some(body) = &request.body {
            // json() sets Content-Type unless the step already did
            req = req.json(body);
        }

        let resp = req.send().map_err(|e| TransportError::Send(e.to_string()))?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let text = resp.text().map_err(|e| TransportError::Send(e.to_string()))?;
        Ok(HttpResponse {
            status,
            headers,
            body: parse_body(&text),
        })
    }
}

/// JSON when possible, a JSON string otherwise, `null` when empty.
fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
