//! Blocking HTTP transport for the Turbonomic REST API.
//!
//! Non-2xx responses are ordinary values here; callers inspect the status code
//! themselves. Only network-level failures surface as errors.
use crate::util::truncate_string;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt;

/// HTTP verbs used against the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A single outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub cookie: Option<String>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            cookie: None,
            body: None,
        }
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn cookie(mut self, cookie: &str) -> Self {
        self.cookie = Some(cookie.to_string());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status, session header, and raw body of a response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub set_cookie: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Decode the body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).with_context(|| {
            format!(
                "decode response body as JSON: {}",
                truncate_string(&self.body, 200)
            )
        })
    }
}

/// Anything that can carry an [`HttpRequest`] to the API.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Production transport backed by a `ureq` agent.
///
/// The target servers commonly run with self-signed certificates, so
/// certificate verification is switched off. No timeout is configured.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(true)
            .build();
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .tls_config(tls)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn prepare<B>(mut req: ureq::RequestBuilder<B>, request: &HttpRequest) -> ureq::RequestBuilder<B> {
    for (key, value) in &request.query {
        req = req.query(key, value);
    }
    if let Some(cookie) = request.cookie.as_deref() {
        req = req.header("cookie", cookie);
    }
    req
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = request.url.as_str();
        let result = match request.method {
            Method::Get => prepare(self.agent.get(url), request).call(),
            Method::Delete => prepare(self.agent.delete(url), request).call(),
            Method::Post => {
                let req = prepare(self.agent.post(url), request);
                match &request.body {
                    Some(body) => req.send_json(body),
                    None => req.send_empty(),
                }
            }
        };

        let mut response =
            result.with_context(|| format!("{} {}", request.method, request.url))?;
        let status = response.status().as_u16();
        let set_cookie = response
            .headers()
            .get("set-cookie")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .body_mut()
            .read_to_string()
            .with_context(|| format!("read response body from {}", request.url))?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status,
            response_bytes = body.len(),
            "api call complete"
        );

        Ok(HttpResponse {
            status,
            set_cookie,
            body,
        })
    }
}
