use crate::trace::error::TraceError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderName, HeaderValue, HOST};
use hyper::Request as HyperRequest;
use std::str::FromStr;
use url::Url;

/// One logical trace request. The redirect loop rewrites `target` between
/// hops; everything else stays as the caller supplied it.
#[derive(Debug, Clone)]
pub struct Request {
    pub target: Url,
    pub method: String,
    /// Raw "Key: Value" lines, order kept, keys may repeat.
    pub headers: Vec<String>,
    pub body: String,
    pub client_cert_path: Option<String>,
    pub follow_redirects: bool,
    pub only_headers: bool,
    pub insecure: bool,
    pub max_redirects: usize,
}

impl Request {
    pub fn new(target: Url) -> Self {
        Self {
            target,
            method: String::from("GET"),
            headers: Vec::new(),
            body: String::new(),
            client_cert_path: None,
            follow_redirects: true,
            only_headers: false,
            insecure: false,
            max_redirects: 2,
        }
    }

    /// The last case-insensitive "host" header supplied by the caller, if
    /// any. It overrides the URL-derived Host value, last one wins.
    pub fn host_override(&self) -> Option<String> {
        self.headers
            .iter()
            .rev()
            .map(|h| header_key_value(h))
            .find(|(k, _)| k.eq_ignore_ascii_case("host"))
            .map(|(_, v)| v.to_string())
    }

    /// The effective Host header value: the override, or host[:port] from
    /// the target URL (port only when the URL names one explicitly).
    pub fn host_value(&self) -> Option<String> {
        if let Some(host) = self.host_override() {
            return Some(host);
        }
        let host = self.target.host_str()?;
        match self.target.port() {
            Some(port) => Some(format!("{host}:{port}")),
            None => Some(host.to_string()),
        }
    }

    /// Builds the wire request: method, absolute target URI, body sourced
    /// from the body string (empty string is an empty body, not absent),
    /// the effective Host header, and every other caller header appended
    /// in order with repeats preserved.
    pub(crate) fn cook(&self) -> Result<HyperRequest<Full<Bytes>>, TraceError> {
        let mut wire = HyperRequest::builder()
            .method(self.method.as_str())
            .uri(self.target.as_str())
            .body(Full::new(Bytes::from(self.body.clone())))?;

        let host = self
            .host_value()
            .ok_or_else(|| TraceError::MissingHost(self.target.to_string()))?;
        wire.headers_mut()
            .insert(HOST, HeaderValue::from_str(&host).map_err(http::Error::from)?);

        for line in &self.headers {
            let (key, value) = header_key_value(line);
            if key.eq_ignore_ascii_case("host") {
                continue;
            }
            wire.headers_mut().append(
                HeaderName::from_str(key).map_err(http::Error::from)?,
                HeaderValue::from_str(value).map_err(http::Error::from)?,
            );
        }
        Ok(wire)
    }
}

/// Splits a raw header line at the first colon; the value loses its
/// leading whitespace. Lines without a colon become a key with an empty
/// value.
pub fn header_key_value(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim_start()),
        None => (line.trim(), ""),
    }
}
