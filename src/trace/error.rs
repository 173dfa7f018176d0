use std::io;
use thiserror::Error;

/// Fatal conditions that abort a trace. A redirect response without a
/// Location header is not an error; the chain just ends.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("url has no host: {0}")]
    MissingHost(String),

    #[error("unable to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("unable to connect to host {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("tls handshake with {addr} failed: {source}")]
    TlsHandshake {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to prepare tls transport: {0}")]
    Transport(#[from] rustls::Error),

    #[error("invalid tls server name: {0}")]
    ServerName(String),

    #[error("unable to read client certificate {path}: {source}")]
    ClientCert {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("proxy connect failed: {0}")]
    Proxy(String),

    #[error("failed to prepare transport for http/1.1: {0}")]
    Http1Transport(#[source] hyper::Error),

    #[error("failed to prepare transport for http/2: {0}")]
    Http2Transport(#[source] hyper::Error),

    #[error("unable to create request: {0}")]
    BuildRequest(#[from] http::Error),

    #[error("failed to read response: {0}")]
    Read(#[source] hyper::Error),

    #[error("unable to follow redirect: {0}")]
    RedirectLocation(String),

    #[error("maximum number of redirects ({0}) followed")]
    TooManyRedirects(usize),
}
