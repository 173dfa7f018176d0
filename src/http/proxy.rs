use crate::trace::error::TraceError;
use std::net::IpAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Read the proxy address for a scheme from the environment.
///
/// Checks `HTTPS_PROXY`/`https_proxy` or `HTTP_PROXY`/`http_proxy`, with
/// `ALL_PROXY`/`all_proxy` as a fallback. Returns `host:port`, or `None`
/// when no proxy is configured or the proxy scheme is unsupported
/// (socks is not supported).
pub fn from_env(scheme: &str) -> Option<String> {
    let env_var = if scheme == "https" {
        std::env::var("HTTPS_PROXY")
            .or_else(|_| std::env::var("https_proxy"))
            .or_else(|_| std::env::var("ALL_PROXY"))
            .or_else(|_| std::env::var("all_proxy"))
            .ok()
    } else {
        std::env::var("HTTP_PROXY")
            .or_else(|_| std::env::var("http_proxy"))
            .or_else(|_| std::env::var("ALL_PROXY"))
            .or_else(|_| std::env::var("all_proxy"))
            .ok()
    }?;

    parse_proxy_value(&env_var)
}

fn parse_proxy_value(value: &str) -> Option<String> {
    if let Ok(url) = url::Url::parse(value) {
        match url.scheme() {
            "http" => {
                let host = url.host_str()?;
                let port = url.port().unwrap_or(80);
                Some(format!("{}:{}", host, port))
            }
            "https" => {
                let host = url.host_str()?;
                let port = url.port().unwrap_or(443);
                Some(format!("{}:{}", host, port))
            }
            _ => None,
        }
    } else {
        // Assume the value is already in host:port format.
        Some(value.to_string())
    }
}

/// Whether a host must be reached directly. Loopback targets are never
/// proxied; otherwise `NO_PROXY`/`no_proxy` patterns apply
/// (`example.com` exact, `.example.com` suffix).
pub fn should_bypass(host: Option<&str>) -> bool {
    let host = match host {
        Some(h) => h,
        None => return false,
    };

    if is_loopback(host) {
        return true;
    }

    let no_proxy = match std::env::var("NO_PROXY").or_else(|_| std::env::var("no_proxy")) {
        Ok(val) => val,
        Err(_) => return false,
    };

    bypass_matches(host, &no_proxy)
}

fn is_loopback(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

fn bypass_matches(host: &str, no_proxy: &str) -> bool {
    for pattern in no_proxy.split(',') {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }

        if let Some(suffix) = pattern.strip_prefix('.') {
            if host.ends_with(pattern) || host == suffix {
                return true;
            }
        } else if host == pattern {
            return true;
        }
    }

    false
}

/// Turns an open connection to an HTTP proxy into a tunnel to the origin
/// by issuing a CONNECT request and waiting for a 2xx reply. The stream
/// is handed back untouched beyond the CONNECT exchange.
pub async fn establish_tunnel(
    mut stream: TcpStream,
    host: &str,
    port: u16,
) -> Result<TcpStream, TraceError> {
    let connect = format!("CONNECT {host}:{port} HTTP/1.1\r\nHost: {host}:{port}\r\n\r\n");
    stream
        .write_all(connect.as_bytes())
        .await
        .map_err(|e| TraceError::Proxy(e.to_string()))?;

    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        let n = stream
            .read(&mut byte)
            .await
            .map_err(|e| TraceError::Proxy(e.to_string()))?;
        if n == 0 {
            return Err(TraceError::Proxy(String::from(
                "proxy closed the connection during CONNECT",
            )));
        }
        head.push(byte[0]);
        if head.len() > 8192 {
            return Err(TraceError::Proxy(String::from(
                "oversized CONNECT response from proxy",
            )));
        }
    }

    let head = String::from_utf8_lossy(&head);
    let accepted = head
        .split_whitespace()
        .nth(1)
        .map(|code| code.starts_with('2'))
        .unwrap_or(false);
    if accepted {
        Ok(stream)
    } else {
        let status = head.lines().next().unwrap_or("").to_string();
        Err(TraceError::Proxy(format!("proxy refused CONNECT: {status}")))
    }
}
