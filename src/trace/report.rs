use crate::trace::timing::TimingMarks;
use hyper::header::{HeaderMap, HeaderName, CONTENT_TYPE};
use hyper::{StatusCode, Version};
use std::time::Duration;

/// Report line for the status, e.g. `HTTP/1.1 200 OK`.
pub fn status_line(version: Version, status: StatusCode) -> String {
    let proto = match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    };
    match status.canonical_reason() {
        Some(reason) => format!("{proto} {} {reason}", status.as_u16()),
        None => format!("{proto} {}", status.as_u16()),
    }
}

/// Renders the response headers one line per name, sorted
/// case-insensitively, names in canonical casing, repeated values joined
/// by commas.
pub fn header_block(headers: &HeaderMap) -> Vec<String> {
    let mut names: Vec<&HeaderName> = headers.keys().collect();
    names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    names
        .into_iter()
        .map(|name| {
            let values: Vec<String> = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect();
            format!("{}: {}", canonical_name(name.as_str()), values.join(","))
        })
        .collect()
}

/// Canonical header casing: the first letter of each dash-separated
/// segment is uppercased, the rest lowercased.
pub fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Statuses whose semantics call for following a Location header.
pub fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// One-line description of the response body, or an empty string when
/// there is nothing worth printing (empty body, or headers-only mode).
pub fn summarize_body(headers: &HeaderMap, body: &[u8], only_headers: bool) -> String {
    if only_headers || body.is_empty() {
        return String::new();
    }
    let media_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim())
        .filter(|v| !v.is_empty())
        .unwrap_or("application/octet-stream");
    format!("Body: {} bytes of {}", body.len(), media_type)
}

/// The five phase lines, a blank separator, and the total line.
pub fn phase_block(marks: &TimingMarks) -> Vec<String> {
    vec![
        format!("DNS lookup: {}", fmt_ms(marks.dns_lookup())),
        format!("TCP connection: {}", fmt_ms(marks.tcp_connection())),
        format!("TLS handshake: {}", fmt_ms(marks.tls_handshake())),
        format!("Server processing: {}", fmt_ms(marks.server_processing())),
        format!("Content transfer: {}", fmt_ms(marks.content_transfer())),
        String::new(),
        format!("Total: {}", fmt_ms(marks.total())),
    ]
}

fn fmt_ms(duration: Option<Duration>) -> String {
    format!("{}ms", duration.unwrap_or_default().as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;
    use std::time::Instant;

    #[test]
    fn status_lines_use_numeric_protocol() {
        assert_eq!(
            status_line(Version::HTTP_11, StatusCode::OK),
            "HTTP/1.1 200 OK"
        );
        assert_eq!(
            status_line(Version::HTTP_2, StatusCode::NOT_FOUND),
            "HTTP/2.0 404 Not Found"
        );
    }

    #[test]
    fn header_names_are_canonicalized() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("x-foo"), "X-Foo");
        assert_eq!(canonical_name("etag"), "Etag");
    }

    #[test]
    fn header_block_sorts_and_joins() {
        let mut headers = HeaderMap::new();
        headers.append("x-foo", HeaderValue::from_static("a"));
        headers.append("x-foo", HeaderValue::from_static("b"));
        headers.append("content-type", HeaderValue::from_static("text/html"));
        assert_eq!(
            header_block(&headers),
            vec!["Content-Type: text/html", "X-Foo: a,b"]
        );
    }

    #[test]
    fn redirect_classification() {
        for code in [301, 302, 303, 307, 308] {
            assert!(is_redirect(StatusCode::from_u16(code).unwrap()), "{code}");
        }
        for code in [200, 204, 300, 304, 400, 500] {
            assert!(!is_redirect(StatusCode::from_u16(code).unwrap()), "{code}");
        }
    }

    #[test]
    fn body_summary_names_size_and_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        assert_eq!(
            summarize_body(&headers, b"<html>", false),
            "Body: 6 bytes of text/html"
        );
        assert_eq!(
            summarize_body(&HeaderMap::new(), b"xx", false),
            "Body: 2 bytes of application/octet-stream"
        );
    }

    #[test]
    fn body_summary_is_suppressed() {
        let headers = HeaderMap::new();
        assert_eq!(summarize_body(&headers, b"", false), "");
        assert_eq!(summarize_body(&headers, b"data", true), "");
    }

    #[test]
    fn phase_block_renders_whole_milliseconds() {
        let base = Instant::now();
        let marks = TimingMarks {
            dns_start: Some(base),
            dns_done: Some(base + Duration::from_micros(1900)),
            connect_done: Some(base + Duration::from_millis(5)),
            got_connection: Some(base + Duration::from_millis(5)),
            first_byte: Some(base + Duration::from_millis(30)),
            body_read: Some(base + Duration::from_millis(31)),
        };
        assert_eq!(
            phase_block(&marks),
            vec![
                "DNS lookup: 1ms",
                "TCP connection: 3ms",
                "TLS handshake: 0ms",
                "Server processing: 25ms",
                "Content transfer: 1ms",
                "",
                "Total: 31ms",
            ]
        );
    }
}
