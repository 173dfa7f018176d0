use crate::http::proxy;
use crate::trace::error::TraceError;
use crate::trace::report;
use crate::trace::request::Request;
use crate::trace::response::Response;
use crate::trace::timing::TimingMarks;
use crate::trace::transport::TransportConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::{http1, http2};
use hyper::header::LOCATION;
use hyper::{Request as HyperRequest, Uri};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::io;
use std::net::SocketAddr;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use url::Url;

enum Dispatch {
    H1(http1::SendRequest<Full<Bytes>>),
    H2(http2::SendRequest<Full<Bytes>>),
}

/// Runs the whole trace: one attempt per hop, the next hop's URL written
/// back into `request.target`. The caller owns `response` and reads the
/// accumulated report after the chain terminates. The loop is bounded by
/// the redirect counter kept in `response`.
pub async fn run(request: &mut Request, response: &mut Response) -> Result<(), TraceError> {
    loop {
        match visit(request, response).await? {
            Some(next) => {
                debug!("following redirect to {next}");
                request.target = next;
                response.report("");
            }
            None => return Ok(()),
        }
    }
}

/// One hop: connect, send, drain, report. Returns the resolved Location
/// of a redirect to follow, or `None` when the chain ends here.
async fn visit(request: &Request, response: &mut Response) -> Result<Option<Url>, TraceError> {
    let scheme = request.target.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(TraceError::UnsupportedScheme(scheme.to_string()));
    }

    let transport = TransportConfig::build(request)?;
    let mut wire = request.cook()?;
    let mut marks = TimingMarks::new();

    let host = request
        .target
        .host_str()
        .ok_or_else(|| TraceError::MissingHost(request.target.to_string()))?
        .to_string();
    let port = request.target.port_or_known_default().unwrap_or(80);
    let authority = transport
        .proxy
        .clone()
        .unwrap_or_else(|| format!("{host}:{port}"));

    // Literal addresses skip DNS; the connect attempt backfills the mark.
    let addr = match authority.parse::<SocketAddr>() {
        Ok(addr) => addr,
        Err(_) => {
            marks.start_dns();
            let addr = lookup_host(authority.as_str())
                .await
                .map_err(|e| resolve_error(&authority, e))?
                .next()
                .ok_or_else(|| {
                    resolve_error(
                        &authority,
                        io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
                    )
                })?;
            marks.end_dns();
            addr
        }
    };

    marks.start_connect();
    let stream = TcpStream::connect(addr).await.map_err(|e| TraceError::Connect {
        addr: addr.to_string(),
        source: e,
    })?;
    marks.end_connect();
    response.report(format!("Connected to {addr}"));

    let dispatch = match &transport.tls {
        Some(tls) => {
            let stream = match &transport.proxy {
                Some(_) => proxy::establish_tunnel(stream, &host, port).await?,
                None => stream,
            };
            let connector = TlsConnector::from(tls.config.clone());
            let handshake = connector.connect(tls.server_name.clone(), stream);
            let tls_stream = match timeout(transport.tls_handshake_timeout, handshake).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => {
                    return Err(TraceError::TlsHandshake {
                        addr: addr.to_string(),
                        source: e,
                    })
                }
                Err(_) => {
                    return Err(TraceError::TlsHandshake {
                        addr: addr.to_string(),
                        source: io::Error::new(io::ErrorKind::TimedOut, "handshake timed out"),
                    })
                }
            };

            let negotiated_h2 = tls_stream.get_ref().1.alpn_protocol() == Some(&b"h2"[..]);
            let io = TokioIo::new(tls_stream);
            if negotiated_h2 {
                let (sender, conn) = http2::handshake(TokioExecutor::new(), io)
                    .await
                    .map_err(TraceError::Http2Transport)?;
                tokio::task::spawn(async move {
                    if let Err(err) = conn.await {
                        debug!("connection task ended: {err:?}");
                    }
                });
                Dispatch::H2(sender)
            } else {
                origin_form(&mut wire)?;
                let (sender, conn) = http1::handshake(io)
                    .await
                    .map_err(TraceError::Http1Transport)?;
                tokio::task::spawn(async move {
                    if let Err(err) = conn.await {
                        debug!("connection task ended: {err:?}");
                    }
                });
                Dispatch::H1(sender)
            }
        }
        None => {
            // A forward proxy wants the absolute url on the request line.
            if transport.proxy.is_none() {
                origin_form(&mut wire)?;
            }
            let io = TokioIo::new(stream);
            let (sender, conn) = http1::handshake(io)
                .await
                .map_err(TraceError::Http1Transport)?;
            tokio::task::spawn(async move {
                if let Err(err) = conn.await {
                    debug!("connection task ended: {err:?}");
                }
            });
            Dispatch::H1(sender)
        }
    };
    marks.mark_connected();

    let res = match dispatch {
        Dispatch::H1(mut sender) => sender.send_request(wire).await,
        Dispatch::H2(mut sender) => sender.send_request(wire).await,
    }
    .map_err(TraceError::Read)?;
    marks.mark_first_byte();

    let (parts, incoming) = res.into_parts();
    let body = incoming
        .collect()
        .await
        .map_err(TraceError::Read)?
        .to_bytes();
    marks.mark_body_read();
    marks.finish();

    response.report(report::status_line(parts.version, parts.status));
    for line in report::header_block(&parts.headers) {
        response.report(line);
    }
    let summary = report::summarize_body(&parts.headers, &body, request.only_headers);
    if !summary.is_empty() {
        response.report(summary);
    }
    response.report("");
    for line in report::phase_block(&marks) {
        response.report(line);
    }

    if !request.follow_redirects || !report::is_redirect(parts.status) {
        return Ok(None);
    }

    // A redirect status without a Location just ends the chain.
    let location = match parts.headers.get(LOCATION) {
        Some(location) => location
            .to_str()
            .map_err(|e| TraceError::RedirectLocation(e.to_string()))?,
        None => return Ok(None),
    };
    let next = request
        .target
        .join(location)
        .map_err(|e| TraceError::RedirectLocation(format!("{location}: {e}")))?;

    if response.follow_redirect() > request.max_redirects {
        return Err(TraceError::TooManyRedirects(request.max_redirects));
    }
    Ok(Some(next))
}

fn resolve_error(host: &str, source: io::Error) -> TraceError {
    TraceError::Resolve {
        host: host.to_string(),
        source,
    }
}

/// Rewrites the wire request to origin-form for direct http/1.1
/// connections; the cooked request carries the absolute url.
fn origin_form(wire: &mut HyperRequest<Full<Bytes>>) -> Result<(), TraceError> {
    let path = wire
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();
    *wire.uri_mut() = path.parse::<Uri>().map_err(http::Error::from)?;
    Ok(())
}
