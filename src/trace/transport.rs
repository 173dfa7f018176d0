use crate::http::proxy;
use crate::tls::client_cert;
use crate::tls::insecure::NoCertificateVerification;
use crate::trace::error::TraceError;
use crate::trace::request::Request;
use pki_types::ServerName;
use rustls::crypto::ring::{default_provider, DEFAULT_CIPHER_SUITES};
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;
use std::time::Duration;

const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request connection configuration: the proxy resolved from the
/// environment, the fixed TLS handshake timeout, and the TLS client
/// setup for https targets.
pub struct TransportConfig {
    pub proxy: Option<String>,
    pub tls_handshake_timeout: Duration,
    pub tls: Option<TlsTransport>,
}

pub struct TlsTransport {
    pub config: Arc<ClientConfig>,
    pub server_name: ServerName<'static>,
}

impl TransportConfig {
    pub fn build(request: &Request) -> Result<Self, TraceError> {
        let scheme = request.target.scheme();
        let proxy = proxy::from_env(scheme)
            .filter(|_| !proxy::should_bypass(request.target.host_str()));
        let tls = if scheme == "https" {
            Some(Self::tls_transport(request)?)
        } else {
            None
        };

        Ok(Self {
            proxy,
            tls_handshake_timeout: TLS_HANDSHAKE_TIMEOUT,
            tls,
        })
    }

    fn tls_transport(request: &Request) -> Result<TlsTransport, TraceError> {
        let host = request
            .host_value()
            .ok_or_else(|| TraceError::MissingHost(request.target.to_string()))?;
        let sni = strip_port(&host).to_string();

        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let provider = Arc::new(CryptoProvider {
            cipher_suites: DEFAULT_CIPHER_SUITES.to_vec(),
            ..default_provider()
        });
        let builder = ClientConfig::builder_with_provider(provider)
            .with_protocol_versions(rustls::DEFAULT_VERSIONS)?
            .with_root_certificates(root_store);

        let mut config = match request.client_cert_path.as_deref() {
            Some(path) => {
                let (certs, key) = client_cert::load_identity(path)?;
                builder.with_client_auth_cert(certs, key)?
            }
            None => builder.with_no_client_auth(),
        };

        if request.insecure {
            config
                .dangerous()
                .set_certificate_verifier(Arc::new(NoCertificateVerification::new(
                    default_provider(),
                )));
        }

        // Offer h2 alongside http/1.1; the handshake picks the protocol.
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

        let server_name = ServerName::try_from(sni.clone())
            .map_err(|e| TraceError::ServerName(format!("{sni}: {e}")))?;

        Ok(TlsTransport {
            config: Arc::new(config),
            server_name,
        })
    }
}

/// Drops a trailing `:port` from a Host value. Bracketed IPv6 literals
/// lose their brackets; a bare value with no single trailing port is
/// returned verbatim.
fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_suffix_is_stripped() {
        assert_eq!(strip_port("example.com:8443"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:443"), "::1");
        assert_eq!(strip_port("::1"), "::1");
    }

    #[test]
    fn sni_comes_from_the_target_host() {
        let request = Request::new("https://example.com:8443/".parse().unwrap());
        let transport = TransportConfig::build(&request).unwrap();
        let tls = transport.tls.expect("https builds a tls transport");
        assert_eq!(
            tls.server_name,
            ServerName::try_from("example.com").unwrap()
        );
    }

    #[test]
    fn sni_honors_a_host_header_override() {
        let mut request = Request::new("https://example.com/".parse().unwrap());
        request.headers = vec!["Host: front.example:9443".to_string()];
        let transport = TransportConfig::build(&request).unwrap();
        let tls = transport.tls.expect("https builds a tls transport");
        assert_eq!(
            tls.server_name,
            ServerName::try_from("front.example").unwrap()
        );
    }

    #[test]
    fn plain_http_carries_no_tls() {
        let request = Request::new("http://example.com/".parse().unwrap());
        let transport = TransportConfig::build(&request).unwrap();
        assert!(transport.tls.is_none());
    }
}
