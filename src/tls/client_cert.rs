use crate::trace::error::TraceError;
use pki_types::{CertificateDer, PrivateKeyDer};
use std::fs::File;
use std::io::{self, BufReader};

/// Loads a client identity from a single PEM file holding the
/// certificate chain and the private key.
pub fn load_identity(
    path: &str,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), TraceError> {
    let mut reader = open(path)?;
    let mut certs = Vec::new();
    for cert in rustls_pemfile::certs(&mut reader) {
        certs.push(cert.map_err(|e| cert_error(path, e))?);
    }
    if certs.is_empty() {
        return Err(cert_error(
            path,
            io::Error::new(io::ErrorKind::InvalidData, "no certificate found"),
        ));
    }

    // The key may sit before or after the certificate blocks, so rescan.
    let mut reader = open(path)?;
    let key = rustls_pemfile::private_key(&mut reader)
        .map_err(|e| cert_error(path, e))?
        .ok_or_else(|| {
            cert_error(
                path,
                io::Error::new(io::ErrorKind::InvalidData, "no private key found"),
            )
        })?;

    Ok((certs, key))
}

fn open(path: &str) -> Result<BufReader<File>, TraceError> {
    Ok(BufReader::new(
        File::open(path).map_err(|e| cert_error(path, e))?,
    ))
}

fn cert_error(path: &str, source: io::Error) -> TraceError {
    TraceError::ClientCert {
        path: path.to_string(),
        source,
    }
}
