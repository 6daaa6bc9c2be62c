//! TLS material loading and server configuration.
//!
//! Certificate material is read synchronously and up front: a bad key or
//! certificate path is a configuration defect, so the secure launch fails
//! fast instead of retrying. The underlying I/O error is always preserved.

use crate::config::TlsFiles;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors loading or assembling TLS material.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid certificate in {}: {source}", .path.display())]
    Cert { path: PathBuf, source: io::Error },

    #[error("no certificates found in {}", .path.display())]
    NoCerts { path: PathBuf },

    #[error("invalid private key in {}: {source}", .path.display())]
    Key { path: PathBuf, source: io::Error },

    #[error("no private key found in {}", .path.display())]
    NoPrivateKey { path: PathBuf },

    #[error("client CA material rejected: {0}")]
    ClientCa(#[from] rustls::server::VerifierBuilderError),

    #[error("TLS configuration rejected: {0}")]
    Config(#[from] rustls::Error),
}

/// Load key, certificate, and CA material from disk and build a server
/// configuration.
///
/// Reads happen in a fixed order (key, certificate, then each CA file) and
/// the first failure aborts the whole load. When CA files are configured
/// they become the trusted roots for optional client certificate auth.
pub fn load_server_config(files: &TlsFiles) -> Result<Arc<ServerConfig>, TlsError> {
    let key = read_private_key(&files.root.join(&files.key))?;
    let chain = read_certs(&files.root.join(&files.cert))?;

    let builder = ServerConfig::builder();
    let mut config = if files.ca.is_empty() {
        builder.with_no_client_auth().with_single_cert(chain, key)?
    } else {
        let mut roots = RootCertStore::empty();
        for file in &files.ca {
            for cert in read_certs(&files.root.join(file))? {
                roots.add(cert)?;
            }
        }
        let verifier = WebPkiClientVerifier::builder(Arc::new(roots))
            .allow_unauthenticated()
            .build()?;
        builder
            .with_client_cert_verifier(verifier)
            .with_single_cert(chain, key)?
    };

    // hyper serves HTTP/1.1 on these connections
    config.alpn_protocols = vec![b"http/1.1".to_vec()];

    debug!(
        root = %files.root.display(),
        ca_files = files.ca.len(),
        "TLS material loaded"
    );

    Ok(Arc::new(config))
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let bytes = std::fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_owned(),
        source,
    })?;

    let certs = rustls_pemfile::certs(&mut bytes.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Cert {
            path: path.to_owned(),
            source,
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCerts {
            path: path.to_owned(),
        });
    }
    Ok(certs)
}

fn read_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let bytes = std::fs::read(path).map_err(|source| TlsError::Read {
        path: path.to_owned(),
        source,
    })?;

    rustls_pemfile::private_key(&mut bytes.as_slice())
        .map_err(|source| TlsError::Key {
            path: path.to_owned(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.to_owned(),
        })
}
