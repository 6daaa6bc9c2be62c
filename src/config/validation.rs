//! Option normalization.
//!
//! Resolves the shorthand-heavy [`ServerOptions`] into a concrete per-protocol
//! launch plan before anything touches the network or the filesystem:
//! - shorthand coercion (bare port, numeric string, `false`/`true`)
//! - port defaulting (80 plaintext, 443 secure)
//! - handler resolution (per-protocol handler, falling back to the shared one)
//! - CA material flattening (one file name or many)
//!
//! Normalization is a pure function; all of its failures are configuration
//! defects reported before any listener is attempted.

use crate::config::{
    CaFiles, HttpOptions, HttpSpec, HttpsOptions, HttpsSpec, Port, Protocol, ServerOptions,
    DEFAULT_HTTP_PORT, DEFAULT_HTTPS_PORT,
};
use crate::handler::SharedHandler;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors detected while normalizing [`ServerOptions`].
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("at least one of http or https must be configured")]
    NoProtocols,

    #[error("no handler configured for the {protocol} server")]
    MissingHandler { protocol: Protocol },

    #[error("invalid {protocol} port '{value}'")]
    InvalidPort { protocol: Protocol, value: String },

    #[error("https cannot be enabled without certificate options")]
    HttpsWithoutTls,
}

/// Concrete launch plan produced from [`ServerOptions`].
///
/// `None` means the protocol was not requested.
#[derive(Debug)]
pub struct LaunchPlan {
    pub http: Option<HttpLaunch>,
    pub https: Option<HttpsLaunch>,
}

/// Resolved parameters for the plaintext listener.
pub struct HttpLaunch {
    /// Port to bind (0 requests an ephemeral port).
    pub port: u16,
    /// Bind address; all interfaces when absent.
    pub ip: Option<String>,
    /// Handler every accepted connection is dispatched to.
    pub handler: SharedHandler,
}

impl fmt::Debug for HttpLaunch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpLaunch")
            .field("port", &self.port)
            .field("ip", &self.ip)
            .finish()
    }
}

/// Resolved parameters for the secure listener.
pub struct HttpsLaunch {
    /// Port to bind (0 requests an ephemeral port).
    pub port: u16,
    /// Bind address; all interfaces when absent.
    pub ip: Option<String>,
    /// Handler every accepted connection is dispatched to.
    pub handler: SharedHandler,
    /// Certificate material locations.
    pub tls: TlsFiles,
}

impl fmt::Debug for HttpsLaunch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpsLaunch")
            .field("port", &self.port)
            .field("ip", &self.ip)
            .field("tls", &self.tls)
            .finish()
    }
}

/// Certificate material locations for a secure launch.
#[derive(Debug, Clone)]
pub struct TlsFiles {
    /// Directory the other fields are resolved against.
    pub root: PathBuf,
    /// Private key file name.
    pub key: String,
    /// Certificate file name.
    pub cert: String,
    /// Client CA file names; may be empty.
    pub ca: Vec<String>,
}

/// Normalize caller-supplied options into a [`LaunchPlan`].
///
/// Fails without side effects if neither protocol is configured, a configured
/// protocol resolves no handler, or a port is not numeric.
pub fn normalize_options(options: ServerOptions) -> Result<LaunchPlan, OptionsError> {
    let ServerOptions {
        handler: shared,
        http,
        https,
    } = options;

    // `false` and absent both mean "not requested"
    let http = http.filter(|spec| !matches!(spec, HttpSpec::Enabled(false)));
    let https = https.filter(|spec| !matches!(spec, HttpsSpec::Enabled(false)));

    if http.is_none() && https.is_none() {
        return Err(OptionsError::NoProtocols);
    }

    let http = http
        .map(|spec| normalize_http(spec, shared.as_ref()))
        .transpose()?;
    let https = https
        .map(|spec| normalize_https(spec, shared.as_ref()))
        .transpose()?;

    Ok(LaunchPlan { http, https })
}

fn normalize_http(
    spec: HttpSpec,
    shared: Option<&SharedHandler>,
) -> Result<HttpLaunch, OptionsError> {
    let options = match spec {
        // `true` selects an all-defaults launch
        HttpSpec::Enabled(_) => HttpOptions::default(),
        HttpSpec::Port(port) => HttpOptions {
            port: Some(port),
            ..HttpOptions::default()
        },
        HttpSpec::Options(options) => options,
    };

    let handler = resolve_handler(options.handler, shared, Protocol::Http)?;
    let port = resolve_port(options.port, Protocol::Http, DEFAULT_HTTP_PORT)?;

    Ok(HttpLaunch {
        port,
        ip: options.ip,
        handler,
    })
}

fn normalize_https(
    spec: HttpsSpec,
    shared: Option<&SharedHandler>,
) -> Result<HttpsLaunch, OptionsError> {
    let options: HttpsOptions = match spec {
        // there is no all-defaults secure launch; certificates are required
        HttpsSpec::Enabled(_) => return Err(OptionsError::HttpsWithoutTls),
        HttpsSpec::Options(options) => options,
    };

    let handler = resolve_handler(options.handler, shared, Protocol::Https)?;
    let port = resolve_port(options.port, Protocol::Https, DEFAULT_HTTPS_PORT)?;

    Ok(HttpsLaunch {
        port,
        ip: options.ip,
        handler,
        tls: TlsFiles {
            root: options.root,
            key: options.key,
            cert: options.cert,
            ca: options.ca.map(CaFiles::into_vec).unwrap_or_default(),
        },
    })
}

fn resolve_handler(
    own: Option<SharedHandler>,
    shared: Option<&SharedHandler>,
    protocol: Protocol,
) -> Result<SharedHandler, OptionsError> {
    own.or_else(|| shared.cloned())
        .ok_or(OptionsError::MissingHandler { protocol })
}

fn resolve_port(port: Option<Port>, protocol: Protocol, default: u16) -> Result<u16, OptionsError> {
    match port {
        None => Ok(default),
        Some(Port::Number(port)) => Ok(port),
        Some(Port::Text(text)) => text.trim().parse().map_err(|_| OptionsError::InvalidPort {
            protocol,
            value: text,
        }),
    }
}
