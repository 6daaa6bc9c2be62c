//! Configuration data types.

use crate::handler::SharedHandler;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default plaintext port.
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// Default secure port.
pub const DEFAULT_HTTPS_PORT: u16 = 443;

/// The two protocols a server can be started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => f.write_str("http"),
            Protocol::Https => f.write_str("https"),
        }
    }
}

/// Options accepted by [`create_servers`](crate::create_servers).
///
/// A protocol with no entry is skipped entirely. The top-level `handler` is
/// the fallback for any configured protocol that does not carry its own.
#[derive(Clone, Default)]
pub struct ServerOptions {
    /// Default request handler, shared by both protocols.
    pub handler: Option<SharedHandler>,

    /// Plaintext server configuration.
    pub http: Option<HttpSpec>,

    /// Secure server configuration.
    pub https: Option<HttpsSpec>,
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .field("http", &self.http)
            .field("https", &self.https)
            .finish()
    }
}

/// Plaintext server configuration, with shorthand forms.
///
/// Accepts `false` (disabled), a bare port number, a numeric port string, or
/// a full [`HttpOptions`] mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HttpSpec {
    /// `false` disables the server; `true` launches it with defaults.
    Enabled(bool),
    /// Port-only shorthand: a number or a numeric string.
    Port(Port),
    /// Full configuration.
    Options(HttpOptions),
}

/// Secure server configuration.
///
/// Accepts `false` (disabled) or a full [`HttpsOptions`] mapping. Unlike the
/// plaintext side there is no port shorthand, since certificate material is
/// always required.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HttpsSpec {
    /// `false` disables the server.
    Enabled(bool),
    /// Full configuration.
    Options(HttpsOptions),
}

/// A port, as either a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Port {
    Number(u16),
    Text(String),
}

/// Plaintext server options.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpOptions {
    /// Port to listen on (default 80; 0 binds an ephemeral port).
    pub port: Option<Port>,

    /// Address to bind (default all interfaces).
    pub ip: Option<String>,

    /// Handler for this server only, overriding the shared one.
    #[serde(skip)]
    pub handler: Option<SharedHandler>,
}

impl fmt::Debug for HttpOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpOptions")
            .field("port", &self.port)
            .field("ip", &self.ip)
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Secure server options.
#[derive(Clone, Deserialize, Serialize)]
pub struct HttpsOptions {
    /// Port to listen on (default 443; 0 binds an ephemeral port).
    #[serde(default)]
    pub port: Option<Port>,

    /// Address to bind (default all interfaces).
    #[serde(default)]
    pub ip: Option<String>,

    /// Directory holding the certificate material.
    pub root: PathBuf,

    /// Private key file name, relative to `root`.
    pub key: String,

    /// Certificate file name, relative to `root`.
    pub cert: String,

    /// Client CA file name(s), relative to `root`.
    #[serde(default)]
    pub ca: Option<CaFiles>,

    /// Handler for this server only, overriding the shared one.
    #[serde(skip)]
    pub handler: Option<SharedHandler>,
}

impl fmt::Debug for HttpsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpsOptions")
            .field("port", &self.port)
            .field("ip", &self.ip)
            .field("root", &self.root)
            .field("key", &self.key)
            .field("cert", &self.cert)
            .field("ca", &self.ca)
            .field("handler", &self.handler.as_ref().map(|_| ".."))
            .finish()
    }
}

/// One CA file name or a sequence of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CaFiles {
    One(String),
    Many(Vec<String>),
}

impl CaFiles {
    /// Flatten into a list of file names.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            CaFiles::One(file) => vec![file],
            CaFiles::Many(files) => files,
        }
    }
}

/// Root configuration file structure for the `dualserve` binary.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Global settings
    pub global: GlobalConfig,

    /// Plaintext server section
    pub http: Option<HttpSpec>,

    /// Secure server section
    pub https: Option<HttpsSpec>,
}

/// Global configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}
