//! dualserve - start paired HTTP and HTTPS servers behind one handler
//!
//! This crate starts a plaintext server and/or a TLS server that dispatch
//! requests to a shared handler, and resolves exactly once when both
//! requested listeners have either started or failed:
//! - shorthand options (bare port, numeric string, `false` to disable)
//! - synchronous, fail-fast TLS material loading (key/cert/CA from one root)
//! - concurrent launches joined by a two-slot rendezvous
//! - a combined error that keeps both underlying failures and whatever
//!   did start, with the secure side supplying the summary
//!
//! ```yaml
//! # dualserve.yaml
//! http: 8080
//! https:
//!   port: 8443
//!   root: /etc/dualserve/certs
//!   key: server.key
//!   cert: server.crt
//! ```

pub mod config;
pub mod handler;
pub mod listener;
pub mod startup;
pub mod tls;
pub mod util;

pub use config::{
    CaFiles, Config, HttpOptions, HttpSpec, HttpsOptions, HttpsSpec, OptionsError, Port, Protocol,
    ServerOptions,
};
pub use handler::{Handler, SharedHandler};
pub use listener::{ListenError, ServerHandle};
pub use startup::{create_servers, ListenFailure, Servers, StartupError};
pub use tls::TlsError;
