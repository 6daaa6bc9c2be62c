//! Startup coordination for the paired servers.
//!
//! [`create_servers`] normalizes the options, fires both launch attempts
//! concurrently, and resolves exactly once after both have reported, in
//! every combination of requested/skipped and success/failure. A failure on
//! one protocol never prevents the other from completing, and whatever did
//! start is handed back even alongside an error.

mod barrier;

use crate::config::{normalize_options, OptionsError, Protocol, ServerOptions};
use crate::listener::{launch_http, launch_https, ListenError, ServerHandle};
use barrier::{Outcome, StartupBarrier};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// The set of servers that started, keyed by protocol.
///
/// A skipped protocol is simply absent; that is not an error.
#[derive(Debug, Default)]
pub struct Servers {
    /// Plaintext server, when requested and started.
    pub http: Option<ServerHandle>,
    /// Secure server, when requested and started.
    pub https: Option<ServerHandle>,
}

impl Servers {
    /// Whether no server started.
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }

    /// Stop every started server's accept loop.
    pub fn stop(&self) {
        if let Some(handle) = &self.http {
            handle.stop();
        }
        if let Some(handle) = &self.https {
            handle.stop();
        }
    }
}

/// Aggregate failure from the two launch attempts.
///
/// Both underlying errors are preserved (absent ones simply omitted), and
/// `servers` carries whichever protocol did start so a caller can decide
/// whether a partial success is usable.
#[derive(Debug)]
pub struct ListenFailure {
    /// Plaintext launch error, if that attempt failed.
    pub http: Option<ListenError>,
    /// Secure launch error, if that attempt failed.
    pub https: Option<ListenError>,
    /// Servers that started despite the failure.
    pub servers: Servers,
}

impl ListenFailure {
    /// The error supplying the summary: the secure one when present.
    fn summary_error(&self) -> Option<&ListenError> {
        self.https.as_ref().or(self.http.as_ref())
    }
}

impl fmt::Display for ListenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.summary_error() {
            Some(error) => write!(f, "{error}"),
            None => f.write_str("listener startup failed"),
        }
    }
}

impl std::error::Error for ListenFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.summary_error()
            .map(|error| error as &(dyn std::error::Error + 'static))
    }
}

/// Why [`create_servers`] failed.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The options were unusable; no launch was attempted.
    #[error(transparent)]
    Options(#[from] OptionsError),

    /// At least one launch attempt failed.
    #[error(transparent)]
    Listen(#[from] ListenFailure),
}

/// Start the configured servers and resolve once both attempts settle.
///
/// Configuration problems are reported before any listener is attempted or
/// any file is read. Otherwise both launches run concurrently: the secure
/// side loads its certificate material, each side binds its port, and the
/// call returns after both have either started or failed, in any order.
///
/// There is no bind timeout; a caller needing bounded startup can wrap the
/// call in `tokio::time::timeout`.
pub async fn create_servers(options: ServerOptions) -> Result<Servers, StartupError> {
    let plan = normalize_options(options)?;

    let mut barrier = StartupBarrier::new();
    let (tx, mut rx) = mpsc::channel::<(Protocol, Outcome)>(2);

    match plan.http {
        Some(launch) => {
            let tx = tx.clone();
            tokio::spawn(async move {
                debug!(port = launch.port, "launching http listener");
                let outcome = match launch_http(launch).await {
                    Ok(handle) => Outcome::Started(handle),
                    Err(error) => Outcome::Failed(error),
                };
                let _ = tx.send((Protocol::Http, outcome)).await;
            });
        }
        None => {
            debug!("http not configured; no server");
            barrier.report(Protocol::Http, Outcome::Skipped);
        }
    }

    match plan.https {
        Some(launch) => {
            let tx = tx.clone();
            tokio::spawn(async move {
                debug!(port = launch.port, "launching https listener");
                let outcome = match launch_https(launch).await {
                    Ok(handle) => Outcome::Started(handle),
                    Err(error) => Outcome::Failed(error),
                };
                let _ = tx.send((Protocol::Https, outcome)).await;
            });
        }
        None => {
            debug!("https not configured; no server");
            barrier.report(Protocol::Https, Outcome::Skipped);
        }
    }

    drop(tx);

    while !barrier.is_complete() {
        match rx.recv().await {
            Some((protocol, outcome)) => {
                barrier.report(protocol, outcome);
            }
            None => {
                warn!("a launch attempt exited without reporting");
                break;
            }
        }
    }

    Ok(barrier.into_result()?)
}
