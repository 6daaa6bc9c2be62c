//! Listener construction and connection dispatch.
//!
//! Each launch binds a TCP listener, spawns an accept loop, and hands the
//! bound endpoint back as a [`ServerHandle`]. Accepted connections are served
//! with hyper and dispatched to the configured [`Handler`](crate::Handler).

mod http;
mod https;

pub(crate) use http::launch_http;
pub(crate) use https::launch_https;

use crate::config::Protocol;
use crate::handler::SharedHandler;
use crate::tls::TlsError;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::debug;

/// Errors from one listener launch attempt.
///
/// A failure is contained to its own protocol; it never aborts the other
/// listener's attempt.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("invalid bind address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error(transparent)]
    Tls(#[from] TlsError),
}

/// A live, accepting listener.
///
/// Dropping the handle leaves the accept loop running; [`stop`](Self::stop)
/// aborts it. In-flight connections are not drained.
#[derive(Debug)]
pub struct ServerHandle {
    protocol: Protocol,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub(crate) fn new(protocol: Protocol, local_addr: SocketAddr, task: JoinHandle<()>) -> Self {
        Self {
            protocol,
            local_addr,
            task,
        }
    }

    /// Protocol this listener serves.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections.
    pub fn stop(&self) {
        self.task.abort();
    }
}

/// Resolve the configured bind address.
///
/// A configured address is always honored; absent one, the listener binds
/// all interfaces.
pub(crate) fn resolve_bind_addr(ip: Option<&str>, port: u16) -> Result<SocketAddr, ListenError> {
    match ip {
        Some(text) => {
            let ip: IpAddr = text.parse().map_err(|source| ListenError::InvalidAddress {
                addr: text.to_string(),
                source,
            })?;
            Ok(SocketAddr::new(ip, port))
        }
        None => Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)),
    }
}

/// Serve one connection with hyper, dispatching requests to the handler.
pub(crate) async fn serve_connection<I>(io: I, handler: SharedHandler, peer: SocketAddr)
where
    I: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |request| {
        let handler = handler.clone();
        async move { Ok::<_, Infallible>(handler.handle(request).await) }
    });

    if let Err(e) = http1::Builder::new()
        .keep_alive(true)
        .serve_connection(TokioIo::new(io), service)
        .await
    {
        debug!(peer = %peer, error = %e, "connection error");
    }
}
