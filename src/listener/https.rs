//! Secure listener launch.

use crate::config::{HttpsLaunch, Protocol};
use crate::handler::SharedHandler;
use crate::listener::{resolve_bind_addr, serve_connection, ListenError, ServerHandle};
use crate::tls;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info, warn};

/// Load certificate material, bind the secure listener, and start its accept
/// loop.
///
/// Material is loaded before the bind so an unreadable key or certificate
/// fails the attempt without ever opening a socket.
pub(crate) async fn launch_https(launch: HttpsLaunch) -> Result<ServerHandle, ListenError> {
    let tls_config = tls::load_server_config(&launch.tls)?;
    let acceptor = TlsAcceptor::from(tls_config);

    let addr = resolve_bind_addr(launch.ip.as_deref(), launch.port)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenError::Bind { addr, source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ListenError::Bind { addr, source })?;

    info!(addr = %local_addr, "https listener bound");

    let task = tokio::spawn(accept_loop(listener, acceptor, launch.handler));
    Ok(ServerHandle::new(Protocol::Https, local_addr, task))
}

/// Accept connections, complete the TLS handshake, and serve. A failed
/// handshake only drops that connection.
async fn accept_loop(listener: TcpListener, acceptor: TlsAcceptor, handler: SharedHandler) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(error = %e, "failed to set TCP_NODELAY");
                }
                let acceptor = acceptor.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => serve_connection(tls_stream, handler, peer).await,
                        Err(e) => {
                            debug!(peer = %peer, error = %e, "TLS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "failed to accept connection");
            }
        }
    }
}
