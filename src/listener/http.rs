//! Plaintext listener launch.

use crate::config::{HttpLaunch, Protocol};
use crate::handler::SharedHandler;
use crate::listener::{resolve_bind_addr, serve_connection, ListenError, ServerHandle};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Bind the plaintext listener and start its accept loop.
pub(crate) async fn launch_http(launch: HttpLaunch) -> Result<ServerHandle, ListenError> {
    let addr = resolve_bind_addr(launch.ip.as_deref(), launch.port)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ListenError::Bind { addr, source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| ListenError::Bind { addr, source })?;

    info!(addr = %local_addr, "http listener bound");

    let task = tokio::spawn(accept_loop(listener, launch.handler));
    Ok(ServerHandle::new(Protocol::Http, local_addr, task))
}

/// Accept connections until the handle is stopped.
async fn accept_loop(listener: TcpListener, handler: SharedHandler) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!(error = %e, "failed to set TCP_NODELAY");
                }
                let handler = handler.clone();
                tokio::spawn(async move {
                    serve_connection(stream, handler, peer).await;
                });
            }
            Err(e) => {
                error!(error = %e, "failed to accept connection");
            }
        }
    }
}
