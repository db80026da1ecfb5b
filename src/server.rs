//! Binds the control-channel listener and spawns one [`Session`] per
//! accepted connection.

use crate::session::Session;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Listens on `bind_address`, spawning an independent session task for each
/// incoming control connection. Accept errors are logged and do not stop the
/// server; a session's own errors are scoped to that session.
pub async fn listen(bind_address: std::net::SocketAddr, root: PathBuf) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_address).await?;
    tracing::info!(%bind_address, "listening for control connections");
    let root = Arc::new(root);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::info!(%peer, "accepted control connection");
                let root = Arc::clone(&root);
                let local_addr = match stream.local_addr() {
                    Ok(addr) => addr,
                    Err(e) => {
                        tracing::warn!("could not read local address for {peer}: {e}");
                        continue;
                    }
                };
                tokio::spawn(async move {
                    let session = Session::new((*root).clone(), local_addr);
                    session.run(stream).await;
                });
            }
            Err(e) => {
                tracing::warn!("error accepting incoming control connection: {e}");
            }
        }
    }
}
