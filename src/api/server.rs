//! Registry server lifecycle: bind, spawn the axum server in a background
//! task, return a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::registry_router;
use crate::db::RegistryStore;

/// Handle to a running registry server.
pub struct RegistryServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RegistryServer {
    /// Signal a graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Registry server shutdown signal sent");
        }
    }

    /// Shut down and wait for the server task to exit.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Err(e) = self.task.await {
            tracing::error!("Registry server task failed: {e}");
        }
    }
}

/// Bind `addr` and serve the registry API in a background tokio task.
///
/// Port `0` binds an ephemeral port; the bound address is on the handle.
pub async fn start_server(
    store: Arc<dyn RegistryStore>,
    addr: SocketAddr,
) -> std::io::Result<RegistryServer> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let app = registry_router(store);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Registry server received shutdown signal");
        };

        tracing::info!(%addr, "Registry server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Registry server error: {e}");
        }

        tracing::info!("Registry server stopped");
    });

    Ok(RegistryServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
