//! HTTP server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.
//! A sweeper task drops idle sessions until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::web_router;
use crate::core_state::CoreState;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running server.
pub struct WebServer {
    pub info: ServerInfo,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl WebServer {
    /// Ask the server to stop accepting connections and drain.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            tracing::error!("Server task failed: {e}");
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Bind `addr` and serve the web router in a background task.
pub async fn start_server(core: Arc<CoreState>, addr: SocketAddr) -> Result<WebServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = web_router(core.clone());

    let info = ServerInfo {
        addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let (sweep_stop_tx, sweep_stop_rx) = oneshot::channel::<()>();
        let sweeper = tokio::spawn(sweep_sessions(core, sweep_stop_rx));

        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Server received shutdown signal");
        };

        tracing::info!(%addr, "Server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Server error: {e}");
        }

        let _ = sweep_stop_tx.send(());
        let _ = sweeper.await;
        tracing::info!("Server stopped");
    });

    Ok(WebServer {
        info,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

async fn sweep_sessions(core: Arc<CoreState>, mut stop: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match core.sessions() {
                    Ok(mut sessions) => {
                        let dropped = sessions.prune();
                        if dropped > 0 {
                            tracing::debug!(dropped, "Idle sessions pruned");
                        }
                    }
                    Err(e) => tracing::warn!("Session sweep skipped: {e}"),
                }
            }
            _ = &mut stop => break,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
