use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::{signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Turns SIGINT/SIGTERM into a cancelled token that running checks observe.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn register_handlers(&self) {
        let coordinator = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                name = wait_for_signal() => {
                    info!(signal = name, "Shutdown signal received");
                    coordinator.requested.store(true, Ordering::SeqCst);
                    coordinator.token.cancel();
                }
                _ = coordinator.token.cancelled() => {}
            }
        });
    }

    /// Runs `on_cancel` once the token fires. Abort the handle when the
    /// guarded work finishes first.
    pub fn forward<F>(&self, on_cancel: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.token.clone();
        tokio::spawn(async move {
            token.cancelled().await;
            warn!("Forwarding shutdown to running work");
            on_cancel();
        })
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install SIGINT handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_forward_runs_on_cancel() {
        let token = CancellationToken::new();
        let coordinator = ShutdownCoordinator::new(token.clone());
        let calls = Arc::new(AtomicUsize::new(0));

        let seen = calls.clone();
        let handle = coordinator.forward(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        token.cancel();
        handle.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_shutdown_requested());
    }
}
