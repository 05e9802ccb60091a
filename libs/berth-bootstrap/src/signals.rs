use anyhow::Result;
use tokio::signal;

/// Wait for termination signals (Ctrl+C, SIGTERM).
///
/// The host registers this future as its stop-signal source; on
/// non-unix platforms only Ctrl+C is watched.
pub async fn wait_for_shutdown() -> Result<()> {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(%e, "Failed to install Ctrl+C handler");
            return Err(e);
        }
        Ok(())
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal_handler) => {
                signal_handler.recv().await;
                Ok(())
            }
            Err(e) => {
                tracing::error!(%e, "Failed to install SIGTERM handler");
                Err(e)
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<std::io::Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            tracing::info!("Received Ctrl+C signal");
        },
        result = terminate => {
            result?;
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Shutdown signal received, initiating graceful shutdown");
    Ok(())
}
