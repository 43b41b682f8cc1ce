//! Shutdown on SIGINT/SIGTERM

use tokio_util::sync::CancellationToken;

/// Wait for a termination signal, then cancel `token`
#[allow(clippy::needless_pass_by_value)] // Moved into a spawned task
pub async fn cancel_on_signal(token: CancellationToken) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM - shutting down");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT - shutting down");
        }
        () = token.cancelled() => return Ok(()),
    }

    token.cancel();
    Ok(())
}
