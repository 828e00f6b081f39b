use anyhow::{Context, Result};
use log::info;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

/// Cancel `token` when the process receives SIGTERM or SIGINT.
///
/// # Errors
/// Returns an error if either signal handler cannot be installed.
pub fn install_shutdown_handler(token: CancellationToken) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, stopping judges"),
            _ = sigint.recv() => info!("received SIGINT, stopping judges"),
        }
        token.cancel();
    });

    Ok(())
}
