//! Termination signal handling
//!
//! Turns SIGINT/SIGTERM into a raised `StopSignal`.

use relogd_core::portal::StopSignal;
use tracing::{error, info};

/// Wait for a termination request, then raise `stop`
pub async fn stop_on_termination(stop: StopSignal) {
    match wait_for_termination().await {
        Ok(signal) => {
            info!(signal, "Termination requested, stopping");
            stop.stop();
        }
        Err(e) => error!("Failed to install signal handlers: {}", e),
    }
}

#[cfg(unix)]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "ctrl-c")
}
