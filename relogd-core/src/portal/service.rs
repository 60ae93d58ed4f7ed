//! Service startup and lifetime
//!
//! Wires settings into a coordinator and applies the startup policy: the
//! loops are spawned first, then the initial login decides whether
//! monitoring is armed or startup is aborted.

use crate::config::Settings;
use crate::error::{ConfigError, RelogError};
use crate::portal::auth::{Authenticator, PortalAuthenticator};
use crate::portal::coordinator::{stopped, CoordinatorReport, ReconnectCoordinator, StopSignal};
use crate::portal::probe::{ConnectivityProbe, HttpProbe};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Coordinator backed by the HTTP authenticator and probe
pub type PortalCoordinator = ReconnectCoordinator<PortalAuthenticator, HttpProbe>;

/// Build the production coordinator from settings
pub fn build_coordinator(settings: &Settings) -> Result<PortalCoordinator, ConfigError> {
    let authenticator = PortalAuthenticator::new(settings.credentials(), settings.gateway.clone())?;
    let probe = HttpProbe::new(
        settings.monitor.probe_endpoint.clone(),
        settings.monitor.timeout(),
    )?;

    Ok(ReconnectCoordinator::new(
        Arc::new(authenticator),
        Arc::new(probe),
        settings.monitor.poll_interval(),
    ))
}

/// Run the service until `stop` is raised
///
/// The coordinator is started before the initial login. If that login
/// fails and `force_start` is unset, both loops are stopped before any
/// probe and `RelogError::Startup` is returned. Otherwise monitoring is
/// armed and this returns once both loops have exited.
///
/// A stop raised before or during the initial login is a clean shutdown:
/// the login is skipped or abandoned and the (empty) report is returned.
pub async fn run_service<A, P>(
    coordinator: &ReconnectCoordinator<A, P>,
    force_start: bool,
    stop: &StopSignal,
) -> Result<CoordinatorReport, RelogError>
where
    A: Authenticator + ?Sized + 'static,
    P: ConnectivityProbe + ?Sized + 'static,
{
    let handle = coordinator.start_deferred(stop);
    let mut stop_rx = stop.subscribe();

    let outcome = tokio::select! {
        biased;
        _ = stopped(&mut stop_rx) => {
            info!("Stop requested during startup, skipping initial login");
            return Ok(handle.wait().await?);
        }
        outcome = coordinator.login_once() => outcome,
    };
    if outcome.is_success() {
        info!("Initial login succeeded");
    } else {
        let reason = outcome
            .failure_reason()
            .unwrap_or_else(|| "unknown".to_string());

        if !force_start {
            error!(reason = %reason, "Initial login failed, stopping startup");
            stop.stop();
            handle.wait().await?;
            return Err(RelogError::Startup { reason });
        }

        warn!(
            reason = %reason,
            "Initial login failed, starting anyway because force_start is set"
        );
    }

    info!(
        interval_secs = coordinator.poll_interval().as_secs(),
        "Entering service phase"
    );
    handle.arm();

    Ok(handle.wait().await?)
}
