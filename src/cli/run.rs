//! Service command
//!
//! Loads settings, optionally detaches, then runs the coordinator until a
//! termination signal arrives.

use crate::daemon::process::{get_default_pid_file, DaemonProcess};
use crate::daemon::signals::stop_on_termination;
use relogd_core::config::toml_config::load_settings_from_path;
use relogd_core::error::RelogError;
use relogd_core::portal::{build_coordinator, run_service, StopSignal};
use std::path::{Path, PathBuf};
use tokio::runtime::Builder;
use tracing::info;

/// Run the connectivity-maintenance service
pub fn run_daemon(
    config_path: &Path,
    detach: bool,
    pid_file: Option<PathBuf>,
) -> Result<(), RelogError> {
    let settings = load_settings_from_path(config_path)?;

    // Forking is only safe before the runtime spawns its worker threads
    let _daemon = if detach {
        let mut daemon = DaemonProcess::new(pid_file.unwrap_or_else(get_default_pid_file));
        if daemon.is_running()? {
            return Err(RelogError::Daemon {
                reason: format!(
                    "Another instance is already running (PID {})",
                    daemon.get_pid()?
                ),
            });
        }
        daemon.daemonize(settings.log.as_deref(), settings.err_log.as_deref())?;
        Some(daemon)
    } else {
        None
    };

    let runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let coordinator = build_coordinator(&settings)?;
        let stop = StopSignal::new();
        let signals = tokio::spawn(stop_on_termination(stop.clone()));

        let result = run_service(&coordinator, settings.force_start, &stop).await;
        signals.abort();

        let report = result?;
        info!(
            probes = report.probes,
            login_attempts = report.login_attempts,
            login_failures = report.login_failures,
            "Service stopped"
        );
        Ok::<(), RelogError>(())
    })
}
