//! One-shot connectivity check command

use relogd_core::config::toml_config::load_settings_from_path;
use relogd_core::error::RelogError;
use relogd_core::portal::{ConnectivityProbe, HttpProbe};
use std::path::Path;

/// Run one connectivity probe and report the result
pub fn run_probe(config_path: &Path) -> Result<(), RelogError> {
    let settings = load_settings_from_path(config_path)?;
    let probe = HttpProbe::new(
        settings.monitor.probe_endpoint.clone(),
        settings.monitor.timeout(),
    )?;

    let result = super::single_threaded_runtime()?.block_on(probe.check());

    if result.is_reachable() {
        println!(
            "✓ {} reachable in {}ms",
            probe.endpoint(),
            result.duration().as_millis()
        );
        Ok(())
    } else {
        Err(RelogError::Unreachable {
            reason: result.error().unwrap_or("unknown").to_string(),
        })
    }
}
