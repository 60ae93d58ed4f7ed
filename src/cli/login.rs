//! One-shot login command

use relogd_core::config::toml_config::load_settings_from_path;
use relogd_core::error::RelogError;
use relogd_core::portal::{Authenticator, PortalAuthenticator};
use std::path::Path;

/// Attempt a single login and report the outcome
pub fn run_login(config_path: &Path) -> Result<(), RelogError> {
    let settings = load_settings_from_path(config_path)?;
    let authenticator = PortalAuthenticator::new(settings.credentials(), settings.gateway.clone())?;

    let outcome = super::single_threaded_runtime()?.block_on(authenticator.login());

    match outcome.into_result() {
        Ok(()) => {
            println!("✓ Logged in as {}@{}", settings.user, settings.isp);
            Ok(())
        }
        Err(e) => Err(RelogError::Login(e)),
    }
}
