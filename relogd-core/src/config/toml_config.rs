//! TOML configuration file loading
//!
//! Reads daemon settings from a TOML file and validates them before
//! anything else runs.

use crate::config::Settings;
use crate::error::{ConfigError, RelogError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";

/// Parse settings from TOML text and validate them
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| {
        RelogError::Config(ConfigError::ValidationError {
            message: format!("Failed to parse config file: {}", e),
        })
    })?;

    settings.validate().map_err(|e| {
        warn!("Configuration validation failed: {}", e);
        RelogError::Config(e)
    })?;

    if !settings.interface.is_empty() {
        debug!(
            interfaces = ?settings.interface,
            "The interface setting is accepted for compatibility and ignored"
        );
    }

    Ok(settings)
}

/// Load settings from a specific TOML file
pub fn load_settings_from_path<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RelogError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => RelogError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let settings = parse_settings(&contents)?;

    info!(
        "Loaded configuration for {}@{}: gateway={}, probe={}, interval={}s, force_start={}",
        settings.user,
        settings.isp,
        settings.gateway.endpoint,
        settings.monitor.probe_endpoint,
        settings.monitor.poll_interval_secs,
        settings.force_start
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_legacy_layout() {
        let settings = parse_settings(
            r#"
user = "20231234"
password = "hunter2"
isp = "cmcc"
interface = ["eth0"]
err_log = "/var/log/relogd.err"
log = "/var/log/relogd.log"
force_start = true
"#,
        )
        .unwrap();

        assert_eq!(settings.user, "20231234");
        assert!(settings.force_start);
        assert_eq!(settings.gateway.callback, "dr1003");
        assert_eq!(settings.monitor.poll_interval_secs, 10);
        assert_eq!(
            settings.log.as_deref(),
            Some(Path::new("/var/log/relogd.log"))
        );
    }

    #[test]
    fn test_parse_rejects_missing_user() {
        let result = parse_settings("password = \"x\"\nisp = \"cmcc\"\n");
        assert!(matches!(
            result,
            Err(RelogError::Config(ConfigError::MissingField { .. }))
        ));
    }
}
