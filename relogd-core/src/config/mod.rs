//! Configuration module
//!
//! Holds the daemon settings. They are loaded once at startup and passed
//! explicitly to the components that need them.

use crate::error::ConfigError;
use crate::types::Credentials;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub mod toml_config;

/// Shortest poll interval that still leaves room for a 1 second timeout
pub const MIN_POLL_INTERVAL_SECS: u64 = 2;

/// Complete daemon settings
///
/// Top-level keys match the historical `config.toml` layout; the
/// `[gateway]` and `[monitor]` tables are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Gateway account name
    #[serde(default)]
    pub user: String,

    /// Gateway account password
    #[serde(default = "empty_secret")]
    pub password: Secret<String>,

    /// ISP identifier appended to the account name
    #[serde(default)]
    pub isp: String,

    /// Keep monitoring even if the initial login fails
    #[serde(default)]
    pub force_start: bool,

    /// Network interfaces (accepted for compatibility, unused)
    #[serde(default)]
    pub interface: Vec<String>,

    /// File receiving daemon stdout when detached
    #[serde(default)]
    pub log: Option<PathBuf>,

    /// File receiving daemon stderr when detached
    #[serde(default)]
    pub err_log: Option<PathBuf>,

    /// Login endpoint settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Connectivity monitoring settings
    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn empty_secret() -> Secret<String> {
    Secret::new(String::new())
}

/// Login endpoint parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayConfig {
    /// Login URL (without query string)
    #[serde(default = "default_gateway_endpoint")]
    pub endpoint: String,

    /// JSONP callback name the gateway wraps its reply in
    #[serde(default = "default_callback")]
    pub callback: String,

    /// Value of the `login_method` query parameter
    #[serde(default = "default_login_method")]
    pub login_method: String,

    /// Client address reported in `wlan_user_ip`
    #[serde(default = "default_client_ip")]
    pub client_ip: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Connectivity monitoring parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Well-known external endpoint used as heartbeat
    #[serde(default = "default_probe_endpoint")]
    pub probe_endpoint: String,

    /// Seconds between two probes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Probe request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gateway_endpoint() -> String {
    "http://10.50.255.11:801/eportal/portal/login".to_string()
}
fn default_callback() -> String {
    "dr1003".to_string()
}
fn default_login_method() -> String {
    "1".to_string()
}
fn default_client_ip() -> String {
    "10.38.64.137".to_string()
}
fn default_probe_endpoint() -> String {
    "http://www.baidu.com".to_string()
}
fn default_poll_interval() -> u64 {
    10
}
fn default_timeout_secs() -> u64 {
    5
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_gateway_endpoint(),
            callback: default_callback(),
            login_method: default_login_method(),
            client_ip: default_client_ip(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probe_endpoint: default_probe_endpoint(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Create settings with default gateway and monitor tables
    pub fn new(user: String, password: String, isp: String) -> Self {
        Self {
            user,
            password: Secret::new(password),
            isp,
            force_start: false,
            interface: Vec::new(),
            log: None,
            err_log: None,
            gateway: GatewayConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }

    /// Build the credentials handed to the authenticator
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.user.clone(), self.password.clone(), self.isp.clone())
    }

    /// Validate the settings
    ///
    /// # Returns
    ///
    /// * `Ok(())` if all fields are valid
    /// * `Err(ConfigError)` with the first problem encountered
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_credentials()?;
        validate_http_url("gateway.endpoint", &self.gateway.endpoint)?;
        validate_http_url("monitor.probe_endpoint", &self.monitor.probe_endpoint)?;
        self.validate_timing()?;

        if self.gateway.callback.is_empty() {
            return Err(ConfigError::MissingField {
                field: "gateway.callback".to_string(),
            });
        }

        Ok(())
    }

    fn validate_credentials(&self) -> Result<(), ConfigError> {
        let missing = if self.user.trim().is_empty() {
            Some("user")
        } else if self.password.expose_secret().is_empty() {
            Some("password")
        } else if self.isp.trim().is_empty() {
            Some("isp")
        } else {
            None
        };

        match missing {
            Some(field) => Err(ConfigError::MissingField {
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Request timeouts must be non-zero and shorter than the poll interval,
    /// which leaves 2 seconds as the shortest usable interval
    fn validate_timing(&self) -> Result<(), ConfigError> {
        let interval = self.monitor.poll_interval_secs;
        if interval < MIN_POLL_INTERVAL_SECS {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "monitor.poll_interval_secs must be at least {}, got: {}",
                    MIN_POLL_INTERVAL_SECS, interval
                ),
            });
        }

        for (field, timeout) in [
            ("gateway.timeout_secs", self.gateway.timeout_secs),
            ("monitor.timeout_secs", self.monitor.timeout_secs),
        ] {
            if timeout == 0 || timeout >= interval {
                return Err(ConfigError::ValidationError {
                    message: format!(
                        "{} must be between 1 and {} (poll interval), got: {}",
                        field,
                        interval - 1,
                        timeout
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Check that `value` parses as an http:// or https:// URL
pub(crate) fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    use url::Url;

    match Url::parse(value) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConfigError::InvalidUrl {
                field: field.to_string(),
                reason: format!("URL scheme must be http or https, got: {}", scheme),
            }),
        },
        Err(e) => Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            reason: format!("Failed to parse URL: {}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings::new(
            "20231234".to_string(),
            "hunter2".to_string(),
            "cmcc".to_string(),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_empty_password_rejected() {
        let settings = Settings::new("alice".to_string(), String::new(), "cmcc".to_string());
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field } if field == "password"));
    }

    #[test]
    fn test_timeout_must_be_shorter_than_interval() {
        let mut settings = valid_settings();
        settings.monitor.timeout_secs = 10;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("monitor.timeout_secs"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut settings = valid_settings();
        settings.monitor.poll_interval_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_one_second_interval_rejected_with_minimum() {
        let mut settings = valid_settings();
        settings.monitor.poll_interval_secs = 1;
        settings.monitor.timeout_secs = 1;
        let err = settings.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration validation error: monitor.poll_interval_secs must be at least 2, got: 1"
        );
    }

    #[test]
    fn test_two_second_interval_with_one_second_timeouts_accepted() {
        let mut settings = valid_settings();
        settings.monitor.poll_interval_secs = 2;
        settings.monitor.timeout_secs = 1;
        settings.gateway.timeout_secs = 1;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_non_http_probe_endpoint_rejected() {
        let mut settings = valid_settings();
        settings.monitor.probe_endpoint = "ftp://example.com".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }
}
