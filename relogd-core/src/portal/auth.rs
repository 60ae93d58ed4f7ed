//! Gateway authentication
//!
//! This module provides the `Authenticator` capability and the
//! `PortalAuthenticator` that logs into the captive portal over HTTP.

use crate::config::{validate_http_url, GatewayConfig};
use crate::error::{ConfigError, LoginError};
use crate::portal::envelope;
use crate::types::Credentials;
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of a single login attempt
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    success: bool,
    duration: Duration,
    error: Option<LoginError>,
}

impl LoginOutcome {
    /// Create a successful login outcome
    pub fn success(duration: Duration) -> Self {
        Self {
            success: true,
            duration,
            error: None,
        }
    }

    /// Create a failed login outcome
    pub fn failure(duration: Duration, error: LoginError) -> Self {
        Self {
            success: false,
            duration,
            error: Some(error),
        }
    }

    /// Check if the login succeeded
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get the duration of the attempt
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Get the failure kind if the login failed
    pub fn error(&self) -> Option<&LoginError> {
        self.error.as_ref()
    }

    /// Human readable failure reason
    pub fn failure_reason(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Convert into a plain `Result`
    pub fn into_result(self) -> Result<(), LoginError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Performs one login attempt against the gateway
///
/// Implementations must not retry internally; retry policy belongs to the
/// coordinator.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self) -> LoginOutcome;
}

/// Logs into the campus portal with a JSONP GET request
#[derive(Debug)]
pub struct PortalAuthenticator {
    client: Client,
    credentials: Credentials,
    gateway: GatewayConfig,
}

impl PortalAuthenticator {
    /// Create a new authenticator
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the gateway endpoint is not an
    /// http(s) URL or the HTTP client cannot be built.
    pub fn new(credentials: Credentials, gateway: GatewayConfig) -> Result<Self, ConfigError> {
        validate_http_url("gateway.endpoint", &gateway.endpoint)?;

        let client = Client::builder()
            .timeout(gateway.timeout())
            .use_rustls_tls()
            .build()
            .map_err(|e| ConfigError::InvalidUrl {
                field: "gateway.endpoint".to_string(),
                reason: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            credentials,
            gateway,
        })
    }

    async fn fetch(&self) -> Result<String, LoginError> {
        let account = self.credentials.account_param();
        let query = [
            ("callback", self.gateway.callback.as_str()),
            ("login_method", self.gateway.login_method.as_str()),
            ("user_account", account.as_str()),
            ("user_password", self.credentials.expose_password()),
            ("wlan_user_ip", self.gateway.client_ip.as_str()),
        ];

        let response = self
            .client
            .get(&self.gateway.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| LoginError::Transport {
                reason: describe_transport_error(e, self.gateway.timeout()),
            })?;

        debug!(status = %response.status(), "Gateway responded");

        response.text().await.map_err(|e| LoginError::Transport {
            reason: format!("Failed to read response body: {}", e.without_url()),
        })
    }
}

#[async_trait]
impl Authenticator for PortalAuthenticator {
    /// Send the login request and decode the gateway verdict
    #[tracing::instrument(skip(self), fields(endpoint = %self.gateway.endpoint, user = %self.credentials.user()))]
    async fn login(&self) -> LoginOutcome {
        let start = Instant::now();

        let verdict = match self.fetch().await {
            Ok(body) => envelope::interpret(&body),
            Err(e) => Err(e),
        };
        let duration = start.elapsed();

        match verdict {
            Ok(()) => {
                info!(duration_ms = duration.as_millis(), "Login successful");
                LoginOutcome::success(duration)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Login failed"
                );
                LoginOutcome::failure(duration, e)
            }
        }
    }
}

/// Describe a reqwest failure without echoing the request URL
///
/// The URL carries the password in its query string.
pub(crate) fn describe_transport_error(e: reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("Request timeout after {:?}", timeout)
    } else if e.is_connect() {
        "Connection refused or unreachable".to_string()
    } else {
        format!("Request failed: {}", e.without_url())
    }
}
