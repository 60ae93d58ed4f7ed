//! Type definitions and wrappers for secure data handling
//!
//! Credentials wrap the password in the secrecy crate so it cannot end up
//! in logs or debug output by accident.

use secrecy::{ExposeSecret, Secret};

/// Gateway account credentials
///
/// Immutable once loaded; owned by the authenticator.
#[derive(Clone, Debug)]
pub struct Credentials {
    user: String,
    password: Secret<String>,
    isp: String,
}

impl Credentials {
    /// Create credentials from their components
    pub fn new(user: impl Into<String>, password: Secret<String>, isp: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password,
            isp: isp.into(),
        }
    }

    /// Account name
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Expose the password value (use with caution!)
    ///
    /// Only the login request builder should need this.
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }

    /// The `user_account` value the gateway expects: `,0,<user>@<isp>`
    pub fn account_param(&self) -> String {
        format!(",0,{}@{}", self.user, self.isp)
    }
}
