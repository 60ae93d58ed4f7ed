//! Error types for the relogd daemon
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Main error type for the relogd application
#[derive(Error, Debug)]
pub enum RelogError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A single login attempt against the gateway failed
    #[error("Login error: {0}")]
    Login(#[from] LoginError),

    /// The monitoring loops could not be joined cleanly
    #[error("Coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// The initial login failed and force start is disabled
    #[error("Initial login failed, stopping startup: {reason}")]
    Startup { reason: String },

    /// The connectivity probe could not reach its endpoint
    #[error("Endpoint unreachable: {reason}")]
    Unreachable { reason: String },

    /// Daemonization or PID file handling failed
    #[error("Daemon error: {reason}")]
    Daemon { reason: String },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Invalid endpoint URL for {field}: {reason}")]
    InvalidUrl { field: String, reason: String },

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Reasons a login attempt can fail
///
/// Transport failures, protocol failures (envelope/JSON) and gateway
/// verdicts are kept apart so callers can tell "no network" from
/// "wrong password".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("Gateway unreachable: {reason}")]
    Transport { reason: String },

    #[error("Malformed response envelope: {body}")]
    MalformedEnvelope { body: String },

    #[error("Invalid JSON in response envelope: {reason}")]
    InvalidJson { reason: String },

    #[error("Gateway response has no info field")]
    MissingInfo,

    #[error("Gateway rejected login: {message}")]
    Rejected { message: String },

    #[error("Unexpected gateway info code: {code}")]
    UnexpectedInfo { code: i64 },
}

impl LoginError {
    /// Whether the failure happened before any response was received
    pub fn is_transport(&self) -> bool {
        matches!(self, LoginError::Transport { .. })
    }

    /// Whether the gateway answered with something we could not decode
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            LoginError::MalformedEnvelope { .. } | LoginError::InvalidJson { .. }
        )
    }
}

/// Failures while joining the coordinator's background tasks
#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("{task} loop terminated abnormally: {reason}")]
    TaskFailed { task: &'static str, reason: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RelogError>;
