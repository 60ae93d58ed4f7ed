//! CLI command implementations
//!
//! This module contains the implementation of all CLI subcommands.

pub mod login;
pub mod probe;
pub mod run;

use relogd_core::error::RelogError;
use tokio::runtime::{Builder, Runtime};

/// Runtime for the one-shot commands
fn single_threaded_runtime() -> Result<Runtime, RelogError> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}
