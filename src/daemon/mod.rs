//! Daemon support for the service command
//!
//! Detaching, PID file management and termination signals.

pub mod process;
pub mod signals;
