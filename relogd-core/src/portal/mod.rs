//! Captive portal module
//!
//! Gateway login, connectivity probing and the reconnection loops.

pub mod auth;
pub mod coordinator;
pub mod envelope;
pub mod probe;
pub mod service;

// Public re-exports
pub use auth::{Authenticator, LoginOutcome, PortalAuthenticator};
pub use coordinator::{CoordinatorHandle, CoordinatorReport, ReconnectCoordinator, StopSignal};
pub use probe::{ConnectivityProbe, ConnectivityResult, HttpProbe};
pub use service::{build_coordinator, run_service, PortalCoordinator};
