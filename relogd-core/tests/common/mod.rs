//! Scripted test doubles for the authenticator and probe capabilities
#![allow(dead_code)]

use async_trait::async_trait;
use relogd_core::error::LoginError;
use relogd_core::portal::{Authenticator, ConnectivityProbe, ConnectivityResult, LoginOutcome};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Probe that replays a script of reachability results, then a fallback
pub struct ScriptedProbe {
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    delay: Duration,
    calls: AtomicU64,
}

impl ScriptedProbe {
    pub fn new(script: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicU64::new(0),
        }
    }

    pub fn always(reachable: bool) -> Self {
        Self::new([], reachable)
    }

    /// Make every check take `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectivityProbe for ScriptedProbe {
    async fn check(&self) -> ConnectivityResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reachable = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if reachable {
            ConnectivityResult::reachable(Duration::ZERO)
        } else {
            ConnectivityResult::unreachable(Duration::ZERO, "scripted failure".to_string())
        }
    }
}

/// Authenticator that counts calls and concurrent logins
pub struct CountingAuthenticator {
    delay: Duration,
    failure: Option<LoginError>,
    calls: AtomicU64,
    in_flight: AtomicU64,
    max_in_flight: AtomicU64,
}

impl CountingAuthenticator {
    pub fn succeeding() -> Self {
        Self::with(Duration::ZERO, None)
    }

    pub fn failing(error: LoginError) -> Self {
        Self::with(Duration::ZERO, Some(error))
    }

    pub fn slow(delay: Duration) -> Self {
        Self::with(delay, None)
    }

    pub fn with(delay: Duration, failure: Option<LoginError>) -> Self {
        Self {
            delay,
            failure,
            calls: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            max_in_flight: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> u64 {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicU64);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Authenticator for CountingAuthenticator {
    async fn login(&self) -> LoginOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.failure {
            Some(error) => LoginOutcome::failure(self.delay, error.clone()),
            None => LoginOutcome::success(self.delay),
        }
    }
}
