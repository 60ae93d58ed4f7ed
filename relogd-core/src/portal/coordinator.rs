//! Connectivity monitoring and automatic re-authentication
//!
//! `ReconnectCoordinator` runs two background tasks:
//!
//! - the **monitor loop** probes connectivity on a fixed interval and, for
//!   every unreachable result, requests a reconnect;
//! - the **reconnect loop** consumes those requests one at a time and
//!   performs a single login attempt for each.
//!
//! Requests travel over a channel of depth 1 filled with `try_send`, so the
//! monitor loop never waits for a login. While a request is already pending,
//! further requests are coalesced into it. Both loops observe one shared
//! `StopSignal` and are joined through `CoordinatorHandle::wait`.

use crate::error::CoordinatorError;
use crate::portal::auth::{Authenticator, LoginOutcome};
use crate::portal::probe::ConnectivityProbe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pending reconnect requests kept while a login is in flight
const TRIGGER_CAPACITY: usize = 1;

/// Process-wide cooperative stop signal
///
/// Cloning is cheap; every clone controls the same signal. Once stopped it
/// stays stopped. Dropping every clone also counts as a stop for the loops.
#[derive(Debug, Clone)]
pub struct StopSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Ask every loop observing this signal to exit
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Get a receiver to observe the signal
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves once the stop signal is raised or its sender is gone
pub(crate) async fn stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Resolves to `true` once armed, `false` if the arming side went away
async fn armed(rx: &mut watch::Receiver<bool>) -> bool {
    rx.wait_for(|armed| *armed).await.is_ok()
}

/// Counters collected by both loops, returned once they have exited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorReport {
    /// Probes completed by the monitor loop
    pub probes: u64,
    /// Probes that found the endpoint unreachable
    pub unreachable: u64,
    /// Reconnect requests handed to the reconnect loop
    pub triggers_sent: u64,
    /// Reconnect requests merged into one already pending
    pub triggers_coalesced: u64,
    /// Logins started by the reconnect loop
    pub login_attempts: u64,
    /// Logins that completed unsuccessfully
    pub login_failures: u64,
}

#[derive(Debug, Default)]
struct MonitorReport {
    probes: u64,
    unreachable: u64,
    triggers_sent: u64,
    triggers_coalesced: u64,
}

#[derive(Debug, Default)]
struct ReconnectReport {
    login_attempts: u64,
    login_failures: u64,
}

/// Owns the monitoring and reconnect loops
///
/// Every login, whether issued by the reconnect loop or through
/// `login_once`, goes through one gate, so at most one login is in flight.
pub struct ReconnectCoordinator<A: ?Sized, P: ?Sized> {
    authenticator: Arc<A>,
    probe: Arc<P>,
    poll_interval: Duration,
    login_gate: Arc<Mutex<()>>,
}

impl<A, P> ReconnectCoordinator<A, P>
where
    A: Authenticator + ?Sized + 'static,
    P: ConnectivityProbe + ?Sized + 'static,
{
    /// Create a new coordinator
    ///
    /// # Arguments
    ///
    /// * `authenticator` - Performs login attempts
    /// * `probe` - Performs connectivity checks
    /// * `poll_interval` - Fixed delay between two probes
    pub fn new(authenticator: Arc<A>, probe: Arc<P>, poll_interval: Duration) -> Self {
        Self {
            authenticator,
            probe,
            poll_interval,
            login_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Spawn both loops and start probing immediately
    pub fn start(&self, stop: &StopSignal) -> CoordinatorHandle {
        let handle = self.start_deferred(stop);
        handle.arm();
        handle
    }

    /// Spawn both loops, holding the first probe until `CoordinatorHandle::arm`
    ///
    /// The reconnect loop is live right away; the monitor loop only waits
    /// for arming or for the stop signal.
    pub fn start_deferred(&self, stop: &StopSignal) -> CoordinatorHandle {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_CAPACITY);
        let (arm_tx, arm_rx) = watch::channel(false);

        let monitor = tokio::spawn(monitor_loop(
            Arc::clone(&self.probe),
            self.poll_interval,
            trigger_tx,
            arm_rx,
            stop.subscribe(),
        ));

        let reconnect = tokio::spawn(reconnect_loop(
            Arc::clone(&self.authenticator),
            Arc::clone(&self.login_gate),
            trigger_rx,
            stop.subscribe(),
        ));

        CoordinatorHandle {
            monitor,
            reconnect,
            arm: arm_tx,
        }
    }

    /// Perform one login outside the reconnect loop
    ///
    /// Waits for any login the reconnect loop has in flight.
    pub async fn login_once(&self) -> LoginOutcome {
        login_gated(&*self.authenticator, &self.login_gate).await
    }
}

/// Join handle for a running coordinator
#[must_use = "dropping the handle detaches the loops"]
pub struct CoordinatorHandle {
    monitor: JoinHandle<MonitorReport>,
    reconnect: JoinHandle<ReconnectReport>,
    arm: watch::Sender<bool>,
}

impl CoordinatorHandle {
    /// Let the monitor loop start probing. Arming twice has no effect.
    pub fn arm(&self) {
        self.arm.send_replace(true);
    }

    /// Whether both loops have already exited
    pub fn is_finished(&self) -> bool {
        self.monitor.is_finished() && self.reconnect.is_finished()
    }

    /// Block until both loops have exited
    ///
    /// Returns only after the stop signal has been observed by both loops
    /// (or one of them failed).
    pub async fn wait(self) -> Result<CoordinatorReport, CoordinatorError> {
        // the arming side has to outlive the join, or an unarmed monitor
        // loop would read its disappearance as a stop
        let CoordinatorHandle {
            monitor,
            reconnect,
            arm: _arm,
        } = self;

        let (monitor, reconnect) = tokio::join!(monitor, reconnect);

        let monitor = monitor.map_err(|e| {
            error!(error = %e, "Monitor loop failed");
            CoordinatorError::TaskFailed {
                task: "monitor",
                reason: e.to_string(),
            }
        })?;
        let reconnect = reconnect.map_err(|e| {
            error!(error = %e, "Reconnect loop failed");
            CoordinatorError::TaskFailed {
                task: "reconnect",
                reason: e.to_string(),
            }
        })?;

        let report = CoordinatorReport {
            probes: monitor.probes,
            unreachable: monitor.unreachable,
            triggers_sent: monitor.triggers_sent,
            triggers_coalesced: monitor.triggers_coalesced,
            login_attempts: reconnect.login_attempts,
            login_failures: reconnect.login_failures,
        };

        info!(
            probes = report.probes,
            unreachable = report.unreachable,
            triggers_sent = report.triggers_sent,
            triggers_coalesced = report.triggers_coalesced,
            login_attempts = report.login_attempts,
            login_failures = report.login_failures,
            "Coordinator stopped"
        );

        Ok(report)
    }
}

async fn login_gated<A>(authenticator: &A, gate: &Mutex<()>) -> LoginOutcome
where
    A: Authenticator + ?Sized,
{
    let _guard = gate.lock().await;
    authenticator.login().await
}

/// Probing → (unreachable: request reconnect) → Sleeping → Probing ...
///
/// The full interval elapses after every probe whatever happened to the
/// request. Stop is observed before the first probe, during a probe and
/// during the sleep.
#[tracing::instrument(skip_all, fields(interval_secs = interval.as_secs()))]
async fn monitor_loop<P>(
    probe: Arc<P>,
    interval: Duration,
    triggers: mpsc::Sender<()>,
    mut arm: watch::Receiver<bool>,
    mut stop: watch::Receiver<bool>,
) -> MonitorReport
where
    P: ConnectivityProbe + ?Sized,
{
    let mut report = MonitorReport::default();

    let is_armed = tokio::select! {
        biased;
        _ = stopped(&mut stop) => false,
        is_armed = armed(&mut arm) => is_armed,
    };
    if !is_armed {
        debug!("Monitor loop stopped before its first probe");
        return report;
    }

    info!("Connectivity monitoring started");

    loop {
        let result = tokio::select! {
            biased;
            _ = stopped(&mut stop) => break,
            result = probe.check() => result,
        };
        report.probes += 1;

        if result.is_reachable() {
            debug!(
                duration_ms = result.duration().as_millis(),
                "Network test successful"
            );
        } else {
            report.unreachable += 1;
            warn!(
                error = result.error().unwrap_or("unknown"),
                "Network test failed, requesting reconnect"
            );

            match triggers.try_send(()) {
                Ok(()) => report.triggers_sent += 1,
                Err(TrySendError::Full(())) => {
                    report.triggers_coalesced += 1;
                    debug!("Reconnect already pending, coalescing request");
                }
                Err(TrySendError::Closed(())) => {
                    if *stop.borrow() {
                        debug!("Reconnect loop already stopped");
                    } else {
                        error!("Reconnect loop is gone, stopping monitor loop");
                    }
                    break;
                }
            }
        }

        tokio::select! {
            biased;
            _ = stopped(&mut stop) => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    info!(probes = report.probes, "Monitor loop stopped");
    report
}

/// Waiting → (request) → Authenticating → Waiting ...
///
/// One login per request; failures are logged and not retried here, the
/// next request comes from the next failed probe. A pending stop wins over
/// a pending request, and a login still in flight at stop is abandoned.
#[tracing::instrument(skip_all)]
async fn reconnect_loop<A>(
    authenticator: Arc<A>,
    gate: Arc<Mutex<()>>,
    mut triggers: mpsc::Receiver<()>,
    mut stop: watch::Receiver<bool>,
) -> ReconnectReport
where
    A: Authenticator + ?Sized,
{
    let mut report = ReconnectReport::default();

    loop {
        let trigger = tokio::select! {
            biased;
            _ = stopped(&mut stop) => break,
            trigger = triggers.recv() => trigger,
        };
        if trigger.is_none() {
            debug!("Monitor loop closed the trigger channel");
            break;
        }

        report.login_attempts += 1;
        info!(attempt = report.login_attempts, "Network test failed, reconnecting");

        let outcome = tokio::select! {
            biased;
            _ = stopped(&mut stop) => {
                debug!("Stop requested while logging in, abandoning attempt");
                break;
            }
            outcome = login_gated(&*authenticator, &gate) => outcome,
        };

        if outcome.is_success() {
            info!(
                duration_ms = outcome.duration().as_millis(),
                "Reconnect succeeded"
            );
        } else {
            report.login_failures += 1;
            warn!(
                error = outcome.failure_reason().as_deref().unwrap_or("unknown"),
                "Reconnect failed"
            );
        }
    }

    info!(
        attempts = report.login_attempts,
        failures = report.login_failures,
        "Reconnect loop stopped"
    );
    report
}
