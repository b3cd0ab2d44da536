//! Tokio-driven countdown ticker
//!
//! One background task per armed run. The task only ever ticks the run it
//! was started for, so a late tick from a cancelled run is a no-op.

use super::{ActivationId, SosController, TickOutcome};
use crate::error::{SosError, SosResult};
use crate::notification::Notifier;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Controller shared between the UI side and the ticking task
pub type SharedController = Arc<Mutex<SosController>>;

/// Shortest tick period; `tokio::time::interval` rejects zero
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Lock the controller; a poisoned lock still holds a consistent session.
pub fn lock(controller: &SharedController) -> MutexGuard<'_, SosController> {
    controller.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run `f` under the controller lock, then show the notices it queued.
///
/// The notifier is only called after the lock is released, so it may read
/// the controller itself.
pub fn transition<R>(
    controller: &SharedController,
    notifier: &dyn Notifier,
    f: impl FnOnce(&mut SosController) -> R,
) -> R {
    let (result, notices) = {
        let mut guard = lock(controller);
        let result = f(&mut *guard);
        (result, guard.take_notices())
    };
    for notice in &notices {
        notifier.notify(notice);
    }
    result
}

/// Drives a [`SosController`] once per `period` while it is armed.
///
/// Dropping the timer stops the background task.
pub struct SosTimer {
    controller: SharedController,
    notifier: Arc<dyn Notifier>,
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl SosTimer {
    pub fn new(controller: SharedController, notifier: Arc<dyn Notifier>, period: Duration) -> Self {
        if period < MIN_TICK_PERIOD {
            tracing::warn!(?period, "SOS tick period too short, using {:?}", MIN_TICK_PERIOD);
        }
        Self {
            controller,
            notifier,
            period: period.max(MIN_TICK_PERIOD),
            task: None,
        }
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    /// Whether a ticking task is alive
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Activate the controller and start ticking.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self) -> SosResult<ActivationId> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| SosError::NoRuntime)?;
        let activation = transition(&self.controller, self.notifier.as_ref(), |c| c.activate())?;

        self.stop();
        let controller = Arc::clone(&self.controller);
        let notifier = Arc::clone(&self.notifier);
        self.task = Some(handle.spawn(run_countdown(controller, notifier, activation, self.period)));
        tracing::debug!(%activation, period_ms = self.period.as_millis() as u64, "SOS timer started");
        Ok(activation)
    }

    /// Cancel the armed run and stop ticking.
    pub fn cancel(&mut self) -> SosResult<()> {
        self.stop();
        transition(&self.controller, self.notifier.as_ref(), |c| c.cancel())
    }

    /// Stop the ticking task without touching the session. Idempotent.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::trace!("SOS timer stopped");
        }
    }
}

impl Drop for SosTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_countdown(
    controller: SharedController,
    notifier: Arc<dyn Notifier>,
    activation: ActivationId,
    period: Duration,
) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let outcome = transition(&controller, notifier.as_ref(), |c| c.tick_for(activation));
        match outcome {
            Ok(TickOutcome::Counting { .. }) => continue,
            Ok(TickOutcome::Dispatched) | Ok(TickOutcome::Stale) => break,
            Err(e) => {
                tracing::warn!(%activation, "SOS countdown stopped: {}", e);
                break;
            }
        }
    }
}
