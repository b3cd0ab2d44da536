//! SOS countdown controller
//!
//! The controller is a plain synchronous state machine:
//!
//! ```text
//!   Idle --activate--> Armed --tick (remaining > 0)--> Armed
//!                        |
//!                        +--cancel--> Idle
//!                        +--tick (remaining == 0)--> Dispatched --> Idle
//! ```
//!
//! `Dispatched` is never stored; it only shows up as an event and a notice.
//! Time is driven from outside, see [`timer::SosTimer`].

pub mod timer;

pub use timer::{SharedController, SosTimer};

use crate::config::SosConfig;
use crate::error::{SosError, SosResult};
use crate::notification::Notice;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Identifies one armed run of the countdown
pub type ActivationId = Uuid;

/// Observable countdown state
///
/// Invariants: `armed == false` implies `seconds_remaining == 0`, and
/// `seconds_remaining > 0` implies `armed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SosSession {
    pub armed: bool,
    pub seconds_remaining: u32,
}

impl SosSession {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SosState {
        if self.armed {
            SosState::Armed
        } else {
            SosState::Idle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SosState {
    Idle,
    Armed,
    /// Transient; reported through events only
    Dispatched,
}

/// Transition broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SosEvent {
    Armed {
        activation: ActivationId,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    Tick {
        activation: ActivationId,
        seconds_remaining: u32,
    },
    Cancelled {
        activation: ActivationId,
        seconds_remaining: u32,
        at: DateTime<Utc>,
    },
    Dispatched {
        activation: ActivationId,
        at: DateTime<Utc>,
    },
    /// Back to idle after a dispatch or cancel
    Idle,
}

impl SosEvent {
    /// State the controller is in right after this event
    pub fn state(&self) -> SosState {
        match self {
            SosEvent::Armed { .. } | SosEvent::Tick { .. } => SosState::Armed,
            SosEvent::Dispatched { .. } => SosState::Dispatched,
            SosEvent::Cancelled { .. } | SosEvent::Idle => SosState::Idle,
        }
    }
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still armed with this many seconds left
    Counting { seconds_remaining: u32 },
    /// Countdown reached zero; services contacted, now idle
    Dispatched,
    /// Tick belonged to a run that is no longer current
    Stale,
}

/// Countdown/cancel state machine behind the emergency SOS button
///
/// Notices produced by a transition are queued, not shown; the owner takes
/// them with [`SosController::take_notices`] once it no longer holds any
/// lock around the controller. Events go straight to subscriber channels.
pub struct SosController {
    countdown_secs: u32,
    session: SosSession,
    activation: Option<ActivationId>,
    outbox: Vec<Notice>,
    subscribers: Vec<mpsc::UnboundedSender<SosEvent>>,
    dispatch_count: u64,
}

impl SosController {
    pub fn new(config: &SosConfig) -> Self {
        Self {
            countdown_secs: config.countdown_secs.max(1),
            session: SosSession::idle(),
            activation: None,
            outbox: Vec::new(),
            subscribers: Vec::new(),
            dispatch_count: 0,
        }
    }

    pub fn countdown_secs(&self) -> u32 {
        self.countdown_secs
    }

    pub fn snapshot(&self) -> SosSession {
        self.session
    }

    pub fn state(&self) -> SosState {
        self.session.state()
    }

    pub fn is_armed(&self) -> bool {
        self.session.armed
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.session.seconds_remaining
    }

    /// Current armed run, if any
    pub fn activation(&self) -> Option<ActivationId> {
        self.activation
    }

    /// How many times emergency services have been contacted
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count
    }

    /// Notices queued by transitions since the last call, oldest first
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.outbox)
    }

    /// Receive every transition from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SosEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().filter(|tx| !tx.is_closed()).count()
    }

    /// Arm the countdown. Rejected if already armed.
    pub fn activate(&mut self) -> SosResult<ActivationId> {
        if self.session.armed {
            tracing::warn!(
                remaining = self.session.seconds_remaining,
                "SOS activation rejected: already armed"
            );
            return Err(SosError::AlreadyArmed {
                remaining: self.session.seconds_remaining,
            });
        }

        let activation = Uuid::new_v4();
        self.activation = Some(activation);
        self.session = SosSession {
            armed: true,
            seconds_remaining: self.countdown_secs,
        };

        tracing::info!(%activation, countdown = self.countdown_secs, "SOS activated");
        self.outbox.push(Notice::destructive(
            "Emergency SOS Activated",
            format!(
                "Emergency services will be contacted in {} seconds...",
                self.countdown_secs
            ),
        ));
        self.emit(SosEvent::Armed {
            activation,
            seconds_remaining: self.countdown_secs,
            at: Utc::now(),
        });

        Ok(activation)
    }

    /// Advance the current run by one second.
    pub fn tick(&mut self) -> SosResult<TickOutcome> {
        let Some(activation) = self.activation.filter(|_| self.session.armed) else {
            return Err(SosError::NotArmed);
        };

        self.session.seconds_remaining = self.session.seconds_remaining.saturating_sub(1);
        let remaining = self.session.seconds_remaining;
        tracing::debug!(%activation, remaining, "SOS tick");
        self.emit(SosEvent::Tick {
            activation,
            seconds_remaining: remaining,
        });

        if remaining == 0 {
            self.dispatch()?;
            Ok(TickOutcome::Dispatched)
        } else {
            Ok(TickOutcome::Counting {
                seconds_remaining: remaining,
            })
        }
    }

    /// Tick on behalf of a specific run; ignored unless that run is current.
    pub fn tick_for(&mut self, activation: ActivationId) -> SosResult<TickOutcome> {
        if self.session.armed && self.activation == Some(activation) {
            self.tick()
        } else {
            tracing::trace!(%activation, "Ignoring stale SOS tick");
            Ok(TickOutcome::Stale)
        }
    }

    /// Stand down before the countdown completes.
    pub fn cancel(&mut self) -> SosResult<()> {
        let activation = self.disarm()?;
        let remaining = self.session.seconds_remaining;
        self.session = SosSession::idle();

        tracing::info!(%activation, remaining, "SOS cancelled");
        self.outbox.push(Notice::new(
            "Emergency Cancelled",
            "SOS has been cancelled successfully",
        ));
        self.emit(SosEvent::Cancelled {
            activation,
            seconds_remaining: remaining,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Contact emergency services now and return to idle.
    pub fn dispatch(&mut self) -> SosResult<()> {
        let activation = self.disarm()?;
        self.session = SosSession::idle();
        self.dispatch_count += 1;

        tracing::info!(%activation, "Emergency services contacted");
        self.outbox.push(Notice::destructive(
            "Emergency Services Contacted",
            "Help is on the way! SMS sent to emergency contacts.",
        ));
        self.emit(SosEvent::Dispatched {
            activation,
            at: Utc::now(),
        });
        self.emit(SosEvent::Idle);
        Ok(())
    }

    fn disarm(&mut self) -> SosResult<ActivationId> {
        match self.activation.take() {
            Some(activation) if self.session.armed => Ok(activation),
            other => {
                self.activation = other;
                tracing::warn!("SOS operation rejected: not armed");
                Err(SosError::NotArmed)
            }
        }
    }

    fn emit(&mut self, event: SosEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl std::fmt::Debug for SosController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SosController")
            .field("countdown_secs", &self.countdown_secs)
            .field("session", &self.session)
            .field("activation", &self.activation)
            .field("queued_notices", &self.outbox.len())
            .field("subscribers", &self.subscribers.len())
            .field("dispatch_count", &self.dispatch_count)
            .finish()
    }
}
