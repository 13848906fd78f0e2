//! Async host for a [`BreathingSession`].
//!
//! The runner owns the session and feeds it from two tokio intervals:
//! the phase tick (100 ms by default) and the one-second clock tick.
//! A run ends when its [`CancellationToken`] is cancelled, when the
//! session reaches its time limit, or after a number of full cycles.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::Event;
use crate::session::{BreathingSession, SessionSnapshot};
use crate::storage::Config;

pub const DEFAULT_TICK: Duration = Duration::from_millis(100);
const CLOCK_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    pub tick_interval: Duration,
    /// Stop once the session clock reaches this many whole seconds.
    pub time_limit: Option<Duration>,
    /// Stop after this many completed cycles.
    pub max_cycles: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK,
            time_limit: None,
            max_cycles: None,
        }
    }
}

impl RunOptions {
    /// Tick interval and session length from the user's settings.
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            time_limit: Some(config.session_limit()),
            max_cycles: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    TimeLimit,
    CycleLimit,
    /// The pattern had nothing to sequence.
    Idle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub pattern_id: String,
    pub elapsed_secs: u64,
    pub cycles: u64,
    pub phase_changes: u64,
    pub reason: StopReason,
}

pub struct SessionRunner {
    session: BreathingSession,
    options: RunOptions,
    cancel: CancellationToken,
}

impl SessionRunner {
    pub fn new(session: BreathingSession, options: RunOptions) -> Self {
        Self {
            session,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that ends the current run when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.session.subscribe()
    }

    pub fn session(&self) -> &BreathingSession {
        &self.session
    }

    pub fn into_session(self) -> BreathingSession {
        self.session
    }

    /// Start the session and drive it until a stop condition is met.
    ///
    /// `on_event` sees every event in emission order, including the
    /// final `SessionStopped`. A cancelled token is never reset, so a
    /// runner whose token was cancelled stops again right after starting.
    pub async fn run<F>(&mut self, mut on_event: F) -> RunSummary
    where
        F: FnMut(&Event),
    {
        for event in self.session.start() {
            on_event(&event);
        }
        let pattern_id = self.session.selected_pattern().id.clone();

        if !self.session.is_active() {
            return RunSummary {
                pattern_id,
                elapsed_secs: 0,
                cycles: 0,
                phase_changes: 0,
                reason: StopReason::Idle,
            };
        }

        let epoch = self.session.epoch();
        let tick_interval = self.options.tick_interval.max(Duration::from_millis(1));
        let limit_secs = self.options.time_limit.map(|d| d.as_secs()).filter(|&s| s > 0);
        info!(
            pattern = %pattern_id,
            tick_ms = tick_interval.as_millis() as u64,
            limit_secs = ?limit_secs,
            "session run started"
        );

        let mut phase_tick = interval(tick_interval);
        let mut clock_tick = interval(CLOCK_TICK);
        // Both intervals fire immediately on first poll.
        phase_tick.tick().await;
        clock_tick.tick().await;

        let mut phase_changes = 0u64;
        let reason = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StopReason::Cancelled,
                _ = phase_tick.tick() => {
                    for event in self.session.tick_phase_for(epoch, tick_interval) {
                        if matches!(event, Event::PhaseChanged { .. }) {
                            phase_changes += 1;
                        }
                        on_event(&event);
                    }
                    if let Some(max) = self.options.max_cycles {
                        if self.session.snapshot().cycles >= max {
                            break StopReason::CycleLimit;
                        }
                    }
                }
                _ = clock_tick.tick() => {
                    self.session.tick_clock();
                    let elapsed = self.session.snapshot().elapsed_secs;
                    if limit_secs.is_some_and(|limit| elapsed >= limit) {
                        break StopReason::TimeLimit;
                    }
                }
            }
        };

        let last = self.session.snapshot();
        debug!(reason = ?reason, "session run ending");
        if let Some(event) = self.session.stop() {
            on_event(&event);
        }

        RunSummary {
            pattern_id,
            elapsed_secs: last.elapsed_secs,
            cycles: last.cycles,
            phase_changes,
            reason,
        }
    }
}
