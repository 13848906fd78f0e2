//! Breathing session coordinator.
//!
//! A [`BreathingSession`] owns one [`PhaseSequencer`] and one
//! [`SessionClock`], and shares a [`FeedbackSink`] with whoever created it.
//! User commands (start, stop, select) and timer ticks go through the
//! session. It returns [`Event`]s and publishes a fresh
//! [`SessionSnapshot`] on a watch channel after every change.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::FeedbackError;
use crate::events::Event;
use crate::feedback::{FeedbackSink, Pulse};
use crate::pattern::BreathingPattern;
use crate::timer::{CircleVisual, Phase, PhaseSequencer, SessionClock, READY_LABEL};

/// Read-only view for front-ends, refreshed on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub pattern_id: String,
    pub pattern_name: String,
    pub active: bool,
    /// `None` while no session is sequencing.
    pub phase: Option<Phase>,
    pub label: String,
    pub progress: f64,
    pub phase_elapsed_ms: u64,
    pub phase_remaining_ms: u64,
    pub elapsed_secs: u64,
    pub elapsed_label: String,
    pub cycles: u64,
    pub visual: CircleVisual,
}

pub struct BreathingSession {
    selected: BreathingPattern,
    sequencer: PhaseSequencer,
    clock: SessionClock,
    sink: Arc<dyn FeedbackSink>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl BreathingSession {
    pub fn new(pattern: BreathingPattern, sink: Arc<dyn FeedbackSink>) -> Self {
        let sequencer = PhaseSequencer::new();
        let clock = SessionClock::new();
        let initial = build_snapshot(&pattern, &sequencer, &clock);
        let (snapshot_tx, _) = watch::channel(initial);
        Self {
            selected: pattern,
            sequencer,
            clock,
            sink,
            snapshot_tx,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.clock.is_active()
    }

    pub fn selected_pattern(&self) -> &BreathingPattern {
        &self.selected
    }

    /// Epoch of the running sequence; ticks tagged with an older epoch
    /// are dropped.
    pub fn epoch(&self) -> u64 {
        self.sequencer.epoch()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        build_snapshot(self.current_pattern(), &self.sequencer, &self.clock)
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Choose the pattern for the next start. A running session keeps the
    /// pattern it was started with.
    pub fn select_pattern(&mut self, pattern: BreathingPattern) -> Event {
        info!(pattern = %pattern.id, "pattern selected");
        let event = Event::PatternSelected {
            pattern_id: pattern.id.clone(),
            at: Utc::now(),
        };
        self.selected = pattern;
        self.publish();
        event
    }

    /// Start sequencing the selected pattern.
    ///
    /// A session that is already running is halted first, and any tone
    /// left over from an earlier session is stopped.
    pub fn start(&mut self) -> Vec<Event> {
        if self.is_active() {
            info!("restarting active session");
            self.sequencer.stop();
            self.clock.stop();
        }
        self.report("stop_tone", self.sink.stop_tone());

        let pattern_id = self.selected.id.clone();
        let event = match self.sequencer.start(self.selected.clone()) {
            Some(phase) => {
                self.clock.start();
                self.report("play_tone", self.sink.play_tone());
                self.report("pulse", self.sink.pulse(Pulse::PHASE_CHANGE));
                info!(pattern = %pattern_id, phase = ?phase, "session started");
                Event::SessionStarted {
                    pattern_id,
                    phase,
                    at: Utc::now(),
                }
            }
            None => Event::SessionIdle {
                pattern_id,
                at: Utc::now(),
            },
        };
        self.publish();
        vec![event]
    }

    /// Advance the phase timer by `delta`.
    pub fn tick_phase(&mut self, delta: Duration) -> Vec<Event> {
        let epoch = self.epoch();
        self.tick_phase_for(epoch, delta)
    }

    /// Advance the phase timer by `delta` if `epoch` is still current.
    pub fn tick_phase_for(&mut self, epoch: u64, delta: Duration) -> Vec<Event> {
        let transitions = self.sequencer.tick_for(epoch, delta);
        let mut events = Vec::with_capacity(transitions.len());
        for transition in transitions {
            self.report("pulse", self.sink.pulse(Pulse::PHASE_CHANGE));
            let cycles = self.sequencer.cycles();
            events.push(Event::PhaseChanged {
                from: transition.from,
                to: transition.to,
                skipped: transition.skipped,
                cycle: cycles,
                at: Utc::now(),
            });
            if transition.cycle_completed {
                events.push(Event::CycleCompleted {
                    cycles,
                    at: Utc::now(),
                });
            }
        }
        self.publish();
        events
    }

    /// Count one second of session time.
    pub fn tick_clock(&mut self) {
        self.clock.tick();
        self.publish();
    }

    /// Stop the session and reset to the initial state.
    ///
    /// Idempotent: only the call that actually ends a running session
    /// stops the tone, fires the completion pulse and returns an event.
    pub fn stop(&mut self) -> Option<Event> {
        if !self.is_active() {
            self.sequencer.stop();
            self.clock.stop();
            return None;
        }

        let pattern_id = self.current_pattern().id.clone();
        let elapsed_secs = self.clock.elapsed_secs();
        let cycles = self.sequencer.cycles();

        self.sequencer.stop();
        self.clock.stop();
        self.report("stop_tone", self.sink.stop_tone());
        self.report("pulse", self.sink.pulse(Pulse::COMPLETION));
        info!(pattern = %pattern_id, elapsed_secs, cycles, "session stopped");
        self.publish();

        Some(Event::SessionStopped {
            pattern_id,
            elapsed_secs,
            cycles,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn current_pattern(&self) -> &BreathingPattern {
        match self.sequencer.pattern() {
            Some(p) if self.sequencer.is_running() => p,
            _ => &self.selected,
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn report(&self, call: &str, result: Result<(), FeedbackError>) {
        if let Err(e) = result {
            warn!(sink = self.sink.name(), call, error = %e, "feedback failed; continuing");
        }
    }
}

fn build_snapshot(
    pattern: &BreathingPattern,
    sequencer: &PhaseSequencer,
    clock: &SessionClock,
) -> SessionSnapshot {
    let running = sequencer.is_running();
    let state = sequencer.state();
    let phase = running.then_some(state.phase);
    SessionSnapshot {
        pattern_id: pattern.id.clone(),
        pattern_name: pattern.name.clone(),
        active: clock.is_active(),
        phase,
        label: phase.map_or(READY_LABEL, Phase::label).to_string(),
        progress: state.progress,
        phase_elapsed_ms: state.elapsed_ms,
        phase_remaining_ms: sequencer.remaining_ms(),
        elapsed_secs: clock.elapsed_secs(),
        elapsed_label: clock.format_elapsed(),
        cycles: sequencer.cycles(),
        visual: phase.map_or_else(CircleVisual::idle, |p| {
            CircleVisual::at(pattern, p, state.progress)
        }),
    }
}
