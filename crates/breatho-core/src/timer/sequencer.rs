//! Phase sequencer implementation.
//!
//! The sequencer is a delta-driven state machine. It does not own a timer;
//! the caller feeds it elapsed time through `tick()`.
//!
//! ## State Transitions
//!
//! ```text
//! Inhale -> Hold -> Exhale -> Rest -> Inhale -> ...
//! ```
//!
//! Zero-length phases are passed over without a tick. A pattern whose
//! phases are all zero leaves the sequencer idle.
//!
//! ## Usage
//!
//! ```ignore
//! let mut seq = PhaseSequencer::new();
//! seq.start(pattern);
//! let epoch = seq.epoch();
//! // On every timer callback:
//! for transition in seq.tick_for(epoch, Duration::from_millis(100)) { ... }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::phase::Phase;
use crate::pattern::BreathingPattern;

/// Position within the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    pub phase: Phase,
    /// Fraction of the phase completed, always in `[0, 1]`.
    pub progress: f64,
    /// Milliseconds spent in the phase so far.
    pub elapsed_ms: u64,
}

impl Default for PhaseState {
    fn default() -> Self {
        Self {
            phase: Phase::Inhale,
            progress: 0.0,
            elapsed_ms: 0,
        }
    }
}

/// Emitted once per phase entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    /// Zero-length phases passed over between `from` and `to`.
    pub skipped: Vec<Phase>,
    /// True when this transition wrapped back to the start of the cycle.
    pub cycle_completed: bool,
}

/// Comparable view of the sequencer, excluding the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequencerSnapshot {
    pub running: bool,
    pub state: PhaseState,
    pub total_elapsed_ms: u64,
    pub cycles: u64,
}

/// Four-phase breathing state machine.
#[derive(Debug, Clone, Default)]
pub struct PhaseSequencer {
    pattern: Option<BreathingPattern>,
    state: PhaseState,
    running: bool,
    /// Generation counter; bumped by every start and every effective stop.
    epoch: u64,
    /// Nanosecond clocks; the millisecond views are derived from these.
    phase_elapsed_ns: u128,
    total_elapsed_ns: u128,
    cycles: u64,
}

impl PhaseSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn progress(&self) -> f64 {
        self.state.progress
    }

    pub fn pattern(&self) -> Option<&BreathingPattern> {
        self.pattern.as_ref()
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        ns_to_ms(self.total_elapsed_ns)
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Remaining milliseconds in the current phase (0 when idle).
    pub fn remaining_ms(&self) -> u64 {
        match (&self.pattern, self.running) {
            (Some(p), true) => p.duration_ms(self.state.phase).saturating_sub(self.state.elapsed_ms),
            _ => 0,
        }
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot {
            running: self.running,
            state: self.state,
            total_elapsed_ms: self.total_elapsed_ms(),
            cycles: self.cycles,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Reset to the start of `pattern` and begin sequencing.
    ///
    /// Returns the phase entered, which is the first phase with a
    /// non-zero duration, or `None` when the pattern is idle.
    pub fn start(&mut self, pattern: BreathingPattern) -> Option<Phase> {
        self.reset();
        self.epoch = self.epoch.wrapping_add(1);

        let first = first_active(&pattern);
        match first {
            Some(phase) => {
                self.state.phase = phase;
                self.running = true;
                debug!(pattern = %pattern.id, phase = ?phase, epoch = self.epoch, "sequencer started");
            }
            None => {
                warn!(pattern = %pattern.id, "pattern has no non-zero phase; sequencer stays idle");
            }
        }
        self.pattern = Some(pattern);
        first
    }

    /// Stop sequencing and return to the initial state. Idempotent.
    pub fn stop(&mut self) {
        if self.running {
            self.epoch = self.epoch.wrapping_add(1);
            debug!(epoch = self.epoch, "sequencer stopped");
        }
        self.reset();
    }

    /// Apply `delta` of elapsed time only if `epoch` is still current.
    pub fn tick_for(&mut self, epoch: u64, delta: Duration) -> Vec<Transition> {
        if epoch != self.epoch {
            debug!(stale = epoch, current = self.epoch, "dropping stale tick");
            return Vec::new();
        }
        self.tick(delta)
    }

    /// Advance by `delta`, returning one transition per phase entered,
    /// in order.
    pub fn tick(&mut self, delta: Duration) -> Vec<Transition> {
        let mut transitions = Vec::new();
        if !self.running {
            return transitions;
        }
        let Some(pattern) = self.pattern.as_ref() else {
            return transitions;
        };

        let delta_ns = delta.as_nanos();
        self.total_elapsed_ns = self.total_elapsed_ns.saturating_add(delta_ns);
        let mut carry = self.phase_elapsed_ns.saturating_add(delta_ns);

        loop {
            let duration = phase_ns(pattern, self.state.phase);
            if carry < duration {
                break;
            }
            carry -= duration;

            let from = self.state.phase;
            let (to, skipped) = next_active(pattern, from);
            let cycle_completed = to.index() <= from.index();
            if cycle_completed {
                self.cycles += 1;
            }
            debug!(from = ?from, to = ?to, skipped = skipped.len(), "phase change");
            transitions.push(Transition {
                from,
                to,
                skipped,
                cycle_completed,
            });
            self.state.phase = to;
        }

        // The loop only exits on a phase whose duration exceeds `carry`.
        let duration = phase_ns(pattern, self.state.phase);
        self.phase_elapsed_ns = carry;
        self.state.elapsed_ms = ns_to_ms(carry);
        self.state.progress = (carry as f64 / duration as f64).clamp(0.0, 1.0);
        transitions
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reset(&mut self) {
        self.running = false;
        self.state = PhaseState::default();
        self.phase_elapsed_ns = 0;
        self.total_elapsed_ns = 0;
        self.cycles = 0;
    }
}

const NANOS_PER_MS: u128 = 1_000_000;

fn phase_ns(pattern: &BreathingPattern, phase: Phase) -> u128 {
    u128::from(pattern.duration_ms(phase)) * NANOS_PER_MS
}

fn ns_to_ms(ns: u128) -> u64 {
    u64::try_from(ns / NANOS_PER_MS).unwrap_or(u64::MAX)
}

fn first_active(pattern: &BreathingPattern) -> Option<Phase> {
    Phase::ALL
        .into_iter()
        .find(|&p| pattern.duration_ms(p) > 0)
}

/// Next phase after `from` with a non-zero duration, plus the zero-length
/// phases in between. Falls back to `from` itself when it is the only
/// active phase.
fn next_active(pattern: &BreathingPattern, from: Phase) -> (Phase, Vec<Phase>) {
    let mut skipped = Vec::new();
    let mut candidate = from.next();
    for _ in 0..Phase::ALL.len() {
        if pattern.duration_ms(candidate) > 0 {
            return (candidate, skipped);
        }
        skipped.push(candidate);
        candidate = candidate.next();
    }
    (from, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{ColorTag, PatternCatalog};

    const TICK: Duration = Duration::from_millis(100);

    fn pattern(id: &str) -> BreathingPattern {
        PatternCatalog::builtin().get(id).cloned().unwrap()
    }

    fn run_ticks(seq: &mut PhaseSequencer, n: usize) -> Vec<Transition> {
        (0..n).flat_map(|_| seq.tick(TICK)).collect()
    }

    #[test]
    fn starts_in_inhale_with_zero_progress() {
        let mut seq = PhaseSequencer::new();
        assert_eq!(seq.start(pattern("box")), Some(Phase::Inhale));
        assert!(seq.is_running());
        assert_eq!(seq.state(), PhaseState::default());
        assert_eq!(seq.remaining_ms(), 4000);
    }

    #[test]
    fn box_advances_once_after_forty_ticks() {
        let mut seq = PhaseSequencer::new();
        seq.start(pattern("box"));
        let transitions = run_ticks(&mut seq, 39);
        assert!(transitions.is_empty());
        assert!(seq.progress() < 1.0);

        let transitions = run_ticks(&mut seq, 1);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].from, Phase::Inhale);
        assert_eq!(transitions[0].to, Phase::Hold);
        assert_eq!(seq.phase(), Phase::Hold);
        assert_eq!(seq.progress(), 0.0);
    }

    #[test]
    fn box_full_cycle_after_160_ticks() {
        let mut seq = PhaseSequencer::new();
        seq.start(pattern("box"));
        let transitions = run_ticks(&mut seq, 160);
        let visited: Vec<Phase> = transitions.iter().map(|t| t.to).collect();
        assert_eq!(visited, vec![Phase::Hold, Phase::Exhale, Phase::Rest, Phase::Inhale]);
        assert!(transitions[3].cycle_completed);
        assert_eq!(seq.phase(), Phase::Inhale);
        assert_eq!(seq.progress(), 0.0);
        assert_eq!(seq.cycles(), 1);
        assert_eq!(seq.total_elapsed_ms(), 16_000);
    }

    #[test]
    fn equal_breathing_skips_hold_and_rest() {
        let mut seq = PhaseSequencer::new();
        seq.start(pattern("equal"));
        let transitions = run_ticks(&mut seq, 80);
        assert_eq!(transitions.len(), 2);
        assert_eq!(transitions[0].to, Phase::Exhale);
        assert_eq!(transitions[0].skipped, vec![Phase::Hold]);
        assert_eq!(transitions[1].to, Phase::Inhale);
        assert_eq!(transitions[1].skipped, vec![Phase::Rest]);
        assert_eq!(seq.cycles(), 1);
    }

    #[test]
    fn zero_inhale_starts_at_first_active_phase() {
        let p = BreathingPattern::from_secs("x", "X", "", [0, 0, 3, 1], ColorTag::Teal);
        let mut seq = PhaseSequencer::new();
        assert_eq!(seq.start(p), Some(Phase::Exhale));
        assert_eq!(seq.phase(), Phase::Exhale);
    }

    #[test]
    fn all_zero_pattern_is_idle() {
        let p = BreathingPattern::from_secs("z", "Z", "", [0, 0, 0, 0], ColorTag::Teal);
        let mut seq = PhaseSequencer::new();
        assert_eq!(seq.start(p), None);
        assert!(!seq.is_running());
        assert!(seq.tick(Duration::from_secs(10)).is_empty());
        assert_eq!(seq.state(), PhaseState::default());
    }

    #[test]
    fn single_active_phase_loops_on_itself() {
        let p = BreathingPattern::from_secs("one", "One", "", [2, 0, 0, 0], ColorTag::Teal);
        let mut seq = PhaseSequencer::new();
        seq.start(p);
        let transitions = seq.tick(Duration::from_secs(2));
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].from, Phase::Inhale);
        assert_eq!(transitions[0].to, Phase::Inhale);
        assert!(transitions[0].cycle_completed);
    }

    #[test]
    fn large_delta_crosses_several_phases_and_carries_remainder() {
        let mut seq = PhaseSequencer::new();
        seq.start(pattern("4-7-8"));
        // 4 (inhale) + 7 (hold) + 1.5 into exhale
        let transitions = seq.tick(Duration::from_millis(12_500));
        assert_eq!(transitions.len(), 2);
        assert_eq!(seq.phase(), Phase::Exhale);
        assert_eq!(seq.state().elapsed_ms, 1500);
        assert!((seq.progress() - 1500.0 / 8000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sub_millisecond_ticks_accumulate() {
        let mut seq = PhaseSequencer::new();
        seq.start(pattern("box"));
        let transitions: Vec<_> = (0..10_000)
            .flat_map(|_| seq.tick(Duration::from_micros(500)))
            .collect();
        assert_eq!(transitions.len(), 1);
        assert_eq!(seq.phase(), Phase::Hold);
        assert_eq!(seq.state().elapsed_ms, 1000);
        assert_eq!(seq.total_elapsed_ms(), 5000);
    }

    #[test]
    fn fractional_millisecond_ticks_do_not_drift() {
        let mut seq = PhaseSequencer::new();
        seq.start(pattern("box"));
        for _ in 0..1000 {
            seq.tick(Duration::from_micros(100_500));
        }
        // six 16 s cycles, then 4 s of inhale and 0.5 s into hold
        assert_eq!(seq.total_elapsed_ms(), 100_500);
        assert_eq!(seq.cycles(), 6);
        assert_eq!(seq.phase(), Phase::Hold);
        assert_eq!(seq.state().elapsed_ms, 500);
        assert!((seq.progress() - 0.125).abs() < 1e-9);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut seq = PhaseSequencer::new();
        seq.start(pattern("box"));
        run_ticks(&mut seq, 55);
        seq.stop();
        let once = (seq.snapshot(), seq.epoch());
        seq.stop();
        assert_eq!((seq.snapshot(), seq.epoch()), once);
        assert!(!seq.is_running());
        assert_eq!(seq.state(), PhaseState::default());
    }

    #[test]
    fn restart_matches_fresh_start() {
        let mut used = PhaseSequencer::new();
        used.start(pattern("box"));
        run_ticks(&mut used, 73);
        used.stop();
        used.start(pattern("equal"));

        let mut fresh = PhaseSequencer::new();
        fresh.start(pattern("equal"));
        assert_eq!(used.snapshot(), fresh.snapshot());
    }

    #[test]
    fn stale_epoch_tick_is_ignored() {
        let mut seq = PhaseSequencer::new();
        seq.start(pattern("box"));
        let old = seq.epoch();
        seq.stop();
        seq.start(pattern("box"));
        assert!(seq.tick_for(old, Duration::from_secs(5)).is_empty());
        assert_eq!(seq.state().elapsed_ms, 0);

        let current = seq.epoch();
        assert_eq!(seq.tick_for(current, Duration::from_secs(5)).len(), 1);
    }

    #[test]
    fn tick_when_stopped_does_nothing() {
        let mut seq = PhaseSequencer::new();
        assert!(seq.tick(TICK).is_empty());
        assert_eq!(seq.total_elapsed_ms(), 0);
    }
}
