//! Integration tests for sessions, feedback and the async runner.
//!
//! Runner tests use tokio's paused clock so minutes of breathing finish
//! instantly and deterministically.

use std::sync::Arc;
use std::time::Duration;

use breatho_core::storage::FeedbackConfig;
use breatho_core::{
    BreathingPattern, BreathingSession, ColorTag, Config, Event, FeedbackCall, GatedFeedback,
    PatternCatalog, Phase, Pulse, RecordingFeedback, RunOptions, SessionRunner, StopReason,
};

fn preset(id: &str) -> BreathingPattern {
    PatternCatalog::builtin().get(id).cloned().unwrap()
}

// ============================================================================
// Session
// ============================================================================

#[test]
fn failing_sink_does_not_disturb_sequencing() {
    let sink = Arc::new(RecordingFeedback::failing());
    let mut session = BreathingSession::new(preset("box"), sink.clone());

    session.start();
    let mut changes = 0;
    for _ in 0..160 {
        changes += session
            .tick_phase(Duration::from_millis(100))
            .iter()
            .filter(|e| matches!(e, Event::PhaseChanged { .. }))
            .count();
    }
    assert_eq!(changes, 4);
    assert_eq!(session.snapshot().cycles, 1);
    assert!(session.stop().is_some());
    // stop_tone + play_tone + 5 phase pulses + stop_tone + completion
    assert_eq!(sink.calls().len(), 9);
}

#[test]
fn cycle_event_follows_wrapping_phase_change() {
    let sink = Arc::new(RecordingFeedback::new());
    let mut session = BreathingSession::new(preset("equal"), sink);
    session.start();
    let events = session.tick_phase(Duration::from_secs(8));
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], Event::PhaseChanged { to: Phase::Exhale, .. }));
    assert!(matches!(events[1], Event::PhaseChanged { to: Phase::Inhale, cycle: 1, .. }));
    assert!(matches!(events[2], Event::CycleCompleted { cycles: 1, .. }));
}

#[test]
fn restart_stops_previous_tone_before_new_one() {
    let sink = Arc::new(RecordingFeedback::new());
    let mut session = BreathingSession::new(preset("box"), sink.clone());
    session.start();
    session.tick_phase(Duration::from_secs(2));
    sink.clear();

    session.start();
    assert_eq!(
        sink.calls(),
        vec![
            FeedbackCall::StopTone,
            FeedbackCall::PlayTone,
            FeedbackCall::Pulse(Pulse::PHASE_CHANGE)
        ]
    );
    assert_eq!(session.snapshot().phase_elapsed_ms, 0);
}

#[test]
fn stale_epoch_tick_after_restart_is_dropped() {
    let sink = Arc::new(RecordingFeedback::new());
    let mut session = BreathingSession::new(preset("box"), sink);
    session.start();
    let old = session.epoch();
    session.stop();
    session.start();

    assert!(session.tick_phase_for(old, Duration::from_secs(10)).is_empty());
    assert_eq!(session.snapshot().phase, Some(Phase::Inhale));
    assert_eq!(session.snapshot().phase_elapsed_ms, 0);
}

#[test]
fn idle_pattern_never_activates() {
    let sink = Arc::new(RecordingFeedback::new());
    let zero = BreathingPattern::from_secs("zero", "Zero", "", [0, 0, 0, 0], ColorTag::Teal);
    let mut session = BreathingSession::new(zero, sink.clone());
    let events = session.start();
    assert!(matches!(events[0], Event::SessionIdle { .. }));
    assert!(!session.is_active());
    assert!(session.stop().is_none());
    assert_eq!(sink.calls(), vec![FeedbackCall::StopTone]);
}

#[test]
fn gated_sink_honours_settings() {
    let inner = Arc::new(RecordingFeedback::new());
    let gated = Arc::new(GatedFeedback::new(
        inner.clone(),
        FeedbackConfig {
            sound_enabled: false,
            haptics_enabled: false,
        },
    ));
    let mut session = BreathingSession::new(preset("box"), gated);
    session.start();
    session.tick_phase(Duration::from_secs(16));
    session.stop();
    assert_eq!(inner.calls(), vec![FeedbackCall::StopTone, FeedbackCall::StopTone]);
}

// ============================================================================
// Runner
// ============================================================================

fn runner_for(id: &str, options: RunOptions) -> (SessionRunner, Arc<RecordingFeedback>) {
    let sink = Arc::new(RecordingFeedback::new());
    let session = BreathingSession::new(preset(id), sink.clone());
    (SessionRunner::new(session, options), sink)
}

#[tokio::test(start_paused = true)]
async fn runner_stops_at_time_limit() {
    let (mut runner, sink) = runner_for(
        "box",
        RunOptions {
            time_limit: Some(Duration::from_secs(16)),
            ..RunOptions::default()
        },
    );
    let mut events = Vec::new();
    let summary = runner.run(|e| events.push(e.clone())).await;

    assert_eq!(summary.reason, StopReason::TimeLimit);
    assert_eq!(summary.elapsed_secs, 16);
    assert_eq!(summary.cycles, 1);
    assert_eq!(summary.phase_changes, 4);
    assert!(matches!(events.first(), Some(Event::SessionStarted { .. })));
    assert!(matches!(
        events.last(),
        Some(Event::SessionStopped { elapsed_secs: 16, cycles: 1, .. })
    ));
    assert_eq!(sink.pulses().last(), Some(&Pulse::COMPLETION));
    assert!(!runner.session().is_active());
}

#[tokio::test(start_paused = true)]
async fn runner_stops_after_cycle_limit() {
    let (mut runner, _) = runner_for(
        "4-7-8",
        RunOptions {
            max_cycles: Some(2),
            ..RunOptions::default()
        },
    );
    let summary = runner.run(|_| {}).await;
    assert_eq!(summary.reason, StopReason::CycleLimit);
    assert_eq!(summary.cycles, 2);
    // inhale, hold, exhale per cycle
    assert_eq!(summary.phase_changes, 6);
}

#[tokio::test(start_paused = true)]
async fn runner_stops_on_cancel() {
    let (runner, _) = runner_for("box", RunOptions::default());
    let token = runner.cancel_token();
    let mut snapshots = runner.subscribe();

    let handle = tokio::spawn(async move {
        let mut runner = runner;
        runner.run(|_| {}).await
    });

    tokio::time::sleep(Duration::from_millis(5_050)).await;
    snapshots.changed().await.unwrap();
    assert!(snapshots.borrow().active);
    token.cancel();

    let summary = handle.await.unwrap();
    assert_eq!(summary.reason, StopReason::Cancelled);
    assert_eq!(summary.elapsed_secs, 5);
    assert_eq!(summary.phase_changes, 1);
    assert!(!snapshots.borrow().active);
}

#[tokio::test(start_paused = true)]
async fn runner_reports_idle_pattern() {
    let sink = Arc::new(RecordingFeedback::new());
    let zero = BreathingPattern::from_secs("zero", "Zero", "", [0, 0, 0, 0], ColorTag::Teal);
    let mut runner = SessionRunner::new(BreathingSession::new(zero, sink), RunOptions::default());
    let summary = runner.run(|_| {}).await;
    assert_eq!(summary.reason, StopReason::Idle);
}

#[test]
fn run_options_follow_config() {
    let mut cfg = Config::default();
    cfg.session.duration_min = 2;
    cfg.session.tick_interval_ms = 250;
    let options = RunOptions::from_config(&cfg);
    assert_eq!(options.time_limit, Some(Duration::from_secs(120)));
    assert_eq!(options.tick_interval, Duration::from_millis(250));
    assert_eq!(options.max_cycles, None);
}
