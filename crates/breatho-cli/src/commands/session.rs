use std::sync::Arc;
use std::time::Duration;

use breatho_core::storage::{SESSION_MINUTES_RANGE, TICK_MS_RANGE};
use breatho_core::{
    BreathingSession, Config, Event, FeedbackSink, GatedFeedback, NoopFeedback, RunOptions,
    SessionRunner, SessionSnapshot,
};
use clap::Subcommand;
use serde::Serialize;

use super::resolve_pattern;
use crate::feedback::TerminalFeedback;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Breathe along in real time (Ctrl-C stops)
    Run {
        /// Pattern id or name; defaults to session.default_pattern
        #[arg(long)]
        pattern: Option<String>,
        /// Session length in minutes; defaults to session.duration_min
        #[arg(long, value_parser = parse_minutes)]
        minutes: Option<u32>,
        /// Stop after this many full cycles
        #[arg(long)]
        cycles: Option<u64>,
        /// Phase tick interval in milliseconds
        #[arg(long, value_parser = parse_tick_ms)]
        tick_ms: Option<u64>,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
        /// Disable the ambient tone for this run
        #[arg(long)]
        no_sound: bool,
        /// Disable haptic pulses for this run
        #[arg(long)]
        no_haptics: bool,
        /// Ring the terminal bell on each pulse
        #[arg(long)]
        bell: bool,
    },
    /// Sequence a pattern offline and print what would happen
    Simulate {
        /// Pattern id or name; defaults to session.default_pattern
        #[arg(long)]
        pattern: Option<String>,
        /// Simulated seconds; defaults to one full cycle
        #[arg(long)]
        seconds: Option<f64>,
        /// Phase tick interval in milliseconds
        #[arg(long, default_value = "100", value_parser = parse_tick_ms)]
        tick_ms: u64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct SimulationReport {
    pattern_id: String,
    simulated_ms: u64,
    events: Vec<Event>,
    last: SessionSnapshot,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    match action {
        SessionAction::Run {
            pattern,
            minutes,
            cycles,
            tick_ms,
            json,
            no_sound,
            no_haptics,
            bell,
        } => {
            let (_, pattern) = resolve_pattern(&config, pattern.as_deref())?;

            let mut options = RunOptions::from_config(&config);
            if let Some(m) = minutes {
                options.time_limit = Some(Duration::from_secs(u64::from(m) * 60));
            }
            if let Some(ms) = tick_ms {
                options.tick_interval = Duration::from_millis(ms);
            }
            options.max_cycles = cycles;
            tracing::debug!(pattern = %pattern.id, ?options, "run options resolved");

            let mut settings = config.feedback;
            settings.sound_enabled &= !no_sound;
            settings.haptics_enabled &= !no_haptics;
            let sink: Arc<dyn FeedbackSink> = Arc::new(GatedFeedback::new(
                Arc::new(TerminalFeedback::new(bell)),
                settings,
            ));

            let mut runner = SessionRunner::new(BreathingSession::new(pattern, sink), options);
            let token = runner.cancel_token();
            let mut snapshots = runner.subscribe();

            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let summary = rt.block_on(async move {
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        token.cancel();
                    }
                });
                let render = tokio::spawn(async move {
                    while snapshots.changed().await.is_ok() {
                        let snap = snapshots.borrow_and_update().clone();
                        if !json && snap.active {
                            eprint!("\r{}", progress_line(&snap));
                        }
                    }
                });
                let summary = runner.run(|event| print_event(event, json)).await;
                render.abort();
                summary
            });

            if json {
                println!("{}", serde_json::to_string(&summary)?);
            } else {
                eprintln!();
                println!(
                    "done: {} cycles in {}s ({:?})",
                    summary.cycles, summary.elapsed_secs, summary.reason
                );
            }
        }
        SessionAction::Simulate {
            pattern,
            seconds,
            tick_ms,
            json,
        } => {
            let (_, pattern) = resolve_pattern(&config, pattern.as_deref())?;
            let tick = Duration::from_millis(tick_ms);
            let total_ms = match seconds {
                Some(s) if s.is_finite() && s > 0.0 => (s * 1000.0).round() as u64,
                _ => pattern.cycle_ms(),
            };
            let report = simulate(pattern, tick, total_ms);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for event in &report.events {
                    print_event(event, false);
                }
                println!("{}", progress_line(&report.last));
            }
        }
    }
    Ok(())
}

/// Same bounds `config set session.duration_min` enforces.
pub(crate) fn parse_minutes(s: &str) -> Result<u32, String> {
    let (min, max) = SESSION_MINUTES_RANGE;
    let value: u32 = s.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be between {min} and {max}"))
    }
}

/// Same bounds `config set session.tick_interval_ms` enforces.
pub(crate) fn parse_tick_ms(s: &str) -> Result<u64, String> {
    let (min, max) = TICK_MS_RANGE;
    let value: u64 = s.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be between {min} and {max}"))
    }
}

/// Drive a session with synthetic ticks; no wall clock involved.
fn simulate(pattern: breatho_core::BreathingPattern, tick: Duration, total_ms: u64) -> SimulationReport {
    let pattern_id = pattern.id.clone();
    let mut session = BreathingSession::new(pattern, Arc::new(NoopFeedback));
    let tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX).max(1);

    let mut events = session.start();
    let mut simulated_ms = 0u64;
    let mut clock_ms = 0u64;
    while simulated_ms + tick_ms <= total_ms {
        events.extend(session.tick_phase(tick));
        simulated_ms += tick_ms;
        clock_ms += tick_ms;
        while clock_ms >= 1000 {
            session.tick_clock();
            clock_ms -= 1000;
        }
    }

    let last = session.snapshot();
    events.extend(session.stop());
    SimulationReport {
        pattern_id,
        simulated_ms,
        events,
        last,
    }
}

fn progress_line(snap: &SessionSnapshot) -> String {
    const WIDTH: usize = 20;
    let filled = ((snap.progress * WIDTH as f64).round() as usize).min(WIDTH);
    format!(
        "{:<12} [{}{}] {:>3.0}%  {}",
        snap.label,
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        snap.progress * 100.0,
        snap.elapsed_label
    )
}

fn print_event(event: &Event, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
        return;
    }
    match event {
        Event::SessionStarted { pattern_id, phase, .. } => {
            println!("started {pattern_id}: {phase}");
        }
        Event::SessionIdle { pattern_id, .. } => {
            println!("{pattern_id} has no timed phase; nothing to do");
        }
        Event::PhaseChanged { to, .. } => println!("-> {to}"),
        Event::CycleCompleted { cycles, .. } => println!("   cycle {cycles} complete"),
        Event::SessionStopped { elapsed_secs, .. } => {
            println!("stopped after {elapsed_secs}s");
        }
        Event::PatternSelected { pattern_id, .. } => println!("selected {pattern_id}"),
    }
}
