use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change in a session produces an Event.
/// Front-ends print or forward them; snapshots go through the watch channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        pattern_id: String,
        phase: Phase,
        at: DateTime<Utc>,
    },
    /// The pattern had no non-zero phase; nothing is sequencing.
    SessionIdle {
        pattern_id: String,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        skipped: Vec<Phase>,
        cycle: u64,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        cycles: u64,
        at: DateTime<Utc>,
    },
    SessionStopped {
        pattern_id: String,
        elapsed_secs: u64,
        cycles: u64,
        at: DateTime<Utc>,
    },
    PatternSelected {
        pattern_id: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SessionStarted { at, .. }
            | Event::SessionIdle { at, .. }
            | Event::PhaseChanged { at, .. }
            | Event::CycleCompleted { at, .. }
            | Event::SessionStopped { at, .. }
            | Event::PatternSelected { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_tag() {
        let event = Event::PhaseChanged {
            from: Phase::Inhale,
            to: Phase::Exhale,
            skipped: vec![Phase::Hold],
            cycle: 0,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phase_changed");
        assert_eq!(json["to"], "exhale");
        assert_eq!(json["skipped"][0], "hold");
    }
}
