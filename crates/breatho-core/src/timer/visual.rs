use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::pattern::BreathingPattern;

const CONTRACTED: CircleVisual = CircleVisual {
    scale: 1.0,
    opacity: 0.6,
};
const EXPANDED: CircleVisual = CircleVisual {
    scale: 1.5,
    opacity: 0.8,
};

/// Size and opacity of the breathing circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleVisual {
    pub scale: f64,
    pub opacity: f64,
}

impl CircleVisual {
    /// Resting look shown when no session runs.
    pub fn idle() -> Self {
        CONTRACTED
    }

    /// Circle for `phase` of `pattern` at `progress`. Inhale grows,
    /// exhale shrinks, hold and rest keep the size they were entered with.
    pub fn at(pattern: &BreathingPattern, phase: Phase, progress: f64) -> Self {
        let t = ease_in_out(progress.clamp(0.0, 1.0));
        match phase {
            Phase::Inhale => lerp(CONTRACTED, EXPANDED, t),
            Phase::Exhale => lerp(EXPANDED, CONTRACTED, t),
            Phase::Hold | Phase::Rest => settled(pattern, phase),
        }
    }
}

/// Size left behind by the last timed inhale or exhale before `phase`.
fn settled(pattern: &BreathingPattern, phase: Phase) -> CircleVisual {
    let mut prev = phase;
    for _ in 1..Phase::ALL.len() {
        prev = Phase::from_index(prev.index() + Phase::ALL.len() - 1);
        if pattern.duration_ms(prev) == 0 {
            continue;
        }
        match prev {
            Phase::Inhale => return EXPANDED,
            Phase::Exhale => return CONTRACTED,
            Phase::Hold | Phase::Rest => {}
        }
    }
    CONTRACTED
}

fn ease_in_out(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: CircleVisual, b: CircleVisual, t: f64) -> CircleVisual {
    CircleVisual {
        scale: a.scale + (b.scale - a.scale) * t,
        opacity: a.opacity + (b.opacity - a.opacity) * t,
    }
}
