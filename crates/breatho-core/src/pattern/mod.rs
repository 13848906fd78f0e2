//! Breathing patterns and the preset catalog.

mod catalog;

pub use catalog::PatternCatalog;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::Phase;

/// Longest accepted duration for a single phase (10 minutes).
pub const MAX_PHASE_MS: u64 = 10 * 60 * 1000;

/// Display colour tag used by front-ends to tint the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Blue,
    Green,
    Purple,
    Orange,
    Teal,
}

impl ColorTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorTag::Blue => "blue",
            ColorTag::Green => "green",
            ColorTag::Purple => "purple",
            ColorTag::Orange => "orange",
            ColorTag::Teal => "teal",
        }
    }
}

/// A named quadruple of phase durations.
///
/// Durations are whole milliseconds so that tick sums stay exact.
/// Patterns are immutable once built; the catalog hands out shared
/// references or clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreathingPattern {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub inhale_ms: u64,
    #[serde(default)]
    pub hold_ms: u64,
    pub exhale_ms: u64,
    #[serde(default)]
    pub rest_ms: u64,
    #[serde(default = "default_color")]
    pub color: ColorTag,
}

fn default_color() -> ColorTag {
    ColorTag::Teal
}

impl BreathingPattern {
    /// Build a pattern from whole-second durations.
    pub fn from_secs(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        [inhale, hold, exhale, rest]: [u64; 4],
        color: ColorTag,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            inhale_ms: inhale.saturating_mul(1000),
            hold_ms: hold.saturating_mul(1000),
            exhale_ms: exhale.saturating_mul(1000),
            rest_ms: rest.saturating_mul(1000),
            color,
        }
    }

    /// Duration of `phase` in milliseconds.
    pub fn duration_ms(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Inhale => self.inhale_ms,
            Phase::Hold => self.hold_ms,
            Phase::Exhale => self.exhale_ms,
            Phase::Rest => self.rest_ms,
        }
    }

    /// Length of one full cycle in milliseconds.
    pub fn cycle_ms(&self) -> u64 {
        Phase::ALL
            .iter()
            .map(|&p| self.duration_ms(p))
            .fold(0u64, u64::saturating_add)
    }

    /// True when every phase is zero-length; such a pattern never ticks.
    pub fn is_idle(&self) -> bool {
        self.cycle_ms() == 0
    }

    /// Phases with a non-zero duration, in cycle order.
    pub fn active_phases(&self) -> Vec<Phase> {
        Phase::ALL
            .into_iter()
            .filter(|&p| self.duration_ms(p) > 0)
            .collect()
    }

    /// Compact "4-7-8-0" style summary in seconds.
    pub fn rhythm(&self) -> String {
        Phase::ALL
            .iter()
            .map(|&p| format_secs(self.duration_ms(p)))
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Check identity fields and duration bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an empty id or name, or a phase
    /// longer than [`MAX_PHASE_MS`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::Empty("id".into()));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("name".into()));
        }
        for phase in Phase::ALL {
            let value = self.duration_ms(phase);
            if value > MAX_PHASE_MS {
                return Err(ValidationError::OutOfRange {
                    field: format!("{}.{}_ms", self.id, format!("{phase:?}").to_lowercase()),
                    value,
                    min: 0,
                    max: MAX_PHASE_MS,
                });
            }
        }
        Ok(())
    }
}

fn format_secs(ms: u64) -> String {
    if ms % 1000 == 0 {
        (ms / 1000).to_string()
    } else {
        format!("{:.1}", ms as f64 / 1000.0)
    }
}
