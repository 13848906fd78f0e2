//! Sound and haptic cues.
//!
//! The session talks to the device through [`FeedbackSink`]. Every call
//! is best effort: the session logs a failed call and carries on.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::FeedbackError;
use crate::storage::FeedbackConfig;

/// A transient haptic tap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    /// Strength in `[0, 1]`.
    pub intensity: f64,
    /// Crispness in `[0, 1]`.
    pub sharpness: f64,
}

impl Pulse {
    /// Fired when a new phase begins.
    pub const PHASE_CHANGE: Pulse = Pulse {
        intensity: 0.5,
        sharpness: 0.5,
    };

    /// Fired when a session is stopped.
    pub const COMPLETION: Pulse = Pulse {
        intensity: 1.0,
        sharpness: 1.0,
    };

    /// Build a pulse, clamping both parameters into `[0, 1]`.
    pub fn new(intensity: f64, sharpness: f64) -> Self {
        Self {
            intensity: clamp_unit(intensity),
            sharpness: clamp_unit(sharpness),
        }
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Device capability for audio and haptic cues.
///
/// One sink is shared by every session; implementations must be callable
/// through `&self`.
pub trait FeedbackSink: Send + Sync {
    /// Short identifier used in logs (e.g. "terminal", "noop").
    fn name(&self) -> &str;

    /// Start the looping ambient tone.
    fn play_tone(&self) -> Result<(), FeedbackError>;

    /// Stop the ambient tone. Stopping a silent sink is not an error.
    fn stop_tone(&self) -> Result<(), FeedbackError>;

    /// Play one transient haptic pulse.
    fn pulse(&self, pulse: Pulse) -> Result<(), FeedbackError>;
}

/// Sink that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {
    fn name(&self) -> &str {
        "noop"
    }

    fn play_tone(&self) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn stop_tone(&self) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn pulse(&self, _pulse: Pulse) -> Result<(), FeedbackError> {
        Ok(())
    }
}

/// A call observed by [`RecordingFeedback`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeedbackCall {
    PlayTone,
    StopTone,
    Pulse(Pulse),
}

/// Test double that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingFeedback {
    calls: Mutex<Vec<FeedbackCall>>,
    fail: bool,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every call is recorded and then reported as failed.
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<FeedbackCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn pulses(&self) -> Vec<Pulse> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FeedbackCall::Pulse(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: FeedbackCall) -> Result<(), FeedbackError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if !self.fail {
            return Ok(());
        }
        Err(match call {
            FeedbackCall::PlayTone | FeedbackCall::StopTone => {
                FeedbackError::Playback("recording sink set to fail".into())
            }
            FeedbackCall::Pulse(_) => FeedbackError::Haptics("recording sink set to fail".into()),
        })
    }
}

impl FeedbackSink for RecordingFeedback {
    fn name(&self) -> &str {
        "recording"
    }

    fn play_tone(&self) -> Result<(), FeedbackError> {
        self.record(FeedbackCall::PlayTone)
    }

    fn stop_tone(&self) -> Result<(), FeedbackError> {
        self.record(FeedbackCall::StopTone)
    }

    fn pulse(&self, pulse: Pulse) -> Result<(), FeedbackError> {
        self.record(FeedbackCall::Pulse(pulse))
    }
}

/// Applies the sound and haptics toggles in front of another sink.
///
/// `stop_tone` always passes through so a tone started before sound was
/// switched off can still be silenced.
pub struct GatedFeedback {
    inner: Arc<dyn FeedbackSink>,
    settings: FeedbackConfig,
}

impl GatedFeedback {
    pub fn new(inner: Arc<dyn FeedbackSink>, settings: FeedbackConfig) -> Self {
        Self { inner, settings }
    }
}

impl FeedbackSink for GatedFeedback {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn play_tone(&self) -> Result<(), FeedbackError> {
        if self.settings.sound_enabled {
            self.inner.play_tone()
        } else {
            Ok(())
        }
    }

    fn stop_tone(&self) -> Result<(), FeedbackError> {
        self.inner.stop_tone()
    }

    fn pulse(&self, pulse: Pulse) -> Result<(), FeedbackError> {
        if self.settings.haptics_enabled {
            self.inner.pulse(pulse)
        } else {
            Ok(())
        }
    }
}
