//! Terminal rendering of sound and haptic cues.

use breatho_core::{FeedbackError, FeedbackSink, Pulse};

/// Prints cues to stderr so stdout stays machine-readable.
pub struct TerminalFeedback {
    bell: bool,
}

impl TerminalFeedback {
    /// `bell` rings the terminal bell on each pulse.
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }
}

impl FeedbackSink for TerminalFeedback {
    fn name(&self) -> &str {
        "terminal"
    }

    fn play_tone(&self) -> Result<(), FeedbackError> {
        eprintln!("~ ambient tone on");
        Ok(())
    }

    fn stop_tone(&self) -> Result<(), FeedbackError> {
        Ok(())
    }

    fn pulse(&self, pulse: Pulse) -> Result<(), FeedbackError> {
        let bell = if self.bell { "\x07" } else { "" };
        eprintln!(
            "{bell}* pulse intensity={:.1} sharpness={:.1}",
            pulse.intensity, pulse.sharpness
        );
        Ok(())
    }
}
