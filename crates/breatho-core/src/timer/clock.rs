use serde::{Deserialize, Serialize};

/// Whole-second session counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClock {
    active: bool,
    elapsed_secs: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn start(&mut self) {
        self.active = true;
        self.elapsed_secs = 0;
    }

    /// Count one second. Ignored while inactive.
    pub fn tick(&mut self) {
        if self.active {
            self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        }
    }

    pub fn stop(&mut self) {
        self.active = false;
        self.elapsed_secs = 0;
    }

    /// Elapsed time as `MM:SS`.
    pub fn format_elapsed(&self) -> String {
        format_mm_ss(self.elapsed_secs)
    }
}

/// Format seconds as `MM:SS`; minutes keep growing past 99.
fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
