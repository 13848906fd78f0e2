//! # Breatho Core Library
//!
//! This library provides the core logic for the Breatho guided-breathing
//! timer. Every operation is available through the `breatho` CLI; other
//! front-ends are thin layers over the same session API.
//!
//! ## Architecture
//!
//! - **Phase Sequencer**: A delta-driven state machine cycling
//!   Inhale -> Hold -> Exhale -> Rest; the caller supplies elapsed time
//! - **Session**: Coordinates the sequencer, the one-second session clock
//!   and the injected feedback sink, and publishes snapshots
//! - **Runner**: Drives a session from tokio intervals with explicit
//!   cancellation
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`PhaseSequencer`]: Core breathing state machine
//! - [`BreathingSession`]: Command and tick entry point for front-ends
//! - [`PatternCatalog`]: Preset and user breathing patterns
//! - [`FeedbackSink`]: Trait for sound and haptic cues
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod feedback;
pub mod pattern;
pub mod runner;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, FeedbackError, ValidationError};
pub use events::Event;
pub use feedback::{FeedbackCall, FeedbackSink, GatedFeedback, NoopFeedback, Pulse, RecordingFeedback};
pub use pattern::{BreathingPattern, ColorTag, PatternCatalog};
pub use runner::{RunOptions, RunSummary, SessionRunner, StopReason};
pub use session::{BreathingSession, SessionSnapshot};
pub use storage::Config;
pub use timer::{CircleVisual, Phase, PhaseSequencer, PhaseState, SessionClock, Transition};
