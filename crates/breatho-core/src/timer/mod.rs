mod clock;
mod phase;
mod sequencer;
mod visual;

pub use clock::SessionClock;
pub use phase::{Phase, READY_LABEL};
pub use sequencer::{PhaseSequencer, PhaseState, SequencerSnapshot, Transition};
pub use visual::CircleVisual;
