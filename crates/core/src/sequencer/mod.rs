pub mod off_guard;
pub mod sequencer;

pub use off_guard::OffGuard;
pub use sequencer::{tick, Sequencer, SequencerConfig, SequencerState, Tick, TickKind};
