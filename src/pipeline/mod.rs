//! Speech pipeline: admission gate, playback driver, and published state.

pub mod driver;
pub mod gate;
pub mod state;

pub use driver::{PipelineHandle, VoicePipeline};
pub use gate::SpeechGate;
pub use state::{BufferInfo, CompletionReason, PlaybackState, SpeakOutcome, StatusSnapshot};
