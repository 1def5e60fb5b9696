//! Koe: buffered text-to-speech playback with avatar lip sync.
//!
//! One `speak` call runs a full cycle: the synthesizer fills a fixed-capacity
//! sample buffer, then a cooperative chunk loop drains it — estimating a
//! loudness level per chunk, driving the avatar's mouth from that level, and
//! dispatching the same chunk to the speaker — under a wall-clock timeout.
//!
//! # Architecture
//!
//! - **Sample buffer**: bounded mono i16 store, written once per utterance,
//!   then drained in chunks (`buffer`)
//! - **Sink adapter**: byte-oriented PCM receiver the synthesizer writes
//!   into, with overflow accounting (`sink`)
//! - **Level estimator**: cheap per-chunk loudness for lip sync (`level`)
//! - **Playback driver**: the per-request state machine and chunk loop
//!   (`pipeline`)
//! - **Collaborator seams**: `Synthesizer`, `AudioOutput`, and `Avatar`
//!   traits; cpal and WAV-file implementations included

pub mod audio;
pub mod avatar;
pub mod buffer;
pub mod config;
pub mod error;
pub mod level;
pub mod pipeline;
pub mod sink;
pub mod synth;

pub use audio::{AudioOutput, CpalOutput};
pub use avatar::{Avatar, Expression};
pub use buffer::SampleBuffer;
pub use config::{AudioConfig, KoeConfig, VoiceParameters};
pub use error::{Result, VoiceError};
pub use pipeline::{
    CompletionReason, PipelineHandle, PlaybackState, SpeakOutcome, StatusSnapshot, VoicePipeline,
};
pub use sink::{BufferSink, PcmSink};
pub use synth::{Synthesizer, WavSynthesizer};
