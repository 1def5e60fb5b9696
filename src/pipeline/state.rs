//! Status and outcome types published by the playback driver.

use crate::config::VoiceParameters;

/// Where the driver is in the per-request state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No request in flight.
    #[default]
    Idle = 0,
    /// The synthesizer is filling the sample buffer.
    Synthesizing = 1,
    /// The chunk loop is draining the buffer.
    Playing = 2,
}

impl PlaybackState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Synthesizing,
            2 => Self::Playing,
            _ => Self::Idle,
        }
    }
}

/// Why the playback loop exited.
///
/// All of these are non-fatal: the completion step runs and the pipeline
/// returns to idle regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    /// Every captured sample was played.
    Drained,
    /// The wall-clock playback budget was exceeded mid-drain.
    Timeout,
    /// The speaking flag was cleared externally.
    Cancelled,
    /// The audio output rejected a chunk.
    DeviceFailure,
}

/// Result of a completed speech request.
#[derive(Debug, Clone, Copy)]
pub struct SpeakOutcome {
    /// How the playback loop ended.
    pub reason: CompletionReason,
    /// Whether synthesis was truncated by a full buffer.
    pub truncated: bool,
    /// Samples captured from the synthesizer.
    pub samples_synthesized: usize,
    /// Samples actually dispatched to the output.
    pub samples_played: usize,
}

/// Sample-buffer usage report.
#[derive(Debug, Clone, Copy)]
pub struct BufferInfo {
    /// Total capacity in samples.
    pub capacity: usize,
    /// Samples held from the most recent synthesis.
    pub used: usize,
    /// Capacity expressed in seconds at the configured rate.
    pub max_duration_secs: f32,
    /// Held samples expressed in seconds at the configured rate.
    pub used_duration_secs: f32,
}

/// Point-in-time view of the pipeline for the command layer.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
    /// Current state-machine position.
    pub state: PlaybackState,
    /// Whether a request is between admission and completion.
    pub is_speaking: bool,
    /// Loudness level (0–100) of the chunk most recently played.
    pub level: u8,
    /// Voice parameters that the next utterance will use.
    pub voice: VoiceParameters,
    /// Most recent failure, if any.
    pub last_failure: Option<String>,
    /// Sample-buffer usage.
    pub buffer: BufferInfo,
}
