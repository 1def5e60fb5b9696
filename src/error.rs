//! Error types for the koe pipeline.

/// Top-level error type for the voice front-end.
///
/// Only failures that prevent an utterance from being captured are errors;
/// conditions that merely cut playback short (timeout, cancellation, device
/// failure mid-drain) are reported through
/// [`CompletionReason`](crate::pipeline::CompletionReason) instead.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// A speech request is already in flight; the new one was dropped.
    #[error("rejected: a speech request is already in progress")]
    RejectedBusy,

    /// The request text was empty or exceeded the configured maximum length.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The pipeline has not been initialized (no sample buffer allocated).
    #[error("pipeline not ready: {0}")]
    NotReady(String),

    /// The external synthesizer failed or produced no audio.
    #[error("synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Audio device or stream error.
    #[error("audio error: {0}")]
    Audio(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, VoiceError>;
