//! The playback driver: admission, synthesis, and the lip-sync chunk loop.

use crate::avatar::{Avatar, Expression};
use crate::buffer::SampleBuffer;
use crate::config::{AudioConfig, KoeConfig, VoiceParameters};
use crate::error::{Result, VoiceError};
use crate::level;
use crate::pipeline::gate::{GateGuard, SpeechGate};
use crate::pipeline::state::{
    BufferInfo, CompletionReason, PlaybackState, SpeakOutcome, StatusSnapshot,
};
use crate::sink::BufferSink;
use crate::synth::Synthesizer;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Rough speech duration per byte of input text, for the short-output
/// diagnostic.
const SECS_PER_CHAR: f32 = 0.06;

/// Warn when actual duration falls below this fraction of the estimate.
const SHORT_DURATION_FACTOR: f32 = 0.7;

/// State shared between the driver and its handles.
#[derive(Debug, Default)]
struct PipelineShared {
    state: AtomicU8,
    speaking: AtomicBool,
    level: AtomicU8,
    gate: SpeechGate,
    last_failure: Mutex<Option<String>>,
}

impl PipelineShared {
    fn set_state(&self, state: PlaybackState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_level(&self, level: u8) {
        self.level.store(level, Ordering::Release);
    }

    fn record_failure(&self, reason: &str) {
        if let Ok(mut slot) = self.last_failure.lock() {
            *slot = Some(reason.to_owned());
        }
    }

    fn last_failure(&self) -> Option<String> {
        self.last_failure.lock().ok().and_then(|slot| slot.clone())
    }
}

/// Cloneable view of a running pipeline for status queries and cancellation.
#[derive(Clone)]
pub struct PipelineHandle {
    shared: Arc<PipelineShared>,
}

impl PipelineHandle {
    /// Request cancellation of the current utterance.
    ///
    /// Cooperative: the chunk loop observes the cleared flag at its next
    /// iteration, within roughly one chunk interval.
    pub fn stop(&self) {
        self.shared.speaking.store(false, Ordering::Release);
    }

    /// Whether a request is between admission and completion.
    pub fn is_speaking(&self) -> bool {
        self.shared.speaking.load(Ordering::Acquire)
    }

    /// Loudness level (0–100) of the chunk most recently played.
    pub fn level(&self) -> u8 {
        self.shared.level.load(Ordering::Acquire)
    }

    /// Current state-machine position.
    pub fn state(&self) -> PlaybackState {
        self.shared.state()
    }

    /// Most recent failure reason, if any.
    pub fn last_failure(&self) -> Option<String> {
        self.shared.last_failure()
    }
}

/// The voice pipeline: owns the sample buffer, voice parameters, and the
/// three collaborator seams, and runs one `speak` cycle at a time.
pub struct VoicePipeline {
    config: AudioConfig,
    params: VoiceParameters,
    buffer: SampleBuffer,
    synth: Box<dyn Synthesizer>,
    output: Box<dyn crate::audio::AudioOutput>,
    avatar: Box<dyn Avatar>,
    shared: Arc<PipelineShared>,
}

impl VoicePipeline {
    /// Build a pipeline from configuration and collaborators.
    ///
    /// Allocates the sample buffer once; it is reused for every utterance.
    pub fn new(
        config: KoeConfig,
        synth: Box<dyn Synthesizer>,
        mut output: Box<dyn crate::audio::AudioOutput>,
        avatar: Box<dyn Avatar>,
    ) -> Self {
        let buffer = SampleBuffer::new(config.audio.buffer_capacity);
        output.set_volume(config.voice.speaker_volume);
        info!(
            "pipeline ready: buffer {} samples ({:.1}s at {} Hz)",
            buffer.capacity(),
            buffer.capacity() as f32 / config.audio.sample_rate as f32,
            config.audio.sample_rate
        );
        Self {
            config: config.audio,
            params: config.voice,
            buffer,
            synth,
            output,
            avatar,
            shared: Arc::new(PipelineShared::default()),
        }
    }

    /// Handle for status queries and cancellation from outside the pipeline.
    #[must_use]
    pub fn handle(&self) -> PipelineHandle {
        PipelineHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Voice parameters the next utterance will use.
    #[must_use]
    pub fn voice(&self) -> VoiceParameters {
        self.params
    }

    /// Set the speech rate (80–450 wpm).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_rate(&mut self, rate: u32) -> Result<()> {
        self.params.set_rate(rate)
    }

    /// Set the voice pitch (0–99).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_pitch(&mut self, pitch: u8) -> Result<()> {
        self.params.set_pitch(pitch)
    }

    /// Set the synthesizer-internal volume (0–200).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_internal_volume(&mut self, volume: u16) -> Result<()> {
        self.params.set_internal_volume(volume)
    }

    /// Set the pitch variation width (0–100).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_pitch_range(&mut self, range: u8) -> Result<()> {
        self.params.set_pitch_range(range)
    }

    /// Set the speaker volume (0–100), forwarded to the output device.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_speaker_volume(&mut self, volume: u8) -> Result<()> {
        self.params.set_speaker_volume(volume)?;
        self.output.set_volume(volume);
        Ok(())
    }

    /// Sample-buffer usage report.
    #[must_use]
    pub fn buffer_info(&self) -> BufferInfo {
        let rate = self.config.sample_rate as f32;
        BufferInfo {
            capacity: self.buffer.capacity(),
            used: self.buffer.written(),
            max_duration_secs: self.buffer.capacity() as f32 / rate,
            used_duration_secs: self.buffer.written() as f32 / rate,
        }
    }

    /// Point-in-time status for the command layer.
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.shared.state(),
            is_speaking: self.shared.speaking.load(Ordering::Acquire),
            level: self.shared.level.load(Ordering::Acquire),
            voice: self.params,
            last_failure: self.shared.last_failure(),
            buffer: self.buffer_info(),
        }
    }

    /// Synthesize `text` and play it back with lip sync.
    ///
    /// Runs the full cycle to completion: admission, buffer fill, chunked
    /// playback, and the uniform completion step. At most one cycle runs at
    /// a time; a request arriving while one is in flight is rejected, not
    /// queued.
    ///
    /// # Errors
    ///
    /// - `RejectedBusy` if a request is already in flight.
    /// - `InvalidInput` for empty or over-length text.
    /// - `NotReady` if the sample buffer is unusable.
    /// - `SynthesisFailed` if the synthesizer fails or produces no audio.
    ///
    /// Timeout, cancellation, and device failure during playback are not
    /// errors; they are reported in the returned [`SpeakOutcome`].
    pub async fn speak(&mut self, text: &str) -> Result<SpeakOutcome> {
        let Some(_gate) = GateGuard::try_acquire(&self.shared.gate) else {
            warn!("speech request rejected: already speaking");
            return Err(self.fail(VoiceError::RejectedBusy));
        };

        if text.is_empty() {
            return Err(self.fail(VoiceError::InvalidInput("empty text".into())));
        }
        if text.len() > self.config.max_text_len {
            return Err(self.fail(VoiceError::InvalidInput(format!(
                "text too long: {} bytes (max {})",
                text.len(),
                self.config.max_text_len
            ))));
        }
        if self.buffer.capacity() == 0 {
            return Err(self.fail(VoiceError::NotReady("sample buffer not allocated".into())));
        }

        info!("speech request: {text:?} ({} bytes)", text.len());
        self.shared.speaking.store(true, Ordering::Release);
        self.shared.set_level(0);
        self.shared.set_state(PlaybackState::Synthesizing);

        // Fill phase: the synthesizer pushes everything before returning.
        self.buffer.reset();
        let params = self.params;
        let (synth_result, truncated) = {
            let mut sink = BufferSink::new(&mut self.buffer);
            let result = self.synth.synthesize(text, &params, &mut sink);
            (result, sink.overflowed())
        };

        if let Err(e) = synth_result {
            self.settle_idle();
            return Err(self.fail(e));
        }
        let synthesized = self.buffer.written();
        if synthesized == 0 {
            self.settle_idle();
            return Err(self.fail(VoiceError::SynthesisFailed(
                "no audio data generated".into(),
            )));
        }

        let duration = synthesized as f32 / self.config.sample_rate as f32;
        info!("synthesis complete: {synthesized} samples ({duration:.2}s)");
        if truncated {
            warn!("synthesis truncated: sample buffer capacity reached");
        }
        // Advisory only; naturally short utterances can trip this.
        let expected = text.len() as f32 * SECS_PER_CHAR;
        if duration < expected * SHORT_DURATION_FACTOR {
            warn!(
                "speech duration seems short ({duration:.2}s vs expected {expected:.2}s) - possible truncation"
            );
        }

        // Drain phase.
        self.avatar.set_expression(Expression::Happy);
        self.avatar.set_speech_text(text);
        self.shared.set_state(PlaybackState::Playing);

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let yield_interval = Duration::from_millis(self.config.chunk_interval_ms);
        let start = Instant::now();
        let mut played = 0usize;

        let reason = loop {
            if self.buffer.is_drained() {
                break CompletionReason::Drained;
            }
            if !self.shared.speaking.load(Ordering::Acquire) {
                break CompletionReason::Cancelled;
            }
            if start.elapsed() >= timeout {
                break CompletionReason::Timeout;
            }

            let chunk = self.buffer.read_chunk(self.config.chunk_size);
            let chunk_len = chunk.len();
            let level = level::estimate(chunk);
            self.shared.set_level(level);
            self.avatar.set_mouth_open_ratio(level::mouth_open_ratio(level));

            if let Err(e) = self.output.play(chunk, self.config.sample_rate) {
                warn!("chunk dispatch failed at sample {played}: {e}");
                break CompletionReason::DeviceFailure;
            }
            played += chunk_len;

            tokio::time::sleep(yield_interval).await;
        };

        // Uniform completion: runs for every loop exit, and the gate guard
        // reopens the gate even if a collaborator panics above.
        self.avatar.set_mouth_open_ratio(0.0);
        self.avatar.set_expression(Expression::Neutral);
        self.avatar.set_speech_text("");
        self.output.stop();
        self.settle_idle();

        match reason {
            CompletionReason::Drained => {}
            CompletionReason::Timeout => {
                self.shared.record_failure(&format!(
                    "playback timeout after {} ms",
                    self.config.timeout_ms
                ));
                warn!("playback exceeded {} ms budget", self.config.timeout_ms);
            }
            CompletionReason::Cancelled => info!("playback cancelled"),
            CompletionReason::DeviceFailure => {
                self.shared.record_failure("audio output rejected a chunk");
            }
        }
        info!("playback finished: {played}/{synthesized} samples ({reason:?})");

        Ok(SpeakOutcome {
            reason,
            truncated,
            samples_synthesized: synthesized,
            samples_played: played,
        })
    }

    /// Shared-state portion of the completion step.
    fn settle_idle(&self) {
        self.shared.set_level(0);
        self.shared.speaking.store(false, Ordering::Release);
        self.shared.set_state(PlaybackState::Idle);
    }

    fn fail(&self, err: VoiceError) -> VoiceError {
        self.shared.record_failure(&err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::avatar::NullAvatar;
    use crate::sink::PcmSink;

    struct FixedSynth {
        samples: usize,
    }

    impl Synthesizer for FixedSynth {
        fn synthesize(
            &mut self,
            _text: &str,
            _params: &VoiceParameters,
            sink: &mut dyn PcmSink,
        ) -> Result<()> {
            let bytes: Vec<u8> = std::iter::repeat_n(1000i16, self.samples)
                .flat_map(i16::to_le_bytes)
                .collect();
            sink.push(&bytes);
            Ok(())
        }
    }

    struct NullOutput;

    impl crate::audio::AudioOutput for NullOutput {
        fn play(&mut self, _chunk: &[i16], _sample_rate: u32) -> Result<()> {
            Ok(())
        }
        fn stop(&mut self) {}
        fn set_volume(&mut self, _volume: u8) {}
    }

    fn fast_pipeline(synth_samples: usize) -> VoicePipeline {
        let mut config = KoeConfig::default();
        config.audio.buffer_capacity = 4096;
        config.audio.chunk_interval_ms = 0;
        VoicePipeline::new(
            config,
            Box::new(FixedSynth {
                samples: synth_samples,
            }),
            Box::new(NullOutput),
            Box::new(NullAvatar),
        )
    }

    #[tokio::test]
    async fn empty_text_is_rejected_and_recorded() {
        let mut pipeline = fast_pipeline(100);
        let err = pipeline.speak("").await.unwrap_err();
        assert!(matches!(err, VoiceError::InvalidInput(_)));
        assert_eq!(pipeline.status().state, PlaybackState::Idle);
        assert!(pipeline.status().last_failure.unwrap().contains("empty"));
        // Gate reopened by the guard.
        assert!(!pipeline.shared.gate.is_busy());
    }

    #[tokio::test]
    async fn over_length_text_is_rejected() {
        let mut pipeline = fast_pipeline(100);
        let long = "a".repeat(301);
        let err = pipeline.speak(&long).await.unwrap_err();
        assert!(matches!(err, VoiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn successful_speak_returns_to_idle() {
        let mut pipeline = fast_pipeline(1000);
        let outcome = pipeline.speak("hello").await.unwrap();
        assert_eq!(outcome.reason, CompletionReason::Drained);
        assert_eq!(outcome.samples_synthesized, 1000);
        assert_eq!(outcome.samples_played, 1000);
        assert!(!outcome.truncated);
        let status = pipeline.status();
        assert_eq!(status.state, PlaybackState::Idle);
        assert!(!status.is_speaking);
        assert_eq!(status.level, 0);
    }

    #[tokio::test]
    async fn busy_gate_rejects_request() {
        let mut pipeline = fast_pipeline(100);
        assert!(pipeline.shared.gate.try_enter());
        let err = pipeline.speak("hi").await.unwrap_err();
        assert!(matches!(err, VoiceError::RejectedBusy));
        pipeline.shared.gate.leave();
        assert!(pipeline.speak("hi").await.is_ok());
    }

    #[tokio::test]
    async fn parameter_snapshot_is_per_utterance() {
        let mut pipeline = fast_pipeline(100);
        pipeline.set_rate(200).unwrap();
        assert_eq!(pipeline.voice().rate, 200);
        pipeline.speak("hi").await.unwrap();
        pipeline.set_rate(300).unwrap();
        assert_eq!(pipeline.voice().rate, 300);
    }
}
