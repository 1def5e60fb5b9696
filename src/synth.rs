//! Synthesizer collaborator seam.

use crate::config::VoiceParameters;
use crate::error::{Result, VoiceError};
use crate::sink::PcmSink;
use std::path::PathBuf;

/// External text-to-speech engine.
///
/// An implementation renders `text` to little-endian i16 PCM and pushes it
/// into `sink` as it is produced, before returning. A sink that accepts
/// fewer bytes than offered is full; the synthesizer should stop pushing.
pub trait Synthesizer: Send {
    /// Synthesize one utterance into the sink.
    ///
    /// # Errors
    ///
    /// Returns `SynthesisFailed` when the engine cannot render the text.
    fn synthesize(
        &mut self,
        text: &str,
        params: &VoiceParameters,
        sink: &mut dyn PcmSink,
    ) -> Result<()>;
}

/// "Synthesizer" that plays a pre-rendered mono i16 WAV file.
///
/// Stands in for a real TTS engine in the demo binary and in manual testing;
/// the request text is ignored beyond logging. The synthesizer-internal
/// volume parameter is applied as a linear gain.
pub struct WavSynthesizer {
    path: PathBuf,
}

impl WavSynthesizer {
    /// Use the WAV file at `path` for every utterance.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Synthesizer for WavSynthesizer {
    fn synthesize(
        &mut self,
        text: &str,
        params: &VoiceParameters,
        sink: &mut dyn PcmSink,
    ) -> Result<()> {
        tracing::debug!("wav synthesizer: {:?} for text {text:?}", self.path);

        let mut reader = hound::WavReader::open(&self.path)
            .map_err(|e| VoiceError::SynthesisFailed(format!("cannot open wav: {e}")))?;
        let spec = reader.spec();
        if spec.channels != 1 || spec.bits_per_sample != 16 {
            return Err(VoiceError::SynthesisFailed(format!(
                "expected mono 16-bit wav, got {} ch / {} bit",
                spec.channels, spec.bits_per_sample
            )));
        }

        const CHUNK_BYTES: usize = 2048;

        let gain = f32::from(params.internal_volume) / 100.0;
        let mut chunk = Vec::with_capacity(CHUNK_BYTES);
        for sample in reader.samples::<i16>() {
            let sample =
                sample.map_err(|e| VoiceError::SynthesisFailed(format!("wav decode: {e}")))?;
            let scaled = (f32::from(sample) * gain)
                .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
            chunk.extend_from_slice(&scaled.to_le_bytes());

            if chunk.len() >= CHUNK_BYTES {
                let accepted = sink.push(&chunk);
                if accepted < chunk.len() {
                    // Sink is full; drop the rest of the file.
                    return Ok(());
                }
                chunk.clear();
            }
        }
        if !chunk.is_empty() {
            sink.push(&chunk);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::buffer::SampleBuffer;
    use crate::sink::BufferSink;

    fn write_wav(path: &std::path::Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn wav_file_flows_through_the_sink() {
        let dir = std::env::temp_dir().join("koe-test-wav-synth");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("utterance.wav");
        write_wav(&path, &[100, -100, 2000]);

        let mut buf = SampleBuffer::new(16);
        let mut sink = BufferSink::new(&mut buf);
        let mut synth = WavSynthesizer::new(&path);
        synth
            .synthesize("hi", &VoiceParameters::default(), &mut sink)
            .unwrap();

        assert_eq!(buf.read_chunk(16), &[100, -100, 2000]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn internal_volume_scales_gain() {
        let dir = std::env::temp_dir().join("koe-test-wav-gain");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("utterance.wav");
        write_wav(&path, &[1000, -1000]);

        let mut params = VoiceParameters::default();
        params.set_internal_volume(200).unwrap();

        let mut buf = SampleBuffer::new(16);
        let mut sink = BufferSink::new(&mut buf);
        let mut synth = WavSynthesizer::new(&path);
        synth.synthesize("hi", &params, &mut sink).unwrap();

        assert_eq!(buf.read_chunk(16), &[2000, -2000]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_a_synthesis_failure() {
        let mut buf = SampleBuffer::new(16);
        let mut sink = BufferSink::new(&mut buf);
        let mut synth = WavSynthesizer::new("/nonexistent/koe/utterance.wav");
        let err = synth
            .synthesize("hi", &VoiceParameters::default(), &mut sink)
            .unwrap_err();
        assert!(matches!(err, VoiceError::SynthesisFailed(_)));
    }
}
