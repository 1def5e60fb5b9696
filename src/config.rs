//! Configuration types for the voice front-end.

use crate::error::{Result, VoiceError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KoeConfig {
    /// Audio buffering and playback settings.
    pub audio: AudioConfig,
    /// Voice parameters handed to the synthesizer.
    pub voice: VoiceParameters,
}

/// Audio buffering and playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Playback sample rate in Hz (mono).
    pub sample_rate: u32,
    /// Samples dispatched per playback iteration.
    pub chunk_size: usize,
    /// Cooperative yield between chunks, in milliseconds.
    pub chunk_interval_ms: u64,
    /// Wall-clock budget for one utterance's playback, in milliseconds.
    pub timeout_ms: u64,
    /// Sample buffer capacity (fixed for the process lifetime).
    pub buffer_capacity: usize,
    /// Maximum accepted request text length, in bytes.
    pub max_text_len: usize,
    /// Output device name (None = system default).
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            chunk_size: 512,
            chunk_interval_ms: 8,
            timeout_ms: 15_000,
            buffer_capacity: 160_000,
            max_text_len: 300,
            output_device: None,
        }
    }
}

/// Voice parameters for the synthesizer and speaker.
///
/// Mutated between utterances by the command layer; the pipeline snapshots
/// them at the start of synthesis, so a change never affects an utterance
/// already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceParameters {
    /// Speech rate in words per minute (80–450).
    pub rate: u32,
    /// Voice pitch (0–99).
    pub pitch: u8,
    /// Synthesizer-internal volume (0–200).
    pub internal_volume: u16,
    /// Pitch variation width (0–100).
    pub pitch_range: u8,
    /// Speaker (hardware) volume (0–100).
    pub speaker_volume: u8,
}

impl Default for VoiceParameters {
    fn default() -> Self {
        Self {
            rate: 150,
            pitch: 70,
            internal_volume: 100,
            pitch_range: 100,
            speaker_volume: 50,
        }
    }
}

impl VoiceParameters {
    /// Set the speech rate. Accepts 80–450 wpm.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_rate(&mut self, rate: u32) -> Result<()> {
        if !(80..=450).contains(&rate) {
            return Err(VoiceError::InvalidInput(format!(
                "rate {rate} out of range 80-450"
            )));
        }
        self.rate = rate;
        Ok(())
    }

    /// Set the voice pitch. Accepts 0–99.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_pitch(&mut self, pitch: u8) -> Result<()> {
        if pitch > 99 {
            return Err(VoiceError::InvalidInput(format!(
                "pitch {pitch} out of range 0-99"
            )));
        }
        self.pitch = pitch;
        Ok(())
    }

    /// Set the synthesizer-internal volume. Accepts 0–200.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_internal_volume(&mut self, volume: u16) -> Result<()> {
        if volume > 200 {
            return Err(VoiceError::InvalidInput(format!(
                "internal volume {volume} out of range 0-200"
            )));
        }
        self.internal_volume = volume;
        Ok(())
    }

    /// Set the pitch variation width. Accepts 0–100.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_pitch_range(&mut self, range: u8) -> Result<()> {
        if range > 100 {
            return Err(VoiceError::InvalidInput(format!(
                "pitch range {range} out of range 0-100"
            )));
        }
        self.pitch_range = range;
        Ok(())
    }

    /// Set the speaker volume. Accepts 0–100.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the value is out of range.
    pub fn set_speaker_volume(&mut self, volume: u8) -> Result<()> {
        if volume > 100 {
            return Err(VoiceError::InvalidInput(format!(
                "speaker volume {volume} out of range 0-100"
            )));
        }
        self.speaker_volume = volume;
        Ok(())
    }
}

impl KoeConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the values
    /// fail validation.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| VoiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VoiceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/koe/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("koe").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("koe")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/koe-config/config.toml")
        }
    }

    /// Check that the configured values can drive the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate == 0 {
            return Err(VoiceError::Config("sample_rate must be non-zero".into()));
        }
        if self.audio.chunk_size == 0 {
            return Err(VoiceError::Config("chunk_size must be non-zero".into()));
        }
        if self.audio.buffer_capacity == 0 {
            return Err(VoiceError::Config(
                "buffer_capacity must be non-zero".into(),
            ));
        }
        if self.audio.max_text_len == 0 {
            return Err(VoiceError::Config("max_text_len must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = KoeConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.audio.sample_rate > 0);
        assert!(config.audio.chunk_size > 0);
        assert!(config.audio.buffer_capacity > config.audio.chunk_size);
        assert_eq!(config.voice.rate, 150);
        assert_eq!(config.voice.speaker_volume, 50);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = std::env::temp_dir().join("koe-test-config-roundtrip");
        let path = dir.join("config.toml");

        let mut config = KoeConfig::default();
        config.audio.sample_rate = 16_000;
        config.voice.rate = 220;

        assert!(config.save_to_file(&path).is_ok());
        let loaded = KoeConfig::from_file(&path).unwrap();
        assert_eq!(loaded.audio.sample_rate, 16_000);
        assert_eq!(loaded.voice.rate, 220);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = KoeConfig::from_file(std::path::Path::new("/nonexistent/koe/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn setters_reject_out_of_range() {
        let mut p = VoiceParameters::default();
        assert!(p.set_rate(79).is_err());
        assert!(p.set_rate(451).is_err());
        assert!(p.set_rate(300).is_ok());
        assert!(p.set_pitch(100).is_err());
        assert!(p.set_pitch(99).is_ok());
        assert!(p.set_internal_volume(201).is_err());
        assert!(p.set_internal_volume(200).is_ok());
        assert!(p.set_pitch_range(101).is_err());
        assert!(p.set_speaker_volume(101).is_err());
        assert!(p.set_speaker_volume(0).is_ok());
        assert_eq!(p.rate, 300);
        assert_eq!(p.pitch, 99);
    }
}
