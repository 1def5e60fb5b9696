//! Audio playback to system speakers via cpal.

use crate::config::AudioConfig;
use crate::error::{Result, VoiceError};
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

/// Hardware audio sink for the playback loop.
///
/// `play` dispatches one chunk toward the device and may block briefly for
/// backpressure, but never for the full duration of the chunk; the playback
/// loop's own pacing provides the real-time cadence.
pub trait AudioOutput {
    /// Dispatch a chunk of mono i16 samples at the given rate.
    ///
    /// # Errors
    ///
    /// Returns an `Audio` error if the device rejects the chunk.
    fn play(&mut self, chunk: &[i16], sample_rate: u32) -> Result<()>;

    /// Stop playback immediately, discarding anything queued.
    fn stop(&mut self);

    /// Set the speaker volume (0–100).
    fn set_volume(&mut self, volume: u8);
}

/// How many chunks' worth of samples may sit in the device queue before
/// `play` applies backpressure.
const QUEUE_HIGH_WATERMARK_CHUNKS: usize = 4;

/// Audio output to system speakers via cpal.
///
/// Keeps one output stream open for the life of the instance; `play`
/// enqueues converted samples for the stream callback to drain.
pub struct CpalOutput {
    _stream: cpal::Stream,
    queue: Arc<Mutex<VecDeque<f32>>>,
    volume: Arc<AtomicU8>,
}

impl CpalOutput {
    /// Open the configured (or default) output device at the configured rate.
    ///
    /// # Errors
    ///
    /// Returns an error if no output device is available or the stream
    /// cannot be built.
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();

        let device = if let Some(ref name) = config.output_device {
            host.output_devices()
                .map_err(|e| VoiceError::Audio(format!("cannot enumerate devices: {e}")))?
                .find(|d| {
                    d.description()
                        .ok()
                        .map(|desc| desc.name() == name)
                        .unwrap_or(false)
                })
                .ok_or_else(|| VoiceError::Audio(format!("output device '{name}' not found")))?
        } else {
            host.default_output_device()
                .ok_or_else(|| VoiceError::Audio("no default output device".into()))?
        };

        let device_name = device
            .description()
            .map(|d| d.name().to_owned())
            .unwrap_or_else(|_| "<unknown>".into());
        info!("using output device: {device_name}");

        let stream_config = StreamConfig {
            channels: 1,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = Arc::new(Mutex::new(VecDeque::<f32>::new()));
        let queue_cb = Arc::clone(&queue);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    let mut q = match queue_cb.lock() {
                        Ok(q) => q,
                        Err(_) => return,
                    };
                    for sample in data.iter_mut() {
                        *sample = q.pop_front().unwrap_or(0.0);
                    }
                },
                move |err| {
                    error!("audio output stream error: {err}");
                },
                None,
            )
            .map_err(|e| VoiceError::Audio(format!("failed to build output stream: {e}")))?;

        stream
            .play()
            .map_err(|e| VoiceError::Audio(format!("failed to start output stream: {e}")))?;

        Ok(Self {
            _stream: stream,
            queue,
            volume: Arc::new(AtomicU8::new(50)),
        })
    }

    /// List available output devices.
    ///
    /// # Errors
    ///
    /// Returns an error if devices cannot be enumerated.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| VoiceError::Audio(format!("cannot enumerate devices: {e}")))?;

        let mut names = Vec::new();
        for device in devices {
            if let Ok(desc) = device.description() {
                names.push(desc.name().to_owned());
            }
        }
        Ok(names)
    }
}

impl AudioOutput for CpalOutput {
    fn play(&mut self, chunk: &[i16], _sample_rate: u32) -> Result<()> {
        let gain = f32::from(self.volume.load(Ordering::Relaxed)) / 100.0;

        {
            let mut q = self
                .queue
                .lock()
                .map_err(|e| VoiceError::Audio(format!("playback queue poisoned: {e}")))?;
            q.extend(
                chunk
                    .iter()
                    .map(|s| f32::from(*s) / f32::from(i16::MAX) * gain),
            );
        }

        // Backpressure: let the callback drain before the queue runs away.
        let high_watermark = chunk.len().max(1) * QUEUE_HIGH_WATERMARK_CHUNKS;
        loop {
            let queued = self
                .queue
                .lock()
                .map_err(|e| VoiceError::Audio(format!("playback queue poisoned: {e}")))?
                .len();
            if queued <= high_watermark {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Ok(mut q) = self.queue.lock() {
            q.clear();
        }
    }

    fn set_volume(&mut self, volume: u8) {
        self.volume.store(volume.min(100), Ordering::Relaxed);
    }
}
