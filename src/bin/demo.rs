//! Demo: speak a pre-rendered WAV file through the lip-sync pipeline.
//!
//! Usage: `koe-demo <utterance.wav> [caption text]`
//!
//! Wires a [`WavSynthesizer`] (standing in for a real TTS engine) to the
//! system speakers, with avatar updates logged to the console.

use anyhow::{Context, bail};
use koe::{CpalOutput, KoeConfig, VoicePipeline, WavSynthesizer, avatar::LogAvatar};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(wav_path) = args.next() else {
        bail!("usage: koe-demo <utterance.wav> [caption text]");
    };
    let caption = args
        .next()
        .unwrap_or_else(|| "Hello from koe".to_string());

    let config_path = KoeConfig::default_config_path();
    let config = if config_path.exists() {
        KoeConfig::from_file(&config_path).context("loading config")?
    } else {
        KoeConfig::default()
    };

    let synth = WavSynthesizer::new(&wav_path);
    let output = CpalOutput::new(&config.audio).context("opening audio output")?;

    let mut pipeline = VoicePipeline::new(
        config,
        Box::new(synth),
        Box::new(output),
        Box::new(LogAvatar),
    );

    let outcome = pipeline.speak(&caption).await.context("speak failed")?;
    tracing::info!(
        "done: {:?}, played {}/{} samples{}",
        outcome.reason,
        outcome.samples_played,
        outcome.samples_synthesized,
        if outcome.truncated { " (truncated)" } else { "" }
    );
    Ok(())
}
