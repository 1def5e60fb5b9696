//! Loudness estimation for lip sync.
//!
//! The estimate is computed once per playback chunk and only feeds a visual
//! parameter, so it samples a small fixed window instead of a full-chunk RMS.

/// Samples inspected per estimate.
const WINDOW: usize = 10;

/// Levels at or below this are treated as silence by the mouth mapping.
const NOISE_FLOOR: u8 = 3;

/// Estimate a normalized loudness level (0–100) for a chunk.
///
/// Averages the absolute values of the first `min(len, 10)` samples and
/// scales full-scale i16 magnitude to 100. Pure and deterministic.
#[must_use]
pub fn estimate(samples: &[i16]) -> u8 {
    if samples.is_empty() {
        return 0;
    }
    let window = samples.len().min(WINDOW);
    let sum: i64 = samples[..window]
        .iter()
        .map(|s| i64::from(*s).abs())
        .sum();
    let avg = sum / window as i64;
    (avg * 100 / 32_767).clamp(0, 100) as u8
}

/// Map a loudness level to a mouth aperture in 0.0–1.0.
///
/// Silence (level at or below the noise floor) closes the mouth; above it
/// the aperture rises linearly, saturating at level 30.
#[must_use]
pub fn mouth_open_ratio(level: u8) -> f32 {
    if level <= NOISE_FLOOR {
        0.0
    } else {
        (f32::from(level) / 30.0).clamp(0.0, 1.0)
    }
}
