//! Avatar collaborator seam.
//!
//! The pipeline drives a face renderer through this trait; rendering itself
//! lives elsewhere. Calls are fire-and-forget.

/// Facial expression shown by the avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expression {
    /// Resting face.
    #[default]
    Neutral,
    /// Shown while speaking.
    Happy,
    Sad,
    Angry,
    Sleepy,
    Doubt,
}

/// Consumer of lip-sync and expression updates.
pub trait Avatar: Send {
    /// Switch the displayed expression.
    fn set_expression(&mut self, expression: Expression);

    /// Show (or clear, with `""`) the caption for the current utterance.
    fn set_speech_text(&mut self, text: &str);

    /// Set the mouth aperture, 0.0 (closed) to 1.0 (fully open).
    fn set_mouth_open_ratio(&mut self, ratio: f32);
}

/// Avatar that discards every update.
#[derive(Debug, Default)]
pub struct NullAvatar;

impl Avatar for NullAvatar {
    fn set_expression(&mut self, _expression: Expression) {}
    fn set_speech_text(&mut self, _text: &str) {}
    fn set_mouth_open_ratio(&mut self, _ratio: f32) {}
}

/// Avatar that logs updates, for headless runs.
#[derive(Debug, Default)]
pub struct LogAvatar;

impl Avatar for LogAvatar {
    fn set_expression(&mut self, expression: Expression) {
        tracing::debug!("avatar expression: {expression:?}");
    }

    fn set_speech_text(&mut self, text: &str) {
        tracing::debug!("avatar caption: {text:?}");
    }

    fn set_mouth_open_ratio(&mut self, ratio: f32) {
        tracing::trace!("avatar mouth: {ratio:.2}");
    }
}
