//! Audio output collaborator.

pub mod output;

pub use output::{AudioOutput, CpalOutput};
