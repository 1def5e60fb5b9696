//! The byte-oriented sink the synthesizer writes PCM into.

use crate::buffer::SampleBuffer;
use tracing::warn;

/// Receiver for raw PCM bytes pushed by a synthesizer.
///
/// `push` never blocks: it copies what fits and returns the number of bytes
/// accepted, which is how the synthesizer observes backpressure. An
/// implementation that is not ready to receive audio accepts zero bytes.
pub trait PcmSink {
    /// Push little-endian i16 PCM bytes; returns bytes accepted.
    fn push(&mut self, data: &[u8]) -> usize;
}

/// Sink adapter that decodes little-endian i16 PCM and appends it to a
/// [`SampleBuffer`], tracking how many samples were dropped on overflow.
pub struct BufferSink<'a> {
    buffer: &'a mut SampleBuffer,
    truncated: usize,
}

impl<'a> BufferSink<'a> {
    /// Wrap a buffer for one synthesis pass.
    pub fn new(buffer: &'a mut SampleBuffer) -> Self {
        Self {
            buffer,
            truncated: 0,
        }
    }

    /// Samples dropped because the buffer was full.
    #[must_use]
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    /// Whether any sample was dropped during this pass.
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.truncated > 0
    }
}

impl PcmSink for BufferSink<'_> {
    fn push(&mut self, data: &[u8]) -> usize {
        // Whole samples only; a trailing odd byte is never accepted.
        let samples: Vec<i16> = data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        let accepted = self.buffer.append(&samples);
        if accepted < samples.len() {
            let dropped = samples.len() - accepted;
            self.truncated += dropped;
            warn!("sample buffer full, truncated {dropped} samples");
        }
        accepted * 2
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    fn le_bytes(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn push_decodes_and_reports_bytes() {
        let mut buf = SampleBuffer::new(8);
        let mut sink = BufferSink::new(&mut buf);
        let n = sink.push(&le_bytes(&[100, -200, 300]));
        assert_eq!(n, 6);
        assert!(!sink.overflowed());
        assert_eq!(buf.read_chunk(8), &[100, -200, 300]);
    }

    #[test]
    fn push_truncates_on_full_buffer() {
        let mut buf = SampleBuffer::new(2);
        let mut sink = BufferSink::new(&mut buf);
        let n = sink.push(&le_bytes(&[1, 2, 3, 4]));
        assert_eq!(n, 4); // two samples accepted
        assert!(sink.overflowed());
        assert_eq!(sink.truncated(), 2);
    }

    #[test]
    fn odd_trailing_byte_is_not_accepted() {
        let mut buf = SampleBuffer::new(8);
        let mut sink = BufferSink::new(&mut buf);
        let mut bytes = le_bytes(&[7, 8]);
        bytes.push(0xff);
        assert_eq!(sink.push(&bytes), 4);
        assert_eq!(buf.written(), 2);
    }
}
