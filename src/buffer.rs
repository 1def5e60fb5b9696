//! Fixed-capacity sample storage for one utterance.
//!
//! Synthesis writes the whole utterance first, playback then drains it in
//! chunks; the two phases never overlap, so a pair of plain cursors is all
//! the coordination the buffer needs.

/// Bounded mono i16 PCM store with a write cursor and a read cursor.
///
/// Invariant: `0 <= read_pos <= write_pos <= capacity`. The storage is
/// allocated once and never grows.
pub struct SampleBuffer {
    data: Box<[i16]>,
    write_pos: usize,
    read_pos: usize,
}

impl SampleBuffer {
    /// Allocate a buffer holding up to `capacity` samples.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0i16; capacity].into_boxed_slice(),
            write_pos: 0,
            read_pos: 0,
        }
    }

    /// Total sample capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of samples written so far this utterance.
    #[must_use]
    pub fn written(&self) -> usize {
        self.write_pos
    }

    /// Number of written samples not yet read.
    #[must_use]
    pub fn unread(&self) -> usize {
        self.write_pos - self.read_pos
    }

    /// Whether every written sample has been read.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.read_pos == self.write_pos
    }

    /// Whether the write cursor has reached capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.write_pos == self.data.len()
    }

    /// Rewind both cursors for a new utterance.
    pub fn reset(&mut self) {
        self.write_pos = 0;
        self.read_pos = 0;
    }

    /// Append as many of `samples` as fit, returning the accepted count.
    ///
    /// Accepting fewer samples than offered is the overflow condition; the
    /// caller decides how to report it.
    pub fn append(&mut self, samples: &[i16]) -> usize {
        let room = self.data.len() - self.write_pos;
        let accepted = samples.len().min(room);
        self.data[self.write_pos..self.write_pos + accepted]
            .copy_from_slice(&samples[..accepted]);
        self.write_pos += accepted;
        accepted
    }

    /// Read up to `max` unread samples, advancing the read cursor.
    ///
    /// Returns an empty slice once the buffer is drained. Successive calls
    /// yield contiguous, non-overlapping windows.
    pub fn read_chunk(&mut self, max: usize) -> &[i16] {
        let count = max.min(self.unread());
        let start = self.read_pos;
        self.read_pos += count;
        &self.data[start..start + count]
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn append_within_capacity_accepts_all() {
        let mut buf = SampleBuffer::new(100);
        assert_eq!(buf.append(&[1i16; 60]), 60);
        assert_eq!(buf.written(), 60);
        assert_eq!(buf.append(&[2i16; 40]), 40);
        assert_eq!(buf.written(), 100);
        assert!(buf.is_full());
    }

    #[test]
    fn append_past_capacity_truncates() {
        let mut buf = SampleBuffer::new(100);
        assert_eq!(buf.append(&[1i16; 150]), 100);
        assert_eq!(buf.written(), 100);
        // Nothing further fits.
        assert_eq!(buf.append(&[1i16; 10]), 0);
    }

    #[test]
    fn read_chunk_windows_are_contiguous_and_exhaust() {
        let mut buf = SampleBuffer::new(10);
        let samples: Vec<i16> = (0..7).collect();
        assert_eq!(buf.append(&samples), 7);

        assert_eq!(buf.read_chunk(3), &[0, 1, 2]);
        assert_eq!(buf.read_chunk(3), &[3, 4, 5]);
        assert_eq!(buf.read_chunk(3), &[6]);
        assert_eq!(buf.read_chunk(3), &[] as &[i16]);
        assert!(buf.is_drained());
    }

    #[test]
    fn read_never_passes_write() {
        let mut buf = SampleBuffer::new(10);
        buf.append(&[5i16; 4]);
        assert_eq!(buf.read_chunk(100).len(), 4);
        assert_eq!(buf.unread(), 0);
    }

    #[test]
    fn reset_rewinds_both_cursors() {
        let mut buf = SampleBuffer::new(10);
        buf.append(&[1i16; 8]);
        buf.read_chunk(5);
        buf.reset();
        assert_eq!(buf.written(), 0);
        assert_eq!(buf.unread(), 0);
        assert_eq!(buf.append(&[2i16; 10]), 10);
    }
}
