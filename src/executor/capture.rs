//! Chunked capture buffer for streamed response bodies.
//!
//! The outbound response length is unknown ahead of time, so the body is
//! accumulated in fixed-capacity chunks as data arrives and linearized into
//! one contiguous buffer only once the transfer has completed. Growth is
//! O(1) amortized per chunk boundary; linearization is O(total length).

use bytes::Bytes;

/// Capacity of one capture chunk in bytes.
pub const CHUNK_CAPACITY: usize = 2048;

/// Append-only byte sink built from fixed-capacity chunks.
///
/// Invariant: every chunk except the tail is exactly full; the tail holds
/// `0..=CHUNK_CAPACITY` bytes. A new tail is allocated only once the
/// current tail is exactly full and more data arrives.
pub struct ChunkedCapture {
    chunks: Vec<Box<[u8; CHUNK_CAPACITY]>>,
    tail_len: usize,
}

impl ChunkedCapture {
    /// Create an empty capture. No chunk is allocated until the first
    /// non-empty append.
    pub fn new() -> Self {
        Self {
            chunks: Vec::new(),
            tail_len: 0,
        }
    }

    /// Append `data`, filling the tail chunk and allocating new chunks as
    /// needed. Writes larger than the chunk capacity span multiple chunks.
    pub fn append(&mut self, data: &[u8]) {
        let mut rest = data;
        while !rest.is_empty() {
            if self.chunks.is_empty() || self.tail_len == CHUNK_CAPACITY {
                self.chunks.push(Box::new([0u8; CHUNK_CAPACITY]));
                self.tail_len = 0;
            }
            let take = rest.len().min(CHUNK_CAPACITY - self.tail_len);
            let tail_idx = self.chunks.len() - 1;
            let tail = &mut self.chunks[tail_idx];
            tail[self.tail_len..self.tail_len + take].copy_from_slice(&rest[..take]);
            self.tail_len += take;
            rest = &rest[take..];
        }
    }

    /// Total number of bytes captured so far.
    pub fn len(&self) -> usize {
        match self.chunks.len() {
            0 => 0,
            n => (n - 1) * CHUNK_CAPACITY + self.tail_len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of chunks currently allocated: `ceil(len / CHUNK_CAPACITY)`.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Linearize into one contiguous buffer, consuming the capture.
    pub fn into_bytes(self) -> Bytes {
        let total = self.len();
        let mut out = Vec::with_capacity(total);
        let last = self.chunks.len().saturating_sub(1);
        for (i, chunk) in self.chunks.iter().enumerate() {
            let fill = if i == last { self.tail_len } else { CHUNK_CAPACITY };
            out.extend_from_slice(&chunk[..fill]);
        }
        Bytes::from(out)
    }
}

impl Default for ChunkedCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_capture() {
        let c = ChunkedCapture::new();
        assert_eq!(c.len(), 0);
        assert_eq!(c.chunk_count(), 0);
        assert!(c.into_bytes().is_empty());
    }

    #[test]
    fn empty_append_allocates_nothing() {
        let mut c = ChunkedCapture::new();
        c.append(b"");
        assert_eq!(c.chunk_count(), 0);
        assert_eq!(c.len(), 0);
    }

    #[test]
    fn small_write_stays_in_one_chunk() {
        let mut c = ChunkedCapture::new();
        c.append(b"pong");
        assert_eq!(c.len(), 4);
        assert_eq!(c.chunk_count(), 1);
        assert_eq!(&c.into_bytes()[..], b"pong");
    }

    #[test]
    fn exact_capacity_fills_one_chunk() {
        let mut c = ChunkedCapture::new();
        c.append(&vec![7u8; CHUNK_CAPACITY]);
        assert_eq!(c.len(), CHUNK_CAPACITY);
        assert_eq!(c.chunk_count(), 1);
    }

    #[test]
    fn one_byte_past_capacity_opens_second_chunk() {
        let mut c = ChunkedCapture::new();
        c.append(&vec![7u8; CHUNK_CAPACITY + 1]);
        assert_eq!(c.len(), CHUNK_CAPACITY + 1);
        assert_eq!(c.chunk_count(), 2);
    }

    #[test]
    fn write_larger_than_capacity_spans_chunks() {
        let payload: Vec<u8> = (0..3 * CHUNK_CAPACITY + 17).map(|i| (i % 251) as u8).collect();
        let mut c = ChunkedCapture::new();
        c.append(&payload);
        assert_eq!(c.len(), payload.len());
        assert_eq!(c.chunk_count(), 4);
        assert_eq!(&c.into_bytes()[..], &payload[..]);
    }

    #[test]
    fn many_small_writes_concatenate_in_order() {
        let mut c = ChunkedCapture::new();
        let mut expected = Vec::new();
        for i in 0..500u32 {
            let piece = i.to_be_bytes();
            c.append(&piece);
            expected.extend_from_slice(&piece);
        }
        assert_eq!(c.len(), expected.len());
        assert_eq!(&c.into_bytes()[..], &expected[..]);
    }

    // Linearization equals byte-for-byte concatenation for arbitrary write
    // sequences, and the chunk count matches ceil(N / C).
    #[quickcheck_macros::quickcheck]
    fn linearization_matches_concatenation(writes: Vec<Vec<u8>>) -> bool {
        let mut c = ChunkedCapture::new();
        let mut expected = Vec::new();
        for w in &writes {
            c.append(w);
            expected.extend_from_slice(w);
        }
        let n = expected.len();
        let chunks_ok = c.chunk_count() == n.div_ceil(CHUNK_CAPACITY);
        let len_ok = c.len() == n;
        chunks_ok && len_ok && c.into_bytes()[..] == expected[..]
    }
}
