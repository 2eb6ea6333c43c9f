//! Frame reassembly from the capture subprocess byte stream.
//!
//! The capture subprocess writes raw packed pixels to its stdout with no
//! framing of its own; chunks arrive at whatever size the OS delivers.
//! `FrameAssembler` accumulates those chunks into a single reused buffer
//! and signals once, and only once, per completed frame.

/// Accumulates raw capture bytes into complete fixed-size frames.
///
/// One buffer is reused across frames (overwritten in place). A partial
/// frame is never observable from outside: the `on_frame` callback fires
/// exactly when the buffer holds a full frame, before any bytes of the
/// next frame are written over it.
pub struct FrameAssembler {
    buffer: Vec<u8>,
    pos: usize,
}

impl FrameAssembler {
    /// Create an assembler for frames of `frame_size` bytes
    /// (`width * height * bytes_per_pixel`).
    pub fn new(frame_size: usize) -> Self {
        Self {
            buffer: vec![0u8; frame_size],
            pos: 0,
        }
    }

    /// The frame size currently being assembled, in bytes.
    pub fn frame_size(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bytes buffered toward the next frame.
    pub fn buffered(&self) -> usize {
        self.pos
    }

    /// Switch to a new frame size after a capture resolution change.
    ///
    /// Any partial frame from the old resolution is discarded, never
    /// reinterpreted: misaligned bytes would corrupt color channels.
    pub fn reset(&mut self, frame_size: usize) {
        self.buffer = vec![0u8; frame_size];
        self.pos = 0;
    }

    /// Feed a chunk of capture bytes, invoking `on_frame` once per frame
    /// completed by this chunk. Returns the number of frames completed.
    ///
    /// A single chunk may complete zero, one, or several frames; leftover
    /// bytes start the next frame. Zero-sized frames consume nothing.
    pub fn feed<F: FnMut(&[u8])>(&mut self, mut chunk: &[u8], mut on_frame: F) -> usize {
        let frame_size = self.buffer.len();
        if frame_size == 0 {
            return 0;
        }

        let mut completed = 0;
        while !chunk.is_empty() {
            let take = (frame_size - self.pos).min(chunk.len());
            self.buffer[self.pos..self.pos + take].copy_from_slice(&chunk[..take]);
            self.pos += take;
            chunk = &chunk[take..];

            if self.pos == frame_size {
                on_frame(&self.buffer);
                self.pos = 0;
                completed += 1;
            }
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_frame_completes_once() {
        let mut asm = FrameAssembler::new(6);
        let mut frames: Vec<Vec<u8>> = Vec::new();
        let n = asm.feed(&[1, 2, 3, 4, 5, 6], |f| frames.push(f.to_vec()));
        assert_eq!(n, 1);
        assert_eq!(frames, vec![vec![1, 2, 3, 4, 5, 6]]);
        assert_eq!(asm.buffered(), 0);
    }

    #[test]
    fn test_partial_frame_is_not_signaled() {
        let mut asm = FrameAssembler::new(6);
        let mut count = 0;
        assert_eq!(asm.feed(&[1, 2, 3], |_| count += 1), 0);
        assert_eq!(count, 0);
        assert_eq!(asm.buffered(), 3);
    }

    #[test]
    fn test_chunk_spanning_frame_boundary() {
        let mut asm = FrameAssembler::new(4);
        let mut frames: Vec<Vec<u8>> = Vec::new();
        asm.feed(&[0, 1, 2], |f| frames.push(f.to_vec()));
        // Completes the first frame and buffers two bytes of the second.
        let n = asm.feed(&[3, 4, 5], |f| frames.push(f.to_vec()));
        assert_eq!(n, 1);
        assert_eq!(frames, vec![vec![0, 1, 2, 3]]);
        assert_eq!(asm.buffered(), 2);
    }

    #[test]
    fn test_single_chunk_completes_multiple_frames() {
        let mut asm = FrameAssembler::new(2);
        let mut frames: Vec<Vec<u8>> = Vec::new();
        let n = asm.feed(&[1, 2, 3, 4, 5, 6, 7], |f| frames.push(f.to_vec()));
        assert_eq!(n, 3);
        assert_eq!(frames, vec![vec![1, 2], vec![3, 4], vec![5, 6]]);
        assert_eq!(asm.buffered(), 1);
    }

    #[test]
    fn test_one_byte_chunks() {
        let mut asm = FrameAssembler::new(3);
        let input: Vec<u8> = (0..9).collect();
        let mut frames: Vec<Vec<u8>> = Vec::new();
        let mut total = 0;
        for b in &input {
            total += asm.feed(std::slice::from_ref(b), |f| frames.push(f.to_vec()));
        }
        assert_eq!(total, 3);
        assert_eq!(frames.concat(), input);
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let mut asm = FrameAssembler::new(8);
        asm.feed(&[9, 9, 9], |_| {});
        assert_eq!(asm.buffered(), 3);

        asm.reset(4);
        assert_eq!(asm.frame_size(), 4);
        assert_eq!(asm.buffered(), 0);

        // Old partial bytes must not leak into the new frame.
        let mut frames: Vec<Vec<u8>> = Vec::new();
        asm.feed(&[1, 2, 3, 4], |f| frames.push(f.to_vec()));
        assert_eq!(frames, vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn test_zero_frame_size_consumes_nothing() {
        let mut asm = FrameAssembler::new(0);
        let mut count = 0;
        assert_eq!(asm.feed(&[1, 2, 3], |_| count += 1), 0);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_frames_match_input_slices_in_order() {
        // Arbitrary chunk sizes summing to k full frames must reproduce
        // the input stream exactly, frame by frame.
        let frame_size = 5;
        let input: Vec<u8> = (0..40).collect(); // 8 frames
        let chunk_sizes = [1, 7, 2, 11, 3, 9, 4, 3];

        let mut asm = FrameAssembler::new(frame_size);
        let mut out: Vec<u8> = Vec::new();
        let mut offset = 0;
        for size in chunk_sizes {
            asm.feed(&input[offset..offset + size], |f| out.extend_from_slice(f));
            offset += size;
        }
        assert_eq!(offset, input.len());
        assert_eq!(out, input);
    }
}
