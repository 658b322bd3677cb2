//! Frame-sized record reading.
//!
//! Tape images are plain concatenations of 5822-byte frames with no framing
//! metadata. A read that ends mid-frame is a format violation and fatal.

use std::io::{ErrorKind, Read};

use crate::error::{Error, Result};
use crate::frame::{RawFrame, FRAME_SIZE};

/// Read one frame from `input`.
///
/// Returns `Ok(None)` on clean end of stream, `Error::ShortRead` if the
/// stream ends inside a frame.
pub fn read_frame<R: Read + ?Sized>(input: &mut R) -> Result<Option<RawFrame>> {
    let mut frame = [0u8; FRAME_SIZE];
    let mut filled = 0;
    while filled < FRAME_SIZE {
        match input.read(&mut frame[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    match filled {
        0 => Ok(None),
        FRAME_SIZE => Ok(Some(frame)),
        got => Err(Error::ShortRead { expected: FRAME_SIZE, got }),
    }
}

/// Sequential frame reader that numbers the frames it yields.
pub struct FrameReader<R> {
    input: R,
    next_frame_number: u64,
}

impl<R: Read> FrameReader<R> {
    pub fn new(input: R) -> Self {
        Self::starting_at(input, 0)
    }

    /// Start numbering at `first` (after a seek past `first` frames).
    pub fn starting_at(input: R, first: u64) -> Self {
        FrameReader { input, next_frame_number: first }
    }

    /// Next frame with its sequence number, or `None` at end of stream.
    pub fn next_frame(&mut self) -> Result<Option<(RawFrame, u64)>> {
        match read_frame(&mut self.input)? {
            Some(frame) => {
                let n = self.next_frame_number;
                self.next_frame_number += 1;
                Ok(Some((frame, n)))
            }
            None => Ok(None),
        }
    }
}
