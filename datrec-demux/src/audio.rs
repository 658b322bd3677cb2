//! Audio payload extraction.
//!
//! PCM frames carry their samples verbatim in a sample-rate dependent prefix
//! of the payload. LP frames pack two 12-bit samples into three payload
//! bytes, scattered through the frame by a fixed permutation; they are
//! expanded here to 16-bit little-endian PCM.

use datrec_common::frame::{RawFrame, DATA_SIZE};
use datrec_common::tables::{LP_DECODE, LP_FRAME_INDEX};

/// Payload bytes carrying audio in a PCM frame, by sampling frequency.
pub fn pcm_payload_len(sampling_frequency: u32) -> Option<usize> {
    match sampling_frequency {
        48000 => Some(5760),
        44100 => Some(5292),
        32000 => Some(3840),
        _ => None,
    }
}

/// Unpacked size of one LP frame: 3840 16-bit samples.
pub const LP_UNPACKED_LEN: usize = 7680;

/// Decode one LP frame's payload to 16-bit little-endian PCM.
///
/// Each permuted byte triplet `(x0, x1, x2)` yields two samples: the codes
/// are `x0` joined with `x1`'s high nibble, and `x2` joined with `x1`'s low
/// nibble. Output bytes are written explicitly, so host endianness never
/// matters.
pub fn decode_lp_frame(frame: &RawFrame) -> Vec<u8> {
    let mut out = Vec::with_capacity(LP_UNPACKED_LEN);
    for i in (0..DATA_SIZE).step_by(3) {
        let x0 = frame[LP_FRAME_INDEX[i] as usize] as usize;
        let x1 = frame[LP_FRAME_INDEX[i + 1] as usize] as usize;
        let x2 = frame[LP_FRAME_INDEX[i + 2] as usize] as usize;
        let a = LP_DECODE[(x0 << 4) | ((x1 >> 4) & 0xf)];
        let b = LP_DECODE[(x2 << 4) | (x1 & 0xf)];
        out.extend_from_slice(&a.to_le_bytes());
        out.extend_from_slice(&b.to_le_bytes());
    }
    out
}
