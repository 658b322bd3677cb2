//! # DAT Triple-Image Merge
//!
//! Reconstructs a clean tape image from three independent byte-for-byte
//! reads of the same tape. Where the reads agree the output is their common
//! byte; where they split, two-of-three majority carries; the tape's own
//! interpolate flags and accumulated per-input error counts settle the rest.

use std::io::{Read, Write};
use tracing::debug;

use datrec_common::error::{Error, Result};
use datrec_common::frame::{trailer_interpolate_flags, trailer_pno, RawFrame, FRAME_SIZE, PNO_GAP};
use datrec_common::reader::read_frame;

/// Counters accumulated over one merge run.
#[derive(Debug, Default, Clone)]
pub struct MergeStats {
    /// Per-input count of bytes corrected away from that input.
    pub corrected: [u64; 3],
    /// Byte positions where all three inputs disagreed.
    pub uncorrected: u64,
    /// Frames emitted.
    pub frames: u64,
}

/// Decide one byte position where the three inputs are not unanimous.
///
/// Decision ladder:
/// 1. If exactly one input has its interpolate flags clear and its byte
///    differs from both others, that input carries: the drive reconstructed
///    the other two reads itself, so the lone clean read outranks them.
///    Both disagreeing inputs are charged an error.
/// 2. Two-of-three majority; the odd input out is charged an error.
/// 3. All three disagree: the input with the fewest accumulated errors
///    carries (smallest index on a tie) and nobody is charged, but the
///    position counts as uncorrected.
fn resolve_byte(
    bytes: [u8; 3],
    interpolated: [bool; 3],
    corrected: &mut [u64; 3],
    uncorrected: &mut u64,
) -> u8 {
    let mut clear = (0..3).filter(|&i| !interpolated[i]);
    if let (Some(lone), None) = (clear.next(), clear.next()) {
        if (0..3).all(|i| i == lone || bytes[i] != bytes[lone]) {
            for (i, count) in corrected.iter_mut().enumerate() {
                if bytes[i] != bytes[lone] {
                    *count += 1;
                }
            }
            return bytes[lone];
        }
    }

    if bytes[0] == bytes[1] {
        corrected[2] += 1;
        return bytes[0];
    }
    if bytes[0] == bytes[2] {
        corrected[1] += 1;
        return bytes[0];
    }
    if bytes[1] == bytes[2] {
        corrected[0] += 1;
        return bytes[1];
    }

    *uncorrected += 1;
    let winner = (0..3).min_by_key(|&i| corrected[i]).unwrap_or(0);
    bytes[winner]
}

/// Merge three frame streams into `out`, accumulating `stats`.
///
/// Terminates cleanly when any input reaches end of stream. On the very
/// first frame, inputs positioned on a leading gap-marker frame (PNO 0x0BB)
/// are advanced past it individually so the three reads line up.
///
/// Aborts with [`Error::Misaligned`] when the uncorrected count exceeds both
/// one frame's worth of bytes and a sixteenth of the bytes compared so far.
pub fn merge<R: Read, W: Write>(
    mut inputs: [R; 3],
    mut out: W,
    stats: &mut MergeStats,
) -> Result<()> {
    let mut frame_idx: u64 = 0;
    loop {
        let mut frames = [[0u8; FRAME_SIZE]; 3];
        let mut interpolated = [false; 3];
        for (i, input) in inputs.iter_mut().enumerate() {
            loop {
                let Some(frame) = read_frame(input)? else {
                    return Ok(());
                };
                if frame_idx == 0 && trailer_pno(&frame) == PNO_GAP {
                    debug!(input = i, "skipping leading gap-marker frame");
                    continue;
                }
                interpolated[i] = trailer_interpolate_flags(&frame) != 0;
                frames[i] = frame;
                break;
            }
        }

        let mut merged: RawFrame = frames[0];
        for n in 0..FRAME_SIZE {
            if frames[0][n] == frames[1][n] && frames[1][n] == frames[2][n] {
                continue;
            }
            merged[n] = resolve_byte(
                [frames[0][n], frames[1][n], frames[2][n]],
                interpolated,
                &mut stats.corrected,
                &mut stats.uncorrected,
            );
        }
        out.write_all(&merged)?;
        stats.frames = frame_idx + 1;

        if stats.uncorrected > FRAME_SIZE as u64
            && stats.uncorrected > frame_idx * FRAME_SIZE as u64 / 16
        {
            return Err(Error::Misaligned {
                uncorrected: stats.uncorrected,
                frames: stats.frames,
            });
        }
        frame_idx += 1;
    }
}
