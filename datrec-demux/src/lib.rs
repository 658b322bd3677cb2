//! # DAT Demultiplexer
//!
//! Splits a stream of 5822-byte DAT frames into WAV tracks, segmenting on
//! content boundaries found in the subcode metadata: program number changes,
//! date/time jumps, format changes, gap and end-of-tape markers, and runs of
//! non-audio frames.

use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info};

use datrec_common::error::{Error, Result};
use datrec_common::frame::{FrameInfo, FRAME_SIZE};
use datrec_common::reader::{read_frame, FrameReader};

pub mod audio;
pub mod options;
pub mod segmenter;
pub mod track;

pub use options::Options;
pub use segmenter::Flow;
pub use track::DemuxContext;

/// Position `file` past the configured number of leading frames.
///
/// Seeks when the input supports it; otherwise (tape devices, pipes) the
/// frames are read and discarded. Running out of input while skipping is
/// fatal.
fn seek_frames(file: &mut File, frames: u64) -> Result<()> {
    if frames == 0 {
        return Ok(());
    }
    info!("seeking {frames} frames");
    let target = frames * FRAME_SIZE as u64;
    match file.seek(SeekFrom::Start(target)) {
        Ok(pos) if pos == target => {
            debug!("seek succeeded");
            Ok(())
        }
        _ => {
            info!("seeking not possible, reading {frames} frames");
            for _ in 0..frames {
                if read_frame(file)?.is_none() {
                    return Err(Error::ShortRead { expected: FRAME_SIZE, got: 0 });
                }
            }
            Ok(())
        }
    }
}

/// Demultiplex one tape image into `ctx`.
///
/// The context carries the open track and global counters across calls, so
/// several images can continue one logical session. Returns after a clean
/// EOF (final frame processed with itself as look-ahead, track closed) or a
/// halt event; all other conditions surface as errors.
pub fn process_file(path: &Path, ctx: &mut DemuxContext) -> Result<()> {
    let mut file = File::open(path)?;
    seek_frames(&mut file, ctx.opts.seek_frames)?;
    let mut reader = FrameReader::starting_at(file, ctx.opts.seek_frames);

    let Some((mut frame, first_number)) = reader.next_frame()? else {
        return Err(Error::ShortRead { expected: FRAME_SIZE, got: 0 });
    };
    let mut info = FrameInfo::parse(&frame, first_number);

    loop {
        match reader.next_frame()? {
            Some((next_frame, next_number)) => {
                let next_info = FrameInfo::parse(&next_frame, next_number);
                if segmenter::process_frame(ctx, &frame, &info, &next_info)? == Flow::Halt {
                    return Ok(());
                }
                frame = next_frame;
                info = next_info;
            }
            None => {
                // Final frame: it is its own look-ahead.
                segmenter::process_frame(ctx, &frame, &info, &info)?;
                ctx.close_track()?;
                return Ok(());
            }
        }
    }
}
