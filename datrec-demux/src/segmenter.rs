//! Tape-to-track segmentation.
//!
//! A two-state machine (no track open / track open) driven by each parsed
//! frame together with its successor. The look-ahead frame damps spurious
//! single-frame glitches: a lone inconsistent or non-audio frame between
//! frames that agree with the open track neither closes it nor contributes
//! audio of its own.

use tracing::{debug, info};

use datrec_common::error::Result;
use datrec_common::frame::{FrameInfo, RawFrame, INTERPOLATE_BITS, PNO_END_OF_TAPE, PNO_GAP};

use crate::options::Options;
use crate::track::DemuxContext;

/// Whether the pipeline should keep feeding frames after this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

/// First reason two frame infos cannot belong to the same track, if any.
///
/// The one-second date tolerance accommodates subcode clocks that tick
/// during a frame.
pub fn inconsistent(a: &FrameInfo, b: &FrameInfo, opts: &Options) -> Option<&'static str> {
    if opts.segment_on_datetime() {
        if let (Some(x), Some(y)) = (a.date_time, b.date_time) {
            if (x - y).num_seconds().abs() > 1 {
                return Some("jump in subcode date/time");
            }
        }
    }
    if a.channels != b.channels {
        return Some("change in number of channels");
    }
    if a.sampling_frequency != b.sampling_frequency {
        return Some("change in sampling frequency");
    }
    if opts.segment_on_program_number() {
        if let (Some(x), Some(y)) = (a.program_number, b.program_number) {
            if x != y {
                return Some("change in program number");
            }
        }
    }
    if a.encoding != b.encoding {
        return Some("change in encoding");
    }
    if a.emphasis != b.emphasis {
        return Some("change in emphasis");
    }
    None
}

/// Process one frame against the context, with `next_info` as look-ahead.
/// At end of stream the final frame is processed with itself as look-ahead.
pub fn process_frame(
    ctx: &mut DemuxContext,
    frame: &RawFrame,
    info: &FrameInfo,
    next_info: &FrameInfo,
) -> Result<Flow> {
    if info.hex_pno == PNO_END_OF_TAPE {
        info!(frame = info.frame_number, "end of tape reached (0x0EE pno found)");
        ctx.close_track()?;
        return Ok(Flow::Halt);
    }
    if info.hex_pno == PNO_GAP {
        debug!(frame = info.frame_number, "gap marker (0x0BB pno), closing track");
        ctx.close_track()?;
        return Ok(Flow::Continue);
    }
    if info.interpolate_flags & INTERPOLATE_BITS != 0 {
        debug!(frame = info.frame_number, "interpolate flags set - ignoring");
    }
    for message in &info.warnings {
        ctx.warn_once(message);
    }

    if !info.is_audio() {
        ctx.consecutive_nonaudio += 1;
        if ctx.consecutive_nonaudio >= ctx.opts.max_nonaudio_tape {
            ctx.close_track()?;
            info!(
                "halting: {} consecutive frames of non-audio data encountered",
                ctx.consecutive_nonaudio
            );
            return Ok(Flow::Halt);
        }
        let Some(track) = &ctx.track else {
            debug!(frame = info.frame_number, "skipping non-audio frame outside track");
            return Ok(Flow::Continue);
        };
        if next_info.is_audio() && inconsistent(&track.info, next_info, &ctx.opts).is_none() {
            info!(
                frame = info.frame_number,
                "ignoring non-audio frame because next frame is consistent audio"
            );
        } else if ctx.consecutive_nonaudio >= ctx.opts.max_nonaudio_track {
            info!(
                "closing track {} because {} frames of non-audio data encountered",
                ctx.track_number, ctx.consecutive_nonaudio
            );
            ctx.close_track()?;
        } else {
            info!(frame = info.frame_number, "ignoring non-audio frame");
        }
        return Ok(Flow::Continue);
    }
    ctx.consecutive_nonaudio = 0;

    // The segmenter works on its own copy so a healed glitch can adopt the
    // neighbouring frames' fields without touching the caller's view.
    let mut info = info.clone();
    if let Some(track) = &ctx.track {
        let mut reason = inconsistent(&track.info, &info, &ctx.opts);
        if let Some(r) = reason {
            if inconsistent(&track.info, next_info, &ctx.opts).is_none() {
                info!(
                    frame = info.frame_number,
                    "ignoring {r} because previous and next frame are consistent"
                );
                info.channels = next_info.channels;
                info.sampling_frequency = next_info.sampling_frequency;
                info.encoding = next_info.encoding;
                info.emphasis = next_info.emphasis;
                info.program_number = next_info.program_number;
                info.date_time = next_info.date_time;
                reason = None;
            }
        }
        if let Some(r) = reason {
            debug!("closing track {} because {r}", ctx.track_number);
            ctx.close_track()?;
            ctx.skip_frames = ctx.opts.skip_frames_on_segment_change;
        }
    }

    if ctx.skip_frames > 0 {
        ctx.skip_frames -= 1;
        return Ok(Flow::Continue);
    }

    if ctx.track.is_none() {
        ctx.open_track(&info)?;
    }
    if let Some(track) = ctx.track.as_mut() {
        track.info.frame_number = info.frame_number;
        if let Some(dt) = info.date_time {
            track.info.date_time = Some(dt);
            if track.first_date_time.is_none() {
                track.first_date_time = Some(dt);
            }
        }
        if track.info.program_number.is_none() {
            track.info.program_number = info.program_number;
        }
    }
    ctx.write_frame_audio(frame)?;

    if ctx.audio_seconds_read >= ctx.opts.max_audio_seconds {
        info!(
            "closing track {} and halting, limit of {:.2} seconds reached",
            ctx.track_number, ctx.opts.max_audio_seconds
        );
        ctx.close_track()?;
        return Ok(Flow::Halt);
    }
    if let Some(track) = &ctx.track {
        if track.length_seconds() >= ctx.opts.max_track_seconds {
            info!(
                "closing track {}, limit of {:.2} seconds reached",
                ctx.track_number, ctx.opts.max_track_seconds
            );
            ctx.close_track()?;
        }
    }
    Ok(Flow::Continue)
}
