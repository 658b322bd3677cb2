//! Track file emission and the long-lived demultiplexing context.
//!
//! A track is written under a provisional name with a placeholder WAV
//! header. On close the header is rewritten with the final sample count, a
//! `.details` sidecar is produced, both files get the track's first subcode
//! date as their timestamps, and the `.wav` is renamed if a date arrived
//! after the track opened. Tracks below the minimum length are deleted.

use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs::{self, File, FileTimes};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::time::SystemTime;
use tracing::{debug, info, warn};

use datrec_common::error::{Error, Result};
use datrec_common::frame::{Encoding, FrameInfo, RawFrame};
use datrec_common::{time, wav};

use crate::audio;
use crate::options::Options;

/// Name a track file: prefix + date timestamp, or prefix + track number when
/// the track never saw a subcode date.
fn track_filename(
    prefix: &str,
    date: Option<DateTime<Local>>,
    track_number: u32,
    suffix: &str,
) -> PathBuf {
    match date {
        Some(t) => PathBuf::from(format!("{prefix}{}.{suffix}", time::filename_timestamp(&t))),
        None => PathBuf::from(format!("{prefix}{track_number}.{suffix}")),
    }
}

/// Set both file times to the track's first subcode date, when there is one.
fn apply_date(file: &File, date: Option<DateTime<Local>>) -> Result<()> {
    if let Some(t) = date {
        let st = SystemTime::from(t);
        file.set_times(FileTimes::new().set_accessed(st).set_modified(st))?;
    }
    Ok(())
}

/// An open track sink.
pub struct TrackWriter {
    file: File,
    provisional_path: PathBuf,
    /// Sticky format of the track, from the frame that opened it. The frame
    /// number and date track the last valid frame; the program number is
    /// adopted later if the opening frame had none.
    pub info: FrameInfo,
    /// Per-channel samples written so far.
    pub n_samples: u64,
    pub first_frame: u64,
    pub first_date_time: Option<DateTime<Local>>,
}

impl TrackWriter {
    /// Create the sink and write a placeholder header; the header is
    /// rewritten with the real sample count when the track closes.
    pub fn open(info: &FrameInfo, prefix: &str, track_number: u32) -> Result<TrackWriter> {
        let path = track_filename(prefix, info.date_time, track_number, "wav");
        info!("creating {}", path.display());
        let mut file = File::create(&path)?;
        file.write_all(&wav::pcm16_header(0, info.channels, info.sampling_frequency))?;
        Ok(TrackWriter {
            file,
            provisional_path: path,
            info: info.clone(),
            n_samples: 0,
            first_frame: info.frame_number,
            first_date_time: info.date_time,
        })
    }

    pub fn length_seconds(&self) -> f64 {
        self.n_samples as f64 / self.info.sampling_frequency as f64
    }

    /// Finalize the sink. Returns whether the track was kept.
    pub fn close(self, opts: &Options, track_number: u32) -> Result<bool> {
        let TrackWriter {
            mut file,
            provisional_path,
            info,
            n_samples,
            first_frame,
            first_date_time,
        } = self;

        let track_seconds = n_samples as f64 / info.sampling_frequency as f64;
        if track_seconds < opts.min_track_seconds {
            if n_samples == 0 {
                info!("deleting {} - no data", provisional_path.display());
            } else {
                info!(
                    "deleting {} because {:.2}s long - minimum track length {:.2}s",
                    provisional_path.display(),
                    track_seconds,
                    opts.min_track_seconds
                );
            }
            drop(file);
            fs::remove_file(&provisional_path)?;
            return Ok(false);
        }

        debug!(
            "re-writing header to {}: {} channels of {} samples at {}hz",
            provisional_path.display(),
            info.channels,
            n_samples,
            info.sampling_frequency
        );
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&wav::pcm16_header(n_samples, info.channels, info.sampling_frequency))?;
        apply_date(&file, first_date_time)?;
        drop(file);

        write_details(opts, track_number, &info, n_samples, first_frame, first_date_time)?;

        let final_path = track_filename(&opts.prefix, first_date_time, track_number, "wav");
        if final_path != provisional_path {
            info!(
                "renaming {} to {}",
                provisional_path.display(),
                final_path.display()
            );
            fs::rename(&provisional_path, &final_path)?;
        }
        Ok(true)
    }
}

/// Write the `.details` sidecar describing a finished track.
fn write_details(
    opts: &Options,
    track_number: u32,
    info: &FrameInfo,
    n_samples: u64,
    first_frame: u64,
    first_date_time: Option<DateTime<Local>>,
) -> Result<()> {
    let path = track_filename(&opts.prefix, first_date_time, track_number, "details");
    info!("creating {}", path.display());
    let mut file = File::create(&path)?;
    writeln!(file, "Sampling frequency: {}", info.sampling_frequency)?;
    writeln!(file, "Channels: {}", info.channels)?;
    writeln!(file, "Samples: {}", n_samples)?;
    writeln!(file, "Quantization: {}", info.encoding.label())?;
    writeln!(file, "Emphasis: {}", info.emphasis.label())?;
    match info.program_number {
        Some(pno) => writeln!(file, "Program_number: {pno}")?,
        None => writeln!(file, "Program_number: --")?,
    }
    match first_date_time {
        Some(t) => writeln!(file, "First date: {}", time::ctime_style(&t))?,
        None => writeln!(file, "First date: --")?,
    }
    match info.date_time {
        Some(t) => writeln!(file, "Last date: {}", time::ctime_style(&t))?,
        None => writeln!(file, "Last date: --")?,
    }
    writeln!(file, "First frame: {first_frame}")?;
    writeln!(file, "Last frame: {}", info.frame_number)?;
    apply_date(&file, first_date_time)?;
    Ok(())
}

/// Long-lived state of one demultiplexing run: the open track, the global
/// counters and the per-track warning dedup set. Persists across input
/// files.
pub struct DemuxContext {
    pub opts: Options,
    /// Number the next kept track will carry; advances only when a track is
    /// kept, so deleted tracks don't consume names.
    pub track_number: u32,
    /// Seconds of audio produced so far, against the global budget.
    pub audio_seconds_read: f64,
    pub consecutive_nonaudio: u32,
    /// Frames still to drop after a segment change.
    pub skip_frames: u32,
    pub track: Option<TrackWriter>,
    warnings_enabled: bool,
    warned: HashSet<&'static str>,
}

impl DemuxContext {
    pub fn new(opts: Options) -> DemuxContext {
        let warnings_enabled = !opts.quiet;
        DemuxContext {
            opts,
            track_number: 1,
            audio_seconds_read: 0.0,
            consecutive_nonaudio: 0,
            skip_frames: 0,
            track: None,
            warnings_enabled,
            warned: HashSet::new(),
        }
    }

    /// Surface a parser advisory, at most once per track.
    pub fn warn_once(&mut self, message: &'static str) {
        if self.warnings_enabled && self.warned.insert(message) {
            warn!("track {}: {}", self.track_number, message);
        }
    }

    pub fn open_track(&mut self, info: &FrameInfo) -> Result<()> {
        if self.track.is_some() {
            return Err(Error::TrackState(
                "opening a track while the previous one is still open".into(),
            ));
        }
        self.track = Some(TrackWriter::open(info, &self.opts.prefix, self.track_number)?);
        Ok(())
    }

    /// Close the open track, if any. Idempotent.
    pub fn close_track(&mut self) -> Result<()> {
        if let Some(track) = self.track.take() {
            if track.close(&self.opts, self.track_number)? {
                self.track_number += 1;
                self.warned.clear();
            }
        }
        Ok(())
    }

    /// Write one frame's audio to the open track, in the track's fixed
    /// format. No-op when no track is open.
    pub fn write_frame_audio(&mut self, frame: &RawFrame) -> Result<()> {
        let Some(track) = self.track.as_mut() else {
            return Ok(());
        };
        let samples = match track.info.encoding {
            Encoding::NonLinear12 => {
                let bytes = audio::decode_lp_frame(frame);
                track.file.write_all(&bytes)?;
                audio::LP_UNPACKED_LEN as u64 / (2 * track.info.channels as u64)
            }
            Encoding::Linear16 => {
                let n = audio::pcm_payload_len(track.info.sampling_frequency).ok_or_else(|| {
                    Error::TrackState(format!(
                        "track open at unsupported sampling frequency {}",
                        track.info.sampling_frequency
                    ))
                })?;
                track.file.write_all(&frame[..n])?;
                n as u64 / (2 * track.info.channels as u64)
            }
        };
        track.n_samples += samples;
        let frequency = track.info.sampling_frequency;
        self.audio_seconds_read += samples as f64 / frequency as f64;
        Ok(())
    }
}
