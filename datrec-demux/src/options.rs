//! Command line options for the demultiplexer.

use clap::Parser;
use std::path::PathBuf;

/// Demultiplex DAT tape images into WAV tracks with `.details` sidecars
#[derive(Parser, Debug, Clone)]
#[command(name = "datrec-demux", disable_version_flag = true)]
pub struct Options {
    /// Halt after this many consecutive non-audio frames
    #[arg(short = 'a', long = "max_nonaudio_tape", value_name = "FRAMES", default_value_t = 10)]
    pub max_nonaudio_tape: u32,

    /// Close the track after this many consecutive non-audio frames
    #[arg(short = 'A', long = "max_nonaudio_track", value_name = "FRAMES", default_value_t = 0)]
    pub max_nonaudio_track: u32,

    /// Don't start a new track when the subcode date/time jumps
    #[arg(short = 'd', long = "ignore_date_time")]
    pub ignore_date_time: bool,

    /// Delete tracks shorter than this many seconds
    #[arg(
        short = 'm',
        long = "minimum_track_length",
        value_name = "SECONDS",
        default_value_t = 1.0
    )]
    pub min_track_seconds: f64,

    /// Close the track when it reaches this many seconds
    #[arg(
        short = 'M',
        long = "maximum_track_length",
        value_name = "SECONDS",
        default_value_t = 360000.0
    )]
    pub max_track_seconds: f64,

    /// Don't start a new track when the program number changes
    #[arg(short = 'n', long = "ignore_program_number")]
    pub ignore_program_number: bool,

    /// Output filename prefix
    #[arg(short = 'p', long = "prefix", value_name = "PREFIX", default_value = "")]
    pub prefix: String,

    /// Suppress warnings
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Halt after producing this many seconds of audio
    #[arg(
        short = 'r',
        long = "read_n_seconds",
        value_name = "SECONDS",
        default_value_t = 360000.0
    )]
    pub max_audio_seconds: f64,

    /// Drop this many frames after each segment change
    #[arg(short = 's', long = "skip_n_frames", value_name = "FRAMES", default_value_t = 0)]
    pub skip_frames_on_segment_change: u32,

    /// Advance the input by this many frames before processing
    #[arg(short = 'S', long = "seek_n_frames", value_name = "FRAMES", default_value_t = 0)]
    pub seek_frames: u64,

    /// Verbosity level 0..5
    #[arg(short = 'v', long = "verbose", value_name = "LEVEL", default_value_t = 1)]
    pub verbosity: u8,

    /// Print the version and continue
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// Tape image files or devices to process
    #[arg(value_name = "IMAGE", required = true)]
    pub inputs: Vec<PathBuf>,
}

impl Options {
    /// Apply the same post-parse fixups the flag semantics require:
    /// the track threshold cannot exceed the tape threshold, and quiet
    /// forces verbosity to zero.
    pub fn normalize(&mut self) {
        if self.max_nonaudio_tape < self.max_nonaudio_track {
            self.max_nonaudio_tape = self.max_nonaudio_track;
        }
        if self.quiet {
            self.verbosity = 0;
        }
    }

    pub fn segment_on_datetime(&self) -> bool {
        !self.ignore_date_time
    }

    pub fn segment_on_program_number(&self) -> bool {
        !self.ignore_program_number
    }

    /// Default tracing filter derived from the verbosity flags.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_nonaudio_tape: 10,
            max_nonaudio_track: 0,
            ignore_date_time: false,
            min_track_seconds: 1.0,
            max_track_seconds: 360000.0,
            ignore_program_number: false,
            prefix: String::new(),
            quiet: false,
            max_audio_seconds: 360000.0,
            skip_frames_on_segment_change: 0,
            seek_frames: 0,
            verbosity: 1,
            version: false,
            inputs: Vec::new(),
        }
    }
}
