//! DAT Test Frame Generation Utilities
//!
//! Builds synthetic 5822-byte tape frames with known trailer contents for
//! exercising the parser, segmenter and merge pipelines: audio frames in
//! each format, non-audio frames, gap and end-of-tape markers, and frames
//! carrying subcode date packs.

use chrono::{Datelike, NaiveDate};
use datrec_common::frame::{FRAME_SIZE, MAINID_OFFSET, PACKS_OFFSET, SUBID_OFFSET};
use std::fs;
use std::path::Path;

fn bcd(v: u32) -> u8 {
    (((v / 10) << 4) | (v % 10)) as u8
}

/// Builder for one raw frame. Starts as a silent stereo 48 kHz 16-bit
/// linear audio frame with no program number and no subcode packs.
pub struct FrameBuilder {
    frame: [u8; FRAME_SIZE],
}

impl FrameBuilder {
    pub fn audio() -> Self {
        FrameBuilder { frame: [0u8; FRAME_SIZE] }
    }

    /// Fill the 5760-byte payload with a constant.
    pub fn payload_fill(mut self, byte: u8) -> Self {
        for b in &mut self.frame[..5760] {
            *b = byte;
        }
        self
    }

    /// Set the sampling frequency code (48000, 44100 or 32000).
    pub fn sampling_frequency(mut self, hz: u32) -> Self {
        let code = match hz {
            48000 => 0,
            44100 => 1,
            32000 => 2,
            _ => panic!("no rate code for {hz}"),
        };
        self.frame[MAINID_OFFSET] = (self.frame[MAINID_OFFSET] & !0x0c) | (code << 2);
        self
    }

    /// Use a reserved sampling frequency code so the frame parses as
    /// invalid-fields.
    pub fn reserved_rate_code(mut self) -> Self {
        self.frame[MAINID_OFFSET] |= 0x0c;
        self
    }

    /// Switch to 12-bit non-linear encoding at 32 kHz (LP mode).
    pub fn lp_mode(mut self) -> Self {
        self.frame[MAINID_OFFSET + 1] |= 0x40;
        self.sampling_frequency(32000)
    }

    /// Mark pre-emphasis.
    pub fn pre_emphasis(mut self) -> Self {
        self.frame[MAINID_OFFSET] |= 0x10;
        self
    }

    /// Set a valid BCD program number (1..=999) with its control bits.
    pub fn program_number(mut self, pno: u16) -> Self {
        assert!(pno <= 999);
        let (h, t, o) = ((pno / 100) as u8, ((pno / 10) % 10) as u8, (pno % 10) as u8);
        self.frame[SUBID_OFFSET] |= 0xC0; // ctrlid: priority + start
        self.frame[SUBID_OFFSET + 1] = (self.frame[SUBID_OFFSET + 1] & 0x0f) | (h << 4);
        self.frame[SUBID_OFFSET + 2] = (t << 4) | o;
        self
    }

    /// Set the raw packed PNO nibbles without control bits, for the gap
    /// (0x0BB) and end-of-tape (0x0EE) markers.
    pub fn raw_pno(mut self, hex: u16) -> Self {
        self.frame[SUBID_OFFSET + 1] =
            (self.frame[SUBID_OFFSET + 1] & 0x0f) | (((hex >> 8) as u8 & 0xf) << 4);
        self.frame[SUBID_OFFSET + 2] = (hex & 0xff) as u8;
        self
    }

    /// Give the frame a non-zero data id, making it non-audio.
    pub fn non_audio(mut self) -> Self {
        self.frame[SUBID_OFFSET] |= 0x03;
        self
    }

    /// Set the interpolate bits the drive uses to flag reconstructed data.
    pub fn interpolated(mut self) -> Self {
        self.frame[SUBID_OFFSET + 3] |= 0x60;
        self
    }

    /// Add a subcode date pack decoding to the given local wall-clock time.
    /// The on-tape hour field is stored one ahead and the weekday 1-based
    /// from Sunday, matching what the parser undoes.
    pub fn date(mut self, year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        let weekday = NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .weekday()
            .num_days_from_sunday()
            + 1;
        let yy = (if year >= 2000 { year - 2000 } else { year - 1900 }) as u32;
        let mut pack = [
            0x50 | weekday as u8,
            bcd(yy),
            bcd(month),
            bcd(day),
            bcd(hour + 1),
            bcd(min),
            bcd(sec),
            0,
        ];
        pack[7] = pack[..7].iter().fold(0u8, |acc, b| acc ^ b);
        self.frame[PACKS_OFFSET..PACKS_OFFSET + 8].copy_from_slice(&pack);
        self
    }

    pub fn build(self) -> [u8; FRAME_SIZE] {
        self.frame
    }
}

/// Concatenate frames into a tape image.
pub fn image(frames: &[[u8; FRAME_SIZE]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frames.len() * FRAME_SIZE);
    for frame in frames {
        out.extend_from_slice(frame);
    }
    out
}

/// Write a tape image file.
pub fn write_image(path: &Path, frames: &[[u8; FRAME_SIZE]]) {
    fs::write(path, image(frames)).unwrap();
}

/// `count` copies of the same frame.
pub fn repeat(frame: [u8; FRAME_SIZE], count: usize) -> Vec<[u8; FRAME_SIZE]> {
    vec![frame; count]
}
