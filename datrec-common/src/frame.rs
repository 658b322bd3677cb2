//! DAT tape frame layout and trailer parsing.
//!
//! A frame is 5822 contiguous bytes on tape: 5760 bytes of audio payload
//! followed by a 62 byte trailer. The trailer holds seven 8-byte subcode
//! packs, a 4 byte sub-id and a 2 byte main-id. `FrameInfo::parse` decodes
//! the trailer into structured metadata; it never touches the payload.

use chrono::{DateTime, Local};

use crate::subcode;

/// Size of one tape frame in bytes.
pub const FRAME_SIZE: usize = 5822;

/// Audio payload bytes at the start of each frame.
pub const DATA_SIZE: usize = 5760;

/// Offset of the seven 8-byte subcode packs.
pub const PACKS_OFFSET: usize = DATA_SIZE;
pub const N_PACKS: usize = 7;
pub const PACK_SIZE: usize = 8;

/// Offset of the 4-byte sub-id.
pub const SUBID_OFFSET: usize = PACKS_OFFSET + N_PACKS * PACK_SIZE;
/// Offset of the 2-byte main-id.
pub const MAINID_OFFSET: usize = SUBID_OFFSET + 4;

/// Raw program number marking an inter-track gap.
pub const PNO_GAP: u16 = 0x0bb;
/// Raw program number marking the end of the recorded tape.
pub const PNO_END_OF_TAPE: u16 = 0x0ee;

/// Bits of `subid[3]` set when the drive reconstructed the frame itself.
pub const INTERPOLATE_BITS: u8 = 0x40 | 0x20;

/// Control-id bit: priority id present.
const CTRL_PRIO: u8 = 0x8;
/// Control-id bit: start id present.
const CTRL_START: u8 = 0x4;

/// One raw tape frame.
pub type RawFrame = [u8; FRAME_SIZE];

/// Frame classification from trailer decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    /// Audio frame with decodable format fields.
    Valid,
    /// Audio frame whose channel or sample-rate code is reserved.
    InvalidFields,
    /// Data (non-audio) frame.
    NonAudio,
}

/// Audio sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Linear16,
    NonLinear12,
}

impl Encoding {
    /// Label used in `.details` files.
    pub fn label(self) -> &'static str {
        match self {
            Encoding::Linear16 => "16-bit linear",
            Encoding::NonLinear12 => "12-bit non-linear",
        }
    }
}

/// Emphasis applied at recording time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    None,
    PreEmphasis,
}

impl Emphasis {
    /// Label used in `.details` files.
    pub fn label(self) -> &'static str {
        match self {
            Emphasis::None => "none",
            Emphasis::PreEmphasis => "pre-emphasis",
        }
    }
}

/// Parsed metadata for one frame. Created by [`FrameInfo::parse`], immutable
/// thereafter (the segmenter works on its own copy when it heals glitches).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInfo {
    /// Sequence index assigned by the reader.
    pub frame_number: u64,
    pub validity: Validity,
    /// 2 or 4; defaults to 2 when the code is reserved.
    pub channels: u16,
    /// 48000, 44100 or 32000; defaults to 48000 when the code is reserved.
    pub sampling_frequency: u32,
    pub encoding: Encoding,
    pub emphasis: Emphasis,
    /// BCD-decoded program number, when the control bits mark one valid.
    pub program_number: Option<u16>,
    /// Raw 12-bit packed PNO field; compare against [`PNO_GAP`] and
    /// [`PNO_END_OF_TAPE`].
    pub hex_pno: u16,
    /// Raw `subid[3]`; only [`INTERPOLATE_BITS`] are meaningful.
    pub interpolate_flags: u8,
    /// Absolute date/time from a subcode date pack, if one decoded.
    pub date_time: Option<DateTime<Local>>,
    /// Parser advisories to surface (deduplicated) at the track layer.
    pub warnings: Vec<&'static str>,
}

/// Convert a BCD-encoded byte to decimal.
pub fn unbcd(b: u8) -> u32 {
    (((b >> 4) & 0xf) as u32) * 10 + ((b & 0xf) as u32)
}

/// Raw packed PNO of a frame, without a full parse. Used by the merge tool,
/// which only needs the gap marker and interpolate flags per frame.
pub fn trailer_pno(frame: &RawFrame) -> u16 {
    let subid = &frame[SUBID_OFFSET..];
    let pno1 = ((subid[1] >> 4) & 0xf) as u16;
    let pno2 = ((subid[2] >> 4) & 0xf) as u16;
    let pno3 = (subid[2] & 0xf) as u16;
    (pno1 << 8) | (pno2 << 4) | pno3
}

/// Interpolate bits of a frame, without a full parse.
pub fn trailer_interpolate_flags(frame: &RawFrame) -> u8 {
    frame[SUBID_OFFSET + 3] & INTERPOLATE_BITS
}

impl FrameInfo {
    /// Decode the 62-byte trailer of `frame`. Pure: no I/O, output depends
    /// only on the frame bytes and the supplied sequence number.
    pub fn parse(frame: &RawFrame, frame_number: u64) -> FrameInfo {
        let subid = &frame[SUBID_OFFSET..MAINID_OFFSET];
        let mainid = &frame[MAINID_OFFSET..MAINID_OFFSET + 2];

        let channels_code = mainid[0] & 0x3;
        let samplerate_code = (mainid[0] >> 2) & 0x3;
        let emphasis_code = (mainid[0] >> 4) & 0x3;
        let encoding_code = (mainid[1] >> 6) & 0x3;
        let dataid = subid[0] & 0xf;
        let ctrlid = (subid[0] >> 4) & 0xf;
        let pno1 = (subid[1] >> 4) & 0xf;
        let pno2 = (subid[2] >> 4) & 0xf;
        let pno3 = subid[2] & 0xf;

        let mut info = FrameInfo {
            frame_number,
            validity: Validity::Valid,
            channels: 2,
            sampling_frequency: 48000,
            encoding: Encoding::Linear16,
            emphasis: Emphasis::None,
            program_number: None,
            hex_pno: ((pno1 as u16) << 8) | ((pno2 as u16) << 4) | pno3 as u16,
            interpolate_flags: subid[3],
            date_time: None,
            warnings: Vec::new(),
        };

        if dataid != 0 {
            tracing::trace!(frame = frame_number, dataid, "non-audio frame");
            info.validity = Validity::NonAudio;
            return info;
        }

        if ctrlid != 0 {
            tracing::trace!(
                frame = frame_number,
                ctrlid,
                channels_code,
                samplerate_code,
                emphasis_code,
                encoding_code,
                "control id set"
            );
        }

        if ctrlid & CTRL_START != 0 && ctrlid & CTRL_PRIO != 0 && pno1 < 10 && pno2 < 10 && pno3 < 10
        {
            info.program_number =
                Some(pno1 as u16 * 100 + pno2 as u16 * 10 + pno3 as u16);
        }

        let scan = subcode::scan_packs(frame, frame_number);
        info.date_time = scan.date_time;
        info.warnings = scan.warnings;

        match channels_code {
            0 => info.channels = 2,
            1 => info.channels = 4,
            _ => {
                tracing::info!(
                    frame = frame_number,
                    code = channels_code,
                    "invalid value for channels"
                );
                info.validity = Validity::InvalidFields;
            }
        }

        match samplerate_code {
            0 => info.sampling_frequency = 48000,
            1 => info.sampling_frequency = 44100,
            2 => info.sampling_frequency = 32000,
            _ => {
                tracing::info!(
                    frame = frame_number,
                    code = samplerate_code,
                    "invalid value for sampling frequency"
                );
                info.validity = Validity::InvalidFields;
            }
        }

        info.emphasis = match emphasis_code {
            1 => Emphasis::PreEmphasis,
            _ => Emphasis::None,
        };

        info.encoding = match encoding_code {
            0 => Encoding::Linear16,
            _ => Encoding::NonLinear12,
        };

        info
    }

    /// Whether the segmenter may write this frame's payload as audio.
    pub fn is_audio(&self) -> bool {
        self.validity == Validity::Valid
    }
}
