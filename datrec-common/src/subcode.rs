//! Subcode pack decoding.
//!
//! Each frame trailer carries seven 8-byte packs. A pack's id sits in the
//! high nibble of its first byte; byte 7 is the XOR parity of bytes 0..6.
//! Only the date pack (id 5) contributes to [`FrameInfo`](crate::FrameInfo);
//! program/absolute/running time packs are decoded for diagnostics only.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone};
use tracing::{debug, trace};

use crate::frame::{unbcd, RawFrame, N_PACKS, PACKS_OFFSET, PACK_SIZE};

/// Pack id labels, indexed by the id nibble.
const PACK_LABELS: [&str; 10] = [
    "Unused",
    "Program time",
    "Absolute time",
    "Running Time",
    "Table of Contents",
    "Date",
    "Catalog",
    "Catalog Number",
    "International Standard Recording Code",
    "Pro Binary",
];

pub const WARN_TIME_CONVERSION: &str = "can not convert time";
pub const WARN_WEEKDAY: &str =
    "Day of week apparently set incorrectly on recording - using correct day of week";

/// Result of scanning the seven packs of one frame.
#[derive(Debug, Default)]
pub struct PackScan {
    /// Date/time from the last good date pack, if any.
    pub date_time: Option<DateTime<Local>>,
    /// Advisories for the caller to surface.
    pub warnings: Vec<&'static str>,
}

fn pack_label(id: u8) -> &'static str {
    PACK_LABELS.get(id as usize).copied().unwrap_or("Unknown")
}

/// Scan all subcode packs of `frame`. Packs failing parity are dropped.
pub fn scan_packs(frame: &RawFrame, frame_number: u64) -> PackScan {
    let mut scan = PackScan::default();
    for pack_index in 0..N_PACKS {
        let start = PACKS_OFFSET + pack_index * PACK_SIZE;
        let pack = &frame[start..start + PACK_SIZE];
        let id = (pack[0] >> 4) & 0xf;
        if id == 0 {
            continue;
        }

        let parity = pack[..7].iter().fold(0u8, |acc, b| acc ^ b);
        if parity != pack[7] {
            debug!(
                frame = frame_number,
                pack = pack_index,
                label = pack_label(id),
                "incorrect parity {parity:#x} != {:#x}",
                pack[7]
            );
            continue;
        }

        match id {
            1..=3 => trace!(
                frame = frame_number,
                pack = pack_index,
                label = pack_label(id),
                "indexnr={} {}:{}:{} frame={}",
                unbcd(pack[2]),
                unbcd(pack[3]),
                unbcd(pack[4]),
                unbcd(pack[5]),
                unbcd(pack[6]),
            ),
            5 => decode_date_pack(pack, frame_number, &mut scan),
            _ => trace!(
                frame = frame_number,
                pack = pack_index,
                label = pack_label(id),
                "pack not decoded"
            ),
        }
    }
    scan
}

/// Decode a date pack into an absolute local time.
///
/// The year is a two-digit BCD with a 1950..2049 window. The hour field is
/// stored one ahead by the recorders this was validated against, so it is
/// applied as a signed offset of `BCD - 1` hours; hour byte 0 therefore
/// lands on 23:00 of the previous day.
fn decode_date_pack(pack: &[u8], frame_number: u64, scan: &mut PackScan) {
    let weekday = pack[0] & 0xf;
    if weekday > 7 {
        trace!(frame = frame_number, weekday, "date pack with invalid weekday");
        return;
    }

    let mut year = unbcd(pack[1]);
    if year < 50 {
        year += 100;
    }
    let year = 1900 + year as i32;
    let month = unbcd(pack[2]);
    let day = unbcd(pack[3]);
    let hours = unbcd(pack[4]) as i64 - 1;
    let minute = unbcd(pack[5]);
    let second = unbcd(pack[6]);

    let date_time = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, minute, second))
        .and_then(|dt| dt.checked_add_signed(Duration::hours(hours)))
        .and_then(|dt| Local.from_local_datetime(&dt).earliest());
    let Some(date_time) = date_time else {
        scan.warnings.push(WARN_TIME_CONVERSION);
        return;
    };

    trace!(frame = frame_number, date = %date_time, "date pack");
    if weekday as i32 - 1 != date_time.weekday().num_days_from_sunday() as i32 {
        scan.warnings.push(WARN_WEEKDAY);
    }
    scan.date_time = Some(date_time);
}
