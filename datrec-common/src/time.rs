//! Time formatting for track names and `.details` files.

use chrono::{DateTime, Local};

/// Format a date the way `ctime` does, locale-independent:
/// `Thu Feb 15 10:30:00 2001`.
pub fn ctime_style(t: &DateTime<Local>) -> String {
    t.format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Timestamp used in track filenames: `2001-02-15-10-30-00`.
pub fn filename_timestamp(t: &DateTime<Local>) -> String {
    t.format("%Y-%m-%d-%H-%M-%S").to_string()
}
