//! # DAT Recovery Common Library
//!
//! Shared code for the DAT recovery tools:
//! - Tape frame layout and trailer parsing (`FrameInfo`)
//! - Subcode pack decoding (dates, program times, parity checks)
//! - LP-mode (12-bit non-linear) decode tables
//! - WAV header construction
//! - Frame stream reading
//! - Time formatting utilities

pub mod error;
pub mod frame;
pub mod reader;
pub mod subcode;
pub mod tables;
pub mod time;
pub mod wav;

pub use error::{Error, Result};
pub use frame::{FrameInfo, RawFrame, FRAME_SIZE};
