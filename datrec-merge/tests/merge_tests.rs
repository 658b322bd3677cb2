//! End-to-end merge tests over synthetic tape images.

use std::io::Cursor;

use datrec_common::error::Error;
use datrec_common::frame::{FRAME_SIZE, SUBID_OFFSET};
use datrec_merge::{merge, MergeStats};

/// A silent stereo 48 kHz audio frame with the given packed PNO nibbles.
fn frame_with_pno(hex: u16) -> [u8; FRAME_SIZE] {
    let mut frame = [0u8; FRAME_SIZE];
    frame[SUBID_OFFSET + 1] = ((hex >> 8) as u8 & 0xf) << 4;
    frame[SUBID_OFFSET + 2] = (hex & 0xff) as u8;
    frame
}

fn image(frames: &[[u8; FRAME_SIZE]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(frames.len() * FRAME_SIZE);
    for frame in frames {
        out.extend_from_slice(frame);
    }
    out
}

fn run(images: [Vec<u8>; 3]) -> (Result<(), Error>, Vec<u8>, MergeStats) {
    let [a, b, c] = images;
    let mut out = Vec::new();
    let mut stats = MergeStats::default();
    let result = merge([Cursor::new(a), Cursor::new(b), Cursor::new(c)], &mut out, &mut stats);
    (result, out, stats)
}

#[test]
fn test_identical_inputs_pass_through() {
    let img = image(&vec![frame_with_pno(0x001); 100]);
    let (result, out, stats) = run([img.clone(), img.clone(), img.clone()]);

    result.unwrap();
    assert_eq!(out.len(), 582200);
    assert_eq!(out, img, "clean data is byte-identical");
    assert_eq!(stats.frames, 100);
    assert_eq!(stats.corrected, [0, 0, 0]);
    assert_eq!(stats.uncorrected, 0);
}

#[test]
fn test_majority_outvotes_a_single_flip() {
    let img = image(&vec![frame_with_pno(0x001); 10]);
    let mut damaged = img.clone();
    damaged[3 * FRAME_SIZE + 1000] ^= 0x42; // frame 3, byte 1000 of input 1

    let (result, out, stats) = run([img.clone(), damaged, img.clone()]);
    result.unwrap();
    assert_eq!(out, img);
    assert_eq!(stats.corrected, [0, 1, 0]);
    assert_eq!(stats.uncorrected, 0);
}

#[test]
fn test_three_way_split_follows_error_history() {
    let mut img0 = image(&vec![frame_with_pno(0x001); 10]);
    let mut img1 = img0.clone();
    let mut img2 = img0.clone();

    // Seed the history: input 0 loses two majority votes, input 2 one.
    img0[100] ^= 1;
    img0[200] ^= 1;
    img2[2 * FRAME_SIZE + 300] ^= 1;

    // Frame 5, byte 2000: all three disagree.
    img0[5 * FRAME_SIZE + 2000] = 0x11;
    img1[5 * FRAME_SIZE + 2000] = 0x22;
    img2[5 * FRAME_SIZE + 2000] = 0x33;

    let (result, out, stats) = run([img0, img1, img2]);
    result.unwrap();
    assert_eq!(stats.corrected, [2, 0, 1]);
    assert_eq!(stats.uncorrected, 1);
    assert_eq!(
        out[5 * FRAME_SIZE + 2000],
        0x22,
        "the input with the fewest accumulated errors carries"
    );
}

#[test]
fn test_interpolate_flags_pick_the_clean_read() {
    let clean = image(&vec![frame_with_pno(0x001); 4]);

    // Inputs 0 and 1 flag themselves as interpolated and share a wrong
    // byte; the lone clean input 2 carries it anyway.
    let mut flagged = Vec::new();
    for _ in 0..4 {
        let mut frame = frame_with_pno(0x001);
        frame[SUBID_OFFSET + 3] = 0x60;
        flagged.extend_from_slice(&frame);
    }
    let mut img0 = flagged.clone();
    let mut img1 = flagged;
    img0[2 * FRAME_SIZE + 500] = 0x7F;
    img1[2 * FRAME_SIZE + 500] = 0x7F;

    let (result, out, stats) = run([img0, img1, clean.clone()]);
    result.unwrap();
    // The clean read carries wherever it disagrees with both flagged
    // inputs, which covers the wrong byte and the flag byte itself.
    assert_eq!(out, clean);
    assert_eq!(stats.corrected[0], 5, "flag byte on four frames plus the flip");
    assert_eq!(stats.corrected[1], 5);
    assert_eq!(stats.corrected[2], 0);
    assert_eq!(stats.uncorrected, 0);
}

#[test]
fn test_leading_gap_frames_resync_per_input() {
    let body = vec![frame_with_pno(0x001); 5];
    let mut with_gap = vec![frame_with_pno(0x0bb)];
    with_gap.extend(body.clone());

    let (result, out, stats) = run([image(&body), image(&with_gap), image(&body)]);
    result.unwrap();
    assert_eq!(out, image(&body), "input 1 realigns past its gap frame");
    assert_eq!(stats.frames, 5);
    assert_eq!(stats.corrected, [0, 0, 0]);
    assert_eq!(stats.uncorrected, 0);
}

#[test]
fn test_divergent_inputs_abort() {
    // Three unrelated images: every byte position is a three-way split.
    let img0 = vec![0x00u8; 4 * FRAME_SIZE];
    let img1 = vec![0x01u8; 4 * FRAME_SIZE];
    let img2 = vec![0x02u8; 4 * FRAME_SIZE];

    let (result, out, stats) = run([img0, img1, img2]);
    match result {
        Err(Error::Misaligned { uncorrected, frames }) => {
            assert_eq!(frames, 2, "the threshold trips after the second frame");
            assert_eq!(uncorrected, 2 * FRAME_SIZE as u64);
        }
        other => panic!("expected misalignment abort, got {other:?}"),
    }
    assert_eq!(out.len(), 2 * FRAME_SIZE, "frames written before the abort remain");
    assert_eq!(stats.uncorrected, 2 * FRAME_SIZE as u64);
}

#[test]
fn test_short_input_frame_is_fatal() {
    let good = image(&vec![frame_with_pno(0x001); 2]);
    let mut truncated = good.clone();
    truncated.truncate(2 * FRAME_SIZE - 50);

    let (result, out, _) = run([good.clone(), truncated, good]);
    match result {
        Err(Error::ShortRead { expected, got }) => {
            assert_eq!(expected, FRAME_SIZE);
            assert_eq!(got, FRAME_SIZE - 50);
        }
        other => panic!("expected short read error, got {other:?}"),
    }
    assert_eq!(out.len(), FRAME_SIZE, "the first frame was already emitted");
}

#[test]
fn test_any_stream_ending_stops_cleanly() {
    let long = image(&vec![frame_with_pno(0x001); 6]);
    let short = image(&vec![frame_with_pno(0x001); 4]);

    let (result, out, stats) = run([long.clone(), short, long]);
    result.unwrap();
    assert_eq!(stats.frames, 4);
    assert_eq!(out.len(), 4 * FRAME_SIZE);
}
