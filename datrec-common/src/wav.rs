//! WAV header construction for 16-bit PCM output.

/// Length of a canonical RIFF/WAVE/fmt /data header.
pub const WAV_HEADER_LEN: usize = 44;

/// Build a 44-byte WAV header for 16-bit PCM.
///
/// `samples` is the per-channel sample count. Written with a placeholder
/// count when a track opens and rewritten with the final count on close.
/// All multi-byte fields are little-endian regardless of host.
pub fn pcm16_header(samples: u64, channels: u16, sample_rate: u32) -> [u8; WAV_HEADER_LEN] {
    let bytes_per_sample = 2u32;
    let data_len = (samples as u32)
        .wrapping_mul(channels as u32)
        .wrapping_mul(bytes_per_sample);
    let byte_rate = sample_rate * channels as u32 * bytes_per_sample;

    let mut h = [0u8; WAV_HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&(36 + data_len).to_le_bytes());
    h[8..16].copy_from_slice(b"WAVEfmt ");
    h[16..20].copy_from_slice(&16u32.to_le_bytes()); // fmt chunk length
    h[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    h[22..24].copy_from_slice(&channels.to_le_bytes());
    h[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    h[32..34].copy_from_slice(&(channels * bytes_per_sample as u16).to_le_bytes()); // block align
    h[34..36].copy_from_slice(&16u16.to_le_bytes()); // bits per sample
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_len.to_le_bytes());
    h
}
