//! WAV header reconstruction.
//!
//! Rebuilds a canonical 44-byte PCM header from scratch and prepends it
//! to the payload after byte 44, discarding whatever header was there.
//! Lossy by design: when the original header cannot be trusted there is
//! nothing to recover the real parameters from, so safe defaults
//! (PCM, stereo, 16-bit, 44.1 kHz) are assumed.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Canonical PCM header length.
pub const HEADER_LEN: usize = 44;

const DEFAULT_SAMPLE_RATE: u32 = 44_100;
const DEFAULT_CHANNELS: u16 = 2;
const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// Build a canonical PCM WAV header for a file of `total_len` bytes.
pub(crate) fn canonical_header(total_len: usize) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    let bytes_per_frame = DEFAULT_CHANNELS * DEFAULT_BITS_PER_SAMPLE / 8;
    let byte_rate = DEFAULT_SAMPLE_RATE * u32::from(bytes_per_frame);
    let riff_size = (total_len.saturating_sub(8)) as u32;
    let data_size = (total_len.saturating_sub(HEADER_LEN)) as u32;

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&riff_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&DEFAULT_CHANNELS.to_le_bytes());
    header[24..28].copy_from_slice(&DEFAULT_SAMPLE_RATE.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&bytes_per_frame.to_le_bytes());
    header[34..36].copy_from_slice(&DEFAULT_BITS_PER_SAMPLE.to_le_bytes());
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());
    header
}

pub(super) fn rebuild(path: &Path) -> Result<()> {
    let data = fs::read(path)?;
    if data.len() < HEADER_LEN {
        return Err(Error::repair(path, "WAV file too small to repair"));
    }

    let mut rebuilt = Vec::with_capacity(data.len());
    rebuilt.extend_from_slice(&canonical_header(data.len()));
    rebuilt.extend_from_slice(&data[HEADER_LEN..]);
    fs::write(path, rebuilt)?;
    Ok(())
}
