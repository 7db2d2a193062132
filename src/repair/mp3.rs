//! MP3 stream rebuild.
//!
//! Skips past any leading ID3v2 block (its length is declared in four
//! synchsafe size bytes), scans forward for the first valid frame-sync
//! marker, and rewrites the file as tag block + audio from that frame on.
//! Leading garbage between the two is discarded.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::integrity::is_frame_sync;

/// Decode a 4-byte synchsafe integer (7 data bits per byte).
pub fn synchsafe_len(bytes: &[u8; 4]) -> usize {
    ((bytes[0] as usize & 0x7F) << 21)
        | ((bytes[1] as usize & 0x7F) << 14)
        | ((bytes[2] as usize & 0x7F) << 7)
        | (bytes[3] as usize & 0x7F)
}

/// Length of a leading ID3v2 block, 0 when there is none.
///
/// A declared length running past the end of the data is clamped; the
/// frame scan will then come up empty and the repair fails cleanly.
fn id3v2_block_len(data: &[u8]) -> usize {
    if data.len() >= 10 && data.starts_with(b"ID3") {
        let size: &[u8; 4] = data[6..10].try_into().expect("slice is 4 bytes");
        (10 + synchsafe_len(size)).min(data.len())
    } else {
        0
    }
}

pub(super) fn rebuild(path: &Path) -> Result<()> {
    let data = fs::read(path)?;

    let tag_len = id3v2_block_len(&data);
    let frame_start = data[tag_len..]
        .windows(2)
        .position(|w| is_frame_sync(w[0], w[1]))
        .map(|offset| tag_len + offset)
        .ok_or_else(|| Error::repair(path, "could not find MP3 frame start"))?;

    let mut rebuilt = Vec::with_capacity(tag_len + data.len() - frame_start);
    rebuilt.extend_from_slice(&data[..tag_len]);
    rebuilt.extend_from_slice(&data[frame_start..]);
    fs::write(path, rebuilt)?;
    Ok(())
}
