//! Test fixtures: minimal byte images of the supported containers.
//!
//! Integrity and repair tests need real files on disk whose structure is
//! known down to the byte. These builders produce the smallest streams the
//! parsers accept, so tests can corrupt specific offsets and assert on
//! exact recovery.

use crate::repair::wav::{HEADER_LEN, canonical_header};

/// A valid PCM WAV image: canonical 44-byte header plus `data_len` bytes
/// of silence.
pub fn wav_bytes(data_len: usize) -> Vec<u8> {
    let total = HEADER_LEN + data_len;
    let mut bytes = Vec::with_capacity(total);
    bytes.extend_from_slice(&canonical_header(total));
    bytes.resize(total, 0);
    bytes
}

/// MPEG1 Layer III frame: 128 kbps, 44.1 kHz, stereo, no padding.
/// Frame length = 144 * 128000 / 44100 = 417 bytes.
const MP3_FRAME_LEN: usize = 417;
const MP3_FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x00];

/// A bare CBR MP3 stream of `frames` silent frames, no tag container.
pub fn mp3_bytes(frames: usize) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frames * MP3_FRAME_LEN);
    for _ in 0..frames {
        bytes.extend_from_slice(&MP3_FRAME_HEADER);
        bytes.resize(bytes.len() + MP3_FRAME_LEN - 4, 0);
    }
    bytes
}

/// An MP3 stream preceded by an empty (all-padding) ID3v2.4 block.
pub fn mp3_bytes_with_id3v2(frames: usize) -> Vec<u8> {
    const PADDING: usize = 256;
    let mut bytes = Vec::with_capacity(10 + PADDING + frames * MP3_FRAME_LEN);
    bytes.extend_from_slice(b"ID3");
    bytes.push(4); // major version
    bytes.push(0); // revision
    bytes.push(0); // flags
    // Synchsafe size of the padding payload.
    bytes.extend_from_slice(&[
        ((PADDING >> 21) & 0x7F) as u8,
        ((PADDING >> 14) & 0x7F) as u8,
        ((PADDING >> 7) & 0x7F) as u8,
        (PADDING & 0x7F) as u8,
    ]);
    bytes.resize(bytes.len() + PADDING, 0);
    bytes.extend_from_slice(&mp3_bytes(frames));
    bytes
}

/// An MP3 stream followed by an ID3v1 trailer and nothing else.
pub fn mp3_bytes_with_id3v1(frames: usize) -> Vec<u8> {
    let mut bytes = mp3_bytes(frames);
    bytes.extend_from_slice(b"TAG");
    bytes.resize(bytes.len() + 125, 0);
    bytes
}

/// A minimal valid FLAC image: magic plus a lone STREAMINFO block
/// (44.1 kHz, stereo, 16-bit, zero samples).
pub fn flac_bytes() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 + 4 + 34);
    bytes.extend_from_slice(b"fLaC");
    // Last-metadata-block flag + type 0 (STREAMINFO), 34-byte body.
    bytes.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
    bytes.extend_from_slice(&[0x10, 0x00]); // min block size 4096
    bytes.extend_from_slice(&[0x10, 0x00]); // max block size 4096
    bytes.extend_from_slice(&[0x00, 0x00, 0x00]); // min frame size (unknown)
    bytes.extend_from_slice(&[0x00, 0x00, 0x00]); // max frame size (unknown)
    // 44100 Hz (20 bits), 2 channels, 16 bits per sample, 0 total samples.
    bytes.extend_from_slice(&[0x0A, 0xC4, 0x42, 0xF0, 0x00, 0x00, 0x00, 0x00]);
    bytes.extend_from_slice(&[0u8; 16]); // unset MD5
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_fixture_shape() {
        let bytes = wav_bytes(100);
        assert_eq!(bytes.len(), 144);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(riff_size as usize, bytes.len() - 8);
    }

    #[test]
    fn test_mp3_fixture_shape() {
        let bytes = mp3_bytes(3);
        assert_eq!(bytes.len(), 3 * MP3_FRAME_LEN);
        assert_eq!(bytes[0], 0xFF);
        assert_eq!(bytes[MP3_FRAME_LEN], 0xFF);
    }

    #[test]
    fn test_id3v2_fixture_declares_padding() {
        let bytes = mp3_bytes_with_id3v2(1);
        assert!(bytes.starts_with(b"ID3"));
        let declared = crate::repair::synchsafe_len(&bytes[6..10].try_into().unwrap());
        assert_eq!(declared, 256);
        // First frame right after header + padding.
        assert_eq!(bytes[10 + 256], 0xFF);
    }

    #[test]
    fn test_flac_fixture_shape() {
        let bytes = flac_bytes();
        assert_eq!(&bytes[0..4], b"fLaC");
        assert_eq!(bytes.len(), 42);
        assert_eq!(bytes[4] & 0x80, 0x80, "last-metadata-block flag");
    }
}
