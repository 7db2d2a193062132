//! Core data models for the compatibility engine.
//!
//! Defines the value objects that flow between the tag store, the
//! validator, and the repair engine: [`AudioFormat`], [`MetadataRecord`],
//! and the UI-facing [`FileCheckState`].
//!
//! `MetadataRecord` is constructed fresh on every read and mutated only by
//! a copy-then-write pattern (read, clone, overlay changed fields, write).
//! Nothing here is cached or shared between calls.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Audio container formats the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    Flac,
    Mp3,
    Wav,
    /// Read-only best-effort; excluded from repair.
    Aaf,
}

impl AudioFormat {
    /// Detect format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "flac" => Some(Self::Flac),
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "aaf" => Some(Self::Aaf),
            _ => None,
        }
    }

    /// Display name, matching the format string stored in tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flac => "FLAC",
            Self::Mp3 => "MP3",
            Self::Wav => "WAV",
            Self::Aaf => "AAF",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized metadata for one audio file.
///
/// String fields default to empty; empty string is a valid present value,
/// distinct from a failed read (see [`MetadataRecord::error`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub date: String,
    pub genre: String,
    pub comment: String,
    pub format: Option<AudioFormat>,
    pub channels: Option<u8>,
    pub sample_rate: Option<u32>,
    /// Bit depth for lossless formats (FLAC/WAV).
    pub bits_per_sample: Option<u8>,
    /// Bitrate in bits per second for lossy formats (MP3).
    pub bitrate: Option<u32>,
    /// Track length in seconds.
    pub length: f64,
    /// Set when the read was partial or failed; the other fields then hold
    /// best-effort data rather than nothing.
    pub error: Option<String>,
}

impl MetadataRecord {
    /// A degraded record for a file whose container could not be parsed.
    pub fn failed(format: Option<AudioFormat>, message: impl Into<String>) -> Self {
        Self {
            format,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// True when every user-facing tag field is empty.
    pub fn has_no_tags(&self) -> bool {
        self.title.is_empty() && self.artist.is_empty() && self.album.is_empty()
    }
}

/// Check status of a file in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    /// At least one blocking issue
    Problem,
    /// Passed the strict profile
    Ok,
    /// Warnings only
    Optimizable,
}

/// Per-file state for a scanned working set.
///
/// Created when a directory is scanned, mutated by check/repair operations,
/// and discarded wholesale on re-scan.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FileCheckState {
    /// Whether a compatibility check has run for this file
    pub checked: bool,
    /// Outcome of the last check, if any
    pub status: Option<FileStatus>,
    /// Whether a fix/repair has been applied since the last check
    pub fixed: bool,
}

impl FileCheckState {
    /// Record a check outcome.
    pub fn mark_checked(&mut self, status: FileStatus) {
        self.checked = true;
        self.status = Some(status);
    }
}
