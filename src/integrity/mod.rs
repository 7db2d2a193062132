//! File integrity checking.
//!
//! Computes a content hash and runs format-specific structural validation
//! (container signatures, frame sync, declared vs. actual size) to classify
//! a file as OK / Warning / Error, and decides whether an Error is
//! auto-repairable.
//!
//! [`check`] never returns an error: I/O failures and parser panics at any
//! boundary are folded into the result as Error-status issues.

mod hash;

pub use hash::compute_content_hash;

use lofty::file::AudioFile;
use lofty::probe::Probe;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Longest track duration considered plausible (24 hours).
///
/// Empirical cutoff, not calibrated against a corrupt-file corpus.
pub const MAX_REASONABLE_DURATION_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Highest bitrate considered plausible for MP3, in bits per second.
///
/// Empirical cutoff, not calibrated against a corrupt-file corpus.
pub const MAX_REASONABLE_BITRATE: u32 = 1_000_000;

/// Allowed drift between the RIFF header's declared size and the actual
/// file size. Trailing metadata commonly pushes a WAV past its declared
/// size without harming playback.
pub const WAV_SIZE_TOLERANCE: u64 = 100;

/// Overall integrity classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum IntegrityStatus {
    Ok,
    Warning,
    Error,
}

/// How a repairable Error can be fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairMethod {
    RebuildMp3,
    RebuildFlac,
    RebuildWav,
    DeleteResourceFile,
}

/// A structural problem found during the integrity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IntegrityIssue {
    /// AppleDouble sidecar file masquerading as audio
    ResourceFile,
    /// File is empty
    ZeroByteFile,
    /// File could not be opened or read
    AccessError { detail: String },
    /// First bytes are neither an ID3 marker nor a frame-sync pattern
    InvalidMp3Header,
    /// No parseable MPEG stream found
    Mp3SyncNotFound { detail: String },
    /// Decoded duration is non-positive or implausibly long
    SuspiciousDuration { seconds: f64 },
    /// Decoded bitrate is non-positive or implausibly high
    SuspiciousBitrate { bitrate: u32 },
    /// First bytes are not the `fLaC` magic
    InvalidFlacSignature,
    /// FLAC stream could not be decoded
    FlacUnreadable { detail: String },
    /// RIFF/WAVE markers missing from the first 12 bytes
    InvalidWavHeader,
    /// Declared RIFF size disagrees with the file size beyond tolerance
    WavSizeMismatch { declared: u64, actual: u64 },
    /// RIFF size field could not be read
    WavSizeUnverifiable,
    /// First bytes are not the `OggS` magic
    InvalidOggSignature,
    /// The check itself failed partway
    CheckFailed { detail: String },
}

/// Remediation category an issue falls into, used to pick the
/// recommendation shown next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Stream damage; re-encoding is the likely fix
    Corrupted,
    /// Data appears to be missing from the end
    Truncated,
    /// Leading container structure is wrong
    Header,
    /// No specific advice
    None,
}

impl IntegrityIssue {
    /// Human-readable description.
    pub fn message(&self) -> String {
        match self {
            Self::ResourceFile => "macOS resource file, not audio data".to_string(),
            Self::ZeroByteFile => "Zero-byte file detected".to_string(),
            Self::AccessError { detail } => format!("File access error: {detail}"),
            Self::InvalidMp3Header => "Invalid MP3 header".to_string(),
            Self::Mp3SyncNotFound { detail } => {
                format!("MP3 frame sync not found, file may be corrupted ({detail})")
            }
            Self::SuspiciousDuration { seconds } => {
                format!("Suspicious track duration ({seconds:.0}s)")
            }
            Self::SuspiciousBitrate { bitrate } => {
                format!("Suspicious bitrate value ({bitrate} bps)")
            }
            Self::InvalidFlacSignature => "Invalid FLAC signature".to_string(),
            Self::FlacUnreadable { detail } => {
                format!("FLAC parsing error, file may be corrupted ({detail})")
            }
            Self::InvalidWavHeader => "Invalid WAV header".to_string(),
            Self::WavSizeMismatch { declared, actual } => {
                format!("WAV file size mismatch (header says {declared}, file is {actual})")
            }
            Self::WavSizeUnverifiable => "Unable to verify WAV file size".to_string(),
            Self::InvalidOggSignature => "Invalid OGG signature".to_string(),
            Self::CheckFailed { detail } => format!("Integrity check error: {detail}"),
        }
    }

    /// Which remediation class this issue belongs to.
    pub fn remediation(&self) -> Remediation {
        match self {
            Self::Mp3SyncNotFound { .. } | Self::FlacUnreadable { .. } => Remediation::Corrupted,
            Self::ZeroByteFile | Self::WavSizeMismatch { .. } => Remediation::Truncated,
            Self::InvalidMp3Header
            | Self::InvalidFlacSignature
            | Self::InvalidWavHeader
            | Self::InvalidOggSignature => Remediation::Header,
            _ => Remediation::None,
        }
    }
}

/// Result of an integrity check.
///
/// Invariant: `repair_method` is only ever `Some` when `status` is
/// [`IntegrityStatus::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityResult {
    pub status: IntegrityStatus,
    /// Findings in the order they were detected
    pub issues: Vec<IntegrityIssue>,
    /// Content hash; empty when the check was skipped or unreadable
    pub checksum: String,
    pub repair_method: Option<RepairMethod>,
}

impl IntegrityResult {
    /// A clean result (also used when the check is disabled).
    pub fn ok() -> Self {
        Self {
            status: IntegrityStatus::Ok,
            issues: Vec::new(),
            checksum: String::new(),
            repair_method: None,
        }
    }

    /// True when a repair strategy exists for this result.
    pub fn can_repair(&self) -> bool {
        self.repair_method.is_some()
    }

    fn warn(&mut self, issue: IntegrityIssue) {
        self.status = self.status.max(IntegrityStatus::Warning);
        self.issues.push(issue);
    }

    fn error(&mut self, issue: IntegrityIssue) {
        self.status = IntegrityStatus::Error;
        self.issues.push(issue);
    }

    fn repairable_error(&mut self, issue: IntegrityIssue, method: RepairMethod) {
        self.error(issue);
        self.repair_method = Some(method);
    }
}

/// Check the integrity of an audio file.
///
/// Classification is by extension, matching the validator's dispatch;
/// unknown extensions get the hash and the zero-byte check only.
pub fn check(path: &Path) -> IntegrityResult {
    let mut result = IntegrityResult::ok();

    // AppleDouble sidecars short-circuit everything else: the only sane
    // repair is deleting the file.
    if is_resource_file(path) {
        result.repairable_error(
            IntegrityIssue::ResourceFile,
            RepairMethod::DeleteResourceFile,
        );
        return result;
    }

    match compute_content_hash(path) {
        Ok(checksum) => result.checksum = checksum,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "cannot hash file");
            result.error(IntegrityIssue::AccessError {
                detail: e.to_string(),
            });
            return result;
        }
    }

    let file_size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            result.error(IntegrityIssue::AccessError {
                detail: e.to_string(),
            });
            return result;
        }
    };

    if file_size == 0 {
        result.error(IntegrityIssue::ZeroByteFile);
        return result;
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let structural = match ext.as_str() {
        "mp3" => check_mp3(path, &mut result),
        "flac" => check_flac(path, &mut result),
        "wav" => check_wav(path, file_size, &mut result),
        "ogg" => check_ogg(path, &mut result),
        _ => Ok(()),
    };

    if let Err(e) = structural {
        result.error(IntegrityIssue::CheckFailed {
            detail: e.to_string(),
        });
    }

    result
}

/// AppleDouble resource files carry a `._` prefix on the basename.
pub fn is_resource_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("._"))
}

fn read_prefix(path: &Path, len: usize) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        let read = file.read(&mut buf[filled..])?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    buf.truncate(filled);
    Ok(buf)
}

/// A byte pair that starts an MPEG audio frame: 11 sync bits set.
pub fn is_frame_sync(b0: u8, b1: u8) -> bool {
    b0 == 0xFF && (b1 & 0xE0) == 0xE0
}

fn check_mp3(path: &Path, result: &mut IntegrityResult) -> std::io::Result<()> {
    let header = read_prefix(path, 4)?;
    let has_marker = header.starts_with(b"ID3")
        || (header.len() >= 2 && is_frame_sync(header[0], header[1]));
    if !has_marker {
        result.repairable_error(IntegrityIssue::InvalidMp3Header, RepairMethod::RebuildMp3);
    }

    // Decode to sanity-check what the stream claims about itself.
    match Probe::open(path).and_then(|p| p.read()) {
        Ok(tagged) => {
            let props = tagged.properties();
            let seconds = props.duration().as_secs_f64();
            if seconds <= 0.0 || seconds > MAX_REASONABLE_DURATION_SECS {
                result.warn(IntegrityIssue::SuspiciousDuration { seconds });
            }
            let bitrate = props.audio_bitrate().unwrap_or(0).saturating_mul(1000);
            if bitrate == 0 || bitrate > MAX_REASONABLE_BITRATE {
                result.warn(IntegrityIssue::SuspiciousBitrate { bitrate });
            }
        }
        Err(e) => {
            result.repairable_error(
                IntegrityIssue::Mp3SyncNotFound {
                    detail: e.to_string(),
                },
                RepairMethod::RebuildMp3,
            );
        }
    }
    Ok(())
}

fn check_flac(path: &Path, result: &mut IntegrityResult) -> std::io::Result<()> {
    let header = read_prefix(path, 4)?;
    if header != b"fLaC" {
        result.repairable_error(
            IntegrityIssue::InvalidFlacSignature,
            RepairMethod::RebuildFlac,
        );
    }

    if let Err(e) = Probe::open(path).and_then(|p| p.read()) {
        result.repairable_error(
            IntegrityIssue::FlacUnreadable {
                detail: e.to_string(),
            },
            RepairMethod::RebuildFlac,
        );
    }
    Ok(())
}

fn check_wav(path: &Path, file_size: u64, result: &mut IntegrityResult) -> std::io::Result<()> {
    let header = read_prefix(path, 12)?;
    if header.len() < 12 || &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        result.repairable_error(IntegrityIssue::InvalidWavHeader, RepairMethod::RebuildWav);
        return Ok(());
    }

    match header[4..8].try_into() {
        Ok(size_bytes) => {
            let declared = u64::from(u32::from_le_bytes(size_bytes)) + 8;
            if declared.abs_diff(file_size) > WAV_SIZE_TOLERANCE {
                result.warn(IntegrityIssue::WavSizeMismatch {
                    declared,
                    actual: file_size,
                });
            }
        }
        Err(_) => result.warn(IntegrityIssue::WavSizeUnverifiable),
    }
    Ok(())
}

fn check_ogg(path: &Path, result: &mut IntegrityResult) -> std::io::Result<()> {
    let header = read_prefix(path, 4)?;
    if header != b"OggS" {
        result.error(IntegrityIssue::InvalidOggSignature);
    }
    Ok(())
}
