//! Issue and warning types for the strict profile.
//!
//! Findings are tagged variants carrying structured payloads; the
//! human-readable strings the report surfaces are rendered only here, by
//! [`Issue::message`] / [`Warning::message`] and their `recommendation`
//! counterparts. Nothing downstream matches on message text.

use serde::{Deserialize, Serialize};

use crate::integrity::{IntegrityIssue, Remediation};
use crate::model::AudioFormat;
use crate::pathcheck::MAX_NAME_LEN;

/// Longest tag field accepted by the strict profile, in characters.
pub const MAX_FIELD_LENGTH: usize = 250;

/// A tag field checked by the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagField {
    Title,
    Artist,
    Album,
}

impl TagField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Artist => "Artist",
            Self::Album => "Album",
        }
    }

    pub fn lower(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Artist => "artist",
            Self::Album => "album",
        }
    }
}

/// A blocking compatibility problem. Any issue fails the strict profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    /// AppleDouble sidecar pretending to be audio
    ResourceFile,
    MissingTitle,
    MissingArtist,
    /// Tag field longer than [`MAX_FIELD_LENGTH`]
    FieldTooLong { field: TagField, length: usize },
    FileNameTooLong,
    FileNameInvalidChars,
    DirNameTooLong { segment: String },
    DirNameInvalidChars { segment: String },
    /// MP3 without any recognizable tag container
    MissingTagContainer,
    /// Per-format analysis failed outright
    UnreadableContainer { format: AudioFormat, detail: String },
    /// Re-emitted from a non-OK integrity check
    Integrity(IntegrityIssue),
}

impl Issue {
    /// Human-readable description.
    pub fn message(&self) -> String {
        match self {
            Self::ResourceFile => "macOS resource file detected".to_string(),
            Self::MissingTitle => "Missing title tag".to_string(),
            Self::MissingArtist => "Missing artist tag".to_string(),
            Self::FieldTooLong { field, .. } => {
                format!("{} tag exceeds {MAX_FIELD_LENGTH} characters", field.as_str())
            }
            Self::FileNameTooLong => {
                format!("File name exceeds {MAX_NAME_LEN} characters")
            }
            Self::FileNameInvalidChars => {
                "File name contains unsupported characters".to_string()
            }
            Self::DirNameTooLong { segment } => {
                format!("Directory name '{segment}' exceeds {MAX_NAME_LEN} characters")
            }
            Self::DirNameInvalidChars { segment } => {
                format!("Directory name '{segment}' contains unsupported characters")
            }
            Self::MissingTagContainer => "No ID3 tags found or corrupted tags".to_string(),
            Self::UnreadableContainer { format, detail } => {
                format!("Error analyzing {format} file: {detail}")
            }
            Self::Integrity(issue) => format!("Integrity issue: {}", issue.message()),
        }
    }

    /// Advice paired with this issue, if any.
    pub fn recommendation(&self) -> Option<String> {
        let text = match self {
            Self::ResourceFile => {
                "These hidden resource files are not actual audio files and should be deleted"
            }
            Self::MissingTitle => "Add a title to improve compatibility",
            Self::MissingArtist => "Add an artist name to improve compatibility",
            Self::FieldTooLong { field, .. } => {
                return Some(format!(
                    "Shorten {} to improve compatibility with older players",
                    field.lower()
                ));
            }
            Self::FileNameTooLong | Self::DirNameTooLong { .. } => {
                return Some(format!("Shorten the name to at most {MAX_NAME_LEN} characters"));
            }
            Self::FileNameInvalidChars | Self::DirNameInvalidChars { .. } => {
                "Rename using only letters, numbers, spaces, and dashes"
            }
            Self::MissingTagContainer => "Add proper ID3v2.3 tags for maximum compatibility",
            Self::UnreadableContainer { format, .. } => match format {
                AudioFormat::Wav => "The WAV file may be corrupted or using a non-standard format",
                _ => return None,
            },
            Self::Integrity(issue) => match issue.remediation() {
                Remediation::Corrupted => {
                    "This file appears to be corrupted and may need to be re-encoded"
                }
                Remediation::Truncated => {
                    "This file appears to be truncated and may be missing data"
                }
                Remediation::Header => {
                    "This file has header issues that may cause playback problems"
                }
                Remediation::None => return None,
            },
        };
        Some(text.to_string())
    }
}

/// A non-blocking observation: playback may degrade on some players, but
/// the file still passes the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// Missing title, downgraded inside the WAV branch
    MissingTitleWav,
    /// Missing artist, downgraded inside the WAV branch
    MissingArtistWav,
    AccentedFileName,
    AccentedDirName { segment: String },
    /// MP3 bitrate outside the common 128–320 kbps range (bps)
    UncommonBitrate { bitrate: u32 },
    /// ID3v1-only tagging
    LegacyTagContainer,
    HighSampleRate { rate: u32 },
    /// Bit depth above `limit` (24 for FLAC, 16 for WAV)
    HighBitDepth { bits: u8, limit: u8 },
    Multichannel { channels: u8 },
    /// WAV sample rate outside {44100, 48000}
    UncommonSampleRate { rate: u32 },
    /// WAV with no tags at all
    NoMetadata,
    /// WAV carrying only ID3 tags, no native INFO chunk
    NonNativeTags,
}

impl Warning {
    /// Human-readable description.
    pub fn message(&self) -> String {
        match self {
            Self::MissingTitleWav => "Missing title tag (normal for WAV files)".to_string(),
            Self::MissingArtistWav => "Missing artist tag (normal for WAV files)".to_string(),
            Self::AccentedFileName => "File name contains accented characters".to_string(),
            Self::AccentedDirName { segment } => {
                format!("Directory name '{segment}' contains accented characters")
            }
            Self::UncommonBitrate { bitrate } => {
                format!("Uncommon bitrate: {}kbps", bitrate / 1000)
            }
            Self::LegacyTagContainer => {
                "Using ID3v1 tags which have limited support".to_string()
            }
            Self::HighSampleRate { rate } => format!("High sample rate: {rate}Hz"),
            Self::HighBitDepth { bits, .. } => format!("High bit depth: {bits}-bit"),
            Self::Multichannel { channels } => {
                format!("Multichannel audio: {channels} channels")
            }
            Self::UncommonSampleRate { rate } => format!("Uncommon sample rate: {rate}Hz"),
            Self::NoMetadata => {
                "WAV file has no metadata (this is normal for WAV files)".to_string()
            }
            Self::NonNativeTags => "WAV file using non-standard ID3 tags".to_string(),
        }
    }

    /// Advice paired with this warning, if any.
    pub fn recommendation(&self) -> Option<String> {
        let text = match self {
            Self::MissingTitleWav | Self::MissingArtistWav => {
                "Some players may not display the metadata in this WAV file"
            }
            Self::AccentedFileName | Self::AccentedDirName { .. } => {
                "Replace accented characters with their plain ASCII equivalents"
            }
            Self::UncommonBitrate { .. } => {
                "Standard compatible bitrates: 128kbps, 192kbps, 256kbps, 320kbps"
            }
            Self::LegacyTagContainer => "Upgrade to ID3v2.3 or ID3v2.4 for better compatibility",
            Self::HighSampleRate { .. } => {
                "Sample rates above 48kHz may not be supported by all players"
            }
            Self::HighBitDepth { limit, .. } => {
                return Some(format!(
                    "Bit depths above {limit}-bit may not be supported by all players"
                ));
            }
            Self::Multichannel { .. } => "More than 2 channels may not be supported by all players",
            Self::UncommonSampleRate { .. } => {
                "Standard sample rates of 44.1kHz or 48kHz have the best compatibility"
            }
            Self::NoMetadata => {
                "WAV files typically have limited or no metadata support in most players"
            }
            Self::NonNativeTags => "Some players may not recognize ID3 tags in WAV files",
        };
        Some(text.to_string())
    }
}
