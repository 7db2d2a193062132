//! The strict-profile rule engine.
//!
//! Combines tag data, path validation, and the optional integrity check
//! into a single per-file [`CompatibilityReport`]. Validation never fails:
//! unreadable containers become findings, not errors, so a batch check
//! always produces one report per file.
//!
//! The pass is ordered (resource file → path → common tags → integrity →
//! format-specific) and later steps may reclassify earlier findings; the
//! WAV branch downgrades missing-tag issues to warnings because WAV has
//! no mandated tag convention.

mod findings;
mod report;

pub use findings::{Issue, MAX_FIELD_LENGTH, TagField, Warning};
pub use report::{CompatibilityReport, PathReport};

use lofty::file::AudioFile;
use lofty::probe::Probe;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::integrity::{self, IntegrityStatus};
use crate::model::{AudioFormat, MetadataRecord};
use crate::pathcheck::{self, NameFinding};

/// Common MP3 bitrate range in bits per second; outside it, players built
/// around the usual presets may misbehave.
const COMMON_BITRATE_RANGE: std::ops::RangeInclusive<u32> = 128_000..=320_000;

/// Sample rates WAV players universally accept.
const STANDARD_WAV_RATES: [u32; 2] = [44_100, 48_000];

/// Validate a file against the Generic Strict Profile.
///
/// `metadata` is the record already read from the tag store. The only I/O
/// this performs is the optional integrity check plus per-format container
/// probes; all failures are folded into the report.
pub fn validate(
    path: &Path,
    metadata: &MetadataRecord,
    config: &ValidationConfig,
) -> CompatibilityReport {
    let mut report = CompatibilityReport::default();

    // Resource files are terminal context: the rest of the pass still
    // runs, but repair treats these as delete-only.
    if integrity::is_resource_file(path) {
        report.issues.push(Issue::ResourceFile);
    }

    if config.perform_path_validation {
        check_paths(path, config, &mut report);
    }

    check_common_tags(metadata, &mut report);

    if config.perform_integrity_check {
        let integrity = integrity::check(path);
        if integrity.status != IntegrityStatus::Ok {
            for issue in &integrity.issues {
                report.issues.push(Issue::Integrity(issue.clone()));
            }
        }
        if !integrity.checksum.is_empty() {
            report
                .format_info
                .insert("checksum".to_string(), integrity.checksum.clone());
        }
        report.integrity = integrity;
    }

    match AudioFormat::from_path(path) {
        Some(AudioFormat::Mp3) => validate_mp3(path, &mut report),
        Some(AudioFormat::Flac) => validate_flac(path, &mut report),
        Some(AudioFormat::Wav) => validate_wav(path, metadata, &mut report),
        // AAF is read-only best-effort; unknown extensions get no
        // format-specific pass at all.
        Some(AudioFormat::Aaf) | None => {}
    }

    report
}

fn check_common_tags(metadata: &MetadataRecord, report: &mut CompatibilityReport) {
    if metadata.title.trim().is_empty() {
        report.issues.push(Issue::MissingTitle);
    }
    if metadata.artist.trim().is_empty() {
        report.issues.push(Issue::MissingArtist);
    }
    for (field, value) in [
        (TagField::Title, &metadata.title),
        (TagField::Artist, &metadata.artist),
        (TagField::Album, &metadata.album),
    ] {
        let length = value.chars().count();
        if length > MAX_FIELD_LENGTH {
            report.issues.push(Issue::FieldTooLong { field, length });
        }
    }
}

fn check_paths(path: &Path, config: &ValidationConfig, report: &mut CompatibilityReport) {
    if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
        let check = pathcheck::check_file_name(file_name);
        for finding in &check.findings {
            match finding {
                NameFinding::TooLong => report.issues.push(Issue::FileNameTooLong),
                NameFinding::SpecialChars => report.issues.push(Issue::FileNameInvalidChars),
                NameFinding::AccentedChars => report.warnings.push(Warning::AccentedFileName),
            }
        }
        report.path.can_rename = check.can_rename;
        report.path.suggested_filename = check.suggested;
    }

    if !config.validate_directory_names {
        return;
    }
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    report.path.dir_path = Some(parent.to_path_buf());

    let segments: Vec<&str> = parent
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(os) => os.to_str(),
            _ => None,
        })
        .collect();

    for (idx, segment) in segments.iter().enumerate() {
        let check = pathcheck::check_dir_name(segment);
        for finding in &check.findings {
            match finding {
                NameFinding::TooLong => report.issues.push(Issue::DirNameTooLong {
                    segment: segment.to_string(),
                }),
                NameFinding::SpecialChars => report.issues.push(Issue::DirNameInvalidChars {
                    segment: segment.to_string(),
                }),
                NameFinding::AccentedChars => report.warnings.push(Warning::AccentedDirName {
                    segment: segment.to_string(),
                }),
            }
        }
        // Rename capability is only reported for the immediate parent; the
        // deferred rename pass walks deeper segments on its own.
        if idx == segments.len() - 1 {
            report.path.dir_can_rename = check.can_rename;
            report.path.suggested_dirname = check.suggested;
        }
    }
}

fn validate_mp3(path: &Path, report: &mut CompatibilityReport) {
    match Probe::open(path).and_then(|p| p.read()) {
        Ok(tagged) => {
            let props = tagged.properties();
            let bitrate = props.audio_bitrate().unwrap_or(0).saturating_mul(1000);
            report
                .format_info
                .insert("bitrate".to_string(), bitrate.to_string());
            if let Some(rate) = props.sample_rate() {
                report
                    .format_info
                    .insert("sample_rate".to_string(), rate.to_string());
            }
            report.format_info.insert(
                "length".to_string(),
                format!("{:.1}", props.duration().as_secs_f64()),
            );

            if !COMMON_BITRATE_RANGE.contains(&bitrate) {
                report.warnings.push(Warning::UncommonBitrate { bitrate });
            }
        }
        Err(e) => {
            report.issues.push(Issue::UnreadableContainer {
                format: AudioFormat::Mp3,
                detail: e.to_string(),
            });
        }
    }

    match mp3_tag_container(path) {
        Ok(TagContainer::Id3v2 { version }) => {
            report
                .format_info
                .insert("tag_version".to_string(), format!("2.{version}"));
        }
        Ok(TagContainer::Id3v1) => {
            report
                .format_info
                .insert("tag_version".to_string(), "1.1".to_string());
            report.warnings.push(Warning::LegacyTagContainer);
        }
        Ok(TagContainer::None) => {
            report.issues.push(Issue::MissingTagContainer);
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "tag container probe failed");
            report.issues.push(Issue::MissingTagContainer);
        }
    }
}

fn validate_flac(path: &Path, report: &mut CompatibilityReport) {
    match Probe::open(path).and_then(|p| p.read()) {
        Ok(tagged) => {
            let props = tagged.properties();
            if let Some(rate) = props.sample_rate() {
                report
                    .format_info
                    .insert("sample_rate".to_string(), rate.to_string());
                if rate > 48_000 {
                    report.warnings.push(Warning::HighSampleRate { rate });
                }
            }
            if let Some(bits) = props.bit_depth() {
                report
                    .format_info
                    .insert("bits_per_sample".to_string(), bits.to_string());
                if bits > 24 {
                    report.warnings.push(Warning::HighBitDepth { bits, limit: 24 });
                }
            }
            if let Some(channels) = props.channels() {
                report
                    .format_info
                    .insert("channels".to_string(), channels.to_string());
                if channels > 2 {
                    report.warnings.push(Warning::Multichannel { channels });
                }
            }
        }
        Err(e) => {
            report.issues.push(Issue::UnreadableContainer {
                format: AudioFormat::Flac,
                detail: e.to_string(),
            });
        }
    }
}

fn validate_wav(path: &Path, metadata: &MetadataRecord, report: &mut CompatibilityReport) {
    // WAV has no mandated tag convention: missing title/artist from the
    // common pass become warnings instead of blocking issues.
    let mut downgraded = Vec::new();
    report.issues.retain(|issue| match issue {
        Issue::MissingTitle => {
            downgraded.push(Warning::MissingTitleWav);
            false
        }
        Issue::MissingArtist => {
            downgraded.push(Warning::MissingArtistWav);
            false
        }
        _ => true,
    });
    report.warnings.extend(downgraded);

    if metadata.has_no_tags() {
        report.warnings.push(Warning::NoMetadata);
    }

    match Probe::open(path).and_then(|p| p.read()) {
        Ok(tagged) => {
            let props = tagged.properties();
            if let Some(rate) = props.sample_rate() {
                report
                    .format_info
                    .insert("sample_rate".to_string(), rate.to_string());
                if !STANDARD_WAV_RATES.contains(&rate) {
                    report.warnings.push(Warning::UncommonSampleRate { rate });
                }
            }
            if let Some(bits) = props.bit_depth() {
                report
                    .format_info
                    .insert("bits_per_sample".to_string(), bits.to_string());
                if bits > 16 {
                    report.warnings.push(Warning::HighBitDepth { bits, limit: 16 });
                }
            }
            if let Some(channels) = props.channels() {
                report
                    .format_info
                    .insert("channels".to_string(), channels.to_string());
                if channels > 2 {
                    report.warnings.push(Warning::Multichannel { channels });
                }
            }
        }
        Err(e) => {
            report.issues.push(Issue::UnreadableContainer {
                format: AudioFormat::Wav,
                detail: e.to_string(),
            });
        }
    }

    match wav_tag_presence(path) {
        Ok((has_info, has_id3)) => {
            let metadata_type = match (has_info, has_id3) {
                (true, true) => "INFO chunks + ID3",
                (true, false) => "INFO chunks only",
                (false, true) => {
                    report.warnings.push(Warning::NonNativeTags);
                    "ID3 only (non-standard)"
                }
                (false, false) => "No metadata",
            };
            report
                .format_info
                .insert("metadata_type".to_string(), metadata_type.to_string());
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "RIFF chunk walk failed");
        }
    }
}

/// Which tag container an MP3 file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagContainer {
    /// ID3v2.x; `version` is the x from the header
    Id3v2 { version: u8 },
    /// Only the fixed 128-byte ID3v1 trailer
    Id3v1,
    None,
}

fn mp3_tag_container(path: &Path) -> std::io::Result<TagContainer> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 10];
    let len = file.metadata()?.len();

    if len >= 10 {
        file.read_exact(&mut header)?;
        if header.starts_with(b"ID3") {
            return Ok(TagContainer::Id3v2 { version: header[3] });
        }
    }

    // ID3v1 lives in a fixed 128-byte trailer.
    if len >= 128 {
        file.seek(SeekFrom::End(-128))?;
        let mut trailer = [0u8; 3];
        file.read_exact(&mut trailer)?;
        if &trailer == b"TAG" {
            return Ok(TagContainer::Id3v1);
        }
    }

    Ok(TagContainer::None)
}

/// Walk the RIFF chunk list looking for a native LIST/INFO block and for
/// embedded ID3 chunks.
fn wav_tag_presence(path: &Path) -> std::io::Result<(bool, bool)> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 12];
    if file.read_exact(&mut header).is_err()
        || &header[0..4] != b"RIFF"
        || &header[8..12] != b"WAVE"
    {
        return Ok((false, false));
    }

    let mut has_info = false;
    let mut has_id3 = false;
    let mut chunk_header = [0u8; 8];
    while file.read_exact(&mut chunk_header).is_ok() {
        let id = &chunk_header[0..4];
        let size = u64::from(u32::from_le_bytes(chunk_header[4..8].try_into().unwrap()));
        let mut skip = size;

        if id == b"LIST" {
            let mut list_type = [0u8; 4];
            if file.read_exact(&mut list_type).is_err() {
                break;
            }
            if &list_type == b"INFO" {
                has_info = true;
            }
            skip = size.saturating_sub(4);
        } else if id == b"id3 " || id == b"ID3 " {
            has_id3 = true;
        }

        // Chunks are word-aligned; odd sizes carry a pad byte.
        file.seek(SeekFrom::Current((skip + skip % 2) as i64))?;
    }

    Ok((has_info, has_id3))
}
