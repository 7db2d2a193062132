//! Audio file tag reading and writing.
//!
//! Uses the lofty crate for format-independent tag access across MP3,
//! FLAC, and WAV. Every read builds a fresh [`MetadataRecord`] from the
//! file; nothing is cached. A failed or partial read still returns a
//! record; the `error` field marks it degraded so validation can keep
//! going on whatever was recovered.
//!
//! AAF files get a best-effort read (length only when a generic probe
//! succeeds) and refuse writes.

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag, TagExt};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{AudioFormat, MetadataRecord};

/// Read metadata from an audio file.
///
/// Never fails the whole operation: parse errors produce a degraded
/// record with [`MetadataRecord::error`] set.
pub fn read_metadata(path: &Path) -> MetadataRecord {
    let format = AudioFormat::from_path(path);

    if format == Some(AudioFormat::Aaf) {
        return read_aaf(path);
    }

    match read_tagged(path, format) {
        Ok(record) => record,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "metadata read failed");
            MetadataRecord::failed(format, e.to_string())
        }
    }
}

fn read_tagged(path: &Path, format: Option<AudioFormat>) -> Result<MetadataRecord> {
    let tagged_file = Probe::open(path)
        .and_then(|p| p.read())
        .map_err(|e| Error::tag(path, e.to_string()))?;

    // Prefer the format's primary tag, fall back to whatever is there.
    let tag = tagged_file.primary_tag().or_else(|| tagged_file.first_tag());

    let text = |value: Option<std::borrow::Cow<'_, str>>| {
        value.map(|s| s.to_string()).unwrap_or_default()
    };

    let properties = tagged_file.properties();

    Ok(MetadataRecord {
        title: text(tag.and_then(|t| t.title())),
        artist: text(tag.and_then(|t| t.artist())),
        album: text(tag.and_then(|t| t.album())),
        date: tag
            .and_then(|t| t.year())
            .map(|y| y.to_string())
            .unwrap_or_default(),
        genre: text(tag.and_then(|t| t.genre())),
        comment: text(tag.and_then(|t| t.comment())),
        format,
        channels: properties.channels(),
        sample_rate: properties.sample_rate(),
        bits_per_sample: properties.bit_depth(),
        bitrate: properties.audio_bitrate().map(|kbps| kbps * 1000),
        length: properties.duration().as_secs_f64(),
        error: None,
    })
}

/// AAF is read-only best-effort: tags stay empty, length is filled when a
/// generic probe manages to parse anything.
fn read_aaf(path: &Path) -> MetadataRecord {
    let mut record = MetadataRecord {
        format: Some(AudioFormat::Aaf),
        ..MetadataRecord::default()
    };
    if let Ok(tagged_file) = Probe::open(path).and_then(|p| p.read()) {
        record.length = tagged_file.properties().duration().as_secs_f64();
    }
    record
}

/// Write a metadata record back to the file, format-appropriately.
///
/// Callers follow a copy-then-write pattern: read, clone, overlay the
/// changed fields, then hand the whole record here. Empty strings are
/// written as-is; an empty title is a present value, not an omission.
pub fn write_metadata(path: &Path, record: &MetadataRecord) -> Result<()> {
    if AudioFormat::from_path(path) == Some(AudioFormat::Aaf) {
        return Err(Error::UnsupportedFormat(
            "writing AAF metadata is not supported".to_string(),
        ));
    }

    let mut tagged_file = Probe::open(path)
        .and_then(|p| p.read())
        .map_err(|e| Error::tag(path, e.to_string()))?;

    let tag_type = tagged_file.primary_tag_type();
    let tag = if let Some(tag) = tagged_file.tag_mut(tag_type) {
        tag
    } else {
        tagged_file.insert_tag(Tag::new(tag_type));
        tagged_file
            .tag_mut(tag_type)
            .expect("tag was just inserted")
    };

    tag.set_title(record.title.clone());
    tag.set_artist(record.artist.clone());
    tag.set_album(record.album.clone());
    tag.set_genre(record.genre.clone());
    tag.set_comment(record.comment.clone());
    if let Some(year) = parse_year(&record.date) {
        tag.set_year(year);
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::tag(path, e.to_string()))?;
    Ok(())
}

/// Pull a 4-digit year out of a date string ("2021", "2021-05-01", ...).
fn parse_year(date: &str) -> Option<u32> {
    let digits: String = date.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_non_audio_is_degraded_not_err() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("not-audio.mp3");
        std::fs::write(&path, "This is just some text, not music.").unwrap();

        let record = read_metadata(&path);
        assert!(record.error.is_some());
        assert_eq!(record.format, Some(AudioFormat::Mp3));
        assert!(record.title.is_empty());
    }

    #[test]
    fn test_read_missing_file_is_degraded() {
        let record = read_metadata(Path::new("no_such_file.flac"));
        assert!(record.error.is_some());
        assert_eq!(record.format, Some(AudioFormat::Flac));
    }

    #[test]
    fn test_aaf_read_is_best_effort_without_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project.aaf");
        std::fs::write(&path, b"opaque aaf payload").unwrap();

        let record = read_metadata(&path);
        assert_eq!(record.format, Some(AudioFormat::Aaf));
        assert!(record.error.is_none());
        assert!(record.has_no_tags());
    }

    #[test]
    fn test_write_aaf_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("project.aaf");
        std::fs::write(&path, b"opaque aaf payload").unwrap();

        let result = write_metadata(&path, &MetadataRecord::default());
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("2021"), Some(2021));
        assert_eq!(parse_year("2021-05-01"), Some(2021));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("May 2021"), None);
    }
}
