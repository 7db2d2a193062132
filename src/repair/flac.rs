//! Multi-stage FLAC recovery.
//!
//! Ordered fallback chain, each stage tried under the engine's
//! backup/restore guard:
//!
//! 1. Lossless round-trip through the external `flac` tool (decode to PCM,
//!    re-encode with verification).
//! 2. In-process tag rewrite: force-save the metadata blocks, inserting a
//!    minimal default tag when none exists.
//! 3. Full re-encode through `ffmpeg`.
//!
//! A stage whose toolchain is missing fails immediately and the pipeline
//! falls through to the next one. Staging files live in a `TempDir`, so
//! cleanup happens on every exit path.

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Tag, TagExt};
use std::fs;
use std::path::Path;

use super::codec::ExternalCodec;
use super::strategy::RepairStrategy;
use crate::error::{Error, Result};

/// The recovery stages, in the order they are attempted.
pub(super) fn strategies<'a>(codecs: &'a dyn ExternalCodec) -> Vec<Box<dyn RepairStrategy + 'a>> {
    vec![
        Box::new(FlacRoundTrip { codecs }),
        Box::new(TagRewrite),
        Box::new(FfmpegTranscode { codecs }),
    ]
}

struct FlacRoundTrip<'a> {
    codecs: &'a dyn ExternalCodec,
}

impl RepairStrategy for FlacRoundTrip<'_> {
    fn name(&self) -> &'static str {
        "lossless re-encode"
    }

    fn attempt(&self, path: &Path) -> Result<()> {
        if !self.codecs.flac_available() {
            return Err(Error::repair(path, "flac tool not available"));
        }
        let staging = tempfile::tempdir()?;
        let decoded = staging.path().join("decoded.wav");
        let reencoded = staging.path().join("reencoded.flac");

        self.codecs.decode_flac(path, &decoded)?;
        self.codecs.encode_flac_verified(&decoded, &reencoded)?;
        fs::copy(&reencoded, path)?;
        Ok(())
    }
}

struct TagRewrite;

impl RepairStrategy for TagRewrite {
    fn name(&self) -> &'static str {
        "metadata block rewrite"
    }

    fn attempt(&self, path: &Path) -> Result<()> {
        let mut tagged_file = Probe::open(path)
            .and_then(|p| p.read())
            .map_err(|e| Error::repair(path, e.to_string()))?;

        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file
            .tag(tag_type)
            .expect("tag was just ensured")
            .clone();
        tag.save_to_path(path, WriteOptions::default())
            .map_err(|e| Error::repair(path, e.to_string()))?;
        Ok(())
    }
}

struct FfmpegTranscode<'a> {
    codecs: &'a dyn ExternalCodec,
}

impl RepairStrategy for FfmpegTranscode<'_> {
    fn name(&self) -> &'static str {
        "full transcode"
    }

    fn attempt(&self, path: &Path) -> Result<()> {
        if !self.codecs.ffmpeg_available() {
            return Err(Error::repair(path, "ffmpeg not available"));
        }
        let staging = tempfile::tempdir()?;
        let transcoded = staging.path().join("transcoded.flac");

        self.codecs.transcode_to_flac(path, &transcoded)?;
        fs::copy(&transcoded, path)?;
        Ok(())
    }
}
