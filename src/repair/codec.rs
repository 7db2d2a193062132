//! External codec toolchain access.
//!
//! FLAC recovery stages 1 and 3 shell out to the `flac` reference encoder
//! and to `ffmpeg` when they exist on PATH. Availability is probed once
//! and injected into the repair engine as a capability, so tests (and
//! systems without the tools) skip those stages instead of failing them
//! halfway through.

use std::path::Path;
use std::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Access to external encode/decode tooling.
pub trait ExternalCodec {
    /// The `flac` reference tool is runnable.
    fn flac_available(&self) -> bool;

    /// Decode a FLAC stream to a PCM WAV file.
    fn decode_flac(&self, src: &Path, wav_out: &Path) -> Result<()>;

    /// Encode a WAV file to FLAC with encoder-side verification enabled.
    fn encode_flac_verified(&self, wav_src: &Path, flac_out: &Path) -> Result<()>;

    /// `ffmpeg` is runnable.
    fn ffmpeg_available(&self) -> bool;

    /// Full re-encode of an arbitrary input to FLAC via ffmpeg.
    fn transcode_to_flac(&self, src: &Path, flac_out: &Path) -> Result<()>;
}

/// PATH-probed implementations of the external tools.
pub struct SystemCodecs {
    flac: bool,
    ffmpeg: bool,
}

impl SystemCodecs {
    /// Probe PATH for the tools once.
    pub fn detect() -> Self {
        let flac = probe("flac", "--version");
        let ffmpeg = probe("ffmpeg", "-version");
        debug!(flac, ffmpeg, "external codec probe");
        Self { flac, ffmpeg }
    }
}

fn probe(tool: &str, version_flag: &str) -> bool {
    Command::new(tool)
        .arg(version_flag)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn run(path_for_errors: &Path, mut command: Command) -> Result<()> {
    let output = command.output().map_err(Error::Io)?;
    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(Error::repair(
            path_for_errors,
            format!("external tool failed: {}", stderr.trim()),
        ))
    }
}

impl ExternalCodec for SystemCodecs {
    fn flac_available(&self) -> bool {
        self.flac
    }

    fn decode_flac(&self, src: &Path, wav_out: &Path) -> Result<()> {
        let mut cmd = Command::new("flac");
        cmd.arg("-d")
            .arg("-f")
            .arg("-o")
            .arg(wav_out)
            .arg(src);
        run(src, cmd)
    }

    fn encode_flac_verified(&self, wav_src: &Path, flac_out: &Path) -> Result<()> {
        let mut cmd = Command::new("flac");
        cmd.arg("--verify")
            .arg("-f")
            .arg("-o")
            .arg(flac_out)
            .arg(wav_src);
        run(wav_src, cmd)
    }

    fn ffmpeg_available(&self) -> bool {
        self.ffmpeg
    }

    fn transcode_to_flac(&self, src: &Path, flac_out: &Path) -> Result<()> {
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-y")
            .arg("-i")
            .arg(src)
            .arg(flac_out);
        run(src, cmd)
    }
}

/// A codec with nothing installed; stages depending on external tools are
/// skipped. Used by tests and as a safe default in locked-down builds.
pub struct NoCodecs;

impl ExternalCodec for NoCodecs {
    fn flac_available(&self) -> bool {
        false
    }

    fn decode_flac(&self, src: &Path, _wav_out: &Path) -> Result<()> {
        Err(Error::repair(src, "flac tool not available"))
    }

    fn encode_flac_verified(&self, wav_src: &Path, _flac_out: &Path) -> Result<()> {
        Err(Error::repair(wav_src, "flac tool not available"))
    }

    fn ffmpeg_available(&self) -> bool {
        false
    }

    fn transcode_to_flac(&self, src: &Path, _flac_out: &Path) -> Result<()> {
        Err(Error::repair(src, "ffmpeg not available"))
    }
}
