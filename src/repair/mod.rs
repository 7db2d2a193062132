//! Best-effort automatic repair.
//!
//! Every content repair runs under the same guard: copy the original to a
//! `.bak` sidecar, run the strategy, re-check integrity, and either keep
//! the result (backup deleted) or restore the original byte-for-byte
//! (backup deleted). A failed repair never leaves the target worse than it
//! was, and no `.bak` outlives the call on the normal paths.

mod codec;
mod flac;
mod mp3;
mod rename;
mod strategy;
pub mod wav;

pub use codec::{ExternalCodec, NoCodecs, SystemCodecs};
pub use mp3::synchsafe_len;
pub use rename::{RenameOutcome, rename_directory, rename_file};
pub use strategy::RepairStrategy;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::integrity::{self, IntegrityResult, IntegrityStatus, RepairMethod};

/// What a repair call did.
///
/// The taxonomy is "repaired" vs. "unchanged" only: on failure the
/// original file has been restored from its backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairOutcome {
    pub repaired: bool,
    pub message: String,
    /// Post-repair integrity result, when a repair ran to completion
    pub integrity: Option<IntegrityResult>,
}

impl RepairOutcome {
    fn unchanged(message: impl Into<String>) -> Self {
        Self {
            repaired: false,
            message: message.into(),
            integrity: None,
        }
    }
}

/// Drives repair strategies selected by the integrity check.
pub struct RepairEngine {
    codecs: Box<dyn ExternalCodec>,
}

impl Default for RepairEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RepairEngine {
    /// Engine with PATH-probed external tools.
    pub fn new() -> Self {
        Self {
            codecs: Box::new(SystemCodecs::detect()),
        }
    }

    /// Engine with injected codec capabilities (tests, locked-down hosts).
    pub fn with_codecs(codecs: impl ExternalCodec + 'static) -> Self {
        Self {
            codecs: Box::new(codecs),
        }
    }

    /// Attempt to repair a file flagged by the integrity check.
    ///
    /// Refuses to touch the file unless the result says it is repairable.
    pub fn repair(&self, path: &Path, integrity_result: &IntegrityResult) -> RepairOutcome {
        let Some(method) = integrity_result.repair_method else {
            return RepairOutcome::unchanged("This issue cannot be automatically repaired");
        };

        match method {
            RepairMethod::DeleteResourceFile => delete_resource_file(path),
            RepairMethod::RebuildMp3 => self.run_stages(path, vec![Box::new(Mp3Rebuild)]),
            RepairMethod::RebuildWav => self.run_stages(path, vec![Box::new(WavRebuild)]),
            RepairMethod::RebuildFlac => {
                self.run_stages(path, flac::strategies(self.codecs.as_ref()))
            }
        }
    }

    /// Run stages in order under the backup/restore guard.
    ///
    /// A stage "wins" when it completes and the file no longer checks out
    /// as Error; otherwise the original is restored and the next stage
    /// starts from clean bytes.
    fn run_stages(&self, path: &Path, stages: Vec<Box<dyn RepairStrategy + '_>>) -> RepairOutcome {
        let backup = backup_path(path);
        if let Err(e) = fs::copy(path, &backup) {
            return RepairOutcome::unchanged(format!("Failed to create backup: {e}"));
        }

        let mut last_failure = String::new();
        for stage in stages {
            match stage.attempt(path) {
                Ok(()) => {
                    let recheck = integrity::check(path);
                    if recheck.status != IntegrityStatus::Error {
                        info!(stage = stage.name(), path = %path.display(), "repair succeeded");
                        let _ = fs::remove_file(&backup);
                        return RepairOutcome {
                            repaired: true,
                            message: format!("{} succeeded", stage.name()),
                            integrity: Some(recheck),
                        };
                    }
                    warn!(
                        stage = stage.name(),
                        path = %path.display(),
                        "stage completed but integrity still failing"
                    );
                    last_failure = format!("{}: integrity still failing", stage.name());
                }
                Err(e) => {
                    warn!(stage = stage.name(), path = %path.display(), error = %e, "stage failed");
                    last_failure = format!("{}: {e}", stage.name());
                }
            }

            if let Err(e) = fs::copy(&backup, path) {
                // Restore failed: keep the backup for manual recovery.
                return RepairOutcome::unchanged(format!(
                    "{last_failure} (error restoring backup: {e})"
                ));
            }
        }

        let _ = fs::remove_file(&backup);
        RepairOutcome::unchanged(format!(
            "All repair stages failed, original restored ({last_failure})"
        ))
    }
}

/// One-shot repair with PATH-probed external tools.
///
/// Consumers that repair more than one file should build a [`RepairEngine`]
/// once instead, so the toolchain probe is not repeated per call.
pub fn repair_file_integrity(path: &Path, integrity_result: &IntegrityResult) -> RepairOutcome {
    RepairEngine::new().repair(path, integrity_result)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// AppleDouble sidecars are deleted, not rewritten. No backup is taken.
fn delete_resource_file(path: &Path) -> RepairOutcome {
    match fs::remove_file(path) {
        Ok(()) => RepairOutcome {
            repaired: true,
            message: "Resource file deleted".to_string(),
            integrity: None,
        },
        Err(e) => RepairOutcome::unchanged(format!("Could not delete file: {e}")),
    }
}

struct Mp3Rebuild;

impl RepairStrategy for Mp3Rebuild {
    fn name(&self) -> &'static str {
        "MP3 stream rebuild"
    }

    fn attempt(&self, path: &Path) -> Result<()> {
        mp3::rebuild(path)
    }
}

struct WavRebuild;

impl RepairStrategy for WavRebuild {
    fn name(&self) -> &'static str {
        "WAV header rebuild"
    }

    fn attempt(&self, path: &Path) -> Result<()> {
        wav::rebuild(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::{IntegrityIssue, compute_content_hash};
    use crate::test_utils;
    use tempfile::tempdir;

    /// Codec whose stage-1 round trip always emits a known-good stream.
    struct HealingCodec;

    impl ExternalCodec for HealingCodec {
        fn flac_available(&self) -> bool {
            true
        }

        fn decode_flac(&self, src: &Path, wav_out: &Path) -> Result<()> {
            fs::copy(src, wav_out)?;
            Ok(())
        }

        fn encode_flac_verified(&self, _wav_src: &Path, flac_out: &Path) -> Result<()> {
            fs::write(flac_out, test_utils::flac_bytes())?;
            Ok(())
        }

        fn ffmpeg_available(&self) -> bool {
            false
        }

        fn transcode_to_flac(&self, src: &Path, _flac_out: &Path) -> Result<()> {
            Err(crate::error::Error::repair(src, "ffmpeg not available"))
        }
    }

    #[test]
    fn test_unrepairable_result_is_refused() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fine.wav");
        std::fs::write(&path, test_utils::wav_bytes(128)).unwrap();
        let before = compute_content_hash(&path).unwrap();

        let engine = RepairEngine::with_codecs(NoCodecs);
        let outcome = engine.repair(&path, &IntegrityResult::ok());
        assert!(!outcome.repaired);
        assert_eq!(before, compute_content_hash(&path).unwrap());
    }

    #[test]
    fn test_wav_repair_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        let mut bytes = test_utils::wav_bytes(2048);
        bytes[0..4].copy_from_slice(b"XXXX");
        std::fs::write(&path, &bytes).unwrap();

        let check = integrity::check(&path);
        assert!(check.can_repair());

        let engine = RepairEngine::with_codecs(NoCodecs);
        let outcome = engine.repair(&path, &check);
        assert!(outcome.repaired, "message: {}", outcome.message);

        let repaired = std::fs::read(&path).unwrap();
        assert_eq!(&repaired[0..4], b"RIFF");
        assert_eq!(&repaired[8..12], b"WAVE");
        assert!(!path.with_file_name("broken.wav.bak").exists());

        let recheck = outcome.integrity.unwrap();
        assert_eq!(recheck.status, IntegrityStatus::Ok);
    }

    #[test]
    fn test_mp3_repair_discards_garbage_and_converges() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noisy.mp3");
        let mut bytes = b"not-audio-lead-in".to_vec();
        bytes.extend_from_slice(&test_utils::mp3_bytes(6));
        std::fs::write(&path, &bytes).unwrap();

        let check = integrity::check(&path);
        assert_eq!(check.repair_method, Some(RepairMethod::RebuildMp3));

        let engine = RepairEngine::with_codecs(NoCodecs);
        let outcome = engine.repair(&path, &check);
        assert!(outcome.repaired, "message: {}", outcome.message);

        let recheck = integrity::check(&path);
        assert_ne!(recheck.status, IntegrityStatus::Error);
        assert!(!path.with_file_name("noisy.mp3.bak").exists());
    }

    #[test]
    fn test_failed_repair_restores_original_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hopeless.mp3");
        // No frame sync anywhere: the rebuild cannot find a starting point.
        std::fs::write(&path, vec![0x11u8; 4096]).unwrap();
        let before = compute_content_hash(&path).unwrap();

        let check = integrity::check(&path);
        assert!(check.can_repair());

        let engine = RepairEngine::with_codecs(NoCodecs);
        let outcome = engine.repair(&path, &check);
        assert!(!outcome.repaired);
        assert_eq!(before, compute_content_hash(&path).unwrap());
        assert!(!path.with_file_name("hopeless.mp3.bak").exists());
    }

    #[test]
    fn test_flac_pipeline_without_tools_restores_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mangled.flac");
        std::fs::write(&path, b"not a flac stream at all").unwrap();
        let before = compute_content_hash(&path).unwrap();

        let check = integrity::check(&path);
        assert_eq!(check.repair_method, Some(RepairMethod::RebuildFlac));

        let engine = RepairEngine::with_codecs(NoCodecs);
        let outcome = engine.repair(&path, &check);
        assert!(!outcome.repaired);
        assert!(outcome.message.contains("All repair stages failed"));
        assert_eq!(before, compute_content_hash(&path).unwrap());
        assert!(!path.with_file_name("mangled.flac.bak").exists());
    }

    #[test]
    fn test_flac_stage_one_heals_with_codec() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fixable.flac");
        std::fs::write(&path, b"ruined stream bytes").unwrap();

        let check = integrity::check(&path);
        assert!(check.can_repair());

        let engine = RepairEngine::with_codecs(HealingCodec);
        let outcome = engine.repair(&path, &check);
        assert!(outcome.repaired, "message: {}", outcome.message);

        let repaired = std::fs::read(&path).unwrap();
        assert_eq!(&repaired[0..4], b"fLaC");
        assert_eq!(
            outcome.integrity.unwrap().status,
            IntegrityStatus::Ok
        );
        assert!(!path.with_file_name("fixable.flac.bak").exists());
    }

    #[test]
    fn test_delete_resource_file_leaves_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("._track.mp3");
        std::fs::write(&path, b"sidecar junk").unwrap();

        let check = integrity::check(&path);
        assert_eq!(check.repair_method, Some(RepairMethod::DeleteResourceFile));

        let engine = RepairEngine::with_codecs(NoCodecs);
        let outcome = engine.repair(&path, &check);
        assert!(outcome.repaired);
        assert!(!path.exists());
        assert!(!path.with_file_name("._track.mp3.bak").exists());
    }

    #[test]
    fn test_zero_byte_file_is_not_repairable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        std::fs::write(&path, b"").unwrap();

        let check = integrity::check(&path);
        assert_eq!(check.issues, vec![IntegrityIssue::ZeroByteFile]);
        assert!(!check.can_repair());

        let engine = RepairEngine::with_codecs(NoCodecs);
        let outcome = engine.repair(&path, &check);
        assert!(!outcome.repaired);
        assert!(path.exists(), "refused repairs must not touch the file");
    }
}
