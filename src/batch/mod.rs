//! Batch orchestration over the validator and repair engine.
//!
//! Drives per-file validation across a working set, aggregates counts,
//! applies automatic tag fixes, and runs content repairs plus renames.
//! Strictly sequential: the engine assumes exclusive access to each file
//! during its own repair, and processing files one at a time is how that
//! guarantee is kept.
//!
//! Directory renames are deferred until every file-level operation in the
//! batch is done, then processed deepest-first so in-flight paths are
//! never invalidated; tracked state paths are rewritten after each one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ValidationConfig;
use crate::model::{AudioFormat, FileCheckState, MetadataRecord};
use crate::profile::{self, CompatibilityReport, Issue, MAX_FIELD_LENGTH, TagField};
use crate::repair::{RepairEngine, rename_directory, rename_file};
use crate::tags;

/// One checked file in a batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub display_name: String,
    pub report: CompatibilityReport,
}

/// All reports from one batch check.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub total_issues: usize,
}

/// Counts from an automatic tag-fix sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixSummary {
    pub fixed: usize,
    pub skipped: usize,
}

/// Counts from a repair/rename sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairSummary {
    pub repaired: usize,
    pub failed: usize,
    pub files_renamed: usize,
    pub dirs_renamed: usize,
}

/// Check a list of files against the strict profile.
///
/// This is the consumer-facing surface: returns `(display_name, report)`
/// pairs plus the total issue count. `progress`, when given, is invoked as
/// `(current, total, filename)` after each file and has no effect on
/// outcomes.
pub fn check_compatibility<R>(
    paths: &[PathBuf],
    metadata_reader: R,
    config: &ValidationConfig,
    mut progress: Option<&mut dyn FnMut(usize, usize, &str)>,
) -> (Vec<(String, CompatibilityReport)>, usize)
where
    R: Fn(&Path) -> MetadataRecord,
{
    let mut results = Vec::with_capacity(paths.len());
    let mut total_issues = 0;

    for (index, path) in paths.iter().enumerate() {
        let metadata = metadata_reader(path);
        let report = profile::validate(path, &metadata, config);
        total_issues += report.issues.len();

        let display_name = display_name(path);
        if let Some(callback) = progress.as_deref_mut() {
            callback(index + 1, paths.len(), &display_name);
        }
        results.push((display_name, report));
    }

    (results, total_issues)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Suggested title for a file: the stem with separators turned back into
/// readable spacing.
pub fn suggest_title(stem: &str) -> String {
    let spaced = stem.replace('_', " ").replace('-', " - ");
    collapse_spaces(&spaced)
}

/// Suggested artist from an `Artist - Title` file name pattern.
pub fn suggest_artist(file_name: &str) -> String {
    match file_name.split_once(" - ") {
        Some((artist, _)) if !artist.trim().is_empty() => artist.trim().to_string(),
        _ => "Unknown Artist".to_string(),
    }
}

/// Truncate a tag field to the profile's length cap.
pub fn trim_field(value: &str) -> String {
    value.chars().take(MAX_FIELD_LENGTH).collect()
}

fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for c in s.chars() {
        if c == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        out.push(c);
    }
    out.trim().to_string()
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Sequentially drives validation and repair over a scanned working set.
pub struct BatchOrchestrator {
    config: ValidationConfig,
    states: BTreeMap<PathBuf, FileCheckState>,
}

impl BatchOrchestrator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            states: BTreeMap::new(),
        }
    }

    /// Scan a directory for supported audio files, replacing any previous
    /// working set.
    pub fn scan_directory(&mut self, dir: &Path, recursive: bool) -> usize {
        self.states.clear();
        let max_depth = if recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(dir)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && AudioFormat::from_path(entry.path()).is_some() {
                self.states
                    .insert(entry.path().to_path_buf(), FileCheckState::default());
            }
        }
        self.states.len()
    }

    /// Replace the working set with an explicit list of files.
    pub fn set_files(&mut self, paths: &[PathBuf]) -> usize {
        self.states.clear();
        for path in paths {
            if path.is_file() && AudioFormat::from_path(path).is_some() {
                self.states.insert(path.clone(), FileCheckState::default());
            }
        }
        self.states.len()
    }

    /// The tracked per-file states, keyed by current path.
    pub fn states(&self) -> &BTreeMap<PathBuf, FileCheckState> {
        &self.states
    }

    /// Validate every file in the working set.
    pub fn check_all<R>(
        &mut self,
        metadata_reader: R,
        mut progress: Option<&mut dyn FnMut(usize, usize, &str)>,
    ) -> BatchReport
    where
        R: Fn(&Path) -> MetadataRecord,
    {
        let paths: Vec<PathBuf> = self.states.keys().cloned().collect();
        let total = paths.len();
        let mut report = BatchReport::default();

        for (index, path) in paths.into_iter().enumerate() {
            let metadata = metadata_reader(&path);
            let file_report = profile::validate(&path, &metadata, &self.config);
            report.total_issues += file_report.issues.len();

            if let Some(state) = self.states.get_mut(&path) {
                state.mark_checked(file_report.status());
            }

            let name = display_name(&path);
            if let Some(callback) = progress.as_deref_mut() {
                callback(index + 1, total, &name);
            }
            report.entries.push(BatchEntry {
                path,
                display_name: name,
                report: file_report,
            });
        }

        report
    }

    /// Apply automatic tag fixes for the fixable issues in a batch report.
    ///
    /// Copy-then-write per file: read fresh, overlay the fixed fields,
    /// write the whole record back.
    pub fn apply_tag_fixes(&mut self, report: &BatchReport) -> FixSummary {
        let mut summary = FixSummary::default();

        for entry in &report.entries {
            if entry.report.issues.is_empty() {
                continue;
            }
            if self.states.get(&entry.path).is_some_and(|s| s.fixed) {
                continue;
            }

            let mut metadata = tags::read_metadata(&entry.path);
            if metadata.error.is_some() {
                summary.skipped += 1;
                continue;
            }

            let mut updated = false;
            for issue in &entry.report.issues {
                match issue {
                    Issue::MissingTitle => {
                        metadata.title = suggest_title(&stem_of(&entry.path));
                        updated = true;
                    }
                    Issue::MissingArtist => {
                        metadata.artist = suggest_artist(&entry.display_name);
                        updated = true;
                    }
                    Issue::FieldTooLong { field, .. } => {
                        let value = match field {
                            TagField::Title => &mut metadata.title,
                            TagField::Artist => &mut metadata.artist,
                            TagField::Album => &mut metadata.album,
                        };
                        *value = trim_field(value);
                        updated = true;
                    }
                    _ => {}
                }
            }

            if !updated {
                summary.skipped += 1;
                continue;
            }

            match tags::write_metadata(&entry.path, &metadata) {
                Ok(()) => {
                    summary.fixed += 1;
                    if let Some(state) = self.states.get_mut(&entry.path) {
                        state.fixed = true;
                    }
                }
                Err(e) => {
                    debug!(path = %entry.path.display(), error = %e, "tag fix failed");
                    summary.skipped += 1;
                }
            }
        }

        info!(fixed = summary.fixed, skipped = summary.skipped, "tag fix sweep done");
        summary
    }

    /// Run content repairs and renames for a batch report.
    ///
    /// File-level work happens first; directory renames are deferred to
    /// the end and processed deepest-first.
    pub fn repair_all(&mut self, engine: &RepairEngine, report: &BatchReport) -> RepairSummary {
        let mut summary = RepairSummary::default();
        let mut dir_renames: BTreeMap<PathBuf, String> = BTreeMap::new();

        for entry in &report.entries {
            if entry.report.integrity.can_repair() {
                let outcome = engine.repair(&entry.path, &entry.report.integrity);
                if outcome.repaired {
                    summary.repaired += 1;
                    if entry.path.exists() {
                        if let Some(state) = self.states.get_mut(&entry.path) {
                            state.fixed = true;
                        }
                    } else {
                        // Deleted resource file: drop it from the set.
                        self.states.remove(&entry.path);
                        continue;
                    }
                } else {
                    summary.failed += 1;
                }
            }

            if entry.report.path.can_rename
                && let Some(new_name) = &entry.report.path.suggested_filename
            {
                let outcome = rename_file(&entry.path, new_name);
                if outcome.renamed
                    && let Some(new_path) = outcome.new_path
                {
                    summary.files_renamed += 1;
                    if let Some(state) = self.states.remove(&entry.path) {
                        self.states.insert(new_path, state);
                    }
                }
            }

            if entry.report.path.dir_can_rename
                && let (Some(dir), Some(new_name)) = (
                    &entry.report.path.dir_path,
                    &entry.report.path.suggested_dirname,
                )
            {
                dir_renames.insert(dir.clone(), new_name.clone());
            }
        }

        // Deepest-first keeps shallower pending renames valid.
        let mut deferred: Vec<(PathBuf, String)> = dir_renames.into_iter().collect();
        deferred.sort_by_key(|(dir, _)| std::cmp::Reverse(dir.components().count()));

        for (dir, new_name) in deferred {
            let outcome = rename_directory(&dir, &new_name);
            if outcome.renamed
                && let Some(new_dir) = outcome.new_path
            {
                summary.dirs_renamed += 1;
                self.rewrite_prefix(&dir, &new_dir);
            }
        }

        info!(
            repaired = summary.repaired,
            failed = summary.failed,
            files_renamed = summary.files_renamed,
            dirs_renamed = summary.dirs_renamed,
            "repair sweep done"
        );
        summary
    }

    /// Rewrite tracked paths under a renamed directory to the new prefix.
    fn rewrite_prefix(&mut self, old_dir: &Path, new_dir: &Path) {
        let moved: Vec<PathBuf> = self
            .states
            .keys()
            .filter(|p| p.starts_with(old_dir))
            .cloned()
            .collect();
        for old_path in moved {
            let suffix = old_path
                .strip_prefix(old_dir)
                .expect("path was filtered by prefix")
                .to_path_buf();
            if let Some(state) = self.states.remove(&old_path) {
                self.states.insert(new_dir.join(suffix), state);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FileStatus;
    use crate::repair::NoCodecs;
    use crate::test_utils;
    use tempfile::tempdir;

    fn tag_config() -> ValidationConfig {
        ValidationConfig::tags_only()
    }

    #[test]
    fn test_suggest_title() {
        assert_eq!(suggest_title("My_Track"), "My Track");
        assert_eq!(suggest_title("Artist-Song"), "Artist - Song");
        assert_eq!(suggest_title("Already - Spaced"), "Already - Spaced");
    }

    #[test]
    fn test_suggest_artist() {
        assert_eq!(suggest_artist("Bob - Tune.mp3"), "Bob");
        assert_eq!(suggest_artist("loosefile.mp3"), "Unknown Artist");
    }

    #[test]
    fn test_trim_field_is_exact() {
        let long = "x".repeat(300);
        assert_eq!(trim_field(&long).chars().count(), 250);
        assert_eq!(trim_field("short"), "short");
    }

    #[test]
    fn test_check_compatibility_counts_and_progress() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.mp3");
        let bad = dir.path().join("bad.mp3");
        std::fs::write(&good, test_utils::mp3_bytes_with_id3v2(4)).unwrap();
        std::fs::write(&bad, test_utils::mp3_bytes_with_id3v2(4)).unwrap();

        let paths = vec![good.clone(), bad.clone()];
        let reader = |path: &Path| {
            let title = if path.ends_with("good.mp3") { "T" } else { "" };
            MetadataRecord {
                title: title.to_string(),
                artist: "A".to_string(),
                ..MetadataRecord::default()
            }
        };

        let mut seen = Vec::new();
        let mut progress = |current: usize, total: usize, name: &str| {
            seen.push((current, total, name.to_string()));
        };
        let (results, total_issues) =
            check_compatibility(&paths, reader, &tag_config(), Some(&mut progress));

        assert_eq!(results.len(), 2);
        assert_eq!(total_issues, 1);
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], (1, 2, "good.mp3".to_string()));
        assert_eq!(seen[1].0, 2);
    }

    #[test]
    fn test_scan_creates_fresh_states() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        std::fs::write(dir.path().join("b.flac"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let sub = dir.path().join("deeper");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("c.wav"), b"x").unwrap();

        let mut orchestrator = BatchOrchestrator::new(tag_config());
        assert_eq!(orchestrator.scan_directory(dir.path(), false), 2);
        assert_eq!(orchestrator.scan_directory(dir.path(), true), 3);
        assert!(orchestrator.states().values().all(|s| !s.checked));
    }

    #[test]
    fn test_missing_title_fix_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("My_Track.mp3");
        std::fs::write(&path, test_utils::mp3_bytes_with_id3v2(4)).unwrap();
        tags::write_metadata(
            &path,
            &MetadataRecord {
                artist: "Bob".to_string(),
                ..MetadataRecord::default()
            },
        )
        .unwrap();

        let mut orchestrator = BatchOrchestrator::new(tag_config());
        orchestrator.scan_directory(dir.path(), false);
        let report = orchestrator.check_all(tags::read_metadata, None);
        assert_eq!(report.total_issues, 1);
        assert_eq!(
            report.entries[0].report.issue_messages(),
            vec!["Missing title tag".to_string()]
        );

        let summary = orchestrator.apply_tag_fixes(&report);
        assert_eq!(summary, FixSummary { fixed: 1, skipped: 0 });

        let metadata = tags::read_metadata(&path);
        assert_eq!(metadata.title, "My Track");

        let recheck = orchestrator.check_all(tags::read_metadata, None);
        assert_eq!(recheck.total_issues, 0);
        assert_eq!(
            orchestrator.states().values().next().unwrap().status,
            Some(FileStatus::Ok)
        );
    }

    #[test]
    fn test_oversized_title_trimmed_to_cap() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("long.mp3");
        std::fs::write(&path, test_utils::mp3_bytes_with_id3v2(4)).unwrap();
        tags::write_metadata(
            &path,
            &MetadataRecord {
                title: "x".repeat(300),
                artist: "Bob".to_string(),
                ..MetadataRecord::default()
            },
        )
        .unwrap();

        let mut orchestrator = BatchOrchestrator::new(tag_config());
        orchestrator.scan_directory(dir.path(), false);
        let report = orchestrator.check_all(tags::read_metadata, None);
        assert!(
            report.entries[0]
                .report
                .issue_messages()
                .contains(&"Title tag exceeds 250 characters".to_string())
        );

        orchestrator.apply_tag_fixes(&report);
        let metadata = tags::read_metadata(&path);
        assert_eq!(metadata.title.chars().count(), 250);
    }

    #[test]
    fn test_repair_all_fixes_wav_and_updates_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        let mut bytes = test_utils::wav_bytes(1024);
        bytes[0..4].copy_from_slice(b"OOPS");
        std::fs::write(&path, bytes).unwrap();

        let config = ValidationConfig {
            perform_integrity_check: true,
            ..ValidationConfig::tags_only()
        };
        let mut orchestrator = BatchOrchestrator::new(config);
        orchestrator.scan_directory(dir.path(), false);
        let report = orchestrator.check_all(tags::read_metadata, None);

        let engine = RepairEngine::with_codecs(NoCodecs);
        let summary = orchestrator.repair_all(&engine, &report);
        assert_eq!(summary.repaired, 1);
        assert_eq!(summary.failed, 0);
        assert!(orchestrator.states().get(&path).unwrap().fixed);

        let repaired = std::fs::read(&path).unwrap();
        assert_eq!(&repaired[0..4], b"RIFF");
    }

    #[test]
    fn test_repair_all_renames_file_and_directory() {
        let dir = tempdir().unwrap();
        let messy_dir = dir.path().join("Démos");
        std::fs::create_dir(&messy_dir).unwrap();
        let path = messy_dir.join("Track?.wav");
        std::fs::write(&path, test_utils::wav_bytes(256)).unwrap();

        let mut orchestrator = BatchOrchestrator::new(ValidationConfig::full());
        orchestrator.scan_directory(dir.path(), true);
        let report = orchestrator.check_all(tags::read_metadata, None);

        let engine = RepairEngine::with_codecs(NoCodecs);
        let summary = orchestrator.repair_all(&engine, &report);
        assert_eq!(summary.files_renamed, 1);
        assert_eq!(summary.dirs_renamed, 1);

        let expected = dir.path().join("Demos").join("Track.wav");
        assert!(expected.exists());
        assert!(
            orchestrator.states().contains_key(&expected),
            "state paths rewritten: {:?}",
            orchestrator.states().keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_resource_file_removed_from_working_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("._ghost.mp3");
        std::fs::write(&path, b"sidecar").unwrap();

        let config = ValidationConfig {
            perform_integrity_check: true,
            ..ValidationConfig::tags_only()
        };
        let mut orchestrator = BatchOrchestrator::new(config);
        orchestrator.scan_directory(dir.path(), false);
        let report = orchestrator.check_all(tags::read_metadata, None);

        let engine = RepairEngine::with_codecs(NoCodecs);
        let summary = orchestrator.repair_all(&engine, &report);
        assert_eq!(summary.repaired, 1);
        assert!(!path.exists());
        assert!(orchestrator.states().is_empty());
    }
}
