//! File and directory renaming.
//!
//! Renames proposed by path validation. Both operations fail cleanly
//! (reported, no filesystem change) when the destination name is taken,
//! so a half-deduplicated library never loses a file to an overwrite.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a rename call did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub renamed: bool,
    pub message: String,
    pub new_path: Option<PathBuf>,
}

impl RenameOutcome {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            renamed: false,
            message: message.into(),
            new_path: None,
        }
    }
}

fn rename_entry(path: &Path, new_name: &str, kind: &str) -> RenameOutcome {
    if new_name.is_empty() || new_name.contains(['/', '\\']) {
        return RenameOutcome::failed(format!("Invalid {kind} name: {new_name:?}"));
    }
    let Some(parent) = path.parent() else {
        return RenameOutcome::failed(format!("Cannot determine parent of {}", path.display()));
    };

    let destination = parent.join(new_name);
    if destination == path {
        return RenameOutcome::failed(format!("{kind} already has that name"));
    }
    if destination.exists() {
        return RenameOutcome::failed(format!(
            "Destination already exists: {}",
            destination.display()
        ));
    }

    match fs::rename(path, &destination) {
        Ok(()) => {
            info!(from = %path.display(), to = %destination.display(), "renamed {kind}");
            RenameOutcome {
                renamed: true,
                message: format!("Renamed {kind} to {new_name}"),
                new_path: Some(destination),
            }
        }
        Err(e) => RenameOutcome::failed(format!("Rename failed: {e}")),
    }
}

/// Rename a file in place within its directory.
pub fn rename_file(path: &Path, new_name: &str) -> RenameOutcome {
    rename_entry(path, new_name, "file")
}

/// Rename a directory in place within its parent.
pub fn rename_directory(path: &Path, new_name: &str) -> RenameOutcome {
    rename_entry(path, new_name, "directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rename_file_moves_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Süß.mp3");
        std::fs::write(&path, b"payload").unwrap();

        let outcome = rename_file(&path, "Suss.mp3");
        assert!(outcome.renamed);
        let new_path = outcome.new_path.unwrap();
        assert!(!path.exists());
        assert_eq!(std::fs::read(&new_path).unwrap(), b"payload");
    }

    #[test]
    fn test_rename_refuses_existing_destination() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        let other = dir.path().join("b.mp3");
        std::fs::write(&path, b"one").unwrap();
        std::fs::write(&other, b"two").unwrap();

        let outcome = rename_file(&path, "b.mp3");
        assert!(!outcome.renamed);
        assert!(outcome.message.contains("already exists"));
        // Nothing moved, nothing clobbered.
        assert_eq!(std::fs::read(&path).unwrap(), b"one");
        assert_eq!(std::fs::read(&other).unwrap(), b"two");
    }

    #[test]
    fn test_rename_directory() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("Démos");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("x.wav"), b"w").unwrap();

        let outcome = rename_directory(&sub, "Demos");
        assert!(outcome.renamed);
        assert!(dir.path().join("Demos").join("x.wav").exists());
    }

    #[test]
    fn test_rejects_separator_in_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        std::fs::write(&path, b"one").unwrap();

        let outcome = rename_file(&path, "../escape.mp3");
        assert!(!outcome.renamed);
        assert!(path.exists());
    }
}
