//! Validation configuration.
//!
//! The checks that cost real I/O (content hashing, structural validation)
//! and the path rules that may rename files are opt-in/opt-out per call.
//! The config is passed explicitly into `profile::validate` and the batch
//! orchestrator rather than living in ambient state, so two callers with
//! different settings can share one process.

use serde::{Deserialize, Serialize};

/// Toggles for the validation pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Hash the file and run format-specific structural checks.
    pub perform_integrity_check: bool,

    /// Check file names for length and character-set violations.
    pub perform_path_validation: bool,

    /// Also check each parent directory segment. Only consulted when
    /// `perform_path_validation` is set.
    pub validate_directory_names: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            // Integrity checking reads every byte of every file; keep it
            // opt-in like the tag checks are opt-out.
            perform_integrity_check: false,
            perform_path_validation: true,
            validate_directory_names: true,
        }
    }
}

impl ValidationConfig {
    /// Config with every check enabled.
    pub fn full() -> Self {
        Self {
            perform_integrity_check: true,
            perform_path_validation: true,
            validate_directory_names: true,
        }
    }

    /// Tag-only validation: no file reads beyond the metadata record.
    pub fn tags_only() -> Self {
        Self {
            perform_integrity_check: false,
            perform_path_validation: false,
            validate_directory_names: false,
        }
    }
}
