//! The per-file compatibility report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::findings::{Issue, Warning};
use crate::integrity::IntegrityResult;
use crate::model::FileStatus;

/// Path-level findings and rename capability for a file and its parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathReport {
    /// The file itself can be renamed to fix its findings
    pub can_rename: bool,
    pub suggested_filename: Option<String>,
    /// Parent directory, when directory validation ran
    pub dir_path: Option<PathBuf>,
    pub dir_can_rename: bool,
    pub suggested_dirname: Option<String>,
}

/// Everything the profile found out about one file.
///
/// An empty `issues` list is the sole criterion for "compatible";
/// warnings never block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub issues: Vec<Issue>,
    pub warnings: Vec<Warning>,
    /// Technical facts for display (bitrate, sample rate, checksum, ...).
    /// BTreeMap keeps rendering order deterministic.
    pub format_info: BTreeMap<String, String>,
    pub integrity: IntegrityResult,
    pub path: PathReport,
}

impl Default for CompatibilityReport {
    fn default() -> Self {
        Self {
            issues: Vec::new(),
            warnings: Vec::new(),
            format_info: BTreeMap::new(),
            integrity: IntegrityResult::ok(),
            path: PathReport::default(),
        }
    }
}

impl CompatibilityReport {
    /// True when the file passes the strict profile.
    pub fn is_compatible(&self) -> bool {
        self.issues.is_empty()
    }

    /// Working-set status derived from the findings.
    pub fn status(&self) -> FileStatus {
        if !self.issues.is_empty() {
            FileStatus::Problem
        } else if !self.warnings.is_empty() {
            FileStatus::Optimizable
        } else {
            FileStatus::Ok
        }
    }

    /// Rendered issue strings, in detection order.
    pub fn issue_messages(&self) -> Vec<String> {
        self.issues.iter().map(Issue::message).collect()
    }

    /// Rendered warning strings, in detection order.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(Warning::message).collect()
    }

    /// Advice strings paired with the findings, issues first.
    pub fn recommendations(&self) -> Vec<String> {
        self.issues
            .iter()
            .filter_map(Issue::recommendation)
            .chain(self.warnings.iter().filter_map(Warning::recommendation))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::findings::TagField;

    #[test]
    fn test_compatible_iff_no_issues() {
        let mut report = CompatibilityReport::default();
        assert!(report.is_compatible());
        assert_eq!(report.status(), FileStatus::Ok);

        report.warnings.push(Warning::HighSampleRate { rate: 96000 });
        assert!(report.is_compatible(), "warnings never block");
        assert_eq!(report.status(), FileStatus::Optimizable);

        report.issues.push(Issue::MissingTitle);
        assert!(!report.is_compatible());
        assert_eq!(report.status(), FileStatus::Problem);
    }

    #[test]
    fn test_recommendations_follow_findings() {
        let report = CompatibilityReport {
            issues: vec![Issue::FieldTooLong {
                field: TagField::Album,
                length: 260,
            }],
            warnings: vec![Warning::Multichannel { channels: 6 }],
            ..CompatibilityReport::default()
        };
        let recs = report.recommendations();
        assert_eq!(recs.len(), 2);
        assert!(recs[0].contains("Shorten album"));
        assert!(recs[1].contains("More than 2 channels"));
    }
}
