//! File and directory name validation.
//!
//! Checks names against the portable character set and length cap used
//! by the strict profile, and proposes ASCII-safe replacement names.
//!
//! Characters outside `[0-9a-zA-Z- ]` fall into two classes:
//! - **accented**: decomposes under canonical normalization (NFD) to an
//!   allowed base letter plus combining marks; transliterable, a warning
//! - **special**: everything else; not safely transliterable, an issue
//!
//! Both classes are replaced in the suggested name; accented characters
//! keep their base letter, special characters are dropped.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Maximum length (in characters) for a file stem or directory name.
pub const MAX_NAME_LEN: usize = 100;

/// Marker appended when a suggested name had to be truncated.
const ELLIPSIS: &str = "...";

/// Fallback stem when sanitization leaves nothing of a file name.
const FILE_FALLBACK: &str = "audiofile";

/// Fallback when sanitization leaves nothing of a directory name.
const DIR_FALLBACK: &str = "folder";

/// A single rule violation found in a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameFinding {
    /// Name exceeds [`MAX_NAME_LEN`] characters
    TooLong,
    /// Name contains characters that cannot be transliterated
    SpecialChars,
    /// Name contains accented characters with an ASCII base letter
    AccentedChars,
}

/// Result of validating one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCheck {
    pub findings: Vec<NameFinding>,
    /// True when a rename to `suggested` would resolve the findings
    pub can_rename: bool,
    /// Replacement name (with the original extension, for files)
    pub suggested: Option<String>,
}

impl NameCheck {
    fn clean() -> Self {
        Self {
            findings: Vec::new(),
            can_rename: false,
            suggested: None,
        }
    }

    /// True when any finding is blocking (length or special characters).
    pub fn has_issues(&self) -> bool {
        self.findings
            .iter()
            .any(|f| matches!(f, NameFinding::TooLong | NameFinding::SpecialChars))
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == ' '
}

/// Character classes outside the allowed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Allowed,
    Accented,
    Special,
}

fn classify(c: char) -> CharClass {
    if is_allowed(c) {
        return CharClass::Allowed;
    }
    let mut decomposed = c.nfd();
    match decomposed.next() {
        Some(base) if is_allowed(base) && decomposed.all(is_combining_mark) => CharClass::Accented,
        _ => CharClass::Special,
    }
}

/// Sanitize a name into the allowed character set.
///
/// Decompose, strip combining marks, drop anything still disallowed,
/// collapse repeated spaces/dashes, and trim leading/trailing space/dash.
/// Falls back to `fallback` when nothing survives. Truncation is handled
/// by the callers, which know what extension must stay intact.
fn sanitize(name: &str, fallback: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev: Option<char> = None;
    for c in name.nfd().filter(|c| !is_combining_mark(*c)) {
        if !is_allowed(c) {
            continue;
        }
        if (c == ' ' || c == '-') && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }
    let trimmed = out.trim_matches([' ', '-']).to_string();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed
    }
}

fn truncate_with_ellipsis(name: String) -> String {
    if name.chars().count() <= MAX_NAME_LEN {
        return name;
    }
    let keep = MAX_NAME_LEN - ELLIPSIS.len();
    let mut out: String = name.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

fn findings_for(name: &str) -> Vec<NameFinding> {
    let mut findings = Vec::new();
    if name.chars().count() > MAX_NAME_LEN {
        findings.push(NameFinding::TooLong);
    }
    let mut has_special = false;
    let mut has_accented = false;
    for c in name.chars() {
        match classify(c) {
            CharClass::Allowed => {}
            CharClass::Accented => has_accented = true,
            CharClass::Special => has_special = true,
        }
    }
    if has_special {
        findings.push(NameFinding::SpecialChars);
    }
    if has_accented {
        findings.push(NameFinding::AccentedChars);
    }
    findings
}

/// Validate a file name (stem checked, extension preserved).
pub fn check_file_name(file_name: &str) -> NameCheck {
    let (stem, ext) = match file_name.rfind('.') {
        // Dotfiles ("._track" has already been handled upstream) keep the
        // whole name as the stem.
        Some(0) | None => (file_name, ""),
        Some(idx) => file_name.split_at(idx),
    };

    let findings = findings_for(stem);
    if findings.is_empty() {
        return NameCheck::clean();
    }

    let suggested_stem = truncate_with_ellipsis(sanitize(stem, FILE_FALLBACK));
    let suggested = format!("{suggested_stem}{ext}");
    let can_rename = suggested != file_name;
    NameCheck {
        findings,
        can_rename,
        suggested: can_rename.then_some(suggested),
    }
}

/// Validate a single directory name.
pub fn check_dir_name(name: &str) -> NameCheck {
    let findings = findings_for(name);
    if findings.is_empty() {
        return NameCheck::clean();
    }

    let suggested = truncate_with_ellipsis(sanitize(name, DIR_FALLBACK));
    let can_rename = suggested != name;
    NameCheck {
        findings,
        can_rename,
        suggested: can_rename.then_some(suggested),
    }
}
