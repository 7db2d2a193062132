//! Application-wide error types.
//!
//! Library modules use specific error variants via `thiserror`, while the
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! Validation findings are *not* errors: `profile::validate` and
//! `integrity::check` always return a value. The variants here cover the
//! operations that actually mutate the filesystem (tag writes, renames,
//! repairs), where the caller needs to distinguish success from failure.

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag container reading/writing error
    #[error("Tag error for {path}: {message}")]
    Tag { path: PathBuf, message: String },

    /// File or directory rename error
    #[error("Rename error: {0}")]
    Rename(String),

    /// Repair attempt error
    #[error("Repair error for {path}: {message}")]
    Repair { path: PathBuf, message: String },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Unsupported or unrecognized audio format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a tag error.
    pub fn tag(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Tag {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a repair error.
    pub fn repair(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Repair {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a rename error.
    pub fn rename(message: impl Into<String>) -> Self {
        Self::Rename(message.into())
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("/path/to/file.mp3");
        assert!(err.to_string().contains("/path/to/file.mp3"));
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::rename("destination exists").context("while renaming track");
        let msg = err.to_string();
        assert!(msg.contains("while renaming track"));
    }

    #[test]
    fn test_tag_error() {
        let err = Error::tag("/music/song.mp3", "unsupported container");
        let msg = err.to_string();
        assert!(msg.contains("song.mp3"));
        assert!(msg.contains("unsupported container"));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(Error::rename("test"));
        let with_ctx = result.with_context("additional context");
        assert!(
            with_ctx
                .unwrap_err()
                .to_string()
                .contains("additional context")
        );
    }
}
