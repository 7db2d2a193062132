//! The repair strategy seam.

use std::path::Path;

use crate::error::Result;

/// One way of rewriting a damaged file in place.
///
/// Strategies mutate `path` directly; the engine wraps every attempt in
/// the backup/restore guard, so an implementation that fails may leave the
/// file in any state; the guard rolls it back.
pub trait RepairStrategy {
    /// Short name for logs and outcome messages.
    fn name(&self) -> &'static str;

    /// Try to repair the file at `path`.
    fn attempt(&self, path: &Path) -> Result<()>;
}
