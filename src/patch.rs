//! Patch application collaborator.
//!
//! forkpatch does not implement a diff algorithm. Applying a patch file onto a
//! tree is delegated to an implementation of [`PatchApplier`]; the default one
//! shells out to `git apply`.

use std::path::Path;

use crate::error::Result;
use crate::git;

pub use crate::git::ApplyOutcome;

/// Applies one unified-diff patch file onto a source tree
pub trait PatchApplier {
    /// Apply `patch` with paths relative to `tree`.
    ///
    /// A patch that does not apply is reported as
    /// [`ApplyOutcome::Rejected`], not as an error; `Err` is reserved for
    /// failures to run the applier at all. Implementations must leave `tree`
    /// untouched when rejecting.
    fn apply(&self, tree: &Path, patch: &Path) -> Result<ApplyOutcome>;
}

/// `git apply -p1`
#[derive(Debug, Clone, Copy, Default)]
pub struct GitApply;

impl PatchApplier for GitApply {
    fn apply(&self, tree: &Path, patch: &Path) -> Result<ApplyOutcome> {
        log::debug!("git apply {} in {}", patch.display(), tree.display());
        git::apply_patch(tree, patch)
    }
}
