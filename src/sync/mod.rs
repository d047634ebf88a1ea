//! # Upstream Sync
//!
//! Orchestrates producing the patched output tree from upstream:
//!
//! 1.  **Fingerprint**: digest the ref, upstream identity, descriptors and
//!     patch contents. If the last successful sync recorded the same
//!     fingerprint and every output still hashes to its recorded value, the
//!     run is a no-op.
//! 2.  **Materialise**: ask the [`UpstreamSource`] for a staging tree at the
//!     ref.
//! 3.  **Stage**: build each descriptor's output in a scratch work tree, in
//!     registration order. The first missing upstream path or rejected patch
//!     aborts the run; the project tree has not been touched at that point
//!     and the work tree is discarded.
//! 4.  **Commit**: move staged outputs over their targets and record the
//!     output hashes.
//!
//! Concurrent syncs of the same project root are not supported.

pub mod stage;
pub mod state;

use std::path::PathBuf;

use crate::defaults::STATE_DIR_NAME;
use crate::descriptors::Descriptor;
use crate::error::Result;
use crate::filesystem::replace_path;
use crate::patch::PatchApplier;
use crate::upstream::{UpstreamRef, UpstreamSource};

use self::stage::{top_level_outputs, WorkTree};
use self::state::{fingerprint, state_path, SyncState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Outputs were rebuilt from upstream.
    Applied,
    /// Inputs and outputs matched the last sync; nothing was touched.
    UpToDate,
}

/// Handle to the patched output tree produced by a sync
#[derive(Debug, Clone)]
pub struct PatchedTree {
    /// Output paths relative to the project root, in descriptor order.
    pub outputs: Vec<String>,
    pub fingerprint: String,
    pub status: SyncStatus,
    pub patches_applied: usize,
}

/// Sync driver for one project root
pub struct UpstreamSync<'a> {
    project_root: PathBuf,
    state_dir: PathBuf,
    upstream: &'a dyn UpstreamSource,
    applier: &'a dyn PatchApplier,
    force: bool,
}

impl<'a> UpstreamSync<'a> {
    pub fn new(
        project_root: impl Into<PathBuf>,
        upstream: &'a dyn UpstreamSource,
        applier: &'a dyn PatchApplier,
    ) -> Self {
        let project_root = project_root.into();
        let state_dir = project_root.join(STATE_DIR_NAME);
        Self {
            project_root,
            state_dir,
            upstream,
            applier,
            force: false,
        }
    }

    /// Rebuild outputs even when they look up to date.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn state_path(&self) -> PathBuf {
        state_path(&self.state_dir)
    }

    /// Produce the patched output tree for `r#ref`.
    pub fn sync<'d, I>(&self, r#ref: &UpstreamRef, descriptors: I) -> Result<PatchedTree>
    where
        I: IntoIterator<Item = &'d Descriptor>,
    {
        let descriptors: Vec<&Descriptor> = descriptors.into_iter().collect();
        let outputs: Vec<String> = descriptors
            .iter()
            .map(|d| d.output_path().to_string())
            .collect();
        let revision = self.upstream.resolve(r#ref)?;
        let fingerprint = fingerprint(
            r#ref,
            &revision,
            &self.upstream.identity(),
            &descriptors,
            &self.project_root,
        )?;

        if !self.force && self.is_up_to_date(&fingerprint)? {
            log::info!("Outputs already match upstream {}", r#ref);
            return Ok(PatchedTree {
                outputs,
                fingerprint,
                status: SyncStatus::UpToDate,
                patches_applied: 0,
            });
        }

        let staging = self.upstream.materialize(r#ref, &revision)?;
        log::info!("Staging tree at {}", staging.display());

        let work = WorkTree::create(self.state_dir.join("work"))?;
        let mut patches_applied = 0;
        for (index, descriptor) in descriptors.iter().enumerate() {
            log::info!("Applying {}", descriptor);
            let staged: Vec<&str> = outputs[..index].iter().map(String::as_str).collect();
            patches_applied += stage::stage(
                descriptor,
                &staging,
                &self.project_root,
                &work,
                self.applier,
                &staged,
            )?;
        }

        let state = SyncState::capture(
            fingerprint.clone(),
            &work.out(),
            outputs.iter().map(String::as_str),
        )?;

        // Nothing under the project root changes before this point.
        for output in top_level_outputs(&descriptors) {
            replace_path(&work.out().join(output), &self.project_root.join(output))?;
        }
        drop(work);
        state.save(&self.state_path())?;

        log::info!(
            "Synced {} outputs ({} patches) from upstream {}",
            outputs.len(),
            patches_applied,
            r#ref
        );
        Ok(PatchedTree {
            outputs,
            fingerprint,
            status: SyncStatus::Applied,
            patches_applied,
        })
    }

    fn is_up_to_date(&self, fingerprint: &str) -> Result<bool> {
        match SyncState::load(&self.state_path())? {
            Some(state) if state.fingerprint == fingerprint => state.is_clean(&self.project_root),
            _ => Ok(false),
        }
    }
}
