//! Building descriptor outputs inside the scratch work tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::descriptors::{Descriptor, PatchDescriptor, PatchDirDescriptor};
use crate::error::{Error, Result};
use crate::filesystem::{copy_file, copy_tree, remove_path, replace_path};
use crate::patch::{ApplyOutcome, PatchApplier};
use crate::path::{compile_globs, is_excluded};
use crate::sync::state::patch_files;

/// Scratch area for one sync run, removed when dropped.
///
/// `out/` mirrors the project layout for every staged output; `scratch/` is
/// reused per file descriptor.
#[derive(Debug)]
pub struct WorkTree {
    root: PathBuf,
}

impl WorkTree {
    /// Create an empty work tree at `root`, discarding leftovers from an
    /// interrupted run.
    pub fn create(root: PathBuf) -> Result<Self> {
        remove_path(&root)?;
        fs::create_dir_all(root.join("out")).map_err(|e| Error::at_path(&root, e))?;
        Ok(Self { root })
    }

    pub fn out(&self) -> PathBuf {
        self.root.join("out")
    }

    fn scratch(&self) -> PathBuf {
        self.root.join("scratch")
    }

    fn held(&self) -> PathBuf {
        self.root.join("held")
    }
}

impl Drop for WorkTree {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Could not remove work tree {}: {}", self.root.display(), e);
            }
        }
    }
}

/// Stage one descriptor into the work tree. Returns the number of patches applied.
///
/// `staged` lists the outputs of the descriptors staged before this one. Those
/// nested inside a directory output survive its staging unchanged.
pub fn stage(
    descriptor: &Descriptor,
    staging: &Path,
    project_root: &Path,
    work: &WorkTree,
    applier: &dyn PatchApplier,
    staged: &[&str],
) -> Result<usize> {
    match descriptor {
        Descriptor::File(file) => stage_file(descriptor, file, staging, project_root, work, applier),
        Descriptor::Dir(dir) => {
            stage_dir(descriptor, dir, staging, project_root, work, applier, staged)
        }
    }
}

fn stage_file(
    descriptor: &Descriptor,
    file: &PatchDescriptor,
    staging: &Path,
    project_root: &Path,
    work: &WorkTree,
    applier: &dyn PatchApplier,
) -> Result<usize> {
    let upstream = staging.join(&file.upstream_path);
    if !upstream.is_file() {
        return Err(Error::MissingUpstreamPath {
            descriptor: descriptor.identity(),
            path: file.upstream_path.clone(),
        });
    }

    // Patch paths are relative to the upstream root, so the file is staged at
    // its upstream location first.
    let scratch = work.scratch();
    remove_path(&scratch)?;
    let scratch_file = scratch.join(&file.upstream_path);
    copy_file(&upstream, &scratch_file)?;

    let excludes = compile_globs(&file.excluded_paths)?;
    let patch = project_root.join(&file.patch_file_path);
    let applied = if is_excluded(&excludes, &file.upstream_path) {
        log::info!(
            "{} is excluded, copying upstream unchanged",
            file.upstream_path
        );
        0
    } else if patch.is_file() {
        apply_one(descriptor, applier, &scratch, &patch)?;
        1
    } else {
        log::warn!(
            "No patch file {} for {}, copying upstream unchanged",
            file.patch_file_path,
            file.upstream_path
        );
        0
    };

    replace_path(&scratch_file, &work.out().join(&file.output_path))?;
    remove_path(&scratch)?;
    Ok(applied)
}

fn stage_dir(
    descriptor: &Descriptor,
    dir: &PatchDirDescriptor,
    staging: &Path,
    project_root: &Path,
    work: &WorkTree,
    applier: &dyn PatchApplier,
    staged: &[&str],
) -> Result<usize> {
    let upstream = staging.join(&dir.upstream_dir);
    if !upstream.is_dir() {
        return Err(Error::MissingUpstreamPath {
            descriptor: descriptor.identity(),
            path: dir.upstream_dir.clone(),
        });
    }

    let target = work.out().join(&dir.output_dir);
    let nested = hold_nested(work, &dir.output_dir, staged)?;
    remove_path(&target)?;
    let excludes = compile_globs(&dir.excludes)?;
    let copied = copy_tree(&upstream, &target, &excludes)?;
    log::debug!("copied {} upstream files for {}", copied, descriptor);

    let patches = patch_files(&project_root.join(&dir.patches_dir))?;
    for patch in &patches {
        apply_one(descriptor, applier, &target, patch)?;
    }

    for output in nested {
        log::debug!("keeping earlier output {} inside {}", output, dir.output_dir);
        replace_path(&work.held().join(output), &work.out().join(output))?;
    }
    remove_path(&work.held())?;
    Ok(patches.len())
}

/// Move earlier outputs nested under `output_dir` out of the way.
fn hold_nested<'s>(work: &WorkTree, output_dir: &str, staged: &[&'s str]) -> Result<Vec<&'s str>> {
    let mut held = Vec::new();
    for &output in staged {
        if !Path::new(output).starts_with(output_dir) {
            continue;
        }
        let src = work.out().join(output);
        if src.exists() {
            replace_path(&src, &work.held().join(output))?;
            held.push(output);
        }
    }
    Ok(held)
}

fn apply_one(
    descriptor: &Descriptor,
    applier: &dyn PatchApplier,
    tree: &Path,
    patch: &Path,
) -> Result<()> {
    match applier.apply(tree, patch)? {
        ApplyOutcome::Applied => {
            log::debug!("applied {}", patch.display());
            Ok(())
        }
        ApplyOutcome::Rejected { message } => Err(Error::PatchConflict {
            descriptor: descriptor.identity(),
            patch: patch.display().to_string(),
            message,
        }),
    }
}

/// Outputs that are not nested inside another output, in first-seen order.
///
/// Committing these moves every staged output into place exactly once.
pub fn top_level_outputs<'a>(descriptors: &[&'a Descriptor]) -> Vec<&'a str> {
    let outputs: Vec<&'a str> = descriptors.iter().map(|&d| d.output_path()).collect();
    outputs
        .iter()
        .copied()
        .filter(|candidate| {
            !outputs
                .iter()
                .any(|other| other != candidate && Path::new(candidate).starts_with(other))
        })
        .collect()
}
