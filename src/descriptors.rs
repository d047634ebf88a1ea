//! # Patch Descriptors
//!
//! A patch descriptor declares how one output file or directory of the fork is
//! derived from upstream. [`PatchDescriptorStore`] owns the descriptors of a
//! project and hands them out in registration order, which is also the order
//! they are applied in: a later descriptor may rely on the work tree an earlier
//! one produced.
//!
//! Output paths are unique across the whole store. Registering the same output
//! twice fails with [`Error::DuplicateDescriptor`] and leaves the store as it
//! was. An output may not contain a patch file or patches directory of any
//! descriptor, nor forkpatch's own state directory or configuration file,
//! since syncing replaces outputs wholesale.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::config::PatchConfig;
use crate::defaults::{CONFIG_FILE_NAME, STATE_DIR_NAME};
use crate::error::{Error, Result};
use crate::path::{compile_globs, normalize_rel_path};
use crate::project::ProjectGraph;

/// A single file derived from upstream by one patch file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchDescriptor {
    /// File path relative to the upstream root.
    pub upstream_path: String,
    /// Output file relative to the project root.
    pub output_path: String,
    /// Patch file relative to the project root.
    pub patch_file_path: String,
    pub excluded_paths: BTreeSet<String>,
}

/// A directory derived from upstream by a directory of patch files
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchDirDescriptor {
    pub name: Option<String>,
    /// Directory relative to the upstream root.
    pub upstream_dir: String,
    /// Output directory relative to the project root.
    pub output_dir: String,
    /// Directory of `*.patch` files relative to the project root.
    pub patches_dir: String,
    /// Glob patterns relative to `upstream_dir`.
    pub excludes: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Descriptor {
    File(PatchDescriptor),
    Dir(PatchDirDescriptor),
}

impl Descriptor {
    pub fn output_path(&self) -> &str {
        match self {
            Descriptor::File(d) => &d.output_path,
            Descriptor::Dir(d) => &d.output_dir,
        }
    }

    pub fn upstream_path(&self) -> &str {
        match self {
            Descriptor::File(d) => &d.upstream_path,
            Descriptor::Dir(d) => &d.upstream_dir,
        }
    }

    /// Patch file or patch directory, relative to the project root.
    pub fn patch_source(&self) -> &str {
        match self {
            Descriptor::File(d) => &d.patch_file_path,
            Descriptor::Dir(d) => &d.patches_dir,
        }
    }

    pub fn excludes(&self) -> &BTreeSet<String> {
        match self {
            Descriptor::File(d) => &d.excluded_paths,
            Descriptor::Dir(d) => &d.excludes,
        }
    }

    /// Identity used in error messages so the operator can find the patch.
    pub fn identity(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::File(d) => write!(
                f,
                "file patch {} -> {} ({})",
                d.upstream_path, d.output_path, d.patch_file_path
            ),
            Descriptor::Dir(d) => {
                if let Some(name) = &d.name {
                    write!(f, "dir patch '{}' ", name)?;
                } else {
                    f.write_str("dir patch ")?;
                }
                write!(
                    f,
                    "{}/ -> {}/ ({})",
                    d.upstream_dir, d.output_dir, d.patches_dir
                )
            }
        }
    }
}

/// Ordered, duplicate-free collection of descriptors
#[derive(Debug, Clone, Default)]
pub struct PatchDescriptorStore {
    descriptors: Vec<Descriptor>,
    outputs: HashSet<String>,
}

impl PatchDescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from the `patches:` section, in declaration order.
    ///
    /// Logs which module owns each output; outputs outside every module are
    /// allowed (upstream API trees usually live at the root).
    pub fn from_config(graph: &ProjectGraph, patches: &[PatchConfig]) -> Result<Self> {
        let mut store = Self::new();
        for patch in patches {
            match patch {
                PatchConfig::File { file } => store.add_file_patch_excluding(
                    &file.path,
                    &file.output,
                    &file.patch,
                    file.excludes.iter().cloned(),
                )?,
                PatchConfig::Dir { dir } => store.add_named_dir_patch(
                    dir.name.clone(),
                    &dir.upstream_path,
                    &dir.output_dir,
                    &dir.patches_dir,
                    dir.excludes.iter().cloned(),
                )?,
            }
        }

        for descriptor in store.all_descriptors() {
            match graph.owner_of(descriptor.output_path()) {
                Some(module) => log::debug!("{} belongs to module {}", descriptor, module.name),
                None => log::debug!("{} is outside every module", descriptor),
            }
        }
        Ok(store)
    }

    /// Register a file-level patch.
    pub fn add_file_patch(
        &mut self,
        upstream_path: &str,
        output_path: &str,
        patch_file_path: &str,
    ) -> Result<()> {
        self.add_file_patch_excluding(
            upstream_path,
            output_path,
            patch_file_path,
            std::iter::empty(),
        )
    }

    /// Register a file-level patch with exclude patterns.
    pub fn add_file_patch_excluding<I>(
        &mut self,
        upstream_path: &str,
        output_path: &str,
        patch_file_path: &str,
        excluded_paths: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let excluded_paths: BTreeSet<String> = excluded_paths.into_iter().collect();
        compile_globs(&excluded_paths)?;
        let descriptor = PatchDescriptor {
            upstream_path: normalize_rel_path(upstream_path)?,
            output_path: normalize_rel_path(output_path)?,
            patch_file_path: normalize_rel_path(patch_file_path)?,
            excluded_paths,
        };
        self.push(Descriptor::File(descriptor))
    }

    /// Register a directory-level patch.
    pub fn add_dir_patch<I>(
        &mut self,
        upstream_dir: &str,
        output_dir: &str,
        patches_dir: &str,
        excludes: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        self.add_named_dir_patch(None, upstream_dir, output_dir, patches_dir, excludes)
    }

    /// Register a directory-level patch with a diagnostic label.
    pub fn add_named_dir_patch<I>(
        &mut self,
        name: Option<String>,
        upstream_dir: &str,
        output_dir: &str,
        patches_dir: &str,
        excludes: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let excludes: BTreeSet<String> = excludes.into_iter().collect();
        compile_globs(&excludes)?;
        let descriptor = PatchDirDescriptor {
            name,
            upstream_dir: normalize_rel_path(upstream_dir)?,
            output_dir: normalize_rel_path(output_dir)?,
            patches_dir: normalize_rel_path(patches_dir)?,
            excludes,
        };
        self.push(Descriptor::Dir(descriptor))
    }

    fn push(&mut self, descriptor: Descriptor) -> Result<()> {
        let output = descriptor.output_path().to_string();
        if self.outputs.contains(&output) {
            return Err(Error::DuplicateDescriptor { output });
        }
        self.check_overwrites(&descriptor)?;
        self.outputs.insert(output);
        self.descriptors.push(descriptor);
        Ok(())
    }

    fn check_overwrites(&self, descriptor: &Descriptor) -> Result<()> {
        let output = descriptor.output_path();
        for reserved in [STATE_DIR_NAME, CONFIG_FILE_NAME] {
            if contains(output, reserved) || contains(reserved, output) {
                return Err(overwrite_error(descriptor, reserved));
            }
        }
        let sources = self
            .descriptors
            .iter()
            .chain(std::iter::once(descriptor))
            .map(Descriptor::patch_source);
        for source in sources {
            if contains(output, source) {
                return Err(overwrite_error(descriptor, source));
            }
        }
        for existing in &self.descriptors {
            if contains(existing.output_path(), descriptor.patch_source()) {
                return Err(overwrite_error(existing, descriptor.patch_source()));
            }
        }
        Ok(())
    }

    /// Registered descriptors, lazily, in registration order.
    pub fn all_descriptors(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Whether `path` is `ancestor` or lies below it.
fn contains(ancestor: &str, path: &str) -> bool {
    Path::new(path).starts_with(ancestor)
}

fn overwrite_error(descriptor: &Descriptor, path: &str) -> Error {
    Error::Configuration {
        message: format!(
            "output '{}' of {} would overwrite '{}'",
            descriptor.output_path(),
            descriptor,
            path
        ),
        hint: Some("Keep patch files and forkpatch's own files outside every output path".to_string()),
    }
}
