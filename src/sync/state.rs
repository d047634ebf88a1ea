//! Sync fingerprinting and the persisted record of the last successful sync.
//!
//! The record never contains the upstream ref itself, only a digest over all
//! sync inputs (ref included) plus the content hash of each output.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::descriptors::Descriptor;
use crate::error::{Error, Result};
use crate::filesystem::hash_path;
use crate::upstream::UpstreamRef;

pub const STATE_FILE_NAME: &str = "sync-state.json";

/// Whether an output still matches what the last sync produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    Clean,
    Modified,
    Missing,
}

impl fmt::Display for OutputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OutputStatus::Clean => "clean",
            OutputStatus::Modified => "modified",
            OutputStatus::Missing => "missing",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    pub fingerprint: String,
    /// Output path (project-relative) → content hash.
    pub outputs: BTreeMap<String, String>,
}

impl SyncState {
    /// Load the state file. A missing or unreadable record means "never synced".
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|e| Error::at_path(path, e))?;
        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                log::warn!("Ignoring corrupt sync state {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// Write the state file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::at_path(parent, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, json).map_err(|e| Error::at_path(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| Error::at_path(path, e))
    }

    /// Record the current hashes of `outputs` under `project_root`.
    pub fn capture<'a, I>(fingerprint: String, project_root: &Path, outputs: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut hashes = BTreeMap::new();
        for output in outputs {
            let path = project_root.join(output);
            let hash = hash_path(&path)?.ok_or_else(|| Error::Filesystem {
                path: path.display().to_string(),
                message: "output missing after sync".to_string(),
            })?;
            hashes.insert(output.to_string(), hash);
        }
        Ok(Self {
            fingerprint,
            outputs: hashes,
        })
    }

    /// Compare every recorded output with what is on disk.
    pub fn verify(&self, project_root: &Path) -> Result<Vec<(String, OutputStatus)>> {
        let mut report = Vec::with_capacity(self.outputs.len());
        for (output, recorded) in &self.outputs {
            let status = match hash_path(&project_root.join(output))? {
                None => OutputStatus::Missing,
                Some(current) if &current == recorded => OutputStatus::Clean,
                Some(_) => OutputStatus::Modified,
            };
            report.push((output.clone(), status));
        }
        Ok(report)
    }

    pub fn is_clean(&self, project_root: &Path) -> Result<bool> {
        Ok(self
            .verify(project_root)?
            .iter()
            .all(|(_, status)| *status == OutputStatus::Clean))
    }
}

/// Location of the state file for a project.
pub fn state_path(state_dir: &Path) -> PathBuf {
    state_dir.join(STATE_FILE_NAME)
}

/// `*.patch` files of a directory in file-name order. A missing directory has
/// no patches.
pub fn patch_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut patches = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::at_path(dir, e))? {
        let path = entry.map_err(|e| Error::at_path(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "patch") {
            patches.push(path);
        }
    }
    patches.sort();
    Ok(patches)
}

/// Digest over every input that determines the sync output.
pub fn fingerprint(
    r#ref: &UpstreamRef,
    revision: &str,
    upstream_identity: &str,
    descriptors: &[&Descriptor],
    project_root: &Path,
) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(r#ref.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(revision.as_bytes());
    hasher.update([0u8]);
    hasher.update(upstream_identity.as_bytes());
    hasher.update([0u8]);

    for descriptor in descriptors {
        hasher.update(serde_json::to_vec(descriptor)?);
        hasher.update([0u8]);

        let source = project_root.join(descriptor.patch_source());
        let patches = match descriptor {
            Descriptor::File(_) if source.is_file() => vec![source],
            Descriptor::File(_) => Vec::new(),
            Descriptor::Dir(_) => patch_files(&source)?,
        };
        for patch in patches {
            let bytes = fs::read(&patch).map_err(|e| Error::at_path(&patch, e))?;
            if let Some(name) = patch.file_name() {
                hasher.update(name.to_string_lossy().as_bytes());
            }
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
    }

    Ok(hex::encode(hasher.finalize()))
}
