//! # forkpatch
//!
//! Build orchestration for projects that fork an upstream source tree and
//! carry their changes as patch files. It is designed to be driven by the
//! `forkpatch` command-line tool but the pieces are usable on their own.
//!
//! ## Quick Example
//!
//! ```
//! use forkpatch::descriptors::PatchDescriptorStore;
//!
//! let mut store = PatchDescriptorStore::new();
//! store
//!     .add_file_patch(
//!         "paper-server/build.gradle.kts",
//!         "trlcore-finally-server/build.gradle.kts",
//!         "trlcore-finally-server/build.gradle.kts.patch",
//!     )
//!     .unwrap();
//! store
//!     .add_dir_patch("paper-api", "paper-api", "trlcore-finally-api/paper-patches", Vec::new())
//!     .unwrap();
//!
//! // A second descriptor writing the same output is rejected.
//! assert!(store
//!     .add_file_patch("x", "paper-api", "x.patch")
//!     .is_err());
//! assert_eq!(store.all_descriptors().count(), 2);
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: the `forkpatch.yaml` schema. One `Config`
//!   value is loaded per invocation and passed explicitly to every operation.
//! - **Project graph (`project`)**: the fork's modules (api, server, test
//!   plugin) and their directories.
//! - **Descriptors (`descriptors`)**: the ordered, duplicate-free set of file
//!   and directory patch units.
//! - **Upstream (`upstream`, `git`)**: materialises the upstream tree at a ref,
//!   from a git remote (with a checkout cache) or a local directory.
//! - **Patching (`patch`)**: applies one patch file onto a tree via
//!   `git apply`.
//! - **Sync (`sync`)**: turns upstream + descriptors into patched outputs
//!   under the project root, skipping work when nothing changed.
//! - **Tasks (`tasks`)**: named maintenance and diagnostic tasks.
//! - **Publishing (`publish`)**: publish endpoint and credentials.
//!
//! ## Sync Flow
//!
//! 1.  **Fingerprint** the ref, upstream identity, descriptors and patches.
//! 2.  **Materialise** upstream at the ref.
//! 3.  **Stage** every descriptor in a scratch work tree, in order.
//! 4.  **Commit** the staged outputs over the project tree and record their
//!     hashes.
//!
//! Any failure before the commit step leaves the project tree untouched.

pub mod config;
pub mod defaults;
pub mod descriptors;
pub mod error;
pub mod filesystem;
pub mod git;
pub mod output;
pub mod patch;
pub mod path;
pub mod project;
pub mod publish;
pub mod suggestions;
pub mod sync;
pub mod tasks;
pub mod upstream;

pub use error::{Error, Result};

#[cfg(test)]
mod path_proptest;
