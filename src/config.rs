//! # Configuration Schema and Parsing
//!
//! This module defines the data structures that represent the `forkpatch.yaml`
//! file and the logic for parsing and validating it. The configuration is the
//! single explicit value every operation receives; nothing is stored in
//! process-wide registries.
//!
//! ## Layout
//!
//! ```yaml
//! project:
//!   name: trlcore-finally
//!   version: 1.21.4-R0.1-SNAPSHOT
//! modules:
//!   - { name: trlcore-finally-api, role: api }
//!   - { name: trlcore-finally-server, role: server }
//! upstream:
//!   name: paper
//!   url: https://github.com/PaperMC/Paper.git
//!   ref: 3f6c7a1
//! patches:
//!   - file:
//!       path: paper-server/build.gradle.kts
//!       output: trlcore-finally-server/build.gradle.kts
//!       patch: trlcore-finally-server/build.gradle.kts.patch
//!   - dir:
//!       name: paperApi
//!       upstream_path: paper-api
//!       excludes: [build.gradle.kts]
//!       patches_dir: trlcore-finally-api/paper-patches
//!       output_dir: paper-api
//! repositories:
//!   - { name: papermc, url: "https://repo.papermc.io/repository/maven-public/" }
//! publish:
//!   name: trlcore-finally
//!   url: https://maven.leafmc.one/snapshots/
//! ```
//!
//! Only `project` and `upstream` are required. Modules default to
//! `<project>-api` and `<project>-server`; see [`crate::defaults`] for the
//! remaining defaults.

use crate::defaults;
use crate::error::{Error, Result};
use crate::project::ModuleRole;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Project identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Root project name (e.g. `trlcore-finally`).
    pub name: String,
    /// Project version, reported by `build-report`.
    #[serde(default)]
    pub version: Option<String>,
}

/// A module of the fork
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Unique module name.
    pub name: String,
    /// Directory relative to the project root. Defaults to the module name.
    #[serde(default)]
    pub path: Option<String>,
    /// What the module is for.
    pub role: ModuleRole,
}

/// Where upstream source comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Short upstream name used in messages (e.g. `paper`).
    #[serde(default = "default_upstream_name")]
    pub name: String,
    /// Git URL of the upstream repository.
    #[serde(default)]
    pub url: Option<String>,
    /// Local directory used as the staging tree instead of a git checkout.
    #[serde(default)]
    pub path: Option<String>,
    /// Pinned commit-ish. Can be overridden with `--ref` or `FORKPATCH_REF`.
    #[serde(default, rename = "ref")]
    pub r#ref: Option<String>,
    /// Branch compared against the pinned ref by `check-upstream-updates`.
    #[serde(default = "defaults::default_upstream_branch")]
    pub branch: String,
}

fn default_upstream_name() -> String {
    "upstream".to_string()
}

/// File-level patch declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilePatchConfig {
    /// File path relative to the upstream root.
    pub path: String,
    /// Output file relative to the project root.
    pub output: String,
    /// Patch file relative to the project root.
    pub patch: String,
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// Directory-level patch declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirPatchConfig {
    /// Optional label used in diagnostics (e.g. `paperApi`).
    #[serde(default)]
    pub name: Option<String>,
    /// Directory relative to the upstream root.
    pub upstream_path: String,
    /// Output directory relative to the project root.
    pub output_dir: String,
    /// Directory of `*.patch` files relative to the project root.
    pub patches_dir: String,
    /// Glob patterns, relative to `upstream_path`, that are not copied.
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// One entry of the `patches:` list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchConfig {
    File { file: FilePatchConfig },
    Dir { dir: DirPatchConfig },
}

/// An artifact repository the build resolves from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    pub name: String,
    pub url: String,
}

/// Remote repository artifacts are published to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishSection {
    pub name: String,
    pub url: String,
    /// Environment variable holding the username.
    #[serde(default = "defaults::default_username_env")]
    pub username_env: String,
    /// Environment variable holding the password.
    #[serde(default = "defaults::default_password_env")]
    pub password_env: String,
}

/// Settings reported by the diagnostic tasks and used by the maintenance ones
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSettings {
    /// Directories removed by `clean-build-cache`, relative to the project root.
    #[serde(default = "defaults::default_cache_dirs")]
    pub cache_dirs: Vec<String>,
    /// Report file written by `build-report`, relative to the project root.
    #[serde(default = "defaults::default_report_path")]
    pub report_path: String,
    #[serde(default = "defaults::default_java_release")]
    pub java_release: u32,
    #[serde(default = "defaults::default_encoding")]
    pub encoding: String,
    #[serde(default = "defaults::default_compiler_args")]
    pub compiler_args: Vec<String>,
    /// Archives are built without timestamps and in stable file order.
    #[serde(default = "defaults::default_true")]
    pub reproducible_archives: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            cache_dirs: defaults::default_cache_dirs(),
            report_path: defaults::default_report_path(),
            java_release: defaults::default_java_release(),
            encoding: defaults::default_encoding(),
            compiler_args: defaults::default_compiler_args(),
            reproducible_archives: true,
        }
    }
}

/// The complete `forkpatch.yaml` document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub project: ProjectConfig,
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub patches: Vec<PatchConfig>,
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
    #[serde(default)]
    pub publish: Option<PublishSection>,
    #[serde(default)]
    pub build: BuildSettings,
}

impl Config {
    /// Modules as declared, or the default api/server pair derived from the
    /// project name when none are declared.
    pub fn effective_modules(&self) -> Vec<ModuleConfig> {
        if !self.modules.is_empty() {
            return self.modules.clone();
        }
        vec![
            ModuleConfig {
                name: format!("{}-api", self.project.name),
                path: None,
                role: ModuleRole::Api,
            },
            ModuleConfig {
                name: format!("{}-server", self.project.name),
                path: None,
                role: ModuleRole::Server,
            },
        ]
    }

    /// Human-readable identity of the upstream source.
    pub fn upstream_location(&self) -> String {
        match (&self.upstream.url, &self.upstream.path) {
            (Some(url), _) => url.clone(),
            (None, Some(path)) => path.clone(),
            (None, None) => "<unset>".to_string(),
        }
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(Error::config("project.name must not be empty"));
        }

        match (&self.upstream.url, &self.upstream.path) {
            (Some(_), Some(_)) => {
                return Err(Error::Configuration {
                    message: "upstream.url and upstream.path are mutually exclusive".to_string(),
                    hint: Some("Use url for a git remote, path for a local checkout".to_string()),
                })
            }
            (None, None) => {
                return Err(Error::Configuration {
                    message: "upstream needs either url or path".to_string(),
                    hint: Some("Add 'url:' pointing at the upstream git repository".to_string()),
                })
            }
            (Some(url), None) if url.contains("://") => {
                Url::parse(url)?;
            }
            _ => {}
        }

        for repo in &self.repositories {
            Url::parse(&repo.url)?;
        }
        if let Some(publish) = &self.publish {
            Url::parse(&publish.url)?;
        }

        Ok(())
    }
}

/// Parse and validate a YAML configuration string.
pub fn parse(yaml_content: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(yaml_content)?;
    config.validate()?;
    Ok(config)
}

/// Read, parse and validate a configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::at_path(path, e))?;
    parse(&content)
}
