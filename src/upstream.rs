//! # Upstream Sources
//!
//! This module materialises the upstream project at a given ref into a staging
//! tree. The version-control details sit behind the [`UpstreamSource`] trait
//! so the sync orchestration can be exercised against plain directories in
//! tests.
//!
//! - **`GitUpstream`**: shallow-fetches the ref with the system `git` into an
//!   on-disk cache keyed by URL hash and revision. A branch name is resolved
//!   to its current head first, so a moved branch is fetched again. Cached
//!   checkouts are reused unless the cache is bypassed.
//! - **`LocalUpstream`**: uses an existing directory as the staging tree. The
//!   ref only feeds the sync fingerprint.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git;

static REF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/+-]*$").expect("ref pattern is valid")
});

static COMMIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{7,64}$").expect("commit pattern is valid"));

/// A commit-ish naming the upstream revision to sync against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UpstreamRef(String);

impl UpstreamRef {
    /// Validate and wrap a commit id, tag or branch name.
    pub fn new(identifier: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        let trimmed = identifier.trim();
        if trimmed.is_empty()
            || !REF_PATTERN.is_match(trimmed)
            || trimmed.contains("..")
            || trimmed.ends_with('/')
            || trimmed.ends_with(".lock")
        {
            return Err(Error::Configuration {
                message: format!("invalid upstream ref '{}'", identifier),
                hint: Some("Use a commit id, tag or branch name (e.g. 3f6c7a1 or ver/1.21.4)".to_string()),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the ref is spelled as a (possibly abbreviated) commit id.
    pub fn is_commit_id(&self) -> bool {
        COMMIT_PATTERN.is_match(&self.0)
    }
}

impl fmt::Display for UpstreamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces a staging tree for an upstream ref
pub trait UpstreamSource {
    /// Stable identity of the source, part of the sync fingerprint.
    fn identity(&self) -> String;

    /// The revision `r#ref` currently names. Part of the sync fingerprint, so
    /// a moved branch invalidates the last sync.
    fn resolve(&self, r#ref: &UpstreamRef) -> Result<String> {
        Ok(r#ref.to_string())
    }

    /// Make the upstream tree at `r#ref` available on disk and return its root.
    /// `revision` is what [`UpstreamSource::resolve`] returned for it.
    fn materialize(&self, r#ref: &UpstreamRef, revision: &str) -> Result<PathBuf>;
}

/// Upstream fetched from a git remote into a checkout cache
#[derive(Debug, Clone)]
pub struct GitUpstream {
    url: String,
    cache_root: PathBuf,
    use_cache: bool,
}

impl GitUpstream {
    pub fn new(url: impl Into<String>, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            cache_root: cache_root.into(),
            use_cache: true,
        }
    }

    /// Always fetch, replacing any cached checkout.
    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.use_cache = !bypass;
        self
    }

    pub fn cache_path(&self, revision: &str) -> PathBuf {
        git::url_to_cache_path(&self.cache_root, &self.url, revision)
    }
}

impl UpstreamSource for GitUpstream {
    fn identity(&self) -> String {
        self.url.clone()
    }

    fn resolve(&self, r#ref: &UpstreamRef) -> Result<String> {
        if r#ref.is_commit_id() {
            return Ok(r#ref.to_string());
        }
        match git::ls_remote_branch(&self.url, r#ref.as_str()) {
            Ok(Some(head)) => {
                log::debug!("{} is branch head {}", r#ref, head);
                Ok(head)
            }
            Ok(None) => Ok(r#ref.to_string()),
            Err(e) => {
                log::warn!("Could not resolve {} against {}: {}", r#ref, self.url, e);
                Ok(r#ref.to_string())
            }
        }
    }

    fn materialize(&self, r#ref: &UpstreamRef, revision: &str) -> Result<PathBuf> {
        let target = self.cache_path(revision);
        if self.use_cache && target.is_dir() {
            log::info!("Using cached upstream checkout {}", target.display());
            return Ok(target);
        }

        log::info!("Fetching {} at {}", self.url, r#ref);
        git::fetch_commitish(&self.url, r#ref.as_str(), &target)?;
        Ok(target)
    }
}

/// Upstream already present on disk
#[derive(Debug, Clone)]
pub struct LocalUpstream {
    root: PathBuf,
}

impl LocalUpstream {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl UpstreamSource for LocalUpstream {
    fn identity(&self) -> String {
        format!("local:{}", self.root.display())
    }

    fn materialize(&self, r#ref: &UpstreamRef, _revision: &str) -> Result<PathBuf> {
        if !self.root.is_dir() {
            return Err(Error::UpstreamFetch {
                url: self.root.display().to_string(),
                reference: r#ref.to_string(),
                message: "local upstream directory does not exist".to_string(),
            });
        }
        log::debug!("Using local upstream {} for {}", self.root.display(), r#ref);
        Ok(self.root.clone())
    }
}

/// Build the upstream source described by the configuration.
///
/// A relative `upstream.path` is resolved against `project_root`.
pub fn from_config(
    config: &Config,
    project_root: &Path,
    cache_root: &Path,
    no_cache: bool,
) -> Result<Box<dyn UpstreamSource>> {
    match (&config.upstream.url, &config.upstream.path) {
        (Some(url), _) => Ok(Box::new(
            GitUpstream::new(url.clone(), cache_root).bypass_cache(no_cache),
        )),
        (None, Some(path)) => Ok(Box::new(LocalUpstream::new(project_root.join(path)))),
        (None, None) => Err(Error::config("upstream needs either url or path")),
    }
}
