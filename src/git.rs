//! Thin wrappers around the system `git` command.
//!
//! Using the system binary means SSH keys, credential helpers and anything
//! configured in `~/.gitconfig` apply to upstream fetches without extra work.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::path::encode_path_segment;

/// Result of applying one patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The patch does not apply; carries git's explanation.
    Rejected { message: String },
}

fn run_git(args: &[&str], cwd: Option<&Path>) -> std::io::Result<Output> {
    let mut cmd = Command::new("git");
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd.output()
}

/// Whether a `git` binary can be executed.
pub fn is_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Check out `ref_name` of `url` into `target_dir`.
///
/// Works for branches, tags and bare commit ids: the ref is fetched with
/// depth 1 into a fresh repository and `FETCH_HEAD` is checked out. The
/// checkout is built next to the target and renamed into place only once
/// complete, so a failed fetch never leaves a half-populated target behind.
pub fn fetch_commitish(url: &str, ref_name: &str, target_dir: &Path) -> Result<()> {
    let fetch_err = |message: String| Error::UpstreamFetch {
        url: url.to_string(),
        reference: ref_name.to_string(),
        message,
    };

    let partial = partial_dir(target_dir);
    if partial.exists() {
        fs::remove_dir_all(&partial).map_err(|e| Error::at_path(&partial, e))?;
    }
    fs::create_dir_all(&partial).map_err(|e| Error::at_path(&partial, e))?;

    let steps: [&[&str]; 4] = [
        &["init", "--quiet"],
        &["remote", "add", "origin", url],
        &["fetch", "--quiet", "--depth=1", "origin", ref_name],
        &["-c", "advice.detachedHead=false", "checkout", "--quiet", "FETCH_HEAD"],
    ];

    for args in steps {
        let output = run_git(args, Some(&partial)).map_err(|e| fetch_err(e.to_string()))?;
        if !output.status.success() {
            let _ = fs::remove_dir_all(&partial);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(fetch_err(explain_fetch_failure(&stderr)));
        }
    }

    if target_dir.exists() {
        fs::remove_dir_all(target_dir).map_err(|e| Error::at_path(target_dir, e))?;
    }
    fs::rename(&partial, target_dir).map_err(|e| Error::at_path(target_dir, e))?;
    Ok(())
}

fn partial_dir(target_dir: &Path) -> PathBuf {
    let mut name = target_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    target_dir.with_file_name(name)
}

fn explain_fetch_failure(stderr: &str) -> String {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        format!(
            "Authentication failed. Make sure you have access to the repository.\n\
            For private repos, ensure you have:\n\
            - SSH key added to ssh-agent\n\
            - Git credentials configured\n\
            - Personal access token set up\n\
            Error: {}",
            stderr.trim()
        )
    } else if stderr.contains("couldn't find remote ref") {
        format!("Ref not found upstream. {}", stderr.trim())
    } else {
        stderr.trim().to_string()
    }
}

/// Apply a unified diff onto `tree` with `git apply -p1`.
///
/// `git apply` is atomic per patch: on rejection the tree is left untouched.
/// `GIT_CEILING_DIRECTORIES` stops git from discovering a repository above
/// `tree` and applying relative to its top level.
pub fn apply_patch(tree: &Path, patch: &Path) -> Result<ApplyOutcome> {
    let patch = fs::canonicalize(patch).map_err(|e| Error::at_path(patch, e))?;
    let ceiling = tree.parent().unwrap_or(tree);

    let output = Command::new("git")
        .args(["apply", "-p1", "--whitespace=nowarn"])
        .arg(&patch)
        .current_dir(tree)
        .env("GIT_CEILING_DIRECTORIES", ceiling)
        .output()
        .map_err(|e| Error::GitCommand {
            command: format!("apply {}", patch.display()),
            stderr: e.to_string(),
        })?;

    if output.status.success() {
        Ok(ApplyOutcome::Applied)
    } else {
        Ok(ApplyOutcome::Rejected {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Resolve the commit a remote branch points at.
pub fn ls_remote_branch(url: &str, branch: &str) -> Result<Option<String>> {
    let refname = format!("refs/heads/{}", branch);
    let output = run_git(&["ls-remote", url, &refname], None).map_err(|e| Error::GitCommand {
        command: "ls-remote".to_string(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: format!("ls-remote {} {}", url, refname),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(parse_ls_remote(&String::from_utf8_lossy(&output.stdout), &refname))
}

/// Pick the object id for `refname` out of `git ls-remote` output.
pub fn parse_ls_remote(stdout: &str, refname: &str) -> Option<String> {
    // Git ls-remote output format: <hash>\t<ref>
    stdout.lines().find_map(|line| {
        let (hash, name) = line.split_once('\t')?;
        (name.trim() == refname).then(|| hash.trim().to_string())
    })
}

/// Convert URL and ref to a cache path
pub fn url_to_cache_path(cache_root: &Path, url: &str, ref_name: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let url_hash = hex::encode(hasher.finalize());

    cache_root.join(format!(
        "{}-{}",
        &url_hash[..16],
        encode_path_segment(ref_name)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_to_cache_path() {
        let cache_root = PathBuf::from("/tmp/cache");
        let cache_path =
            url_to_cache_path(&cache_root, "https://github.com/PaperMC/Paper.git", "abc123");
        assert!(cache_path.starts_with(&cache_root));
        assert!(cache_path.to_string_lossy().ends_with("-abc123"));
    }

    #[test]
    fn test_url_to_cache_path_with_slashes() {
        let cache_root = PathBuf::from("/tmp/cache");
        let cache_path = url_to_cache_path(&cache_root, "https://example.com/r.git", "ver/1.21.4");
        assert!(cache_path.to_string_lossy().contains("ver-1.21.4"));
    }

    #[test]
    fn test_url_to_cache_path_different_urls() {
        let cache_root = PathBuf::from("/tmp/cache");
        let path1 = url_to_cache_path(&cache_root, "https://github.com/user1/repo.git", "main");
        let path2 = url_to_cache_path(&cache_root, "https://github.com/user2/repo.git", "main");
        assert_ne!(path1, path2);
    }

    #[test]
    fn test_url_to_cache_path_is_stable() {
        let cache_root = PathBuf::from("/c");
        assert_eq!(
            url_to_cache_path(&cache_root, "https://x/y.git", "r"),
            url_to_cache_path(&cache_root, "https://x/y.git", "r")
        );
    }

    #[test]
    fn test_parse_ls_remote() {
        let stdout = "1111111111111111111111111111111111111111\trefs/heads/main\n\
                      2222222222222222222222222222222222222222\trefs/heads/ver/1.21.4\n";
        assert_eq!(
            parse_ls_remote(stdout, "refs/heads/main").as_deref(),
            Some("1111111111111111111111111111111111111111")
        );
        assert_eq!(
            parse_ls_remote(stdout, "refs/heads/ver/1.21.4").as_deref(),
            Some("2222222222222222222222222222222222222222")
        );
        assert_eq!(parse_ls_remote(stdout, "refs/heads/dev"), None);
        assert_eq!(parse_ls_remote("", "refs/heads/main"), None);
    }

    #[test]
    fn test_partial_dir_is_sibling() {
        let partial = partial_dir(Path::new("/cache/abc-main"));
        assert_eq!(partial, PathBuf::from("/cache/abc-main.partial"));
    }

    #[test]
    fn test_explain_fetch_failure_auth() {
        let message = explain_fetch_failure("fatal: Could not read from remote repository.");
        assert!(message.contains("Authentication failed"));
    }

    #[test]
    fn test_explain_fetch_failure_missing_ref() {
        let message = explain_fetch_failure("fatal: couldn't find remote ref deadbeef");
        assert!(message.contains("Ref not found upstream"));
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=forkpatch", "-c", "user.email=forkpatch@example.com"])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_fetch_commitish_from_local_repository() {
        if !is_available() {
            return;
        }
        let temp = tempfile::TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        fs::create_dir_all(origin.join("paper-server")).unwrap();
        fs::write(origin.join("paper-server/build.gradle.kts"), "plugins {}\n").unwrap();
        git(&origin, &["init", "-q"]);
        git(&origin, &["add", "."]);
        git(&origin, &["commit", "-q", "-m", "upstream"]);
        git(&origin, &["tag", "v1"]);

        let target = temp.path().join("cache/checkout");
        fetch_commitish(&origin.to_string_lossy(), "v1", &target).unwrap();

        assert!(target.join("paper-server/build.gradle.kts").is_file());
        assert!(!partial_dir(&target).exists());
    }

    #[test]
    fn test_fetch_commitish_unknown_ref() {
        if !is_available() {
            return;
        }
        let temp = tempfile::TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        fs::create_dir_all(&origin).unwrap();
        fs::write(origin.join("README"), "x").unwrap();
        git(&origin, &["init", "-q"]);
        git(&origin, &["add", "."]);
        git(&origin, &["commit", "-q", "-m", "upstream"]);

        let target = temp.path().join("cache/checkout");
        let err = fetch_commitish(&origin.to_string_lossy(), "no-such-tag", &target).unwrap_err();

        assert_eq!(err.kind(), "UpstreamFetchError");
        assert!(!target.exists());
        assert!(!partial_dir(&target).exists());
    }

    #[test]
    #[cfg_attr(not(feature = "integration-tests"), ignore)]
    fn test_ls_remote_branch_network() {
        let head = ls_remote_branch("https://github.com/PaperMC/Paper.git", "main").unwrap();
        assert_eq!(head.map(|h| h.len()), Some(40));
    }
}
