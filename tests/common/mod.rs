//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::LOCAL_UPSTREAM);
//!     fixture.command().args(["run", "show-build-info"]).assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::git_available;
    pub use super::TestFixture;
}

/// Configuration snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// Local upstream under `upstream/`, one file patch and one dir patch.
    pub const LOCAL_UPSTREAM: &str = r#"
project:
  name: trlcore-finally
  version: 1.21.4-R0.1-SNAPSHOT
upstream:
  name: paper
  path: upstream
  ref: abc123
patches:
  - file:
      path: paper-server/build.gradle.kts
      output: trlcore-finally-server/build.gradle.kts
      patch: trlcore-finally-server/build.gradle.kts.patch
  - dir:
      name: paperApi
      upstream_path: paper-api
      excludes: [build.gradle.kts]
      patches_dir: trlcore-finally-api/paper-patches
      output_dir: paper-api
repositories:
  - name: papermc
    url: https://repo.papermc.io/repository/maven-public/
publish:
  name: trlcore-finally
  url: https://maven.leafmc.one/snapshots/
"#;

    /// Same as [`LOCAL_UPSTREAM`] without a pinned ref.
    pub const NO_REF: &str = r#"
project: { name: trlcore-finally }
upstream: { name: paper, path: upstream }
patches:
  - file:
      path: paper-server/build.gradle.kts
      output: trlcore-finally-server/build.gradle.kts
      patch: trlcore-finally-server/build.gradle.kts.patch
"#;

    /// A dir patch whose output directory holds its own patch files.
    pub const OUTPUT_OVER_PATCHES: &str = r#"
project: { name: trlcore-finally }
upstream: { name: paper, path: upstream, ref: abc123 }
patches:
  - dir:
      upstream_path: paper-api
      patches_dir: trlcore-finally-api/paper-patches
      output_dir: trlcore-finally-api
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "project: [unclosed";

    pub const SERVER_BUILD: &str = "plugins {\n    java\n}\n";

    /// Unified diff against `paper-server/build.gradle.kts`.
    pub const SERVER_BUILD_PATCH: &str = "\
diff --git a/paper-server/build.gradle.kts b/paper-server/build.gradle.kts
--- a/paper-server/build.gradle.kts
+++ b/paper-server/build.gradle.kts
@@ -1,3 +1,4 @@
 plugins {
     java
+    id(\"io.papermc.paperweight.core\")
 }
";

    pub const API_SOURCE: &str = "package org.bukkit;\npublic class Bukkit {\n}\n";

    /// Unified diff against `src/main/java/org/bukkit/Bukkit.java`, relative
    /// to the `paper-api` directory.
    pub const API_PATCH: &str = "\
diff --git a/src/main/java/org/bukkit/Bukkit.java b/src/main/java/org/bukkit/Bukkit.java
--- a/src/main/java/org/bukkit/Bukkit.java
+++ b/src/main/java/org/bukkit/Bukkit.java
@@ -1,3 +1,4 @@
 package org.bukkit;
 public class Bukkit {
+    public static final String FORK = \"trlcore-finally\";
 }
";

    /// A diff whose context does not exist in `Bukkit.java`.
    pub const CONFLICTING_API_PATCH: &str = "\
diff --git a/src/main/java/org/bukkit/Bukkit.java b/src/main/java/org/bukkit/Bukkit.java
--- a/src/main/java/org/bukkit/Bukkit.java
+++ b/src/main/java/org/bukkit/Bukkit.java
@@ -1,3 +1,3 @@
 package org.spigotmc;
-public interface Server {
+public interface ForkServer {
 }
";
}

/// Whether a usable `git` binary is on PATH.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A temporary project directory with optional config and files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `forkpatch.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child("forkpatch.yaml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Local upstream tree under `upstream/` plus matching patch files.
    pub fn with_paper_upstream(self) -> Self {
        self.with_file("upstream/paper-server/build.gradle.kts", configs::SERVER_BUILD)
            .with_file("upstream/paper-api/build.gradle.kts", "// upstream api build\n")
            .with_file(
                "upstream/paper-api/src/main/java/org/bukkit/Bukkit.java",
                configs::API_SOURCE,
            )
            .with_file(
                "trlcore-finally-server/build.gradle.kts.patch",
                configs::SERVER_BUILD_PATCH,
            )
            .with_file(
                "trlcore-finally-api/paper-patches/0001-Add-fork-constant.patch",
                configs::API_PATCH,
            )
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("forkpatch.yaml")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Command running in this fixture's directory, without colour.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("forkpatch");
        cmd.current_dir(self.path())
            .env_remove("FORKPATCH_CONFIG")
            .env_remove("FORKPATCH_REF")
            .env("FORKPATCH_CACHE", self.path().join(".cache"))
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
