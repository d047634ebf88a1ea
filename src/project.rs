//! Project graph: the fixed set of modules that make up the fork.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ModuleConfig;
use crate::error::{Error, Result};

/// What a module is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleRole {
    Api,
    Server,
    TestPlugin,
}

impl fmt::Display for ModuleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleRole::Api => "api",
            ModuleRole::Server => "server",
            ModuleRole::TestPlugin => "test-plugin",
        };
        f.write_str(name)
    }
}

/// A resolved module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    /// Directory relative to the project root.
    pub directory: String,
    pub role: ModuleRole,
}

/// Modules of a project, anchored at the project root
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    root: PathBuf,
    modules: Vec<Module>,
}

impl ProjectGraph {
    /// Resolve module declarations against `root`.
    ///
    /// Fails with [`Error::DuplicateModule`] when two modules share a name.
    pub fn resolve(root: impl Into<PathBuf>, modules: &[ModuleConfig]) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(modules.len());

        for module in modules {
            if !seen.insert(module.name.as_str()) {
                return Err(Error::DuplicateModule {
                    name: module.name.clone(),
                });
            }
            let directory = module
                .path
                .clone()
                .unwrap_or_else(|| module.name.clone());
            if Path::new(&directory).is_absolute() {
                return Err(Error::config(format!(
                    "module '{}' directory must be relative to the project root: {}",
                    module.name, directory
                )));
            }
            resolved.push(Module {
                name: module.name.clone(),
                directory,
                role: module.role,
            });
        }

        Ok(Self {
            root: root.into(),
            modules: resolved,
        })
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Absolute directory of a module.
    pub fn module_dir(&self, module: &Module) -> PathBuf {
        self.root.join(&module.directory)
    }

    /// Module whose directory contains the project-relative `path`, if any.
    pub fn owner_of(&self, path: &str) -> Option<&Module> {
        let path = Path::new(path);
        self.modules
            .iter()
            .find(|m| path.starts_with(Path::new(&m.directory)))
    }

    /// Create any module directory that does not exist yet.
    ///
    /// Returns the directories that were created.
    pub fn ensure_directories(&self) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for module in &self.modules {
            let dir = self.module_dir(module);
            if dir.is_dir() {
                continue;
            }
            if dir.exists() {
                return Err(Error::Filesystem {
                    path: dir.display().to_string(),
                    message: format!("module '{}' path exists but is not a directory", module.name),
                });
            }
            fs::create_dir_all(&dir).map_err(|e| Error::at_path(&dir, e))?;
            log::debug!("created module directory {}", dir.display());
            created.push(dir);
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn module(name: &str, role: ModuleRole) -> ModuleConfig {
        ModuleConfig {
            name: name.to_string(),
            path: None,
            role,
        }
    }

    #[test]
    fn test_resolve_defaults_directory_to_name() {
        let graph = ProjectGraph::resolve(
            "/project",
            &[
                module("trlcore-finally-api", ModuleRole::Api),
                module("trlcore-finally-server", ModuleRole::Server),
            ],
        )
        .unwrap();

        assert_eq!(graph.modules().len(), 2);
        let api = &graph.modules()[0];
        assert_eq!(api.role, ModuleRole::Api);
        assert_eq!(api.directory, "trlcore-finally-api");
        assert_eq!(
            graph.module_dir(api),
            PathBuf::from("/project/trlcore-finally-api")
        );
        assert!(graph
            .modules()
            .iter()
            .all(|m| m.role != ModuleRole::TestPlugin));
    }

    #[test]
    fn test_resolve_rejects_duplicate_names() {
        let err = ProjectGraph::resolve(
            "/project",
            &[module("api", ModuleRole::Api), module("api", ModuleRole::Server)],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateModule { ref name } if name == "api"));
    }

    #[test]
    fn test_resolve_rejects_absolute_directory() {
        let mut m = module("api", ModuleRole::Api);
        m.path = Some("/abs/api".to_string());
        assert!(ProjectGraph::resolve("/project", &[m]).is_err());
    }

    #[test]
    fn test_owner_of() {
        let graph = ProjectGraph::resolve(
            "/project",
            &[module("trlcore-finally-server", ModuleRole::Server)],
        )
        .unwrap();
        assert_eq!(
            graph
                .owner_of("trlcore-finally-server/build.gradle.kts")
                .map(|m| m.name.as_str()),
            Some("trlcore-finally-server")
        );
        assert!(graph.owner_of("paper-api/src").is_none());
    }

    #[test]
    fn test_ensure_directories_creates_missing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("api")).unwrap();
        let graph = ProjectGraph::resolve(
            temp.path(),
            &[module("api", ModuleRole::Api), module("server", ModuleRole::Server)],
        )
        .unwrap();

        let created = graph.ensure_directories().unwrap();
        assert_eq!(created, vec![temp.path().join("server")]);
        assert!(temp.path().join("server").is_dir());

        // second call is a no-op
        assert!(graph.ensure_directories().unwrap().is_empty());
    }

    #[test]
    fn test_ensure_directories_rejects_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("api"), "not a dir").unwrap();
        let graph = ProjectGraph::resolve(temp.path(), &[module("api", ModuleRole::Api)]).unwrap();
        assert!(graph.ensure_directories().is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(ModuleRole::TestPlugin.to_string(), "test-plugin");
    }
}
