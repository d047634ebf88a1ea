//! # CLI Command Implementations
//!
//! One module per subcommand of the `forkpatch` tool. Each module has an
//! `Args` struct derived with `clap` and an `execute` function that loads what
//! it needs and calls into the `forkpatch` library.
//!
//! Commands that read the project share [`ProjectArgs`] and [`load_context`].

pub mod completions;
pub mod run;
pub mod status;
pub mod tasks;

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use forkpatch::config;
use forkpatch::defaults::{default_cache_root, CONFIG_FILE_NAME};
use forkpatch::suggestions;
use forkpatch::tasks::TaskContext;

/// Options locating the project and the upstream checkout cache
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Path to the forkpatch.yaml configuration file
    #[arg(short, long, value_name = "FILE", env = "FORKPATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory of the upstream checkout cache.
    ///
    /// Defaults to the system cache directory (`~/.cache/forkpatch` on Linux).
    #[arg(long, value_name = "DIR", env = "FORKPATCH_CACHE")]
    pub cache_root: Option<PathBuf>,
}

/// Load the configuration and build the task context.
///
/// The project root is the directory holding the configuration file.
pub fn load_context(args: &ProjectArgs) -> Result<TaskContext> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let config_path = match &args.config {
        Some(path) => cwd.join(path),
        None => cwd.join(CONFIG_FILE_NAME),
    };
    if !config_path.is_file() {
        return Err(suggestions::config_not_found(&config_path));
    }

    let config = config::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let root = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(cwd);
    let cache_root = args.cache_root.clone().unwrap_or_else(default_cache_root);

    log::debug!(
        "Project root {}, cache root {}",
        root.display(),
        cache_root.display()
    );
    Ok(TaskContext::new(root, config, cache_root))
}
