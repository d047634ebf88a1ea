//! # Run Command Implementation
//!
//! `forkpatch run <task>` invokes a registered build task. The name `sync` is
//! reserved for applying the configured patches to the upstream sources:
//!
//! 1. Resolve the upstream ref (`--ref`, `FORKPATCH_REF`, then `upstream.ref`).
//! 2. Resolve modules and create missing module directories.
//! 3. Build the patch descriptors from the configuration.
//! 4. Sync, printing whether outputs were rebuilt or already up to date.

use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::{Duration, Instant};

use forkpatch::config::Config;
use forkpatch::descriptors::PatchDescriptorStore;
use forkpatch::error::Error;
use forkpatch::output::{Marker, OutputConfig};
use forkpatch::patch::GitApply;
use forkpatch::suggestions;
use forkpatch::sync::{SyncStatus, UpstreamSync};
use forkpatch::tasks::{builtin, TaskContext};
use forkpatch::upstream::{self, UpstreamRef};

use super::{load_context, ProjectArgs};

/// Task name handled by the sync engine rather than the registry.
pub const SYNC_TASK: &str = "sync";

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task to run (`sync`, or see `forkpatch tasks`)
    #[arg(value_name = "TASK")]
    pub task: String,

    #[command(flatten)]
    pub project: ProjectArgs,

    /// Upstream commit, tag or branch to sync against (sync only)
    #[arg(long = "ref", value_name = "COMMIT", env = "FORKPATCH_REF")]
    pub r#ref: Option<String>,

    /// Rebuild outputs even if they are up to date (sync only)
    #[arg(short, long)]
    pub force: bool,

    /// Fetch upstream again instead of using the checkout cache (sync only)
    #[arg(long)]
    pub no_cache: bool,
}

/// Execute the run command
pub fn execute(args: RunArgs, output: &OutputConfig) -> Result<()> {
    if args.task == SYNC_TASK {
        let ctx = load_context(&args.project)?;
        return run_sync(&ctx, &args, output);
    }

    let registry = builtin::registry()?;
    if registry.get(&args.task).is_none() {
        return Err(suggestions::unknown_task(&args.task, &registry.names()));
    }
    if args.force || args.no_cache {
        log::warn!("--force and --no-cache only apply to '{}'", SYNC_TASK);
    }
    let ctx = load_context(&args.project)?;

    println!("{} {}", output.marker(Marker::Task), output.heading(&args.task));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let outcome = registry.invoke(&args.task, &ctx, &mut out)?;
    log::debug!("{} finished in {:.2}s", outcome.name, outcome.elapsed.as_secs_f64());
    Ok(())
}

/// Pick the ref from the command line or environment, else the configuration.
pub fn resolve_ref(cli_ref: Option<&str>, config: &Config) -> Result<UpstreamRef> {
    let identifier = cli_ref
        .or(config.upstream.r#ref.as_deref())
        .ok_or_else(suggestions::missing_ref)?;
    Ok(UpstreamRef::new(identifier)?)
}

fn run_sync(ctx: &TaskContext, args: &RunArgs, output: &OutputConfig) -> Result<()> {
    let start_time = Instant::now();
    let r#ref = resolve_ref(args.r#ref.as_deref(), &ctx.config)?;

    let graph = ctx.project_graph()?;
    for dir in graph.ensure_directories()? {
        log::info!("Created module directory {}", dir.display());
    }
    let store = PatchDescriptorStore::from_config(&graph, &ctx.config.patches)?;
    let upstream = upstream::from_config(&ctx.config, &ctx.root, &ctx.cache_root, args.no_cache)?;
    let applier = GitApply;

    println!(
        "{} Syncing {} descriptors from {} at {}",
        output.marker(Marker::Sync),
        store.len(),
        ctx.config.upstream.name,
        r#ref
    );

    let spinner = spinner(output, format!("Syncing {}", ctx.config.upstream_location()));
    let result = UpstreamSync::new(&ctx.root, &*upstream, &applier)
        .force(args.force)
        .sync(&r#ref, store.all_descriptors());
    spinner.finish_and_clear();

    let tree = result.map_err(|err| match err {
        err @ Error::PatchConflict { .. } => suggestions::patch_conflict(err),
        other => anyhow::Error::new(other),
    })?;

    match tree.status {
        SyncStatus::UpToDate => println!(
            "{} Outputs already match {} at {}",
            output.marker(Marker::UpToDate),
            ctx.config.upstream.name,
            r#ref
        ),
        SyncStatus::Applied => {
            println!(
                "{} Synced in {:.2}s",
                output.marker(Marker::Success),
                start_time.elapsed().as_secs_f64()
            );
            println!(
                "   {} outputs, {} patches applied",
                tree.outputs.len(),
                tree.patches_applied
            );
            for path in &tree.outputs {
                println!("   {}", path);
            }
        }
    }
    Ok(())
}

fn spinner(output: &OutputConfig, message: String) -> ProgressBar {
    if !output.use_color {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg} ({elapsed})") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
