//! # Status Command Implementation
//!
//! Read-only report on the last sync: whether the inputs (ref, upstream,
//! descriptors, patch files) still produce the recorded fingerprint, and
//! whether each recorded output is unchanged on disk.
//!
//! Exits with an error when the project has never been synced or when any
//! output is out of date, so it can gate a build.

use anyhow::Result;
use clap::Args;

use forkpatch::defaults::STATE_DIR_NAME;
use forkpatch::error::Error;
use forkpatch::output::{Marker, OutputConfig};
use forkpatch::sync::state::{fingerprint, state_path, OutputStatus, SyncState};
use forkpatch::upstream;

use super::run::resolve_ref;
use super::{load_context, ProjectArgs};

/// Show whether patched outputs match the last sync
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Upstream ref to compare against
    #[arg(long = "ref", value_name = "COMMIT", env = "FORKPATCH_REF")]
    pub r#ref: Option<String>,
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, output: &OutputConfig) -> Result<()> {
    let ctx = load_context(&args.project)?;
    let path = state_path(&ctx.root.join(STATE_DIR_NAME));

    let Some(state) = SyncState::load(&path)? else {
        return Err(Error::Configuration {
            message: "project has never been synced".to_string(),
            hint: Some("Run 'forkpatch run sync'".to_string()),
        }
        .into());
    };

    let r#ref = resolve_ref(args.r#ref.as_deref(), &ctx.config)?;
    let upstream = upstream::from_config(&ctx.config, &ctx.root, &ctx.cache_root, false)?;
    let store = ctx.descriptors()?;
    let descriptors: Vec<_> = store.all_descriptors().collect();
    let revision = upstream.resolve(&r#ref)?;
    let current = fingerprint(
        &r#ref,
        &revision,
        &upstream.identity(),
        &descriptors,
        &ctx.root,
    )?;
    let inputs_match = current == state.fingerprint;

    println!("{}", output.heading("Sync status"));
    println!("  ref:    {}", r#ref);
    println!(
        "  inputs: {}",
        if inputs_match { "unchanged" } else { "changed since last sync" }
    );

    let mut stale = 0;
    for (output_path, status) in state.verify(&ctx.root)? {
        if status != OutputStatus::Clean {
            stale += 1;
        }
        println!("  {:<9} {}", status, output_path);
    }

    if inputs_match && stale == 0 {
        println!("{} Up to date", output.marker(Marker::UpToDate));
        return Ok(());
    }

    println!("{} Run 'forkpatch run sync' to rebuild", output.marker(Marker::Warning));
    Err(Error::StaleOutputs {
        stale,
        inputs_changed: !inputs_match,
    }
    .into())
}
