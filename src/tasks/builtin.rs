//! Tasks every forkpatch project gets.

use std::fs::{self, File};
use std::io::{BufWriter, Write};

use chrono::Utc;

use crate::defaults::STATE_DIR_NAME;
use crate::error::{Error, Result};
use crate::filesystem::remove_path;
use crate::git;
use crate::path::normalize_rel_path;
use crate::publish::RemoteRepositoryConfig;
use crate::sync::state::{state_path, SyncState};
use crate::tasks::{BuildTask, BuildTaskRegistry, TaskContext};
use crate::upstream::{GitUpstream, UpstreamRef};

pub const GROUP_BUILD: &str = "build optimization";
pub const GROUP_HELP: &str = "help";
pub const GROUP_PUBLISHING: &str = "publishing";

/// Registry holding every built-in task.
pub fn registry() -> Result<BuildTaskRegistry> {
    let mut registry = BuildTaskRegistry::new();
    registry.register(BuildTask::new(
        "clean-build-cache",
        GROUP_BUILD,
        "Delete the configured build cache directories",
        clean_build_cache,
    ))?;
    registry.register(BuildTask::new(
        "show-build-info",
        GROUP_BUILD,
        "Show tool, platform and build settings",
        show_build_info,
    ))?;
    registry.register(BuildTask::new(
        "list-dependencies",
        GROUP_BUILD,
        "List modules, the upstream source and artifact repositories",
        list_dependencies,
    ))?;
    registry.register(BuildTask::new(
        "check-upstream-updates",
        GROUP_BUILD,
        "Compare the pinned upstream ref with the upstream branch head",
        check_upstream_updates,
    ))?;
    registry.register(BuildTask::new(
        "build-report",
        GROUP_BUILD,
        "Write a build report file",
        build_report,
    ))?;
    registry.register(BuildTask::new(
        "inspect-upstream",
        GROUP_HELP,
        "Print the upstream configuration and every patch descriptor",
        inspect_upstream,
    ))?;
    registry.register(BuildTask::new(
        "show-publish-config",
        GROUP_PUBLISHING,
        "Show the publish endpoint and whether credentials are set",
        show_publish_config,
    ))?;
    Ok(registry)
}

fn clean_build_cache(ctx: &TaskContext, out: &mut dyn Write) -> Result<()> {
    let mut removed = 0;
    for dir in &ctx.config.build.cache_dirs {
        let rel = normalize_rel_path(dir)?;
        let path = ctx.root.join(&rel);
        if path.exists() {
            remove_path(&path)?;
            log::info!("Deleted {}", path.display());
            writeln!(out, "Deleted {}", rel)?;
            removed += 1;
        } else {
            writeln!(out, "Not present {}", rel)?;
        }
    }
    writeln!(out, "Build cache cleaned ({} removed)", removed)?;
    Ok(())
}

fn show_build_info(ctx: &TaskContext, out: &mut dyn Write) -> Result<()> {
    let build = &ctx.config.build;
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    writeln!(out, "forkpatch:        {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "OS:               {}", std::env::consts::OS)?;
    writeln!(out, "Architecture:     {}", std::env::consts::ARCH)?;
    writeln!(out, "Processors:       {}", cpus)?;
    writeln!(out, "Project:          {}", ctx.config.project.name)?;
    writeln!(
        out,
        "Version:          {}",
        ctx.config.project.version.as_deref().unwrap_or("unspecified")
    )?;
    writeln!(out, "Java release:     {}", build.java_release)?;
    writeln!(out, "Encoding:         {}", build.encoding)?;
    writeln!(out, "Compiler args:    {}", build.compiler_args.join(" "))?;
    writeln!(out, "Reproducible:     {}", build.reproducible_archives)?;
    Ok(())
}

fn list_dependencies(ctx: &TaskContext, out: &mut dyn Write) -> Result<()> {
    let graph = ctx.project_graph()?;

    writeln!(out, "Modules:")?;
    for module in graph.modules() {
        writeln!(out, "  {} ({}) at {}", module.name, module.role, module.directory)?;
    }

    writeln!(out, "Upstream:")?;
    writeln!(
        out,
        "  {} {}{}",
        ctx.config.upstream.name,
        ctx.config.upstream_location(),
        ctx.config
            .upstream
            .r#ref
            .as_deref()
            .map(|r| format!(" @ {}", r))
            .unwrap_or_default()
    )?;

    writeln!(out, "Repositories:")?;
    if ctx.config.repositories.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for repo in &ctx.config.repositories {
        writeln!(out, "  {} {}", repo.name, repo.url)?;
    }
    Ok(())
}

fn check_upstream_updates(ctx: &TaskContext, out: &mut dyn Write) -> Result<()> {
    let upstream = &ctx.config.upstream;
    let Some(url) = &upstream.url else {
        writeln!(
            out,
            "Upstream {} is a local directory; nothing to check",
            ctx.config.upstream_location()
        )?;
        return Ok(());
    };

    let head = git::ls_remote_branch(url, &upstream.branch)?.ok_or_else(|| Error::GitCommand {
        command: format!("ls-remote {}", url),
        stderr: format!("branch '{}' not found", upstream.branch),
    })?;
    writeln!(out, "Upstream {} {} is at {}", upstream.name, upstream.branch, head)?;

    match upstream.r#ref.as_deref() {
        None => writeln!(out, "No ref pinned in the configuration")?,
        Some(pinned) if same_commit(pinned, &head) => {
            writeln!(out, "Pinned ref {} is up to date", pinned)?
        }
        Some(pinned) => writeln!(
            out,
            "Update available: pinned {} differs from {} head {}",
            pinned, upstream.branch, head
        )?,
    }
    Ok(())
}

/// Abbreviated ids match their full form.
fn same_commit(pinned: &str, head: &str) -> bool {
    (pinned.len() >= 7 && head.starts_with(pinned)) || pinned == head
}

fn build_report(ctx: &TaskContext, out: &mut dyn Write) -> Result<()> {
    let rel = normalize_rel_path(&ctx.config.build.report_path)?;
    let path = ctx.root.join(&rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::at_path(parent, e))?;
    }

    let graph = ctx.project_graph()?;
    let descriptors = ctx.descriptors()?;
    let state = SyncState::load(&state_path(&ctx.root.join(STATE_DIR_NAME)))?;

    let file = File::create(&path).map_err(|e| Error::at_path(&path, e))?;
    let mut report = BufWriter::new(file);
    writeln!(report, "Build Report")?;
    writeln!(report, "============")?;
    writeln!(report, "Generated: {}", Utc::now().to_rfc3339())?;
    writeln!(report, "Project: {}", ctx.config.project.name)?;
    writeln!(
        report,
        "Version: {}",
        ctx.config.project.version.as_deref().unwrap_or("unspecified")
    )?;
    writeln!(report, "Modules: {}", graph.modules().len())?;
    for module in graph.modules() {
        writeln!(report, "  - {} ({})", module.name, module.role)?;
    }
    writeln!(report, "Upstream: {}", ctx.config.upstream_location())?;
    writeln!(report, "Patch descriptors: {}", descriptors.len())?;
    match &state {
        Some(state) => {
            writeln!(report, "Last sync fingerprint: {}", state.fingerprint)?;
            for (output, status) in state.verify(&ctx.root)? {
                writeln!(report, "  {} {}", output, status)?;
            }
        }
        None => writeln!(report, "Last sync: never")?,
    }
    report.flush().map_err(|e| Error::at_path(&path, e))?;
    drop(report);

    writeln!(out, "Build report written to {}", rel)?;
    Ok(())
}

fn inspect_upstream(ctx: &TaskContext, out: &mut dyn Write) -> Result<()> {
    let upstream = &ctx.config.upstream;
    writeln!(out, "Upstream:")?;
    writeln!(out, "  name:     {}", upstream.name)?;
    writeln!(out, "  location: {}", ctx.config.upstream_location())?;
    writeln!(out, "  branch:   {}", upstream.branch)?;
    writeln!(out, "  ref:      {}", upstream.r#ref.as_deref().unwrap_or("(unset)"))?;

    if let (Some(url), Some(r)) = (&upstream.url, &upstream.r#ref) {
        let git = GitUpstream::new(url.clone(), &ctx.cache_root);
        let r = UpstreamRef::new(r.clone())?;
        if r.is_commit_id() {
            let cache = git.cache_path(r.as_str());
            writeln!(out, "  cache:    {}", cache.display())?;
            writeln!(out, "  cached:   {}", cache.is_dir())?;
        } else {
            writeln!(out, "  cache:    keyed by the commit {} resolves to at sync time", r)?;
        }
    }

    let descriptors = ctx.descriptors()?;
    writeln!(out, "Descriptors ({}):", descriptors.len())?;
    for (index, descriptor) in descriptors.all_descriptors().enumerate() {
        writeln!(out, "  {}. {}", index + 1, descriptor)?;
        if !descriptor.excludes().is_empty() {
            let excludes: Vec<&str> = descriptor.excludes().iter().map(String::as_str).collect();
            writeln!(out, "     excludes: {}", excludes.join(", "))?;
        }
    }

    match SyncState::load(&state_path(&ctx.root.join(STATE_DIR_NAME)))? {
        Some(state) => {
            writeln!(out, "Last sync: {}", state.fingerprint)?;
        }
        None => writeln!(out, "Last sync: never")?,
    }
    Ok(())
}

fn show_publish_config(ctx: &TaskContext, out: &mut dyn Write) -> Result<()> {
    let Some(section) = &ctx.config.publish else {
        writeln!(out, "No publish repository configured")?;
        return Ok(());
    };

    let repo = RemoteRepositoryConfig::from_section(section)?;
    let credentials = repo.resolve_credentials();
    let presence = |value: &str| if value.is_empty() { "not set" } else { "set" };

    writeln!(out, "Repository: {}", repo.name)?;
    writeln!(out, "URL:        {}", repo.url)?;
    writeln!(
        out,
        "Username:   ${} ({})",
        repo.username_env,
        presence(&credentials.username)
    )?;
    writeln!(
        out,
        "Password:   ${} ({})",
        repo.password_env,
        presence(&credentials.password)
    )?;
    if !credentials.is_complete() {
        writeln!(out, "Publishing needs both variables set")?;
    }
    Ok(())
}
