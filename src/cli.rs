//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use forkpatch::output::OutputConfig;

/// forkpatch - Build a fork from upstream sources plus patch files
#[derive(Parser, Debug)]
#[command(name = "forkpatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a build task, or `sync` to apply patches to upstream sources
    Run(commands::run::RunArgs),

    /// List available tasks by group
    Tasks(commands::tasks::TasksArgs),

    /// Show whether patched outputs still match the last sync
    Status(commands::status::StatusArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = self.output_config();

        match self.command {
            Commands::Run(args) => commands::run::execute(args, &output),
            Commands::Tasks(args) => commands::tasks::execute(args, &output),
            Commands::Status(args) => commands::status::execute(args, &output),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::new()
        .parse_filters(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_sync_flags() {
        let cli = Cli::try_parse_from([
            "forkpatch", "run", "sync", "--ref", "abc123", "--force", "--no-cache",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.task, "sync");
                assert_eq!(args.r#ref.as_deref(), Some("abc123"));
                assert!(args.force);
                assert!(args.no_cache);
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "forkpatch", "tasks", "--color", "never", "--log-level", "debug",
        ])
        .unwrap();
        assert_eq!(cli.color, "never");
        assert_eq!(cli.log_level, "debug");
        assert!(!cli.output_config().use_color);
    }

    #[test]
    fn test_run_requires_task() {
        assert!(Cli::try_parse_from(["forkpatch", "run"]).is_err());
    }
}
