//! # Tasks Command Implementation
//!
//! Lists every task `forkpatch run` accepts, grouped like Gradle's task list.
//! Does not read the configuration.

use anyhow::Result;
use clap::Args;

use forkpatch::error::Error;
use forkpatch::output::OutputConfig;
use forkpatch::tasks::builtin;

use super::run::SYNC_TASK;

/// List available tasks
#[derive(Args, Debug)]
pub struct TasksArgs {
    /// Only show tasks of this group
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,
}

/// Execute the `tasks` command.
pub fn execute(args: TasksArgs, output: &OutputConfig) -> Result<()> {
    let registry = builtin::registry()?;

    let mut groups: Vec<(&str, Vec<(&str, &str)>)> = vec![(
        "upstream",
        vec![(SYNC_TASK, "Apply the configured patches to upstream sources")],
    )];
    for task in registry.tasks() {
        let entry = (task.name.as_str(), task.description.as_str());
        match groups.iter_mut().find(|(group, _)| *group == task.group) {
            Some((_, tasks)) => tasks.push(entry),
            None => groups.push((task.group.as_str(), vec![entry])),
        }
    }

    let mut shown = 0;
    for (group, tasks) in &groups {
        if args.group.as_deref().is_some_and(|wanted| wanted != *group) {
            continue;
        }
        println!("{}", output.heading(&format!("{} tasks", group)));
        for (name, description) in tasks {
            println!("  {:<24} {}", name, description);
            shown += 1;
        }
        println!();
    }

    if shown == 0 {
        if let Some(group) = &args.group {
            return Err(Error::config(format!("no tasks in group '{}'", group)).into());
        }
    }
    Ok(())
}
