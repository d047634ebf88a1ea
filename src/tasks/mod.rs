//! # Build Task Registry
//!
//! Named, grouped maintenance and diagnostic tasks invoked as
//! `forkpatch run <name>`. The registry is an ordinary value built once per
//! process (see [`builtin::registry`]); every task receives the loaded
//! configuration through a [`TaskContext`] and writes its report to the
//! supplied writer.

pub mod builtin;

use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::descriptors::PatchDescriptorStore;
use crate::error::{Error, Result};
use crate::project::ProjectGraph;

/// Everything a task may read
#[derive(Debug, Clone)]
pub struct TaskContext {
    /// Project root; relative configuration paths resolve against it.
    pub root: PathBuf,
    pub config: Config,
    /// Root of the upstream checkout cache.
    pub cache_root: PathBuf,
}

impl TaskContext {
    pub fn new(root: impl Into<PathBuf>, config: Config, cache_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config,
            cache_root: cache_root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_graph(&self) -> Result<ProjectGraph> {
        ProjectGraph::resolve(&self.root, &self.config.effective_modules())
    }

    pub fn descriptors(&self) -> Result<PatchDescriptorStore> {
        PatchDescriptorStore::from_config(&self.project_graph()?, &self.config.patches)
    }
}

/// Task body: reads the context, writes a report.
pub type TaskAction = Box<dyn Fn(&TaskContext, &mut dyn Write) -> Result<()>>;

/// A named unit of work
pub struct BuildTask {
    pub name: String,
    pub group: String,
    pub description: String,
    action: TaskAction,
}

impl BuildTask {
    pub fn new<F>(
        name: impl Into<String>,
        group: impl Into<String>,
        description: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: Fn(&TaskContext, &mut dyn Write) -> Result<()> + 'static,
    {
        Self {
            name: name.into(),
            group: group.into(),
            description: description.into(),
            action: Box::new(action),
        }
    }
}

impl fmt::Debug for BuildTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildTask")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Result of a successful invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub name: String,
    pub group: String,
    pub elapsed: Duration,
}

/// Tasks by name, in registration order
#[derive(Debug, Default)]
pub struct BuildTaskRegistry {
    tasks: Vec<BuildTask>,
    names: HashSet<String>,
}

impl BuildTaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task. Names are unique.
    pub fn register(&mut self, task: BuildTask) -> Result<()> {
        if !self.names.insert(task.name.clone()) {
            return Err(Error::Configuration {
                message: format!("task '{}' is already registered", task.name),
                hint: None,
            });
        }
        self.tasks.push(task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&BuildTask> {
        self.tasks.iter().find(|task| task.name == name)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &BuildTask> + '_ {
        self.tasks.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name.as_str()).collect()
    }

    /// Run the task registered as `name`.
    ///
    /// An unknown name fails with [`Error::UnknownTask`] before anything runs.
    pub fn invoke(&self, name: &str, ctx: &TaskContext, out: &mut dyn Write) -> Result<TaskOutcome> {
        let task = self.get(name).ok_or_else(|| Error::UnknownTask {
            name: name.to_string(),
        })?;

        log::debug!("Running task {} ({})", task.name, task.group);
        let started = Instant::now();
        (task.action)(ctx, out)?;
        out.flush()?;

        Ok(TaskOutcome {
            name: task.name.clone(),
            group: task.group.clone(),
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn context() -> TaskContext {
        let config = crate::config::parse("project: { name: leaf }\nupstream: { path: ../paper }\n")
            .unwrap();
        TaskContext::new("/tmp/leaf", config, "/tmp/cache")
    }

    fn counting_task(name: &str, counter: Rc<Cell<usize>>) -> BuildTask {
        BuildTask::new(name, "build optimization", "counts", move |_, out| {
            counter.set(counter.get() + 1);
            writeln!(out, "ran")?;
            Ok(())
        })
    }

    #[test]
    fn test_invoke_runs_action_once() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = BuildTaskRegistry::new();
        registry.register(counting_task("count", counter.clone())).unwrap();

        let mut out = Vec::new();
        let outcome = registry.invoke("count", &context(), &mut out).unwrap();

        assert_eq!(counter.get(), 1);
        assert_eq!(outcome.name, "count");
        assert_eq!(outcome.group, "build optimization");
        assert_eq!(String::from_utf8(out).unwrap(), "ran\n");
    }

    #[test]
    fn test_unknown_task_runs_nothing() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = BuildTaskRegistry::new();
        registry.register(counting_task("count", counter.clone())).unwrap();

        let mut out = Vec::new();
        let err = registry.invoke("missing", &context(), &mut out).unwrap_err();

        assert_eq!(err.kind(), "UnknownTaskError");
        assert!(err.to_string().contains("missing"));
        assert_eq!(counter.get(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = BuildTaskRegistry::new();
        registry.register(counting_task("count", counter.clone())).unwrap();

        let err = registry.register(counting_task("count", counter)).unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
        assert_eq!(registry.tasks().count(), 1);
    }

    #[test]
    fn test_tasks_in_registration_order() {
        let counter = Rc::new(Cell::new(0));
        let mut registry = BuildTaskRegistry::new();
        for name in ["b", "a", "c"] {
            registry.register(counting_task(name, counter.clone())).unwrap();
        }
        assert_eq!(registry.names(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_action_error_propagates() {
        let mut registry = BuildTaskRegistry::new();
        registry
            .register(BuildTask::new("fail", "help", "fails", |_, _| {
                Err(Error::config("broken"))
            }))
            .unwrap();

        let err = registry.invoke("fail", &context(), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_context_resolves_default_modules() {
        let graph = context().project_graph().unwrap();
        let names: Vec<_> = graph.modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["leaf-api", "leaf-server"]);
        assert!(context().descriptors().unwrap().is_empty());
    }
}
