//! Dependency resolution over a loaded [`DataStore`].

use crate::store::{DataStore, Task};
use crate::{Error, Result};
use std::collections::HashSet;

/// What happens to a task that is reached more than once during resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Append the task once per occurrence.
    #[default]
    Keep,
    /// Append only the first occurrence of each stored task; later ones are
    /// skipped entirely, whatever name they are referenced by.
    FirstOccurrence,
}

/// Work item of the depth-first walk.
enum Step<'a> {
    /// Look the task up and schedule its dependencies.
    Expand(&'a str),
    /// All dependencies are done; append the task.
    Emit { referenced: &'a str, stored: &'a str },
}

/// Computes dependency lists for tasks and builds.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    store: &'a DataStore,
    duplicates: DuplicatePolicy,
}

impl<'a> Resolver<'a> {
    /// Resolver over `store` that keeps every occurrence of a task.
    pub fn new(store: &'a DataStore) -> Self {
        Self {
            store,
            duplicates: DuplicatePolicy::Keep,
        }
    }

    /// Select what happens to tasks reached more than once.
    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Task names in file order.
    pub fn list_task_names(&self) -> Vec<String> {
        self.store.task_names()
    }

    /// Build names in file order.
    pub fn list_build_names(&self) -> Vec<String> {
        self.store.build_names()
    }

    /// Direct dependencies of a task, verbatim and in declaration order.
    pub fn resolve_task_dependencies(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.task(name)?.dependencies.clone())
    }

    /// Every task a build needs, each task preceded by its dependencies.
    ///
    /// Top-level tasks are walked in order and each one is expanded depth-first.
    /// Names are appended as they are referenced. A missing task anywhere in the
    /// graph fails the whole call, as does a task that is reached again while it
    /// is still being expanded.
    pub fn resolve_build_tasks(&self, name: &str) -> Result<Vec<String>> {
        let build = self
            .store
            .find_build(name)
            .ok_or_else(|| Error::BuildNotFound(name.to_string()))?;

        let mut stack: Vec<Step<'a>> = build
            .tasks
            .iter()
            .rev()
            .map(|task| Step::Expand(task.as_str()))
            .collect();
        let mut path: Vec<&'a str> = Vec::new();
        let mut expanding: HashSet<&'a str> = HashSet::new();
        let mut emitted: HashSet<&'a str> = HashSet::new();
        let mut resolved = Vec::new();

        while let Some(step) = stack.pop() {
            match step {
                Step::Expand(referenced) => {
                    let task = self.task(referenced)?;
                    let stored = task.name.as_str();
                    if self.duplicates == DuplicatePolicy::FirstOccurrence
                        && emitted.contains(stored)
                    {
                        continue;
                    }
                    if !expanding.insert(stored) {
                        return Err(cycle(&path, stored));
                    }
                    path.push(stored);
                    tracing::trace!(
                        task = referenced,
                        dependencies = task.dependencies.len(),
                        depth = path.len(),
                        "expanding"
                    );

                    stack.push(Step::Emit { referenced, stored });
                    stack.extend(
                        task.dependencies
                            .iter()
                            .rev()
                            .map(|dependency| Step::Expand(dependency.as_str())),
                    );
                }
                Step::Emit { referenced, stored } => {
                    path.pop();
                    expanding.remove(stored);
                    emitted.insert(stored);
                    resolved.push(referenced.to_string());
                }
            }
        }

        tracing::debug!(build = name, tasks = resolved.len(), "resolved build");
        Ok(resolved)
    }

    fn task(&self, name: &str) -> Result<&'a Task> {
        self.store
            .find_task(name)
            .ok_or_else(|| Error::TaskNotFound(name.to_string()))
    }
}

/// Cycle error running from the first occurrence of `repeated` on the path.
fn cycle(path: &[&str], repeated: &str) -> Error {
    let start = path.iter().position(|name| *name == repeated).unwrap_or(0);
    let mut chain: Vec<String> = path[start..].iter().map(|name| name.to_string()).collect();
    chain.push(repeated.to_string());
    Error::DependencyCycle { chain }
}
