//! Task and build collections loaded from the two YAML documents.

use crate::{Error, Result};
use serde_yaml::Value;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// A named unit of work and the tasks it depends on.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct Task {
    pub name: String,
    pub dependencies: Vec<String>,
}

/// A named set of top-level tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct Build {
    pub name: String,
    pub tasks: Vec<String>,
}

/// How a user-supplied name is matched against stored names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// The stored name must equal the query.
    #[default]
    Exact,
    /// The first stored name containing the query wins, in file order.
    Substring,
}

/// Immutable view over every task and build.
#[derive(Debug, Clone, Default)]
pub struct DataStore {
    tasks: Vec<Task>,
    builds: Vec<Build>,
    task_index: HashMap<String, usize>,
    build_index: HashMap<String, usize>,
    match_mode: MatchMode,
}

impl DataStore {
    /// Build a store from records that were already parsed.
    ///
    /// When a name appears twice the first record is the one exact lookup returns.
    pub fn new(tasks: Vec<Task>, builds: Vec<Build>) -> Self {
        let task_index = index_by_name(tasks.iter().map(|t| t.name.as_str()), "task");
        let build_index = index_by_name(builds.iter().map(|b| b.name.as_str()), "build");
        Self {
            tasks,
            builds,
            task_index,
            build_index,
            match_mode: MatchMode::Exact,
        }
    }

    /// Read and parse the tasks and builds documents.
    pub fn load(tasks_path: impl AsRef<Path>, builds_path: impl AsRef<Path>) -> Result<Self> {
        let tasks_path = tasks_path.as_ref();
        let builds_path = builds_path.as_ref();

        let tasks_text = read_source(tasks_path)?;
        let builds_text = read_source(builds_path)?;
        let tasks = parse_tasks(&tasks_text, &tasks_path.display().to_string())?;
        let builds = parse_builds(&builds_text, &builds_path.display().to_string())?;

        tracing::debug!(
            tasks = tasks.len(),
            builds = builds.len(),
            "loaded build description"
        );
        Ok(Self::new(tasks, builds))
    }

    /// Parse both documents from in-memory YAML text.
    pub fn from_yaml_strs(tasks_yaml: &str, builds_yaml: &str) -> Result<Self> {
        let tasks = parse_tasks(tasks_yaml, "tasks")?;
        let builds = parse_builds(builds_yaml, "builds")?;
        Ok(Self::new(tasks, builds))
    }

    /// Switch how task and build names are looked up.
    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    /// The lookup policy in effect.
    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Task records in file order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Build records in file order.
    pub fn builds(&self) -> &[Build] {
        &self.builds
    }

    /// Task names in file order.
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name.clone()).collect()
    }

    /// Build names in file order.
    pub fn build_names(&self) -> Vec<String> {
        self.builds.iter().map(|b| b.name.clone()).collect()
    }

    /// Look up a task according to the match mode.
    pub fn find_task(&self, name: &str) -> Option<&Task> {
        match self.match_mode {
            MatchMode::Exact => self.task_index.get(name).map(|&i| &self.tasks[i]),
            MatchMode::Substring => self.tasks.iter().find(|t| t.name.contains(name)),
        }
    }

    /// Look up a build according to the match mode.
    pub fn find_build(&self, name: &str) -> Option<&Build> {
        match self.match_mode {
            MatchMode::Exact => self.build_index.get(name).map(|&i| &self.builds[i]),
            MatchMode::Substring => self.builds.iter().find(|b| b.name.contains(name)),
        }
    }
}

fn index_by_name<'a>(names: impl Iterator<Item = &'a str>, kind: &str) -> HashMap<String, usize> {
    let mut index = HashMap::new();
    for (position, name) in names.enumerate() {
        if index.contains_key(name) {
            tracing::warn!(kind, name, "duplicate name, keeping the first definition");
            continue;
        }
        index.insert(name.to_string(), position);
    }
    index
}

/// Read a whole file, separating "does not exist" from other I/O failures.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => Error::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn parse_tasks(text: &str, origin: &str) -> Result<Vec<Task>> {
    Ok(parse_collection(text, origin, "tasks", "task", "dependencies")?
        .into_iter()
        .map(|(name, dependencies)| Task { name, dependencies })
        .collect())
}

fn parse_builds(text: &str, origin: &str) -> Result<Vec<Build>> {
    Ok(parse_collection(text, origin, "builds", "build", "tasks")?
        .into_iter()
        .map(|(name, tasks)| Build { name, tasks })
        .collect())
}

/// Walk `{<collection>: [{name, <list_key>: [..]}, ..]}` into name/list pairs.
fn parse_collection(
    text: &str,
    origin: &str,
    collection: &str,
    kind: &str,
    list_key: &str,
) -> Result<Vec<(String, Vec<String>)>> {
    let malformed = |reason: String| Error::MalformedSource {
        origin: origin.to_string(),
        reason,
    };

    let document: Value = serde_yaml::from_str(text).map_err(|err| malformed(err.to_string()))?;
    match &document {
        Value::Mapping(_) => {}
        Value::Null => return Err(malformed("document is empty".into())),
        _ => return Err(malformed("expected a mapping at the top level".into())),
    }

    let records = document
        .get(collection)
        .ok_or_else(|| Error::MissingKey {
            key: collection.to_string(),
            context: format!("'{origin}'"),
        })?
        .as_sequence()
        .ok_or_else(|| malformed(format!("'{collection}' must be a sequence")))?;

    let mut parsed = Vec::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        let number = position + 1;
        if !record.is_mapping() {
            return Err(malformed(format!("{kind} #{number} is not a mapping")));
        }

        let name = record
            .get("name")
            .ok_or_else(|| Error::MissingKey {
                key: "name".into(),
                context: format!("{kind} #{number} of '{origin}'"),
            })?
            .as_str()
            .ok_or_else(|| malformed(format!("{kind} #{number} has a non-string name")))?;

        let items = record
            .get(list_key)
            .ok_or_else(|| Error::MissingKey {
                key: list_key.to_string(),
                context: format!("{kind} '{name}' of '{origin}'"),
            })?
            .as_sequence()
            .ok_or_else(|| malformed(format!("'{list_key}' of {kind} '{name}' must be a sequence")))?;

        let names = items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    malformed(format!("'{list_key}' of {kind} '{name}' must contain only strings"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        parsed.push((name.to_string(), names));
    }
    Ok(parsed)
}
