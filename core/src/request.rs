//! Request dispatch shared by every front end.

use crate::resolver::{DuplicatePolicy, Resolver};
use crate::store::DataStore;
use crate::Result;

/// One query against the loaded build description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListTasks,
    ListBuilds,
    GetTask(String),
    GetBuild(String),
}

/// Answer to a [`Request`], ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    TaskNames { names: Vec<String> },
    BuildNames { names: Vec<String> },
    Task { name: String, dependencies: Vec<String> },
    Build { name: String, tasks: Vec<String> },
}

/// Owns the data store and answers requests against it.
#[derive(Debug, Clone)]
pub struct Inspector {
    store: DataStore,
    duplicates: DuplicatePolicy,
}

impl Inspector {
    /// Inspector answering from `store`, keeping duplicate tasks.
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            duplicates: DuplicatePolicy::Keep,
        }
    }

    /// Select the duplicate policy used for build requests.
    pub fn with_duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// The loaded data store.
    pub fn store(&self) -> &DataStore {
        &self.store
    }

    /// Resolver configured with this inspector's duplicate policy.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.store).with_duplicates(self.duplicates)
    }

    /// Answer a single request. Lookup failures are returned, never fatal.
    pub fn handle(&self, request: &Request) -> Result<Response> {
        tracing::debug!(?request, "handling request");
        let resolver = self.resolver();
        let response = match request {
            Request::ListTasks => Response::TaskNames {
                names: resolver.list_task_names(),
            },
            Request::ListBuilds => Response::BuildNames {
                names: resolver.list_build_names(),
            },
            Request::GetTask(name) => Response::Task {
                name: name.clone(),
                dependencies: resolver.resolve_task_dependencies(name)?,
            },
            Request::GetBuild(name) => Response::Build {
                name: name.clone(),
                tasks: resolver.resolve_build_tasks(name)?,
            },
        };
        Ok(response)
    }
}
