//! Core crate for the build description inspector: data store, dependency
//! resolution and request dispatch.

pub mod config;
pub mod request;
pub mod resolver;
pub mod store;

pub use config::Config;
pub use request::{Inspector, Request, Response};
pub use resolver::{DuplicatePolicy, Resolver};
pub use store::{Build, DataStore, MatchMode, Task};

use std::path::PathBuf;
use thiserror::Error;

/// Common error type for the inspector core.
#[derive(Debug, Error)]
pub enum Error {
    /// A tasks, builds or config file does not exist.
    #[error("file '{}' not found", path.display())]
    SourceNotFound { path: PathBuf },

    /// Reading an existing file failed.
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be parsed or has the wrong shape.
    #[error("malformed data in '{origin}': {reason}")]
    MalformedSource { origin: String, reason: String },

    /// A required key is absent.
    #[error("missing key '{key}' in {context}")]
    MissingKey { key: String, context: String },

    /// The config file could not be parsed.
    #[error("invalid config '{}': {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("task '{0}' does not exist")]
    TaskNotFound(String),

    #[error("build '{0}' does not exist")]
    BuildNotFound(String),

    /// A task depends on itself, directly or transitively.
    #[error("dependency cycle detected: {}", chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },
}

impl Error {
    /// Whether the error belongs to a single query rather than to loading.
    ///
    /// Query errors leave the data store usable; load errors do not.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            Error::TaskNotFound(_) | Error::BuildNotFound(_) | Error::DependencyCycle { .. }
        )
    }
}

/// Convenient alias for results returned by the core crate.
pub type Result<T> = std::result::Result<T, Error>;
