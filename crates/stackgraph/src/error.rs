//! Error types for the stackgraph crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building, ordering or synthesizing graphs
#[derive(Error, Debug)]
pub enum Error {
    /// Resource, stack or output name is not a valid Terraform identifier
    #[error("invalid name '{0}': must start with a letter or '_' and contain only letters, digits, '_' or '-'")]
    InvalidName(String),

    /// Two resources of the same type share a name within a stack
    #[error("duplicate resource '{fqn}' in stack '{stack}'")]
    DuplicateResource { stack: String, fqn: String },

    /// Two stacks share a name within an app
    #[error("duplicate stack '{0}'")]
    DuplicateStack(String),

    /// A stack was looked up or depended on but is not part of the app
    #[error("unknown stack '{0}'")]
    UnknownStack(String),

    /// An explicit `depends_on` edge names a resource the stack does not have
    #[error("resource '{from}' in stack '{stack}' depends on unknown resource '{to}'")]
    UnknownDependency {
        stack: String,
        from: String,
        to: String,
    },

    /// An interpolation references a resource the stack does not have
    #[error("resource '{from}' in stack '{stack}' references unknown resource '{to}'")]
    DanglingReference {
        stack: String,
        from: String,
        to: String,
    },

    /// The dependency edges contain a cycle
    #[error("dependency cycle between: {}", .0.join(", "))]
    Cycle(Vec<String>),

    /// A typed resource or provider could not be turned into JSON
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO error
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest could not be read back
    #[error("invalid manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for stackgraph operations
pub type Result<T> = std::result::Result<T, Error>;
