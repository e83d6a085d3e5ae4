use std::path::PathBuf;

/// Failure submitting or confirming a contract-creation transaction.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("artifact '{0}' not found in registry")]
    ArtifactNotFound(String),

    #[error("bytecode for '{artifact}' still references unlinked libraries: {placeholders}")]
    UnlinkedBytecode {
        artifact: String,
        placeholders: String,
    },

    #[error("backend rejected deployment of '{artifact}': {reason}")]
    Rejected { artifact: String, reason: String },

    #[error("deployment of '{artifact}' timed out after {secs}s")]
    Timeout { artifact: String, secs: u64 },
}

/// Failure resolving a library placeholder in dependent bytecode.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("artifact '{0}' not found in registry")]
    ArtifactNotFound(String),

    #[error("library '{library}' has no deployment record; deploy it before linking into '{dependent}'")]
    LibraryNotDeployed { library: String, dependent: String },

    #[error("bytecode of '{dependent}' contains no placeholder for library '{library}'")]
    PlaceholderNotFound { library: String, dependent: String },

    #[error("'{0}' is not a valid 20-byte hex address")]
    InvalidAddress(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MigratorError {
    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("plan file not found at {0}")]
    PlanNotFound(PathBuf),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("artifact store error: {0}")]
    ArtifactStore(String),

    #[error("journal persistence failed: {0}")]
    Journal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, MigratorError>;
