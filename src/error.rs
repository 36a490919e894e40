use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Everything the catalog, storage and dispatch layers can fail with. The
/// dispatcher renders these as `Error:` or `Action required:` strings; none
/// of them cross the shell boundary as a panic.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("table '{0}' is disabled; enable it first")]
    TableDisabled(String),

    #[error("table '{0}' is enabled; disable it before destructive operations")]
    TableEnabled(String),

    #[error("column family '{0}' not found")]
    FamilyNotFound(String),

    #[error("column family '{0}' already exists")]
    FamilyExists(String),

    #[error("cannot remove column family '{0}': it is the last one")]
    LastFamily(String),

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("row '{0}' not found")]
    RowNotFound(String),

    #[error("no value at timestamp {timestamp} in '{qualifier}'")]
    VersionNotFound { qualifier: String, timestamp: i64 },

    #[error("the required flag '-{0}' is missing")]
    MissingFlag(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("invalid {what}: '{value}'")]
    InvalidArgument { what: &'static str, value: String },

    #[error("snapshot {path}: {reason}")]
    BadSnapshot { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("bulk input is not valid JSON: {0}")]
    BulkInput(#[from] serde_json::Error),
}

impl StoreError {
    /// Lifecycle preconditions render as `Action required:`; everything else
    /// is a plain `Error:`.
    pub fn is_action_required(&self) -> bool {
        matches!(
            self,
            StoreError::TableEnabled(_) | StoreError::TableDisabled(_)
        )
    }
}
