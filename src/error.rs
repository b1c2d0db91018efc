use std::path::PathBuf;

/// Every failure a command can end with.
///
/// Errors are raised where they are detected and travel unchanged up to the
/// command boundary, where they are rendered as a single `[ERROR]` line.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    // Database errors
    #[error("Database {name:?} doesn't exist")]
    DatabaseNotFound { name: String },

    #[error("Database {name:?} already exists")]
    DatabaseAlreadyExists { name: String },

    #[error("Failed deleting database {name:?}: {source}")]
    DeleteDatabaseFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No database in use, run USE <database> first")]
    NoDatabaseInUse,

    // Table errors
    #[error("Table {name:?} doesn't exist")]
    TableNotFound { name: String },

    #[error("Table {name:?} already exists")]
    TableAlreadyExists { name: String },

    // Attribute and record errors
    #[error("Attribute {name:?} doesn't exist")]
    AttributeNotFound { name: String },

    #[error("Attribute {name:?} already exists")]
    DuplicateAttribute { name: String },

    #[error("Record with id {id} doesn't exist")]
    RecordNotFound { id: u64 },

    #[error("Primary key {name:?} cannot be altered")]
    PrimaryKeyAlteration { name: String },

    // Query errors
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("Invalid list: {reason}")]
    InvalidList { reason: String },

    #[error("Invalid value count: expected {expected} values but found {found}")]
    InvalidValue { expected: usize, found: usize },

    // Storage errors
    #[error("Corrupt row file {path:?}: {reason}")]
    CorruptRowFile { path: PathBuf, reason: String },

    #[error("Corrupt metadata {path:?}: {reason}")]
    CorruptMetadata { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed parsing metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl DbError {
    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_list(reason: impl Into<String>) -> Self {
        Self::InvalidList {
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = DbError> = std::result::Result<T, E>;
