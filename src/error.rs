use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not a git repository (run `codeatlas analyze` inside a cloned repository)")]
    NotARepository,

    #[error("no index found for this repository (run `codeatlas analyze` first)")]
    NoIndex,

    #[error("index is out of date (re-run `codeatlas analyze` to refresh it)")]
    StaleIndex,

    #[error("Language not supported: {0}")]
    UnsupportedLanguage(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("storage is locked by another process")]
    StorageLocked,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("analysis cancelled")]
    Cancelled,
}

impl AtlasError {
    /// Process exit code for the CLI: 1 for user-recoverable conditions,
    /// 2 for unexpected failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            AtlasError::NotARepository
            | AtlasError::NoIndex
            | AtlasError::StaleIndex
            | AtlasError::Cancelled => 1,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
