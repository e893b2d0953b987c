use coda_api::{ApiError, ErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("configuration: {0}")]
    Config(String),

    #[error("columns ({table}): {source}")]
    Columns { table: String, source: ApiError },

    #[error("rows ({table}): {source}")]
    Rows { table: String, source: ApiError },

    #[error("row ({table}/{row}): {source}")]
    Row { table: String, row: String, source: ApiError },

    #[error("serialize row {id}: {source}")]
    Serialize { id: String, source: serde_json::Error },

    #[error("validation: {0}")]
    Validation(ApiError),

    #[error("store ({id}): {source}")]
    Store { id: String, source: ApiError },
}

impl LoaderError {
    /// Taxonomy of the failure: `Config` for missing settings, `Upstream`
    /// and `Timeout` for source API failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoaderError::Config(_) => ErrorKind::Config,
            LoaderError::Columns { source, .. }
            | LoaderError::Rows { source, .. }
            | LoaderError::Row { source, .. }
            | LoaderError::Store { source, .. } => source.kind(),
            LoaderError::Serialize { .. } | LoaderError::Validation(_) => ErrorKind::Format,
        }
    }
}
