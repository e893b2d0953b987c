use coda_api::ApiError;
use coda_loader::LoaderError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error("{0}")]
    Loader(#[from] LoaderError),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("write {path}: {source}")]
    Write { path: String, source: std::io::Error },
}
