use std::time::Duration;

use serde::Deserialize;

use coda_api::SortBy;

use crate::error::LoaderError;

pub const TOKEN_ENV: &str = "CODA_API_TOKEN";
pub const DOC_ID_ENV: &str = "CODA_DOC_ID";
pub const TABLE_ID_ENV: &str = "CODA_TABLE_ID";

pub const DEFAULT_BASE_URL: &str = "https://coda.io/apis/v1";
/// Upper bound of the rows endpoint page size.
pub const MAX_PAGE_SIZE: u32 = 500;

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}
fn default_progress_interval() -> Duration {
    Duration::from_secs(5)
}

// ═══════════════════════════════════════════════════════════════
//  Query filter
// ═══════════════════════════════════════════════════════════════

/// Фильтр строк основной таблицы.
///
/// `Raw` передаётся в `query` как есть. `AnyOf`: OR по значениям одной
/// колонки: один запрос на значение, результаты склеиваются по порядку.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QueryFilter {
    Raw(String),
    AnyOf { column: String, values: Vec<String> },
}

impl QueryFilter {
    /// Query strings to send, one request (series) each.
    pub fn queries(&self) -> Vec<String> {
        match self {
            QueryFilter::Raw(query) => vec![query.clone()],
            QueryFilter::AnyOf { column, values } => values
                .iter()
                .map(|v| format!("{column}:{}", serde_json::Value::String(v.clone())))
                .collect(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  LoaderOptions — caller input
// ═══════════════════════════════════════════════════════════════

/// Loader options as given by the caller (config file, CLI, code).
/// `token`, `doc_id` and `table_id` fall back to the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoaderOptions {
    pub token: Option<String>,
    pub doc_id: Option<String>,
    /// Table id or name.
    pub table_id: Option<String>,
    pub query: Option<QueryFilter>,
    pub sort_by: Option<SortBy>,
    /// Maximum number of rows per query.
    pub limit: Option<usize>,
    /// Strip the ```` ``` ```` wrapping from string values (default on).
    pub sanitize_strings: Option<bool>,
    /// 0 disables lookup expansion (default).
    pub max_lookup_depth: Option<u32>,
    pub base_url: Option<String>,
    pub page_size: Option<u32>,
    pub request_timeout_ms: Option<u64>,
    pub progress_interval_ms: Option<u64>,
    /// Deadline for expanding a single row; the row is kept unexpanded
    /// when it is exceeded.
    pub row_timeout_ms: Option<u64>,
}

impl LoaderOptions {
    /// Validate against the process environment.
    pub fn resolve(self) -> Result<LoaderSettings, LoaderError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Validate, looking up missing credentials with `env`.
    pub fn resolve_with(
        self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<LoaderSettings, LoaderError> {
        let token = required(self.token, "token", TOKEN_ENV, &env)?;
        let doc_id = required(self.doc_id, "doc_id", DOC_ID_ENV, &env)?;
        let table_id = required(self.table_id, "table_id", TABLE_ID_ENV, &env)?;

        Ok(LoaderSettings {
            token,
            doc_id,
            table_id,
            query: self.query,
            sort_by: self.sort_by,
            limit: self.limit,
            sanitize_strings: self.sanitize_strings.unwrap_or(true),
            max_lookup_depth: self.max_lookup_depth.unwrap_or(0),
            base_url: self
                .base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            page_size: self.page_size.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            request_timeout: self
                .request_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(default_request_timeout),
            progress_interval: self
                .progress_interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(default_progress_interval),
            row_timeout: self.row_timeout_ms.map(Duration::from_millis),
        })
    }
}

fn required(
    value: Option<String>,
    name: &str,
    var: &str,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<String, LoaderError> {
    value
        .filter(|v| !v.trim().is_empty())
        .or_else(|| env(var).filter(|v| !v.trim().is_empty()))
        .ok_or_else(|| LoaderError::Config(format!("missing {name} (set `{name}` or {var})")))
}

// ═══════════════════════════════════════════════════════════════
//  LoaderSettings — validated
// ═══════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct LoaderSettings {
    pub token: String,
    pub doc_id: String,
    pub table_id: String,
    pub query: Option<QueryFilter>,
    pub sort_by: Option<SortBy>,
    pub limit: Option<usize>,
    pub sanitize_strings: bool,
    pub max_lookup_depth: u32,
    pub base_url: String,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub progress_interval: Duration,
    pub row_timeout: Option<Duration>,
}

impl std::fmt::Debug for LoaderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderSettings")
            .field("token", &"***")
            .field("doc_id", &self.doc_id)
            .field("table_id", &self.table_id)
            .field("query", &self.query)
            .field("sort_by", &self.sort_by)
            .field("limit", &self.limit)
            .field("sanitize_strings", &self.sanitize_strings)
            .field("max_lookup_depth", &self.max_lookup_depth)
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("request_timeout", &self.request_timeout)
            .field("progress_interval", &self.progress_interval)
            .field("row_timeout", &self.row_timeout)
            .finish()
    }
}
