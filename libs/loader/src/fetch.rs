use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use coda_api::{ApiError, Column, Row, RowsRequest, SortBy, SourceApi};

// ═══════════════════════════════════════════════════════════════
//  TableFetcher
// ═══════════════════════════════════════════════════════════════

/// Paginated reads from the source API.
///
/// Каждый запрос страницы ограничен `timeout` и учитывается в счётчике
/// запросов (для progress-логов и сводки загрузки).
pub struct TableFetcher {
    api: Arc<dyn SourceApi>,
    page_size: u32,
    timeout: Duration,
    requests: AtomicU64,
}

impl TableFetcher {
    pub fn new(api: Arc<dyn SourceApi>, page_size: u32, timeout: Duration) -> Self {
        Self { api, page_size, timeout, requests: AtomicU64::new(0) }
    }

    /// Page requests issued so far.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Every row of `table`, keyed by row id.
    pub async fn fetch_table(&self, table: &str) -> Result<HashMap<String, Row>, ApiError> {
        let mut rows = HashMap::new();
        let mut request = RowsRequest { limit: Some(self.page_size), ..Default::default() };
        let mut seen_tokens = HashSet::new();
        loop {
            let page = self.call(self.api.list_rows(table, &request)).await?;
            rows.extend(page.items.into_iter().map(|row| (row.id.clone(), row)));
            match next_token(page.next_page_token, &mut seen_tokens) {
                Some(token) => request.page_token = Some(token),
                None => break,
            }
        }
        debug!(table, rows = rows.len(), "table fetched");
        Ok(rows)
    }

    /// Rows of `table` in API order, following pages until exhausted or
    /// `limit` rows are collected.
    pub async fn fetch_rows(
        &self,
        table: &str,
        query: Option<&str>,
        sort_by: Option<SortBy>,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, ApiError> {
        let mut rows = Vec::new();
        if limit == Some(0) {
            return Ok(rows);
        }
        let mut request = RowsRequest {
            query: query.map(str::to_owned),
            sort_by,
            limit: Some(self.page_size_for(limit)),
            page_token: None,
        };
        let mut seen_tokens = HashSet::new();
        loop {
            let page = self.call(self.api.list_rows(table, &request)).await?;
            rows.extend(page.items);
            if let Some(limit) = limit {
                if rows.len() >= limit {
                    rows.truncate(limit);
                    break;
                }
                request.limit = Some(self.page_size_for(Some(limit - rows.len())));
            }
            match next_token(page.next_page_token, &mut seen_tokens) {
                Some(token) => request.page_token = Some(token),
                None => break,
            }
        }
        debug!(table, query, rows = rows.len(), "rows fetched");
        Ok(rows)
    }

    /// Column metadata of `table`, all pages.
    pub async fn fetch_columns(&self, table: &str) -> Result<Vec<Column>, ApiError> {
        let mut columns = Vec::new();
        let mut token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        loop {
            let page = self.call(self.api.list_columns(table, token.as_deref())).await?;
            columns.extend(page.items);
            match next_token(page.next_page_token, &mut seen_tokens) {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(columns)
    }

    /// One row by id (single-row endpoint).
    pub async fn fetch_row(&self, table: &str, row_id: &str) -> Result<Row, ApiError> {
        self.call(self.api.get_row(table, row_id)).await
    }

    fn page_size_for(&self, remaining: Option<usize>) -> u32 {
        match remaining {
            Some(n) => u32::try_from(n).unwrap_or(u32::MAX).clamp(1, self.page_size),
            None => self.page_size,
        }
    }

    async fn call<T>(
        &self,
        request: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<T, ApiError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::timeout(format!(
                "no response within {} ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

/// Continuation token, unless absent, empty or already seen (a repeating
/// token would page forever).
fn next_token(token: Option<String>, seen: &mut HashSet<String>) -> Option<String> {
    let token = token.filter(|t| !t.is_empty())?;
    seen.insert(token.clone()).then_some(token)
}
