use std::future::Future;
use std::pin::Pin;

use crate::error::ApiError;
use crate::types::{Column, Page, Row, RowsRequest};

// ════════════════════════════════════════════════════════════════
//  Source API
// ════════════════════════════════════════════════════════════════

/// Access to one Coda document. Implementations are bound to a doc id
/// and credentials; `table` is a table id or name.
///
/// Реализации: HTTP client (source-http), in-memory fake для тестов.
pub trait SourceApi: Send + Sync {
    /// `GET /docs/{docId}/tables/{table}/columns`, one page.
    fn list_columns<'a>(
        &'a self,
        table: &'a str,
        page_token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Page<Column>, ApiError>> + Send + 'a>>;

    /// `GET /docs/{docId}/tables/{table}/rows?valueFormat=rich`, one page.
    fn list_rows<'a>(
        &'a self,
        table: &'a str,
        request: &'a RowsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Page<Row>, ApiError>> + Send + 'a>>;

    /// `GET /docs/{docId}/tables/{table}/rows/{rowId}?valueFormat=rich`.
    fn get_row<'a>(
        &'a self,
        table: &'a str,
        row_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Row, ApiError>> + Send + 'a>>;
}
