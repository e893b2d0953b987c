//! In-memory `SourceApi` for tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use serde_json::{Value, json};

use coda_api::{ApiError, Column, Page, RawValue, Row, RowsRequest, SourceApi};

#[derive(Default)]
pub struct FakeSource {
    tables: HashMap<String, Vec<Row>>,
    columns: HashMap<String, Vec<Column>>,
    failing: HashSet<String>,
    stalled: HashSet<String>,
    row_requests: Mutex<HashMap<String, usize>>,
    column_requests: Mutex<HashMap<String, usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to the table named by its `href`.
    pub fn add_row(&mut self, row: Row) {
        let table = row.table_id().unwrap_or_default().to_string();
        self.tables.entry(table).or_default().push(row);
    }

    pub fn add_column(&mut self, table: &str, id: &str, name: &str, kind: &str) {
        let column: Column = serde_json::from_value(json!({
            "id": id,
            "name": name,
            "format": {"type": kind},
        }))
        .expect("column json");
        self.columns.entry(table.to_string()).or_default().push(column);
    }

    /// Every request against `table` answers HTTP 500.
    pub fn fail_table(&mut self, table: &str) {
        self.failing.insert(table.to_string());
    }

    /// Every request against `table` never completes.
    pub fn stall_table(&mut self, table: &str) {
        self.stalled.insert(table.to_string());
    }

    /// `list_rows` + `get_row` calls made against `table`.
    pub fn row_requests(&self, table: &str) -> usize {
        self.row_requests.lock().unwrap().get(table).copied().unwrap_or(0)
    }

    pub fn column_requests(&self, table: &str) -> usize {
        self.column_requests.lock().unwrap().get(table).copied().unwrap_or(0)
    }

    pub fn total_row_requests(&self) -> usize {
        self.row_requests.lock().unwrap().values().sum()
    }

    async fn gate(&self, table: &str) -> Result<(), ApiError> {
        if self.stalled.contains(table) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(table) {
            return Err(ApiError::upstream(500, "internal error"));
        }
        Ok(())
    }
}

fn bump(counter: &Mutex<HashMap<String, usize>>, table: &str) {
    *counter.lock().unwrap().entry(table.to_string()).or_default() += 1;
}

/// `column:<json>` against the row's value in that column.
fn matches_query(row: &Row, query: &str) -> bool {
    let Some((column, expected)) = query.split_once(':') else {
        return false;
    };
    let expected: Value =
        serde_json::from_str(expected).unwrap_or_else(|_| Value::String(expected.to_string()));
    row.values.get(column).map(RawValue::to_json) == Some(expected)
}

fn paginate<T: Clone>(items: &[T], token: Option<&str>, limit: Option<u32>) -> Page<T> {
    let start: usize = token.and_then(|t| t.parse().ok()).unwrap_or(0).min(items.len());
    let end = match limit {
        Some(limit) => (start + limit as usize).min(items.len()),
        None => items.len(),
    };
    Page {
        items: items[start..end].to_vec(),
        next_page_token: (end < items.len()).then(|| end.to_string()),
    }
}

impl SourceApi for FakeSource {
    fn list_columns<'a>(
        &'a self,
        table: &'a str,
        page_token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Page<Column>, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            bump(&self.column_requests, table);
            self.gate(table).await?;
            let columns = self.columns.get(table).map(Vec::as_slice).unwrap_or_default();
            Ok(paginate(columns, page_token, Some(2)))
        })
    }

    fn list_rows<'a>(
        &'a self,
        table: &'a str,
        request: &'a RowsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Page<Row>, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            bump(&self.row_requests, table);
            self.gate(table).await?;
            let Some(rows) = self.tables.get(table) else {
                return Err(ApiError::upstream(404, "table not found"));
            };
            let filtered: Vec<Row> = match &request.query {
                Some(query) => rows.iter().filter(|r| matches_query(r, query)).cloned().collect(),
                None => rows.clone(),
            };
            Ok(paginate(&filtered, request.page_token.as_deref(), request.limit))
        })
    }

    fn get_row<'a>(
        &'a self,
        table: &'a str,
        row_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Row, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            bump(&self.row_requests, table);
            self.gate(table).await?;
            self.tables
                .get(table)
                .and_then(|rows| rows.iter().find(|r| r.id == row_id))
                .cloned()
                .ok_or_else(|| ApiError::upstream(404, "row not found"))
        })
    }
}

/// Row of `table` with the given cell values.
pub fn row(table: &str, id: &str, values: Value) -> Row {
    serde_json::from_value(json!({
        "id": id,
        "type": "row",
        "name": id,
        "href": format!("https://coda.io/apis/v1/docs/dTest/tables/{table}/rows/{id}"),
        "browserLink": format!("https://coda.io/d/_dTest#_tu{table}/_ru{id}"),
        "values": values,
    }))
    .expect("row json")
}

/// Wire form of a reference to `table:row_id`.
pub fn reference(table: &str, row_id: &str) -> Value {
    json!({
        "@context": "http://schema.org/",
        "@type": "StructuredValue",
        "additionalType": "row",
        "name": row_id,
        "url": format!("https://coda.io/d/_dTest#_tu{table}/_ru{row_id}"),
        "tableId": table,
        "rowId": row_id,
        "tableUrl": format!("https://coda.io/d/_dTest#_tu{table}"),
    })
}
