use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

use coda_api::{ApiError, Column, Page, Row, RowsRequest, SourceApi};

/// Coda REST client bound to one document.
///
/// Bearer-аутентификация, значения строк запрашиваются в rich-формате.
/// Сегменты пути (id или имя таблицы) URL-кодируются.
pub struct HttpSource {
    http: reqwest::Client,
    base_url: String,
    token: String,
    doc_id: String,
}

impl HttpSource {
    pub fn new(
        base_url: &str,
        token: &str,
        doc_id: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            doc_id: doc_id.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/docs/{}/tables/{}",
            self.base_url,
            urlencoding::encode(&self.doc_id),
            urlencoding::encode(table)
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        debug!(url, "GET");
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ApiError::upstream(status.as_u16(), body));
        }
        serde_json::from_str(&body).map_err(|e| ApiError::format_err(format!("{url}: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout(e.to_string())
    } else {
        ApiError::io(e.to_string())
    }
}

/// Query string of a rows request.
pub fn rows_query(request: &RowsRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![("valueFormat", "rich".to_string())];
    if let Some(q) = &request.query {
        query.push(("query", q.clone()));
    }
    if let Some(sort_by) = request.sort_by {
        query.push(("sortBy", sort_by.to_string()));
    }
    if let Some(limit) = request.limit {
        query.push(("limit", limit.to_string()));
    }
    if let Some(token) = &request.page_token {
        query.push(("pageToken", token.clone()));
    }
    query
}

impl SourceApi for HttpSource {
    fn list_columns<'a>(
        &'a self,
        table: &'a str,
        page_token: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<Page<Column>, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/columns", self.table_url(table));
            let query: Vec<(&'static str, String)> =
                page_token.map(|t| vec![("pageToken", t.to_string())]).unwrap_or_default();
            self.get_json(&url, &query).await
        })
    }

    fn list_rows<'a>(
        &'a self,
        table: &'a str,
        request: &'a RowsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<Page<Row>, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/rows", self.table_url(table));
            self.get_json(&url, &rows_query(request)).await
        })
    }

    fn get_row<'a>(
        &'a self,
        table: &'a str,
        row_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Row, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!("{}/rows/{}", self.table_url(table), urlencoding::encode(row_id));
            self.get_json(&url, &[("valueFormat", "rich".to_string())]).await
        })
    }
}
