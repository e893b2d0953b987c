use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use coda_api::{Column, Row, RowParser, RowStore, SchemaDescriptor, SourceApi};

use crate::config::LoaderSettings;
use crate::error::LoaderError;
use crate::expand::Expander;
use crate::fetch::TableFetcher;
use crate::normalize::{ColumnTypes, normalize};
use crate::sanitize::sanitize_values;
use crate::schema::infer_schema;

/// Итог одной загрузки.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub rows_fetched: usize,
    pub rows_stored: usize,
    /// References replaced by the referenced row's data.
    pub expanded_references: u64,
    /// Page requests against the source API, lookups included.
    pub requests: u64,
    pub elapsed: Duration,
}

// ═══════════════════════════════════════════════════════════════
//  CodaLoader
// ═══════════════════════════════════════════════════════════════

/// Loader of one Coda table: fetch → expand → normalize → sanitize → store.
pub struct CodaLoader {
    settings: LoaderSettings,
    api: Arc<dyn SourceApi>,
}

impl CodaLoader {
    pub const NAME: &'static str = "coda-loader";

    pub fn new(settings: LoaderSettings, api: Arc<dyn SourceApi>) -> Self {
        Self { settings, api }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    fn fetcher(&self) -> TableFetcher {
        TableFetcher::new(self.api.clone(), self.settings.page_size, self.settings.request_timeout)
    }

    fn table(&self) -> &str {
        &self.settings.table_id
    }

    /// Column metadata of the configured table.
    pub async fn columns(&self) -> Result<Vec<Column>, LoaderError> {
        self.fetcher().fetch_columns(self.table()).await.map_err(|source| LoaderError::Columns {
            table: self.table().to_string(),
            source,
        })
    }

    /// Inferred validation schema; open when column metadata is unavailable.
    pub async fn schema(&self) -> SchemaDescriptor {
        match self.columns().await {
            Ok(columns) => infer_schema(&columns),
            Err(e) => {
                warn!(table = %self.table(), error = %e, "column metadata unavailable, using open schema");
                SchemaDescriptor::open()
            }
        }
    }

    /// Full pipeline into `store`. Primary column and row fetch failures
    /// abort the load; lookup failures only reduce expansion.
    pub async fn load(
        &self,
        store: &dyn RowStore,
        parser: &dyn RowParser,
    ) -> Result<LoadSummary, LoaderError> {
        let started = Instant::now();
        let fetcher = self.fetcher();
        info!(
            doc = %self.settings.doc_id,
            table = %self.table(),
            max_lookup_depth = self.settings.max_lookup_depth,
            "loading table"
        );

        let columns = fetcher.fetch_columns(self.table()).await.map_err(|source| {
            LoaderError::Columns { table: self.table().to_string(), source }
        })?;
        let types = ColumnTypes::from_columns(&columns);

        let rows = self.fetch_primary(&fetcher).await?;
        let rows_fetched = rows.len();
        debug!(rows = rows_fetched, "primary rows fetched");

        let mut expander = Expander::new(&fetcher, self.settings.max_lookup_depth)
            .with_progress_interval(self.settings.progress_interval)
            .with_row_timeout(self.settings.row_timeout);
        let rows = expander.expand_all(rows, self.table()).await;
        let expanded_references = expander.expanded();

        let mut rows_stored = 0;
        for row in rows {
            let row = self.finish(row, &types);
            let data = serde_json::to_value(&row)
                .map_err(|source| LoaderError::Serialize { id: row.id.clone(), source })?;
            let data = parser.parse(&row.id, data).map_err(LoaderError::Validation)?;
            store
                .set(&row.id, data)
                .await
                .map_err(|source| LoaderError::Store { id: row.id.clone(), source })?;
            rows_stored += 1;
        }
        store
            .flush()
            .await
            .map_err(|source| LoaderError::Store { id: self.table().to_string(), source })?;

        let summary = LoadSummary {
            rows_fetched,
            rows_stored,
            expanded_references,
            requests: fetcher.requests(),
            elapsed: started.elapsed(),
        };
        info!(
            rows = summary.rows_stored,
            expanded = summary.expanded_references,
            requests = summary.requests,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "table loaded"
        );
        Ok(summary)
    }

    /// One row through the single-row endpoint, processed like a loaded row.
    pub async fn fetch_row(&self, row_id: &str) -> Result<Row, LoaderError> {
        let fetcher = self.fetcher();
        let columns = fetcher.fetch_columns(self.table()).await.map_err(|source| {
            LoaderError::Columns { table: self.table().to_string(), source }
        })?;
        let row = fetcher.fetch_row(self.table(), row_id).await.map_err(|source| LoaderError::Row {
            table: self.table().to_string(),
            row: row_id.to_string(),
            source,
        })?;

        let mut expander = Expander::new(&fetcher, self.settings.max_lookup_depth);
        let row = match self.settings.max_lookup_depth {
            0 => row,
            _ => expander.expand_row(row, self.table()).await,
        };
        Ok(self.finish(row, &ColumnTypes::from_columns(&columns)))
    }

    /// Primary rows: one series per query, concatenated in query order.
    async fn fetch_primary(&self, fetcher: &TableFetcher) -> Result<Vec<Row>, LoaderError> {
        let queries: Vec<Option<String>> = match &self.settings.query {
            Some(filter) => filter.queries().into_iter().map(Some).collect(),
            None => vec![None],
        };

        let mut rows = Vec::new();
        for query in &queries {
            let page = fetcher
                .fetch_rows(self.table(), query.as_deref(), self.settings.sort_by, self.settings.limit)
                .await
                .map_err(|source| LoaderError::Rows { table: self.table().to_string(), source })?;
            rows.extend(page);
        }
        Ok(rows)
    }

    fn finish(&self, mut row: Row, types: &ColumnTypes) -> Row {
        let values = normalize(std::mem::take(&mut row.values), types);
        row.values = if self.settings.sanitize_strings { sanitize_values(values) } else { values };
        row
    }
}
