use std::collections::HashMap;

use tracing::{debug, warn};

use coda_api::{Row, RowReference};

use crate::fetch::TableFetcher;

/// Кэши одной загрузки: строки по ключу `tableId:rowId` (включая
/// промахи) и целиком загруженные таблицы. Живут всю загрузку, между
/// строками верхнего уровня не сбрасываются. Размер не ограничен.
pub struct Session<'f> {
    fetcher: &'f TableFetcher,
    rows: HashMap<String, Option<Row>>,
    tables: HashMap<String, HashMap<String, Row>>,
}

impl<'f> Session<'f> {
    pub fn new(fetcher: &'f TableFetcher) -> Self {
        Self { fetcher, rows: HashMap::new(), tables: HashMap::new() }
    }

    pub fn fetcher(&self) -> &'f TableFetcher {
        self.fetcher
    }

    /// Row a reference points at, or None when it cannot be resolved.
    ///
    /// The whole referenced table is fetched on first contact. A failed
    /// table fetch is logged and recorded as a miss for this key only.
    pub async fn resolve(&mut self, reference: &RowReference) -> Option<Row> {
        if let Some(table) = self.tables.get(&reference.table_id) {
            return table.get(&reference.row_id).cloned();
        }
        let key = reference.key();
        if let Some(cached) = self.rows.get(&key) {
            return cached.clone();
        }

        match self.fetcher.fetch_table(&reference.table_id).await {
            Ok(table) => {
                let row = table.get(&reference.row_id).cloned();
                if row.is_none() {
                    debug!(reference = %key, "referenced row not found");
                    self.rows.insert(key, None);
                }
                self.tables.insert(reference.table_id.clone(), table);
                row
            }
            Err(e) => {
                warn!(table = %reference.table_id, reference = %key, error = %e, "lookup table fetch failed");
                self.rows.insert(key, None);
                None
            }
        }
    }

    /// Entries of the row-level cache.
    pub fn cached_rows(&self) -> usize {
        self.rows.len()
    }

    /// Fully fetched tables.
    pub fn cached_tables(&self) -> usize {
        self.tables.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::testing::{FakeSource, reference, row};
    use coda_api::RawValue;

    fn reference_to(table: &str, row_id: &str) -> RowReference {
        match RawValue::from(reference(table, row_id)) {
            RawValue::RowReference(r) => r,
            other => panic!("expected reference, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn table_is_fetched_once() {
        let mut source = FakeSource::new();
        for i in 0..10 {
            source.add_row(row("grid-fruit", &format!("i-{i}"), json!({})));
        }
        let source = Arc::new(source);
        let fetcher = TableFetcher::new(source.clone(), 500, Duration::from_secs(1));
        let mut session = Session::new(&fetcher);

        for i in 0..10 {
            let found = session.resolve(&reference_to("grid-fruit", &format!("i-{i}"))).await;
            assert_eq!(found.map(|r| r.id), Some(format!("i-{i}")));
        }
        assert!(session.resolve(&reference_to("grid-fruit", "i-missing")).await.is_none());
        assert_eq!(source.row_requests("grid-fruit"), 1);
        assert_eq!(session.cached_tables(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_degrades_to_miss() {
        let mut source = FakeSource::new();
        source.add_row(row("grid-broken", "i-1", json!({})));
        source.fail_table("grid-broken");
        let source = Arc::new(source);
        let fetcher = TableFetcher::new(source.clone(), 500, Duration::from_secs(1));
        let mut session = Session::new(&fetcher);

        assert!(session.resolve(&reference_to("grid-broken", "i-1")).await.is_none());
        assert!(session.resolve(&reference_to("grid-broken", "i-1")).await.is_none());
        assert_eq!(source.row_requests("grid-broken"), 1);
        assert_eq!(session.cached_rows(), 1);
        assert_eq!(session.cached_tables(), 0);
    }
}
