use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use coda_api::value::reference_key;
use coda_api::{ExpandedRow, ExpandedRowReference, RawValue, Row, RowReference, Values};

use crate::fetch::TableFetcher;
use crate::session::Session;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ═══════════════════════════════════════════════════════════════
//  Expander
// ═══════════════════════════════════════════════════════════════

/// Раскрывает ссылки на строки (lookup) до `max_depth` уровней.
///
/// Строки обрабатываются строго последовательно: ссылки, разрешённые
/// раньше, наполняют кэш сессии для последующих.
pub struct Expander<'f> {
    session: Session<'f>,
    max_depth: u32,
    progress_interval: Duration,
    row_timeout: Option<Duration>,
    expanded: u64,
}

impl<'f> Expander<'f> {
    pub fn new(fetcher: &'f TableFetcher, max_depth: u32) -> Self {
        Self {
            session: Session::new(fetcher),
            max_depth,
            progress_interval: Duration::from_secs(5),
            row_timeout: None,
            expanded: 0,
        }
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Rows whose expansion takes longer are kept unexpanded.
    pub fn with_row_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.row_timeout = timeout;
        self
    }

    pub fn session(&self) -> &Session<'f> {
        &self.session
    }

    /// References replaced by expanded ones so far.
    pub fn expanded(&self) -> u64 {
        self.expanded
    }

    /// Expand every row, preserving order. `default_table` keys rows
    /// whose `href` does not name their table.
    pub async fn expand_all(&mut self, rows: Vec<Row>, default_table: &str) -> Vec<Row> {
        if self.max_depth == 0 {
            return rows;
        }

        let total = rows.len();
        let started = Instant::now();
        let mut last_report = started;
        let mut out = Vec::with_capacity(total);

        for (done, row) in rows.into_iter().enumerate() {
            let expanded = match self.row_timeout {
                Some(limit) => {
                    let counted = self.expanded;
                    match tokio::time::timeout(limit, self.expand_row(row.clone(), default_table)).await {
                        Ok(expanded) => expanded,
                        Err(_) => {
                            // отброшенная строка не вносит раскрытий в счётчик
                            self.expanded = counted;
                            warn!(row = %row.id, timeout_ms = limit.as_millis() as u64, "row expansion timed out, keeping it unexpanded");
                            row
                        }
                    }
                }
                None => self.expand_row(row, default_table).await,
            };
            out.push(expanded);

            if last_report.elapsed() >= self.progress_interval {
                last_report = Instant::now();
                info!(
                    elapsed_s = started.elapsed().as_secs(),
                    percent = (done + 1) * 100 / total,
                    requests = self.session.fetcher().requests(),
                    cached_rows = self.session.cached_rows(),
                    cached_tables = self.session.cached_tables(),
                    "expanding lookups"
                );
            }
        }

        info!(
            rows = total,
            expanded = self.expanded,
            requests = self.session.fetcher().requests(),
            cached_tables = self.session.cached_tables(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "lookup expansion done"
        );
        out
    }

    /// Expand one top-level row. The row itself starts the chain, so
    /// references leading back to it stay unexpanded.
    pub async fn expand_row(&mut self, row: Row, default_table: &str) -> Row {
        let mut chain = HashSet::new();
        chain.insert(reference_key(row.table_id().unwrap_or(default_table), &row.id));
        self.expand_at(row, &mut chain, 0).await
    }

    fn expand_at<'s>(
        &'s mut self,
        row: Row,
        chain: &'s mut HashSet<String>,
        depth: u32,
    ) -> BoxFuture<'s, Row> {
        Box::pin(async move {
            if self.max_depth == 0 || depth >= self.max_depth {
                return row;
            }

            let mut values = Values::new();
            for (column, value) in &row.values {
                let replaced = match value {
                    RawValue::RowReference(r) => self
                        .expand_reference(r, chain, depth)
                        .await
                        .map(RawValue::ExpandedRowReference),
                    RawValue::List(items) => self.expand_list(items, chain, depth).await,
                    _ => None,
                };
                values.insert(column.clone(), replaced.unwrap_or_else(|| value.clone()));
            }
            row.with_values(values)
        })
    }

    /// New list when at least one item was expanded.
    async fn expand_list(
        &mut self,
        items: &[RawValue],
        chain: &mut HashSet<String>,
        depth: u32,
    ) -> Option<RawValue> {
        let mut changed = false;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let expanded = match item {
                RawValue::RowReference(r) => self.expand_reference(r, chain, depth).await,
                _ => None,
            };
            match expanded {
                Some(e) => {
                    changed = true;
                    out.push(RawValue::ExpandedRowReference(e));
                }
                None => out.push(item.clone()),
            }
        }
        changed.then_some(RawValue::List(out))
    }

    fn expand_reference<'s>(
        &'s mut self,
        reference: &'s RowReference,
        chain: &'s mut HashSet<String>,
        depth: u32,
    ) -> BoxFuture<'s, Option<ExpandedRowReference>> {
        Box::pin(async move {
            let key = reference.key();
            if chain.contains(&key) {
                debug!(reference = %key, depth, "circular reference left unexpanded");
                return None;
            }
            let target = self.session.resolve(reference).await?;

            chain.insert(key.clone());
            let target = self.expand_at(target, chain, depth + 1).await;
            chain.remove(&key);

            self.expanded += 1;
            Some(ExpandedRowReference {
                reference: reference.clone(),
                values: ExpandedRow { id: target.id, values: target.values },
            })
        })
    }
}
