use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;

use coda_api::{ApiError, RowStore};

// ═══════════════════════════════════════════════════════════════
//  MemoryStore
// ═══════════════════════════════════════════════════════════════

/// In-memory row store keyed by row id. Повторный `set` с тем же id
/// заменяет запись.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<serde_json::Value> {
        self.rows.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Copy of every stored row, ordered by id.
    pub async fn snapshot(&self) -> BTreeMap<String, serde_json::Value> {
        self.rows.read().await.clone()
    }
}

impl RowStore for MemoryStore {
    fn set<'a>(
        &'a self,
        id: &'a str,
        data: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>> {
        Box::pin(async move {
            self.rows.write().await.insert(id.to_string(), data);
            Ok(())
        })
    }

    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }
}
