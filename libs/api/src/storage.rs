use std::future::Future;
use std::pin::Pin;

use crate::error::ApiError;
use crate::schema::SchemaDescriptor;
use crate::types::Row;
use crate::value::values_from_json;

// ════════════════════════════════════════════════════════════════
//  Row Store
// ════════════════════════════════════════════════════════════════

/// Key-value store receiving loaded rows. `set` with an existing id
/// replaces the previous entry (last write wins).
///
/// Плагины: memory store, JSON Lines file store.
pub trait RowStore: Send + Sync {
    fn set<'a>(
        &'a self,
        id: &'a str,
        data: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + 'a>>;

    /// Flush buffers (end of load).
    fn flush(&self) -> Pin<Box<dyn Future<Output = Result<(), ApiError>> + Send + '_>>;
}

// ════════════════════════════════════════════════════════════════
//  Row Parser
// ════════════════════════════════════════════════════════════════

/// Parse/validate hook called once per row before it is stored.
/// Returns the data to store.
pub trait RowParser: Send + Sync {
    fn parse(&self, id: &str, data: serde_json::Value) -> Result<serde_json::Value, ApiError>;
}

/// Stores rows as they are.
pub struct PassthroughParser;

impl RowParser for PassthroughParser {
    fn parse(&self, _id: &str, data: serde_json::Value) -> Result<serde_json::Value, ApiError> {
        Ok(data)
    }
}

/// Validates each row's `values` against an inferred schema.
pub struct SchemaParser {
    schema: SchemaDescriptor,
}

impl SchemaParser {
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self { schema }
    }
}

impl RowParser for SchemaParser {
    fn parse(&self, id: &str, data: serde_json::Value) -> Result<serde_json::Value, ApiError> {
        let values = match data.get("values") {
            Some(serde_json::Value::Object(map)) => values_from_json(map.clone()),
            _ => {
                let row: Row = serde_json::from_value(data.clone())?;
                row.values
            }
        };
        self.schema
            .validate(&values)
            .map_err(|e| ApiError::format_err(format!("row {id}: {e}")))?;
        Ok(data)
    }
}
