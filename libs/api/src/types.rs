use serde::{Deserialize, Serialize};

use crate::value::Values;

// ════════════════════════════════════════════════════════════════
//  Row
// ════════════════════════════════════════════════════════════════

fn default_row_type() -> String {
    "row".into()
}

/// One record of a source table (`valueFormat=rich`).
///
/// Identity is `id`; everything except `values` is left as fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    #[serde(rename = "type", default = "default_row_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub index: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub browser_link: String,
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub values: Values,
}

impl Row {
    /// Id of the table owning this row, taken from its API `href`
    /// (`.../tables/{tableId}/rows/{rowId}`).
    pub fn table_id(&self) -> Option<&str> {
        let rest = self.href.split_once("/tables/")?.1;
        let id = rest.split('/').next()?;
        (!id.is_empty()).then_some(id)
    }

    /// Same row with other values.
    pub fn with_values(&self, values: Values) -> Row {
        Row { values, ..self.clone() }
    }
}

// ════════════════════════════════════════════════════════════════
//  Column
// ════════════════════════════════════════════════════════════════

/// Reference to a table, as embedded in lookup column formats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Declared column format. Only `type` and `isArray` drive behavior;
/// the rest is carried through for tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFormat {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub format: ColumnFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default)]
    pub calculated: bool,
    /// Display column of the table.
    #[serde(default)]
    pub display: bool,
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_format_type(&self.format.kind)
    }
}

/// Семейство значений, которое объявляет формат колонки.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Number,
    Boolean,
    Date,
    Select,
    Link,
    Image,
    Person,
    Lookup,
    /// Everything else (percent, duration, button, reaction, ...).
    Other,
}

impl ColumnKind {
    pub fn from_format_type(kind: &str) -> Self {
        match kind {
            "text" | "canvas" | "email" => ColumnKind::Text,
            "number" | "slider" | "currency" => ColumnKind::Number,
            "checkbox" | "boolean" => ColumnKind::Boolean,
            "date" | "dateTime" | "time" => ColumnKind::Date,
            "select" => ColumnKind::Select,
            "link" => ColumnKind::Link,
            "image" => ColumnKind::Image,
            "person" => ColumnKind::Person,
            "lookup" => ColumnKind::Lookup,
            _ => ColumnKind::Other,
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Requests & pages
// ════════════════════════════════════════════════════════════════

/// One page of a paginated list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Continuation token. None = last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Row ordering supported by the rows endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    CreatedAt,
    Natural,
    UpdatedAt,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::CreatedAt => "createdAt",
            SortBy::Natural => "natural",
            SortBy::UpdatedAt => "updatedAt",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" | "created_at" => Ok(SortBy::CreatedAt),
            "natural" => Ok(SortBy::Natural),
            "updatedAt" | "updated_at" => Ok(SortBy::UpdatedAt),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

/// Parameters of one `GET .../rows` request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowsRequest {
    /// Coda filter formula, e.g. `c-tuVwxYz:"Apple"`.
    pub query: Option<String>,
    pub sort_by: Option<SortBy>,
    /// Page size.
    pub limit: Option<u32>,
    pub page_token: Option<String>,
}
