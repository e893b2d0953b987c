use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ApiError;
use crate::value::{RawValue, Values};

// ════════════════════════════════════════════════════════════════
//  Value Shape
// ════════════════════════════════════════════════════════════════

/// Каноническая форма значения колонки после нормализации.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ValueShape {
    Number,
    /// `true`, `false` or `null`.
    NullableBoolean,
    String,
    /// `{"@type":"WebPage"}`.
    WebPage,
    /// List of `{"@type":"ImageObject"}`.
    ImageList,
    /// `{"@type":"Person"}`.
    Person,
    /// List of row references, plain or expanded.
    RowReferenceList,
    EmptyList,
    ListOf { item: Box<ValueShape> },
    OneOf { options: Vec<ValueShape> },
    Any,
}

impl ValueShape {
    /// `base`, `[]` or `[base, ...]`: widening applied to array columns.
    /// Нормализация списки не строит, так что одиночное значение остаётся
    /// допустимым.
    pub fn array_of(base: ValueShape) -> Self {
        ValueShape::OneOf {
            options: vec![
                base.clone(),
                ValueShape::EmptyList,
                ValueShape::ListOf { item: Box::new(base) },
            ],
        }
    }

    pub fn accepts(&self, value: &RawValue) -> bool {
        match self {
            ValueShape::Number => matches!(value, RawValue::Number(_)),
            ValueShape::NullableBoolean => matches!(value, RawValue::Bool(_) | RawValue::Null),
            ValueShape::String => matches!(value, RawValue::String(_)),
            ValueShape::WebPage => matches!(value, RawValue::WebPage(_)),
            ValueShape::Person => matches!(value, RawValue::Person(_)),
            ValueShape::ImageList => match value {
                RawValue::List(items) => items.iter().all(|v| matches!(v, RawValue::Image(_))),
                _ => false,
            },
            ValueShape::RowReferenceList => match value {
                RawValue::List(items) => items.iter().all(RawValue::is_row_reference),
                _ => false,
            },
            ValueShape::EmptyList => matches!(value, RawValue::List(items) if items.is_empty()),
            ValueShape::ListOf { item } => match value {
                RawValue::List(items) => items.iter().all(|v| item.accepts(v)),
                _ => false,
            },
            ValueShape::OneOf { options } => options.iter().any(|o| o.accepts(value)),
            ValueShape::Any => true,
        }
    }
}

impl std::fmt::Display for ValueShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueShape::Number => write!(f, "number"),
            ValueShape::NullableBoolean => write!(f, "boolean | null"),
            ValueShape::String => write!(f, "string"),
            ValueShape::WebPage => write!(f, "WebPage"),
            ValueShape::ImageList => write!(f, "array<ImageObject>"),
            ValueShape::Person => write!(f, "Person"),
            ValueShape::RowReferenceList => write!(f, "array<row reference>"),
            ValueShape::EmptyList => write!(f, "[]"),
            ValueShape::ListOf { item } => write!(f, "array<{item}>"),
            ValueShape::OneOf { options } => {
                let parts: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                write!(f, "{}", parts.join(" | "))
            }
            ValueShape::Any => write!(f, "any"),
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Field & SchemaDescriptor
// ════════════════════════════════════════════════════════════════

/// Shape of one column plus a label for tooling (`"<name> (<type>)"`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub label: String,
    pub shape: ValueShape,
}

/// Validation schema of a table's row values, keyed by column id.
///
/// An open schema (column metadata unavailable) accepts every value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDescriptor {
    pub fields: BTreeMap<String, FieldSchema>,
    pub open: bool,
}

impl SchemaDescriptor {
    pub fn new(fields: BTreeMap<String, FieldSchema>) -> Self {
        Self { fields, open: false }
    }

    /// Accept-anything schema.
    pub fn open() -> Self {
        Self { fields: BTreeMap::new(), open: true }
    }

    pub fn field(&self, column_id: &str) -> Option<&FieldSchema> {
        self.fields.get(column_id)
    }

    /// Check every known column value. Columns absent from the schema pass.
    pub fn validate(&self, values: &Values) -> Result<(), ApiError> {
        if self.open {
            return Ok(());
        }
        let violations: Vec<String> = values
            .iter()
            .filter_map(|(id, value)| {
                let field = self.fields.get(id)?;
                (!field.shape.accepts(value))
                    .then(|| format!("{}: expected {}, got {}", field.label, field.shape, value.to_json()))
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::format_err(violations.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::WebPage;

    fn field(label: &str, shape: ValueShape) -> FieldSchema {
        FieldSchema { label: label.into(), shape }
    }

    #[test]
    fn array_widening() {
        let shape = ValueShape::array_of(ValueShape::String);
        assert!(shape.accepts(&RawValue::List(vec![])));
        assert!(shape.accepts(&RawValue::List(vec![RawValue::from("a"), RawValue::from("b")])));
        assert!(shape.accepts(&RawValue::from("a")));
        assert!(!shape.accepts(&RawValue::List(vec![RawValue::int(1)])));
        assert!(!shape.accepts(&RawValue::int(1)));
        assert_eq!(shape.to_string(), "string | [] | array<string>");
    }

    #[test]
    fn validate_reports_label() {
        let mut fields = BTreeMap::new();
        fields.insert("c-price".to_string(), field("Price (number)", ValueShape::Number));
        fields.insert("c-site".to_string(), field("Site (link)", ValueShape::WebPage));
        let schema = SchemaDescriptor::new(fields);

        let mut ok = Values::new();
        ok.insert("c-price".into(), RawValue::int(3));
        ok.insert("c-site".into(), RawValue::WebPage(WebPage::new("")));
        ok.insert("c-unknown".into(), RawValue::Bool(true));
        assert!(schema.validate(&ok).is_ok());

        let mut bad = Values::new();
        bad.insert("c-price".into(), RawValue::from("3"));
        let err = schema.validate(&bad).unwrap_err();
        assert!(err.message().starts_with("Price (number): expected number"), "{err}");
    }

    #[test]
    fn open_schema_accepts_everything() {
        let mut values = Values::new();
        values.insert("c-x".into(), RawValue::Null);
        assert!(SchemaDescriptor::open().validate(&values).is_ok());
    }
}
