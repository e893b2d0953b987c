use std::collections::BTreeMap;

use coda_api::{Column, ColumnKind, FieldSchema, SchemaDescriptor, ValueShape};

/// Validation schema of normalized rows, one field per column.
pub fn infer_schema(columns: &[Column]) -> SchemaDescriptor {
    let fields: BTreeMap<String, FieldSchema> =
        columns.iter().map(|c| (c.id.clone(), infer_field(c))).collect();
    SchemaDescriptor::new(fields)
}

pub fn infer_field(column: &Column) -> FieldSchema {
    FieldSchema {
        label: format!("{} ({})", column.name, column.format.kind),
        shape: infer_shape(column),
    }
}

fn infer_shape(column: &Column) -> ValueShape {
    // hyperlink() formulas yield either a bare url or a WebPage
    if column
        .formula
        .as_deref()
        .is_some_and(|f| f.to_lowercase().contains("hyperlink("))
    {
        return ValueShape::OneOf { options: vec![ValueShape::String, ValueShape::WebPage] };
    }

    let base = match column.kind() {
        ColumnKind::Image => return ValueShape::ImageList,
        ColumnKind::Lookup => return ValueShape::RowReferenceList,
        ColumnKind::Number => ValueShape::Number,
        ColumnKind::Boolean => ValueShape::NullableBoolean,
        ColumnKind::Text | ColumnKind::Date | ColumnKind::Select => ValueShape::String,
        ColumnKind::Link => ValueShape::WebPage,
        ColumnKind::Person => ValueShape::Person,
        ColumnKind::Other => return ValueShape::Any,
    };
    if column.format.is_array {
        ValueShape::array_of(base)
    } else {
        base
    }
}
