use std::collections::HashMap;

use serde_json::Number;

use coda_api::{Column, ColumnKind, Person, RawValue, Values, WebPage};

/// Declared column kinds of one table, keyed by column id.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypes(HashMap<String, ColumnKind>);

impl ColumnTypes {
    pub fn from_columns(columns: &[Column]) -> Self {
        Self(columns.iter().map(|c| (c.id.clone(), c.kind())).collect())
    }

    pub fn get(&self, column_id: &str) -> Option<ColumnKind> {
        self.0.get(column_id).copied()
    }

    pub fn insert(&mut self, column_id: impl Into<String>, kind: ColumnKind) {
        self.0.insert(column_id.into(), kind);
    }
}

/// Coerce every cell into the canonical shape of its declared column
/// kind. Columns without a known kind pass through. Never fails.
pub fn normalize(values: Values, types: &ColumnTypes) -> Values {
    values
        .into_iter()
        .map(|(id, value)| {
            let value = match types.get(&id) {
                Some(kind) => normalize_value(value, kind),
                None => value,
            };
            (id, value)
        })
        .collect()
}

pub fn normalize_value(value: RawValue, kind: ColumnKind) -> RawValue {
    match kind {
        ColumnKind::Link => match value {
            v if v.is_blank() => RawValue::WebPage(WebPage::new("")),
            RawValue::String(url) => RawValue::WebPage(WebPage::new(url)),
            other => other,
        },
        ColumnKind::Number => match value {
            RawValue::Number(n) => RawValue::Number(n),
            RawValue::String(s) => RawValue::Number(parse_number(&s)),
            _ => RawValue::int(0),
        },
        ColumnKind::Boolean => match value {
            RawValue::Bool(b) => RawValue::Bool(b),
            RawValue::String(s) if s.eq_ignore_ascii_case("true") => RawValue::Bool(true),
            RawValue::String(s) if s.eq_ignore_ascii_case("false") => RawValue::Bool(false),
            _ => RawValue::Null,
        },
        ColumnKind::Person => match value {
            v if v.is_blank() => RawValue::Person(Person::named("")),
            RawValue::String(name) => RawValue::Person(Person::named(name)),
            other => other,
        },
        ColumnKind::Image => match value {
            list @ RawValue::List(_) => list,
            image @ RawValue::Image(_) => RawValue::List(vec![image]),
            _ => RawValue::List(Vec::new()),
        },
        ColumnKind::Lookup => match value {
            list @ RawValue::List(_) => list,
            r if r.is_row_reference() => RawValue::List(vec![r]),
            _ => RawValue::List(Vec::new()),
        },
        ColumnKind::Text | ColumnKind::Date | ColumnKind::Select | ColumnKind::Other => value,
    }
}

/// Integer when possible, otherwise float; unparseable and non-finite → 0.
fn parse_number(s: &str) -> Number {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return i.into();
    }
    s.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .unwrap_or_else(|| Number::from(0_i64))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn image() -> RawValue {
        RawValue::from(json!({
            "@context": "http://schema.org/",
            "@type": "ImageObject",
            "url": "https://codahosted.io/a.png",
        }))
    }

    fn reference() -> RawValue {
        RawValue::from(json!({
            "@context": "http://schema.org/",
            "@type": "StructuredValue",
            "additionalType": "row",
            "name": "Apple",
            "tableId": "grid-fruit",
            "rowId": "i-apple",
        }))
    }

    fn all_kinds() -> Vec<ColumnKind> {
        vec![
            ColumnKind::Text,
            ColumnKind::Number,
            ColumnKind::Boolean,
            ColumnKind::Date,
            ColumnKind::Select,
            ColumnKind::Link,
            ColumnKind::Image,
            ColumnKind::Person,
            ColumnKind::Lookup,
            ColumnKind::Other,
        ]
    }

    fn samples() -> Vec<RawValue> {
        vec![
            RawValue::Null,
            RawValue::from(""),
            RawValue::from("abc"),
            RawValue::from(" 42 "),
            RawValue::from("1.5"),
            RawValue::from("TRUE"),
            RawValue::from("yes"),
            RawValue::from("https://example.com"),
            RawValue::int(7),
            RawValue::Bool(false),
            image(),
            reference(),
            RawValue::List(vec![image()]),
            RawValue::List(vec![]),
            RawValue::from(json!({"@type": "MonetaryAmount", "amount": 3})),
        ]
    }

    #[test]
    fn link() {
        assert_eq!(
            normalize_value(RawValue::Null, ColumnKind::Link).to_json(),
            json!({"@context": "http://schema.org/", "@type": "WebPage", "url": ""})
        );
        assert_eq!(
            normalize_value(RawValue::from("https://example.com"), ColumnKind::Link),
            RawValue::WebPage(WebPage::new("https://example.com"))
        );
        assert_eq!(normalize_value(RawValue::int(3), ColumnKind::Link), RawValue::int(3));
    }

    #[test]
    fn number() {
        assert_eq!(normalize_value(RawValue::from("abc"), ColumnKind::Number), RawValue::int(0));
        assert_eq!(normalize_value(RawValue::from(""), ColumnKind::Number), RawValue::int(0));
        assert_eq!(normalize_value(RawValue::Null, ColumnKind::Number), RawValue::int(0));
        assert_eq!(normalize_value(RawValue::from("NaN"), ColumnKind::Number), RawValue::int(0));
        assert_eq!(normalize_value(RawValue::from(" 42 "), ColumnKind::Number), RawValue::int(42));
        assert_eq!(
            normalize_value(RawValue::from("1.5"), ColumnKind::Number).to_json(),
            json!(1.5)
        );
        assert_eq!(normalize_value(RawValue::Bool(true), ColumnKind::Number), RawValue::int(0));
        assert_eq!(normalize_value(RawValue::int(9), ColumnKind::Number), RawValue::int(9));
    }

    #[test]
    fn boolean() {
        assert_eq!(normalize_value(RawValue::from("TRUE"), ColumnKind::Boolean), RawValue::Bool(true));
        assert_eq!(normalize_value(RawValue::from("false"), ColumnKind::Boolean), RawValue::Bool(false));
        assert_eq!(normalize_value(RawValue::from("yes"), ColumnKind::Boolean), RawValue::Null);
        assert_eq!(normalize_value(RawValue::Null, ColumnKind::Boolean), RawValue::Null);
        assert_eq!(normalize_value(RawValue::int(1), ColumnKind::Boolean), RawValue::Null);
        assert_eq!(normalize_value(RawValue::Bool(true), ColumnKind::Boolean), RawValue::Bool(true));
    }

    #[test]
    fn person() {
        assert_eq!(normalize_value(RawValue::from(""), ColumnKind::Person), RawValue::Person(Person::named("")));
        assert_eq!(
            normalize_value(RawValue::from("Ada"), ColumnKind::Person),
            RawValue::Person(Person::named("Ada"))
        );
    }

    #[test]
    fn image_and_lookup_are_lists() {
        assert_eq!(normalize_value(image(), ColumnKind::Image), RawValue::List(vec![image()]));
        assert_eq!(normalize_value(RawValue::from("x"), ColumnKind::Image), RawValue::List(vec![]));
        assert_eq!(normalize_value(RawValue::Null, ColumnKind::Image), RawValue::List(vec![]));
        assert_eq!(normalize_value(reference(), ColumnKind::Lookup), RawValue::List(vec![reference()]));
        assert_eq!(normalize_value(image(), ColumnKind::Lookup), RawValue::List(vec![]));
        let list = RawValue::List(vec![reference(), reference()]);
        assert_eq!(normalize_value(list.clone(), ColumnKind::Lookup), list);
    }

    #[test]
    fn unknown_columns_pass_through() {
        let mut types = ColumnTypes::default();
        types.insert("c-n", ColumnKind::Number);
        let mut values = Values::new();
        values.insert("c-n".into(), RawValue::from("5"));
        values.insert("c-free".into(), RawValue::from("5"));
        let out = normalize(values, &types);
        assert_eq!(out["c-n"], RawValue::int(5));
        assert_eq!(out["c-free"], RawValue::from("5"));
    }

    #[test]
    fn idempotent() {
        for kind in all_kinds() {
            for sample in samples() {
                let once = normalize_value(sample.clone(), kind);
                let twice = normalize_value(once.clone(), kind);
                assert_eq!(once, twice, "{kind:?} on {sample:?}");
            }
        }
    }
}
