use serde_json::{Map, Value};

use coda_api::{ExpandedRowReference, RawValue, RowReference, Values};

const FENCE: &str = "```";

/// Inner text of a string fully wrapped in triple backticks; other
/// strings unchanged.
pub fn sanitize_str(s: &str) -> &str {
    s.strip_prefix(FENCE)
        .and_then(|inner| inner.strip_suffix(FENCE))
        .unwrap_or(s)
}

pub fn sanitize_values(values: Values) -> Values {
    values.into_iter().map(|(k, v)| (k, sanitize(v))).collect()
}

/// Strip fences from every string leaf, descending into lists, objects
/// and tagged values.
pub fn sanitize(value: RawValue) -> RawValue {
    match value {
        RawValue::String(s) => RawValue::String(sanitize_owned(s)),
        RawValue::List(items) => RawValue::List(items.into_iter().map(sanitize).collect()),
        RawValue::Object(map) => RawValue::Object(sanitize_values(map)),
        RawValue::Image(mut img) => {
            img.name = img.name.map(sanitize_owned);
            img.url = sanitize_owned(img.url);
            img.extra = sanitize_map(img.extra);
            RawValue::Image(img)
        }
        RawValue::WebPage(mut page) => {
            page.url = sanitize_owned(page.url);
            page.name = page.name.map(sanitize_owned);
            page.extra = sanitize_map(page.extra);
            RawValue::WebPage(page)
        }
        RawValue::Person(mut person) => {
            person.name = sanitize_owned(person.name);
            person.email = person.email.map(sanitize_owned);
            person.extra = sanitize_map(person.extra);
            RawValue::Person(person)
        }
        RawValue::RowReference(r) => RawValue::RowReference(sanitize_reference(r)),
        RawValue::ExpandedRowReference(ExpandedRowReference { reference, mut values }) => {
            values.values = sanitize_values(values.values);
            RawValue::ExpandedRowReference(ExpandedRowReference {
                reference: sanitize_reference(reference),
                values,
            })
        }
        other => other,
    }
}

fn sanitize_reference(mut r: RowReference) -> RowReference {
    r.name = sanitize_owned(r.name);
    r.url = sanitize_owned(r.url);
    r.table_id = sanitize_owned(r.table_id);
    r.row_id = sanitize_owned(r.row_id);
    r.table_url = sanitize_owned(r.table_url);
    r.extra = sanitize_map(r.extra);
    r
}

fn sanitize_owned(s: String) -> String {
    match sanitize_str(&s) {
        inner if inner.len() == s.len() => s,
        inner => inner.to_string(),
    }
}

fn sanitize_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(k, v)| (k, sanitize_json(v))).collect()
}

fn sanitize_json(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_owned(s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_json).collect()),
        Value::Object(map) => Value::Object(sanitize_map(map)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_full_fence_only() {
        assert_eq!(sanitize_str("```hello```"), "hello");
        assert_eq!(sanitize_str("`hello`"), "`hello`");
        assert_eq!(sanitize_str("```hello"), "```hello");
        assert_eq!(sanitize_str("say ```hello```"), "say ```hello```");
        assert_eq!(sanitize_str("```"), "```");
        assert_eq!(sanitize_str("``````"), "");
        assert_eq!(sanitize_str("```line 1\nline 2```"), "line 1\nline 2");
    }

    #[test]
    fn recurses_into_nested_values() {
        let value = RawValue::from(json!({
            "list": ["```a```", 1, null, ["```b```"]],
            "plain": "```c```",
        }));
        assert_eq!(
            sanitize(value).to_json(),
            json!({"list": ["a", 1, null, ["b"]], "plain": "c"})
        );
    }

    #[test]
    fn sanitizes_tagged_and_expanded_values() {
        let value = RawValue::from(json!({
            "@context": "http://schema.org/",
            "@type": "StructuredValue",
            "additionalType": "row",
            "name": "```Apple```",
            "url": "```https://coda.io/x```",
            "tableId": "```grid-fruit```",
            "rowId": "```i-apple```",
            "tableUrl": "```https://coda.io/t```",
            "values": {"id": "i-apple", "values": {"c-note": "```ripe```", "c-n": 2}},
        }));
        let wire = sanitize(value).to_json();
        assert_eq!(wire["name"], json!("Apple"));
        assert_eq!(wire["url"], json!("https://coda.io/x"));
        assert_eq!(wire["tableId"], json!("grid-fruit"));
        assert_eq!(wire["rowId"], json!("i-apple"));
        assert_eq!(wire["tableUrl"], json!("https://coda.io/t"));

        let plain = sanitize(RawValue::from(json!({
            "@type": "StructuredValue",
            "additionalType": "row",
            "name": "Pear",
            "url": "```https://coda.io/p```",
            "tableId": "grid-fruit",
            "rowId": "```i-pear```",
        })));
        assert!(matches!(plain, RawValue::RowReference(_)));
        let wire = plain.to_json();
        assert_eq!(wire["url"], json!("https://coda.io/p"));
        assert_eq!(wire["rowId"], json!("i-pear"));
        assert_eq!(wire["values"]["values"], json!({"c-note": "ripe", "c-n": 2}));

        let person = sanitize(RawValue::from(json!({"@type": "Person", "name": "```Ada```"})));
        assert_eq!(person.to_json()["name"], json!("Ada"));
    }

    #[test]
    fn leaves_other_primitives() {
        assert_eq!(sanitize(RawValue::int(3)), RawValue::int(3));
        assert_eq!(sanitize(RawValue::Bool(true)), RawValue::Bool(true));
        assert_eq!(sanitize(RawValue::Null), RawValue::Null);
    }
}
