use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// JSON-LD context carried by every tagged value in `valueFormat=rich`.
pub const SCHEMA_ORG_CONTEXT: &str = "http://schema.org/";

pub const IMAGE_OBJECT: &str = "ImageObject";
pub const WEB_PAGE: &str = "WebPage";
pub const PERSON: &str = "Person";
pub const STRUCTURED_VALUE: &str = "StructuredValue";

/// `additionalType` marking a `StructuredValue` as a row reference.
pub const ROW_ADDITIONAL_TYPE: &str = "row";

/// Cell values of one row, keyed by column id.
pub type Values = BTreeMap<String, RawValue>;

fn schema_org() -> String {
    SCHEMA_ORG_CONTEXT.to_string()
}

// ════════════════════════════════════════════════════════════════
//  Tagged objects
// ════════════════════════════════════════════════════════════════

/// `{"@type":"ImageObject"}`: image/attachment cell item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageObject {
    #[serde(rename = "@context", default = "schema_org")]
    pub context: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: String,
    /// height, width, status, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `{"@type":"WebPage"}`: link cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebPage {
    #[serde(rename = "@context", default = "schema_org")]
    pub context: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { context: schema_org(), url: url.into(), name: None, extra: Map::new() }
    }
}

/// `{"@type":"Person"}`: person cell.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Person {
    #[serde(rename = "@context", default = "schema_org")]
    pub context: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Person {
    pub fn named(name: impl Into<String>) -> Self {
        Self { context: schema_org(), name: name.into(), email: None, extra: Map::new() }
    }
}

/// Foreign key into another (or the same) table:
/// `{"@type":"StructuredValue","additionalType":"row", tableId, rowId, ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowReference {
    #[serde(rename = "@context", default = "schema_org")]
    pub context: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    pub table_id: String,
    pub row_id: String,
    #[serde(default)]
    pub table_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RowReference {
    /// Cache / cycle-detection key: `tableId:rowId`.
    pub fn key(&self) -> String {
        reference_key(&self.table_id, &self.row_id)
    }
}

pub fn reference_key(table_id: &str, row_id: &str) -> String {
    format!("{table_id}:{row_id}")
}

/// Data of a referenced row embedded into a reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRow {
    pub id: String,
    pub values: Values,
}

/// Row reference joined with the referenced row's (expanded) values.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRowReference {
    pub reference: RowReference,
    pub values: ExpandedRow,
}

// ════════════════════════════════════════════════════════════════
//  RawValue
// ════════════════════════════════════════════════════════════════

/// Значение ячейки в rich-формате.
///
/// На проводе tagged-объекты различаются по полю `@type` (и
/// `additionalType` для ссылок на строки); здесь это явные варианты.
/// Неизвестные `@type` и объекты, не прошедшие разбор, остаются `Object`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Image(ImageObject),
    WebPage(WebPage),
    Person(Person),
    RowReference(RowReference),
    ExpandedRowReference(ExpandedRowReference),
    List(Vec<RawValue>),
    Object(Values),
}

impl RawValue {
    pub fn int(n: i64) -> Self {
        RawValue::Number(n.into())
    }

    /// Null or the empty string: the two shapes the API uses for blank cells.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The reference carried by a plain or expanded row reference.
    pub fn as_row_reference(&self) -> Option<&RowReference> {
        match self {
            RawValue::RowReference(r) => Some(r),
            RawValue::ExpandedRowReference(e) => Some(&e.reference),
            _ => None,
        }
    }

    pub fn is_row_reference(&self) -> bool {
        self.as_row_reference().is_some()
    }

    pub fn to_json(&self) -> Value {
        match self {
            RawValue::Null => Value::Null,
            RawValue::Bool(b) => Value::Bool(*b),
            RawValue::Number(n) => Value::Number(n.clone()),
            RawValue::String(s) => Value::String(s.clone()),
            RawValue::Image(img) => Value::Object(image_to_map(img)),
            RawValue::WebPage(page) => Value::Object(web_page_to_map(page)),
            RawValue::Person(person) => Value::Object(person_to_map(person)),
            RawValue::RowReference(r) => Value::Object(reference_to_map(r)),
            RawValue::ExpandedRowReference(e) => {
                let mut map = reference_to_map(&e.reference);
                let mut inner = Map::new();
                inner.insert("id".into(), Value::String(e.values.id.clone()));
                inner.insert("values".into(), values_to_json(&e.values.values));
                map.insert("values".into(), Value::Object(inner));
                Value::Object(map)
            }
            RawValue::List(items) => Value::Array(items.iter().map(RawValue::to_json).collect()),
            RawValue::Object(map) => values_to_json(map),
        }
    }
}

pub fn values_to_json(values: &Values) -> Value {
    Value::Object(values.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

pub fn values_from_json(map: Map<String, Value>) -> Values {
    map.into_iter().map(|(k, v)| (k, RawValue::from(v))).collect()
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => RawValue::Number(n),
            Value::String(s) => RawValue::String(s),
            Value::Array(items) => RawValue::List(items.into_iter().map(RawValue::from).collect()),
            Value::Object(map) => from_object(map),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl Serialize for RawValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(RawValue::from)
    }
}

// ── wire decoding ──

fn from_object(map: Map<String, Value>) -> RawValue {
    let tag = map.get("@type").and_then(Value::as_str).map(str::to_owned);
    let tagged = match tag.as_deref() {
        Some(IMAGE_OBJECT) => decode_tagged(&map, &["@type"]).map(RawValue::Image),
        Some(WEB_PAGE) => decode_tagged(&map, &["@type"]).map(RawValue::WebPage),
        Some(PERSON) => decode_tagged(&map, &["@type"]).map(RawValue::Person),
        Some(STRUCTURED_VALUE)
            if map.get("additionalType").and_then(Value::as_str) == Some(ROW_ADDITIONAL_TYPE) =>
        {
            decode_reference(&map)
        }
        _ => None,
    };
    tagged.unwrap_or_else(|| RawValue::Object(values_from_json(map)))
}

fn decode_tagged<T: DeserializeOwned>(map: &Map<String, Value>, strip: &[&str]) -> Option<T> {
    let mut stripped = map.clone();
    for key in strip {
        stripped.remove(*key);
    }
    serde_json::from_value(Value::Object(stripped)).ok()
}

fn decode_reference(map: &Map<String, Value>) -> Option<RawValue> {
    match map.get("values") {
        Some(Value::Object(joined)) => {
            let reference: RowReference =
                decode_tagged(map, &["@type", "additionalType", "values"])?;
            let id = joined.get("id")?.as_str()?.to_string();
            let values = match joined.get("values") {
                Some(Value::Object(v)) => values_from_json(v.clone()),
                _ => Values::new(),
            };
            Some(RawValue::ExpandedRowReference(ExpandedRowReference {
                reference,
                values: ExpandedRow { id, values },
            }))
        }
        _ => decode_tagged(map, &["@type", "additionalType"]).map(RawValue::RowReference),
    }
}

// ── wire encoding ──

fn tagged_map(extra: &Map<String, Value>, context: &str, tag: &str) -> Map<String, Value> {
    let mut map = extra.clone();
    map.insert("@context".into(), Value::String(context.to_string()));
    map.insert("@type".into(), Value::String(tag.to_string()));
    map
}

fn image_to_map(img: &ImageObject) -> Map<String, Value> {
    let mut map = tagged_map(&img.extra, &img.context, IMAGE_OBJECT);
    if let Some(name) = &img.name {
        map.insert("name".into(), Value::String(name.clone()));
    }
    map.insert("url".into(), Value::String(img.url.clone()));
    map
}

fn web_page_to_map(page: &WebPage) -> Map<String, Value> {
    let mut map = tagged_map(&page.extra, &page.context, WEB_PAGE);
    map.insert("url".into(), Value::String(page.url.clone()));
    if let Some(name) = &page.name {
        map.insert("name".into(), Value::String(name.clone()));
    }
    map
}

fn person_to_map(person: &Person) -> Map<String, Value> {
    let mut map = tagged_map(&person.extra, &person.context, PERSON);
    map.insert("name".into(), Value::String(person.name.clone()));
    if let Some(email) = &person.email {
        map.insert("email".into(), Value::String(email.clone()));
    }
    map
}

fn reference_to_map(r: &RowReference) -> Map<String, Value> {
    let mut map = tagged_map(&r.extra, &r.context, STRUCTURED_VALUE);
    map.insert("additionalType".into(), Value::String(ROW_ADDITIONAL_TYPE.into()));
    map.insert("name".into(), Value::String(r.name.clone()));
    map.insert("url".into(), Value::String(r.url.clone()));
    map.insert("tableId".into(), Value::String(r.table_id.clone()));
    map.insert("rowId".into(), Value::String(r.row_id.clone()));
    map.insert("tableUrl".into(), Value::String(r.table_url.clone()));
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reference_json(table: &str, row: &str) -> Value {
        json!({
            "@context": "http://schema.org/",
            "@type": "StructuredValue",
            "additionalType": "row",
            "name": "Apple",
            "url": format!("https://coda.io/d/_dDoc#_tu{table}/_ru{row}"),
            "tableId": table,
            "rowId": row,
            "tableUrl": format!("https://coda.io/d/_dDoc#_tu{table}"),
        })
    }

    #[test]
    fn decodes_tagged_objects() {
        let link = RawValue::from(json!({
            "@context": "http://schema.org/",
            "@type": "WebPage",
            "url": "https://example.com",
        }));
        assert_eq!(link, RawValue::WebPage(WebPage::new("https://example.com")));

        let person = RawValue::from(json!({
            "@context": "http://schema.org/",
            "@type": "Person",
            "name": "Ada",
            "email": "ada@example.com",
        }));
        match person {
            RawValue::Person(p) => {
                assert_eq!(p.name, "Ada");
                assert_eq!(p.email.as_deref(), Some("ada@example.com"));
                assert!(p.extra.is_empty());
            }
            other => panic!("expected person, got {other:?}"),
        }

        let image = RawValue::from(json!({
            "@context": "http://schema.org/",
            "@type": "ImageObject",
            "name": "logo.png",
            "url": "https://codahosted.io/logo.png",
            "height": 64,
            "width": 64,
            "status": "live",
        }));
        match image {
            RawValue::Image(img) => {
                assert_eq!(img.url, "https://codahosted.io/logo.png");
                assert_eq!(img.extra.get("status"), Some(&json!("live")));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn decodes_row_reference() {
        let value = RawValue::from(reference_json("grid-fruit", "i-apple"));
        let r = value.as_row_reference().expect("row reference");
        assert_eq!(r.key(), "grid-fruit:i-apple");
        assert!(r.extra.is_empty());
        assert!(matches!(value, RawValue::RowReference(_)));
    }

    #[test]
    fn structured_value_without_row_type_stays_generic() {
        let value = RawValue::from(json!({
            "@context": "http://schema.org/",
            "@type": "MonetaryAmount",
            "currency": "USD",
            "amount": 12.5,
        }));
        match value {
            RawValue::Object(map) => {
                assert_eq!(map.get("@type"), Some(&RawValue::from("MonetaryAmount")));
            }
            other => panic!("expected generic object, got {other:?}"),
        }

        // row-tagged but missing ids: not a usable reference
        let broken = RawValue::from(json!({
            "@type": "StructuredValue",
            "additionalType": "row",
            "name": "dangling",
        }));
        assert!(matches!(broken, RawValue::Object(_)));
    }

    #[test]
    fn expanded_reference_wire_form() {
        let mut values = Values::new();
        values.insert("c-name".into(), RawValue::from("Apple"));
        let reference = match RawValue::from(reference_json("grid-fruit", "i-apple")) {
            RawValue::RowReference(r) => r,
            other => panic!("expected reference, got {other:?}"),
        };
        let expanded = RawValue::ExpandedRowReference(ExpandedRowReference {
            reference,
            values: ExpandedRow { id: "i-apple".into(), values },
        });

        let wire = expanded.to_json();
        assert_eq!(wire["additionalType"], json!("row"));
        assert_eq!(wire["values"], json!({"id": "i-apple", "values": {"c-name": "Apple"}}));
        assert_eq!(RawValue::from(wire), expanded);
    }

    #[test]
    fn empty_link_wire_form() {
        let page = RawValue::WebPage(WebPage::new(""));
        assert_eq!(
            page.to_json(),
            json!({"@context": "http://schema.org/", "@type": "WebPage", "url": ""})
        );
    }

    #[test]
    fn blank_detection() {
        assert!(RawValue::Null.is_blank());
        assert!(RawValue::from("").is_blank());
        assert!(!RawValue::from(" ").is_blank());
        assert!(!RawValue::int(0).is_blank());
    }
}
