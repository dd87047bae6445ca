//! # Records
//!
//! A [`Record`] is an open field map. Values are restricted to the scalar
//! [`Value`] variants; every comparison goes through [`Value::to_text`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use indexmap::IndexMap;
use std::convert::Infallible;
use std::path::Path;

/// A scalar field value.
///
/// Nested arrays and objects are not representable; deserializing one into a
/// record fails with a [`RecordError::Json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Value {
    /// Canonical text of the value. `Null` has none and never matches.
    pub fn to_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Number(n) => Some(Cow::Owned(number_text(n))),
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        // 2.0 prints as "2"
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = RecordError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => Ok(Value::Number(n)),
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Array(_) => Err(RecordError::NotScalar("array")),
            serde_json::Value::Object(_) => Err(RecordError::NotScalar("object")),
        }
    }
}

/// Errors raised while materializing records.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("failed to read records: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("field values must be scalar, found {0}")]
    NotScalar(&'static str),
    #[error("expected a JSON object")]
    NotObject,
}

/// One directory entry: field name to scalar value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.shift_remove(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Canonical text of `field`, if present and not null.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        self.0.get(field).and_then(Value::to_text)
    }

    /// A new record holding only `field`. The key is kept even when the
    /// source lacks it, with a null value.
    pub fn project(&self, field: &str) -> Record {
        let mut out = Record::new();
        out.insert(field, self.0.get(field).cloned().unwrap_or(Value::Null));
        out
    }

    /// Overwrite fields with those from `patch`, keeping the rest. Existing
    /// fields keep their position; new ones are appended.
    pub fn merge(&mut self, patch: Record) {
        self.0.extend(patch.0);
    }

    /// Parse a JSON array of objects.
    pub fn list_from_json(input: &str) -> Result<Vec<Record>, RecordError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read a JSON array of objects from disk.
    pub fn list_from_path(path: impl AsRef<Path>) -> Result<Vec<Record>, RecordError> {
        let content = std::fs::read_to_string(path)?;
        Self::list_from_json(&content)
    }
}

impl TryFrom<serde_json::Value> for Record {
    type Error = RecordError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let serde_json::Value::Object(map) = value else {
            return Err(RecordError::NotObject);
        };
        map.into_iter()
            .map(|(k, v)| Ok((k, Value::try_from(v)?)))
            .collect()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Record(iter.into_iter().collect())
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Record {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }
}

/// Anything that can hand over the full, unfiltered record list.
///
/// Implemented synchronously: the engine expects a complete snapshot before
/// it starts filtering.
pub trait RecordSource {
    type Error;

    fn fetch_all(&self) -> Result<Vec<Record>, Self::Error>;
}

impl RecordSource for [Record] {
    type Error = Infallible;

    fn fetch_all(&self) -> Result<Vec<Record>, Self::Error> {
        Ok(self.to_vec())
    }
}

impl RecordSource for Vec<Record> {
    type Error = Infallible;

    fn fetch_all(&self) -> Result<Vec<Record>, Self::Error> {
        Ok(self.clone())
    }
}

/// A JSON export on disk, re-read on every fetch.
pub struct JsonExport {
    path: std::path::PathBuf,
}

impl JsonExport {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonExport {
    type Error = RecordError;

    fn fetch_all(&self) -> Result<Vec<Record>, Self::Error> {
        Record::list_from_path(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_text_is_canonical() {
        assert_eq!(Value::from(42).to_text().unwrap(), "42");
        assert_eq!(Value::from(2.0).to_text().unwrap(), "2");
        assert_eq!(Value::from(1.5).to_text().unwrap(), "1.5");
        assert_eq!(Value::from(-7).to_text().unwrap(), "-7");
    }

    #[test]
    fn test_bool_and_null_text() {
        assert_eq!(Value::from(true).to_text().unwrap(), "true");
        assert!(Value::Null.to_text().is_none());
    }

    #[test]
    fn test_deserialize_scalar_record() {
        let r: Record =
            serde_json::from_value(json!({"_id": 1, "email": "a@x.edu", "active": true, "video": null}))
                .unwrap();
        assert_eq!(r.len(), 4);
        assert_eq!(r.text("_id").unwrap(), "1");
        assert!(r.get("video").unwrap().is_null());
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let err = Record::list_from_json(r#"[{"tags": ["a", "b"]}]"#);
        assert!(err.is_err());

        let err = Record::try_from(json!({"meta": {"a": 1}})).unwrap_err();
        assert!(matches!(err, RecordError::NotScalar("object")));
    }

    #[test]
    fn test_project_keeps_absent_key_as_null() {
        let r = Record::from([("email", "a@x.edu")]);
        let p = r.project("role");
        assert_eq!(p.len(), 1);
        assert_eq!(p.get("role"), Some(&Value::Null));
        assert_eq!(serde_json::to_value(&p).unwrap(), json!({"role": null}));
    }

    #[test]
    fn test_merge_overwrites_and_keeps() {
        let mut r = Record::from([("_id", "1"), ("role", "student")]);
        r.merge(Record::from([("role", "admin"), ("email", "a@x.edu")]));
        assert_eq!(r.text("role").unwrap(), "admin");
        assert_eq!(r.text("_id").unwrap(), "1");
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_field_order_survives_round_trip() {
        let input = r#"[{"role":"admin","_id":7,"email":"a@x.edu"}]"#;
        let records = Record::list_from_json(input).unwrap();
        assert_eq!(records[0].fields().collect::<Vec<_>>(), ["role", "_id", "email"]);
        assert_eq!(serde_json::to_string(&records).unwrap(), input);
    }

    #[test]
    fn test_merge_appends_new_fields_in_place() {
        let mut r = Record::from([("role", "student"), ("_id", "1")]);
        r.merge(Record::from([("website_link", "x.edu"), ("role", "admin")]));
        assert_eq!(r.fields().collect::<Vec<_>>(), ["role", "_id", "website_link"]);
        r.remove("_id");
        assert_eq!(r.fields().collect::<Vec<_>>(), ["role", "website_link"]);
    }

    #[test]
    fn test_json_export_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.json");
        std::fs::write(&path, r#"[{"_id": 1}, {"_id": 2}]"#).unwrap();

        let records = JsonExport::new(&path).fetch_all().unwrap();
        assert_eq!(records.len(), 2);
        assert!(JsonExport::new(dir.path().join("missing.json")).fetch_all().is_err());
    }
}
