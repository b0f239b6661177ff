//! Name-keyed field access for the record evaluator.
//!
//! A [`Record`] answers "what is the value of field `name`?" and optionally
//! names its own kind, which is the alias used when several records are
//! evaluated together (`alias.field`).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::convert::Scalar;
use crate::error::{Error, Result};

/// A field value as stored on a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Bool(bool),
    Text(String),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The comparable form of the value, `None` for null.
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            FieldValue::Int(n) => Some(Scalar::Number(*n as f64)),
            FieldValue::Float(n) => Some(Scalar::Number(*n)),
            FieldValue::Timestamp(t) => Some(Scalar::Timestamp(*t)),
            FieldValue::Bool(b) => Some(Scalar::Bool(*b)),
            FieldValue::Text(s) => Some(Scalar::Text(s.clone())),
            FieldValue::Null => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(value.into())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value.naive_utc())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

/// Field lookup by name.
///
/// Implementations match `name` case-insensitively against each field's
/// declared name and aliases. `None` means the record has no such field,
/// which is different from a field holding [`FieldValue::Null`].
pub trait Record {
    fn field(&self, name: &str) -> Option<FieldValue>;

    /// Alias used to route `alias.field` names when several records are
    /// evaluated together.
    fn kind_name(&self) -> &str {
        ""
    }
}

/// Implement [`Record`] for a struct by listing its fields.
///
/// ```
/// use filtergen::record_fields;
///
/// #[derive(Clone)]
/// struct Member {
///     id: i64,
///     member_id: i64,
///     division: String,
///     score: Option<i32>,
/// }
///
/// record_fields!(Member, "member", |m| {
///     "id" => m.id,
///     "member_id" | "memberId" => m.member_id,
///     "division" => m.division,
///     "score" => m.score,
/// });
/// ```
#[macro_export]
macro_rules! record_fields {
    ($ty:ty, $kind:expr, |$this:ident| { $($($name:literal)|+ => $value:expr),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn field(&self, name: &str) -> Option<$crate::FieldValue> {
                let $this = self;
                $(
                    if [$($name),+].iter().any(|n: &&str| n.eq_ignore_ascii_case(name)) {
                        return Some($crate::FieldValue::from($value.clone()));
                    }
                )*
                None
            }

            fn kind_name(&self) -> &str {
                $kind
            }
        }
    };
}

/// Case-insensitive lookup in a JSON object, exact match first.
fn lookup<'a>(fields: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    fields.get(name).or_else(|| {
        fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        lookup(self, name).map(FieldValue::from)
    }
}

impl Record for HashMap<String, FieldValue> {
    fn field(&self, name: &str) -> Option<FieldValue> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .cloned()
    }
}

/// A JSON object with an optional alias.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonRecord {
    alias: String,
    fields: Map<String, Value>,
}

impl JsonRecord {
    /// Wrap a JSON value. `null` and non-object values are rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self {
                alias: String::new(),
                fields,
            }),
            Value::Null => Err(Error::InvalidData("nil".to_string())),
            _ => Err(Error::InvalidType("object".to_string())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Wrap every element of a JSON array.
    pub fn many_from_json(json: &str) -> Result<Vec<Self>> {
        match serde_json::from_str(json)? {
            Value::Array(items) => items.into_iter().map(Self::from_value).collect(),
            Value::Null => Err(Error::InvalidData("nil".to_string())),
            _ => Err(Error::InvalidType("array".to_string())),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Record for JsonRecord {
    fn field(&self, name: &str) -> Option<FieldValue> {
        lookup(&self.fields, name).map(FieldValue::from)
    }

    fn kind_name(&self) -> &str {
        &self.alias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone)]
    struct Account {
        id: i64,
        division: String,
        score: Option<i32>,
    }

    record_fields!(Account, "account", |a| {
        "id" => a.id,
        "division" | "dept" => a.division,
        "score" => a.score,
    });

    #[test]
    fn test_macro_lookup_is_case_insensitive() {
        let account = Account {
            id: 7,
            division: "finance".into(),
            score: None,
        };
        assert_eq!(account.field("ID"), Some(FieldValue::Int(7)));
        assert_eq!(account.field("Dept"), Some(FieldValue::Text("finance".into())));
        assert_eq!(account.field("score"), Some(FieldValue::Null));
        assert_eq!(account.field("brand"), None);
        assert_eq!(account.kind_name(), "account");
    }

    #[test]
    fn test_json_record_shapes() {
        assert!(matches!(
            JsonRecord::from_value(Value::Null),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            JsonRecord::from_value(json!([1, 2])),
            Err(Error::InvalidType(_))
        ));

        let record = JsonRecord::from_value(json!({
            "Id": 1,
            "price": 12.5,
            "name": "budi",
            "active": true,
            "tags": ["a"],
            "gone": null
        }))
        .unwrap()
        .with_alias("member");

        assert_eq!(record.kind_name(), "member");
        assert_eq!(record.field("id"), Some(FieldValue::Int(1)));
        assert_eq!(record.field("price"), Some(FieldValue::Float(12.5)));
        assert_eq!(record.field("NAME"), Some(FieldValue::Text("budi".into())));
        assert_eq!(record.field("active"), Some(FieldValue::Bool(true)));
        assert_eq!(record.field("tags"), Some(FieldValue::Text(r#"["a"]"#.into())));
        assert_eq!(record.field("gone"), Some(FieldValue::Null));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn test_many_from_json() {
        let records = JsonRecord::many_from_json(r#"[{"id":1},{"id":2}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert!(matches!(
            JsonRecord::many_from_json(r#"{"id":1}"#),
            Err(Error::InvalidType(_))
        ));
        assert!(matches!(
            JsonRecord::many_from_json("null"),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn test_hash_map_record() {
        let mut record = HashMap::new();
        record.insert("member_id".to_string(), FieldValue::from(45));
        assert_eq!(record.field("MEMBER_ID"), Some(FieldValue::Int(45)));
    }

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(FieldValue::Int(3).to_scalar(), Some(Scalar::Number(3.0)));
        assert_eq!(FieldValue::Null.to_scalar(), None);
        assert!(FieldValue::from(None::<i32>).is_null());
    }
}
