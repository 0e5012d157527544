//! Conversions between Rust values and DynamoDB attribute values.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};

use crate::error::{StoreError, StoreResult};

/// A DynamoDB item.
pub type Item = HashMap<String, AttributeValue>;

/// Convert a Rust value to an AttributeValue.
pub trait ToAttributeValue {
    fn to_attr(&self) -> AttributeValue;
}

impl ToAttributeValue for String {
    fn to_attr(&self) -> AttributeValue {
        AttributeValue::S(self.clone())
    }
}

impl ToAttributeValue for &str {
    fn to_attr(&self) -> AttributeValue {
        AttributeValue::S(self.to_string())
    }
}

impl ToAttributeValue for i64 {
    fn to_attr(&self) -> AttributeValue {
        AttributeValue::N(self.to_string())
    }
}

impl ToAttributeValue for u32 {
    fn to_attr(&self) -> AttributeValue {
        AttributeValue::N(self.to_string())
    }
}

impl ToAttributeValue for f64 {
    fn to_attr(&self) -> AttributeValue {
        AttributeValue::N(self.to_string())
    }
}

impl ToAttributeValue for bool {
    fn to_attr(&self) -> AttributeValue {
        AttributeValue::Bool(*self)
    }
}

impl ToAttributeValue for Value {
    fn to_attr(&self) -> AttributeValue {
        json_to_attr(self)
    }
}

impl<T: ToAttributeValue> ToAttributeValue for Option<T> {
    fn to_attr(&self) -> AttributeValue {
        match self {
            Some(v) => v.to_attr(),
            None => AttributeValue::Null(true),
        }
    }
}

/// Convert an AttributeValue to a Rust type.
pub trait FromAttributeValue: Sized {
    fn from_attr(value: &AttributeValue) -> Option<Self>;
}

impl FromAttributeValue for String {
    fn from_attr(value: &AttributeValue) -> Option<Self> {
        value.as_s().ok().cloned()
    }
}

impl FromAttributeValue for i64 {
    fn from_attr(value: &AttributeValue) -> Option<Self> {
        let n = value.as_n().ok()?;
        n.parse::<i64>()
            .ok()
            .or_else(|| n.parse::<f64>().ok().map(|f| f as i64))
    }
}

impl FromAttributeValue for u64 {
    fn from_attr(value: &AttributeValue) -> Option<Self> {
        i64::from_attr(value).and_then(|n| u64::try_from(n).ok())
    }
}

impl FromAttributeValue for f64 {
    fn from_attr(value: &AttributeValue) -> Option<Self> {
        value.as_n().ok()?.parse().ok()
    }
}

impl FromAttributeValue for bool {
    fn from_attr(value: &AttributeValue) -> Option<Self> {
        value.as_bool().ok().copied()
    }
}

impl FromAttributeValue for Value {
    fn from_attr(value: &AttributeValue) -> Option<Self> {
        Some(attr_to_json(value))
    }
}

/// Read an optional attribute. `NULL` and type mismatches read as `None`.
pub fn get<T: FromAttributeValue>(item: &Item, key: &str) -> Option<T> {
    item.get(key).and_then(T::from_attr)
}

/// Read a required attribute.
pub fn require<T: FromAttributeValue>(item: &Item, key: &str) -> StoreResult<T> {
    get(item, key).ok_or_else(|| StoreError::invalid_item(format!("missing or invalid `{}`", key)))
}

/// Recursively convert JSON into an AttributeValue.
pub fn json_to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attr).collect()),
        Value::Object(fields) => AttributeValue::M(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), json_to_attr(v)))
                .collect(),
        ),
    }
}

/// Recursively convert an AttributeValue into JSON.
///
/// Binary attributes have no JSON form and read as `null`.
pub fn attr_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => number_to_json(n),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::L(values) => Value::Array(values.iter().map(attr_to_json).collect()),
        AttributeValue::M(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), attr_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => Value::Array(values.iter().map(|n| number_to_json(n)).collect()),
        _ => Value::Null,
    }
}

fn number_to_json(n: &str) -> Value {
    if let Ok(i) = n.parse::<i64>() {
        return Value::Number(i.into());
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_object_becomes_map() {
        let attr = json_to_attr(&json!({
            "captions": {"size": 80, "bold": true},
            "colors": ["#fff", "#000"],
            "title": null
        }));

        let fields = attr.as_m().unwrap();
        let captions = fields["captions"].as_m().unwrap();
        assert_eq!(captions["size"], AttributeValue::N("80".into()));
        assert_eq!(captions["bold"], AttributeValue::Bool(true));
        assert_eq!(fields["colors"].as_l().unwrap().len(), 2);
        assert_eq!(fields["title"], AttributeValue::Null(true));
    }

    #[test]
    fn test_attr_to_json_numbers() {
        assert_eq!(attr_to_json(&AttributeValue::N("42".into())), json!(42));
        assert_eq!(attr_to_json(&AttributeValue::N("1.5".into())), json!(1.5));
        assert_eq!(attr_to_json(&AttributeValue::N("nope".into())), Value::Null);
    }

    #[test]
    fn test_attr_to_json_sets() {
        let ss = AttributeValue::Ss(vec!["a".into(), "b".into()]);
        assert_eq!(attr_to_json(&ss), json!(["a", "b"]));
    }

    #[test]
    fn test_nested_value_survives_conversion() {
        let value = json!({"layout": {"padding": [1, 2.5, "x"], "enabled": false}});
        assert_eq!(attr_to_json(&json_to_attr(&value)), value);
    }

    #[test]
    fn test_get_and_require() {
        let mut item = Item::new();
        item.insert("id".into(), "job-1".to_attr());
        item.insert("createdAt".into(), 1_700_000_000_000i64.to_attr());
        item.insert("videoTitle".into(), None::<String>.to_attr());

        assert_eq!(require::<String>(&item, "id").unwrap(), "job-1");
        assert_eq!(get::<i64>(&item, "createdAt"), Some(1_700_000_000_000));
        assert_eq!(get::<String>(&item, "videoTitle"), None);
        assert!(matches!(
            require::<String>(&item, "userId"),
            Err(StoreError::InvalidItem(_))
        ));
    }

    #[test]
    fn test_float_encoded_integer() {
        assert_eq!(i64::from_attr(&AttributeValue::N("3.0".into())), Some(3));
        assert_eq!(u64::from_attr(&AttributeValue::N("-1".into())), None);
    }
}
