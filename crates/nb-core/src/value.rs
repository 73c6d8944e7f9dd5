//! The nested value model.
//!
//! A [`Value`] is either a leaf (null, bool, integer, float, string) or an
//! internal node (map, list, tuple, record).

use std::fmt;

use indexmap::IndexMap;

use crate::path::Key;
use crate::record::Record;

/// Ordered mapping node. Equality ignores insertion order.
pub type Map = IndexMap<String, Value>;

/// A nested value.
///
/// # Example
/// ```
/// use nb_core::Value;
/// let v = Value::from(serde_json::json!({"a": 1, "c": {"b": [1, 2]}}));
/// assert!(v.is_map());
/// assert_eq!(v.to_string(), r#"{"a": 1, "c": {"b": [1, 2]}}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    // Leaves
    /// Absent / null value.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),

    // Internal nodes
    /// Key → value mapping.
    Map(Map),
    /// Mutable-by-convention ordered sequence.
    List(Vec<Value>),
    /// Fixed ordered sequence, rebuilt as a tuple when types are kept.
    Tuple(Vec<Value>),
    /// Fixed-field record.
    Record(Box<dyn Record>),
}

impl Value {
    /// True for [`Value::Map`].
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Borrow as a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow list or tuple items.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Numeric view of `Int` and `Float` leaves.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Truthiness: null, `false`, zero, the empty string and empty
    /// containers are falsy; records are always truthy.
    ///
    /// # Example
    /// ```
    /// use nb_core::Value;
    /// assert!(!Value::Int(0).is_truthy());
    /// assert!(Value::Str("true!".into()).is_truthy());
    /// assert!(!Value::List(vec![]).is_truthy());
    /// ```
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Record(_) => true,
        }
    }

    /// Index one step down.
    ///
    /// Maps are indexed by the key text, sequences by position (digit-only
    /// names included), records by field name. Leaves have no children.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key.as_map_key().as_ref()),
            Value::List(items) | Value::Tuple(items) => key.as_index().and_then(|i| items.get(i)),
            Value::Record(record) => key.as_name().and_then(|name| record.field(name)),
            _ => None,
        }
    }

    /// Mutable counterpart of [`Value::get`].
    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        match self {
            Value::Map(map) => map.get_mut(key.as_map_key().as_ref()),
            Value::List(items) | Value::Tuple(items) => {
                key.as_index().and_then(|i| items.get_mut(i))
            }
            Value::Record(record) => key.as_name().and_then(|name| record.field_mut(name)),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Map(_) => "map",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Record(record) => record.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
            Value::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::Record(record) => {
                write!(f, "{}(", record.type_name())?;
                for (i, name) in record.field_names().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match record.field(name) {
                        Some(value) => write!(f, "{name}={value}")?,
                        None => write!(f, "{name}=?")?,
                    }
                }
                f.write_str(")")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Map(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            // Non-finite floats have no JSON form.
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
                    .collect(),
            ),
            Value::List(items) | Value::Tuple(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Record(record) => serde_json::Value::Object(
                record
                    .field_names()
                    .iter()
                    .filter_map(|name| {
                        record
                            .field(name)
                            .map(|value| ((*name).to_string(), serde_json::Value::from(value)))
                    })
                    .collect(),
            ),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(toml: toml::Value) -> Self {
        match toml {
            toml::Value::String(s) => Value::Str(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(x) => Value::Float(x),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::Str(dt.to_string()),
            toml::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => Value::Map(
                table
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_equality_ignores_order() {
        let a = Value::from(json!({"x": 1, "y": 2}));
        let b = Value::from(json!({"y": 2, "x": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn json_conversion_keeps_insertion_order() {
        let v = Value::from(json!({"z": 1, "a": [true, null, 1.5, "s"]}));
        assert_eq!(v.to_string(), r#"{"z": 1, "a": [true, null, 1.5, "s"]}"#);
        let back = serde_json::Value::from(&v);
        assert_eq!(back, json!({"z": 1, "a": [true, null, 1.5, "s"]}));
    }

    #[test]
    fn tuple_display() {
        let t = Value::Tuple(vec![Value::Int(10), Value::Int(16)]);
        assert_eq!(t.to_string(), "(10, 16)");
        assert_eq!(Value::Tuple(vec![Value::Int(1)]).to_string(), "(1,)");
    }

    #[test]
    fn get_reaches_into_sequences() {
        let v = Value::from(json!({"g": [1, [2, 3], 4]}));
        let g = v.get(&Key::from("g")).unwrap();
        assert_eq!(
            g.get(&Key::from("1")).unwrap(),
            &Value::List(vec![Value::Int(2), Value::Int(3)])
        );
        assert_eq!(g.get(&Key::Index(2)), Some(&Value::Int(4)));
        assert!(Value::Int(1).get(&Key::Index(0)).is_none());
    }

    #[test]
    fn toml_tables_become_maps() {
        let parsed: toml::Value = toml::from_str("[a]\nb = 1\nc = [1.5]").unwrap();
        let v = Value::from(parsed);
        assert_eq!(v, Value::from(json!({"a": {"b": 1, "c": [1.5]}})));
    }
}
