//! Values produced by constant evaluation

use crate::name::FullyQualifiedName;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// Key of a PHP array
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    Int(i64),
    String(String),
}

impl ArrayKey {
    /// Normalize a string key: decimal integer strings become integer keys
    pub fn from_string(s: String) -> Self {
        let canonical = s == "0" || !(s.starts_with('0') || s.starts_with("-0") || s.starts_with('+'));
        if canonical {
            if let Ok(n) = s.parse::<i64>() {
                return ArrayKey::Int(n);
            }
        }
        ArrayKey::String(s)
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(n) => write!(f, "{}", n),
            ArrayKey::String(s) => f.write_str(s),
        }
    }
}

/// A statically known PHP value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Ordered key/value pairs
    Array(Vec<(ArrayKey, Value)>),
    /// An instance of the named class. Used to describe instance-check
    /// arguments; constant evaluation never produces it.
    Object(FullyQualifiedName),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// PHP truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !(s.is_empty() || s == "0"),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Look up an array element
    pub fn get(&self, key: &ArrayKey) -> Option<&Value> {
        match self {
            Value::Array(items) => items.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Whether the array keys are exactly `0..n`
    pub fn is_list(&self) -> bool {
        match self {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .all(|(i, (k, _))| *k == ArrayKey::Int(i as i64)),
            _ => false,
        }
    }
}

/// Insert into an array with PHP semantics: an existing key is overwritten
/// in place, a missing key appends, `None` uses the next integer index.
pub fn array_insert(items: &mut Vec<(ArrayKey, Value)>, key: Option<ArrayKey>, value: Value) {
    let key = key.unwrap_or_else(|| {
        let next = items
            .iter()
            .filter_map(|(k, _)| match k {
                ArrayKey::Int(n) => Some(*n),
                ArrayKey::String(_) => None,
            })
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(0);
        ArrayKey::Int(next)
    });

    if let Some(slot) = items.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        items.push((key, value));
    }
}

/// Format a float the way PHP's string conversion does
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{}", f as i64);
    }
    format!("{}", f)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::String(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::Array(items) => {
                f.write_str("[")?;
                let list = self.is_list();
                for (i, (k, v)) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if !list {
                        match k {
                            ArrayKey::Int(n) => write!(f, "{} => ", n)?,
                            ArrayKey::String(s) => write!(f, "'{}' => ", s)?,
                        }
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Value::Object(class) => write!(f, "object({})", class),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) if self.is_list() => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for (_, v) in items {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Value::Array(items) => {
                let mut map = serializer.serialize_map(Some(items.len()))?;
                for (k, v) in items {
                    map.serialize_entry(&k.to_string(), v)?;
                }
                map.end()
            }
            Value::Object(class) => serializer.serialize_str(class.as_str()),
        }
    }
}
