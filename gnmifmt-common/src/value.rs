//! Dynamically-typed telemetry values and their text rendering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key marking a mapping as a gNMI leaf-list.
const LEAFLIST_KEY: &str = "element";

/// Key holding the typed-value union inside a leaf-list element.
const TYPED_VALUE_KEY: &str = "Value";

/// A decoded telemetry value.
///
/// Mapping keys are kept in lexicographic order so that rendering is stable
/// across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[serde(from = "serde_json::Value")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    // Without arbitrary_precision every remaining number is an f64.
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl Value {
    /// Render the value as a single line of human-readable text.
    ///
    /// Never fails: strings come out verbatim, numbers as plain decimals,
    /// leaf-lists as `[a, b, c]` and any other structure as compact JSON.
    pub fn render(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Uint(u) => u.to_string(),
            // Display for f64 is the shortest round-trip form and never uses an exponent.
            Value::Float(f) => f.to_string(),
            Value::Map(map) => match map.get(LEAFLIST_KEY) {
                Some(Value::Seq(elements)) => render_leaflist(elements),
                _ => self.to_compact_json(),
            },
            Value::Seq(_) => self.to_compact_json(),
        }
    }

    /// The payload of a leaf-list element, if it has the expected shape.
    ///
    /// The element must carry a `Value` mapping with exactly one entry, the
    /// typed-value union (e.g. `{"string_val": "foo"}`).
    pub fn typed_value(&self) -> Option<&Value> {
        let Value::Map(element) = self else {
            return None;
        };
        match element.get(TYPED_VALUE_KEY) {
            Some(Value::Map(union)) if union.len() == 1 => union.values().next(),
            _ => None,
        }
    }

    /// Compact JSON with numbers formatted as [`Value::render`] formats them,
    /// so `3.0` reads `3` at any depth.
    fn to_compact_json(&self) -> String {
        let mut out = String::new();
        self.write_json(&mut out);
        out
    }

    fn write_json(&self, out: &mut String) {
        match self {
            Value::Null => out.push_str("null"),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Int(i) => out.push_str(&i.to_string()),
            Value::Uint(u) => out.push_str(&u.to_string()),
            // JSON has no NaN or infinity.
            Value::Float(f) if !f.is_finite() => out.push_str("null"),
            Value::Float(f) => out.push_str(&f.to_string()),
            Value::String(s) => write_json_string(s, out),
            Value::Seq(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    item.write_json(out);
                }
                out.push(']');
            }
            Value::Map(map) => {
                out.push('{');
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write_json_string(key, out);
                    out.push(':');
                    item.write_json(out);
                }
                out.push('}');
            }
        }
    }
}

fn write_json_string(s: &str, out: &mut String) {
    out.push_str(&serde_json::Value::from(s).to_string());
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Render the elements of a gNMI leaf-list as `[a, b, c]`.
///
/// Elements that do not wrap a single typed value are skipped.
pub fn render_leaflist(elements: &[Value]) -> String {
    let rendered: Vec<String> = elements
        .iter()
        .filter_map(Value::typed_value)
        .map(Value::render)
        .collect();
    format!("[{}]", rendered.join(", "))
}
