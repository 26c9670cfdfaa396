use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::path::compose;
use crate::value::Value;

/// One gNMI subscribe notification, as captured on a single NDJSON line.
///
/// Decoding is lenient: field names match regardless of case, unknown fields
/// are ignored and `null` stands for an empty string or an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Target the notification came from (e.g. "router01:6030").
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,

    /// Name of the subscription that produced the notification.
    #[serde(
        rename = "subscription-name",
        default,
        deserialize_with = "null_as_default"
    )]
    pub subscription_name: String,

    /// Unix epoch nanoseconds of the notification.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,

    /// Collector-formatted time string; carried but not used for output.
    #[serde(default, deserialize_with = "null_as_default")]
    pub time: String,

    /// Notification prefix path. Empty when absent.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub prefix: String,

    /// Updates carried by the notification, in wire order.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub updates: Vec<Update>,
}

/// A single path update inside a [`Record`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Update path relative to the record prefix. May be empty.
    #[serde(
        rename(serialize = "Path", deserialize = "path"),
        alias = "Path",
        default,
        deserialize_with = "null_as_default"
    )]
    pub path: String,

    /// Values keyed by their leaf name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: BTreeMap<String, Value>,
}

impl Record {
    /// Decode a record from one line of JSON.
    ///
    /// Field names of the record and of its updates are matched without
    /// regard to case (`Prefix`, `UPDATES`, `path` all work). When two
    /// spellings of one field appear, the one sorting last wins. Keys inside
    /// `values` are left alone.
    pub fn from_slice(line: &[u8]) -> Result<Self> {
        let mut raw: serde_json::Value = serde_json::from_slice(line)?;
        if let serde_json::Value::Object(fields) = &mut raw {
            fold_field_names(fields);
            if let Some(serde_json::Value::Array(updates)) = fields.get_mut("updates") {
                for update in updates {
                    if let serde_json::Value::Object(update_fields) = update {
                        fold_field_names(update_fields);
                    }
                }
            }
        }
        Ok(serde_json::from_value(raw)?)
    }

    /// Full path of `update` under this record's prefix.
    ///
    /// `None` when neither the prefix nor the update carries a path.
    pub fn full_path(&self, update: &Update) -> Option<String> {
        let path = compose(&self.prefix, &update.path);
        (!path.is_empty()).then_some(path)
    }
}

impl Update {
    /// Create an update for `path` with no values.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
        }
    }

    /// Add a value to this update.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

fn fold_field_names(fields: &mut serde_json::Map<String, serde_json::Value>) {
    *fields = std::mem::take(fields)
        .into_iter()
        .map(|(name, value)| (name.to_lowercase(), value))
        .collect();
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
