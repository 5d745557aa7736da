//! Shared key/value state for one flow run.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// Key/value state visible to every step of a run.
///
/// Actions only ever see a snapshot; writes happen in the executor when a
/// step completes, so no key is removed while the run is live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
  values: HashMap<String, serde_json::Value>,
}

impl Context {
  /// Create an empty context.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a context from key/value pairs.
  pub fn from_entries<K, I>(entries: I) -> Self
  where
    K: Into<String>,
    I: IntoIterator<Item = (K, serde_json::Value)>,
  {
    Self {
      values: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
    }
  }

  /// Get a value by key.
  pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
    self.values.get(key)
  }

  /// Get a value by key and deserialize it.
  pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ContextError> {
    self
      .values
      .get(key)
      .map(|v| {
        serde_json::from_value(v.clone()).map_err(|source| ContextError::Decode {
          key: key.to_string(),
          source,
        })
      })
      .transpose()
  }

  /// Check whether a key is present.
  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.values.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }

  /// Render the whole context as a JSON object.
  pub fn to_json(&self) -> serde_json::Value {
    serde_json::Value::Object(
      self
        .values
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect(),
    )
  }

  /// Write a step result. Only the executor calls this.
  ///
  /// Returns the previous value if the key was already present.
  pub(crate) fn merge(
    &mut self,
    key: impl Into<String>,
    value: serde_json::Value,
  ) -> Option<serde_json::Value> {
    self.values.insert(key.into(), value)
  }

  /// Add every entry of `other`, replacing existing keys.
  pub(crate) fn extend(&mut self, other: Context) {
    self.values.extend(other.values);
  }
}

impl From<serde_json::Map<String, serde_json::Value>> for Context {
  fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
    Self::from_entries(map)
  }
}

impl<K: Into<String>, const N: usize> From<[(K, serde_json::Value); N]> for Context {
  fn from(entries: [(K, serde_json::Value); N]) -> Self {
    Self::from_entries(entries)
  }
}

impl TryFrom<serde_json::Value> for Context {
  type Error = ContextError;

  fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
    match value {
      serde_json::Value::Object(map) => Ok(map.into()),
      serde_json::Value::Null => Err(ContextError::NotAnObject { kind: "null" }),
      serde_json::Value::Bool(_) => Err(ContextError::NotAnObject { kind: "boolean" }),
      serde_json::Value::Number(_) => Err(ContextError::NotAnObject { kind: "number" }),
      serde_json::Value::String(_) => Err(ContextError::NotAnObject { kind: "string" }),
      serde_json::Value::Array(_) => Err(ContextError::NotAnObject { kind: "array" }),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_get_returns_seeded_value() {
    let ctx = Context::from([("flag", json!(false))]);

    assert_eq!(ctx.get("flag"), Some(&json!(false)));
    assert_eq!(ctx.get("missing"), None);
  }

  #[test]
  fn test_repeated_reads_are_identical() {
    let ctx = Context::from([("name", json!("demo"))]);

    let first = ctx.get("name").cloned();
    let second = ctx.get("name").cloned();
    assert_eq!(first, second);
  }

  #[test]
  fn test_merge_reports_previous_value() {
    let mut ctx = Context::new();
    assert_eq!(ctx.merge("a", json!(1)), None);
    assert_eq!(ctx.merge("a", json!(2)), Some(json!(1)));
    assert_eq!(ctx.get("a"), Some(&json!(2)));
  }

  #[test]
  fn test_get_as_decodes_typed_value() {
    let ctx = Context::from([("services", json!(["postgres", "redis"]))]);

    let services: Vec<String> = ctx.get_as("services").unwrap().unwrap();
    assert_eq!(services, vec!["postgres", "redis"]);

    let bad: Result<Option<u32>, _> = ctx.get_as("services");
    assert!(matches!(bad, Err(ContextError::Decode { .. })));
  }

  #[test]
  fn test_try_from_rejects_non_objects() {
    let err = Context::try_from(json!([1, 2])).unwrap_err();
    assert!(matches!(err, ContextError::NotAnObject { kind: "array" }));

    let ctx = Context::try_from(json!({"a": 1})).unwrap();
    assert_eq!(ctx.len(), 1);
  }

  #[test]
  fn test_to_json_round_trips_entries() {
    let ctx = Context::from([("a", json!(1)), ("b", json!("two"))]);
    assert_eq!(ctx.to_json(), json!({"a": 1, "b": "two"}));
  }
}
