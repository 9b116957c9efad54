// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named key/value store scoped to one player.

use crate::value::{Value, ValueKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Player parameters, read by control-flow nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    values: IndexMap<String, Value>,
}

impl Parameters {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Typed value, `None` when missing or of another type
    pub fn get<T: ValueKind>(&self, name: &str) -> Option<T> {
        self.values.get(name).and_then(T::from_value)
    }

    /// Typed value, or the type's default when missing or of another type
    pub fn get_or_default<T: ValueKind + Default>(&self, name: &str) -> T {
        self.get(name).unwrap_or_default()
    }

    /// Untyped value
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Set a typed value, replacing any previous value of any type
    pub fn set<T: ValueKind>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), value.into_value());
    }

    /// Set an untyped value
    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Remove a value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    /// Check if a value exists
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_get_and_set() {
        let mut params = Parameters::new();
        params.set("skip_intro", true);
        params.set("lap", 3);

        assert_eq!(params.get::<bool>("skip_intro"), Some(true));
        assert_eq!(params.get::<i32>("lap"), Some(3));
        assert_eq!(params.get::<f32>("lap"), None);
        assert_eq!(params.get::<bool>("missing"), None);
    }

    #[test]
    fn test_get_or_default() {
        let mut params = Parameters::new();
        assert!(!params.get_or_default::<bool>("flag"));

        params.set("flag", 1.5f32);
        assert!(!params.get_or_default::<bool>("flag"));
        assert_eq!(params.get_or_default::<f32>("flag"), 1.5);
    }

    #[test]
    fn test_set_replaces_type() {
        let mut params = Parameters::new();
        params.set("target", 1);
        params.set("target", String::from("door"));
        assert_eq!(params.len(), 1);
        assert_eq!(params.get::<String>("target").as_deref(), Some("door"));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut params = Parameters::new();
        params.set("a", 1);
        params.set("b", 2);
        params.set("c", 3);
        params.remove("b");

        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(!params.contains("b"));
    }
}
