//! Structured validation error map
//!
//! Keys are field paths: `field` for top-level fields and
//! `records[index].field` for fields of array elements.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Path used when the payload itself is malformed
pub const ROOT_PATH: &str = "$";

/// Build the path of a field inside an array element
pub fn element_path(array: &str, index: usize, field: &str) -> String {
    format!("{}[{}].{}", array, index, field)
}

/// Field path → messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `path`, ignoring exact duplicates
    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        let entry = self.0.entry(path.into()).or_default();
        if !entry.contains(&message) {
            entry.push(message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct failing paths
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// First message for `path`
    pub fn first(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|m| m.first()).map(String::as_str)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Merge another map into this one
    pub fn extend(&mut self, other: ValidationErrors) {
        for (path, messages) in other.0 {
            for message in messages {
                self.add(path.clone(), message);
            }
        }
    }

    /// Convert into `Err(self)` when non-empty
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// All messages joined into one line, for notifications
    pub fn flatten(&self) -> String {
        self.0
            .iter()
            .flat_map(|(path, messages)| messages.iter().map(move |m| format!("{}: {}", path, m)))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.flatten())
    }
}

impl std::error::Error for ValidationErrors {}

impl FromIterator<(String, String)> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut errors = Self::new();
        for (path, message) in iter {
            errors.add(path, message);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_flatten() {
        let mut errors = ValidationErrors::new();
        errors.add("surname", "此字段为必填项");
        errors.add("surname", "此字段为必填项");
        errors.add(element_path("companions", 1, "relationship"), "此字段为必填项");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("surname").unwrap().len(), 1);
        assert!(errors.contains("companions[1].relationship"));
        assert_eq!(
            errors.flatten(),
            "companions[1].relationship: 此字段为必填项; surname: 此字段为必填项"
        );
        assert!(errors.into_result().is_err());
        assert!(ValidationErrors::new().into_result().is_ok());
    }
}
