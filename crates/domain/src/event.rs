//! Application-defined game events.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An application-defined game occurrence: an unordered mapping of string
/// keys to string values.
///
/// A `GameEvent` has no identity beyond its contents and is owned by the
/// caller until handed to the publisher. Equality is contents equality,
/// which is what the codec round-trip law is stated in terms of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameEvent {
    properties: HashMap<String, String>,
}

impl GameEvent {
    /// Create an empty event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a single property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Look up a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Borrow the underlying property map.
    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over the key/value pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<HashMap<String, String>> for GameEvent {
    fn from(properties: HashMap<String, String>) -> Self {
        Self { properties }
    }
}

impl FromIterator<(String, String)> for GameEvent {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            properties: iter.into_iter().collect(),
        }
    }
}
