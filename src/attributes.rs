// ABOUTME: String-keyed attribute set passed to every sound request
// ABOUTME: One map type with adapters for pair lists and associative containers

use crate::error::{Error, ErrorCode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A set of sound attributes, keyed by the names in [`crate::attr`]
///
/// Free-form keys are allowed; the native client validates them when the
/// set is turned into a property list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: BTreeMap<String, String>,
}

impl Attributes {
    /// Create an empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a flat `[key, value, key, value, ...]` list
    ///
    /// A trailing key without a value is rejected with
    /// [`ErrorCode::Invalid`].
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self, Error> {
        if pairs.len() % 2 != 0 {
            return Err(Error::new(ErrorCode::Invalid));
        }
        Ok(pairs
            .chunks_exact(2)
            .map(|pair| (pair[0].as_ref(), pair[1].as_ref()))
            .collect())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Insert a value only when the key is absent
    pub fn insert_default(&mut self, key: &str, value: &str) {
        if !self.entries.contains_key(key) {
            self.entries.insert(key.to_string(), value.to_string());
        }
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Remove a value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Check for a key
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy every attribute from `other`, overriding existing keys
    pub fn extend_from(&mut self, other: &Attributes) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }

    /// Convert into the associative container used by language bindings
    pub fn into_hash_map(self) -> HashMap<String, String> {
        self.entries.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Attributes {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<HashMap<String, String>> for Attributes {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr;

    #[test]
    fn test_from_pairs() {
        let attrs = Attributes::from_pairs(&[
            attr::EVENT_ID,
            "phone-incoming-call",
            attr::CANBERRA_VOLUME,
            "-6.0",
        ])
        .unwrap();

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get(attr::EVENT_ID), Some("phone-incoming-call"));
        assert_eq!(attrs.get(attr::CANBERRA_VOLUME), Some("-6.0"));
    }

    #[test]
    fn test_from_pairs_rejects_dangling_key() {
        let err = Attributes::from_pairs(&[attr::EVENT_ID]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Invalid);
    }

    #[test]
    fn test_hash_map_adapter_matches_pair_adapter() {
        let mut map = HashMap::new();
        map.insert(attr::MEDIA_FILENAME.to_string(), "/x.ogg".to_string());
        map.insert("custom.key".to_string(), "value".to_string());

        let from_map = Attributes::from(map.clone());
        let from_pairs =
            Attributes::from_pairs(&[attr::MEDIA_FILENAME, "/x.ogg", "custom.key", "value"])
                .unwrap();

        assert_eq!(from_map, from_pairs);
        assert_eq!(from_map.into_hash_map(), map);
    }

    #[test]
    fn test_insert_default_keeps_caller_value() {
        let mut attrs = Attributes::new().with(attr::CANBERRA_CACHE_CONTROL, "volatile");
        attrs.insert_default(attr::CANBERRA_CACHE_CONTROL, attr::cache_control::PERMANENT);
        assert_eq!(attrs.get(attr::CANBERRA_CACHE_CONTROL), Some("volatile"));

        let mut attrs = Attributes::new();
        attrs.insert_default(attr::CANBERRA_CACHE_CONTROL, attr::cache_control::PERMANENT);
        assert_eq!(attrs.get(attr::CANBERRA_CACHE_CONTROL), Some("permanent"));
    }

    #[test]
    fn test_json_is_a_plain_object() {
        let attrs = Attributes::from([(attr::EVENT_ID, "bell")]);
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"event.id":"bell"}"#);

        let parsed: Attributes = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, attrs);
    }
}
