// ABOUTME: Native property bag built from an attribute set
// ABOUTME: Validates property names the way the native client does

use crate::attributes::Attributes;
use crate::error::{ErrorCode, SUCCESS};

/// Property list handed to a [`SoundBackend`](super::SoundBackend)
///
/// Each call builds its own list and drops it before returning, so a backend
/// only ever borrows one for the duration of a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropList {
    entries: Vec<(String, String)>,
}

impl PropList {
    /// Create an empty property list
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string property, returning a native status
    ///
    /// Keys must be non-empty and contain only ASCII letters, digits, `.`,
    /// `_` and `-`; anything else yields [`ErrorCode::Invalid`].
    pub fn sets(&mut self, key: &str, value: &str) -> i32 {
        if !is_valid_name(key) {
            return ErrorCode::Invalid.code();
        }
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
        SUCCESS
    }

    /// Build a property list holding every attribute in `attrs`
    pub fn from_attributes(attrs: &Attributes) -> Result<Self, ErrorCode> {
        let mut list = PropList::new();
        for (key, value) in attrs.iter() {
            let status = list.sets(key, value);
            if status != SUCCESS {
                log::debug!("Rejected property {:?}", key);
                return Err(ErrorCode::from_code(status).unwrap_or(ErrorCode::Internal));
            }
        }
        Ok(list)
    }

    /// Look up a property
    pub fn gets(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check for a property
    pub fn contains(&self, key: &str) -> bool {
        self.gets(key).is_some()
    }

    /// Iterate over properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy back into an attribute set
    pub fn to_attributes(&self) -> Attributes {
        self.iter().collect()
    }
}

fn is_valid_name(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
