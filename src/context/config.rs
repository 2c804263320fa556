// ABOUTME: Context configuration
// ABOUTME: Backend, driver, identity and default attributes applied at init

use crate::attributes::Attributes;
use crate::error::ConfigError;
use crate::native::BackendKind;
use serde::Deserialize;
use std::path::Path;

/// Context configuration
///
/// Can be built in code or loaded from JSON:
///
/// ```json
/// {
///   "backend": "null",
///   "driver": "null",
///   "application_id": "org.example.Bell",
///   "attributes": { "canberra.volume": "-6.0" }
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Backend to create when none is supplied explicitly
    pub backend: BackendKind,
    /// Native driver to select before opening (e.g. "pulse", "alsa", "null")
    pub driver: Option<String>,
    /// Overrides the process-wide application name
    pub application_name: Option<String>,
    /// Overrides the registered application id
    pub application_id: Option<String>,
    /// Context-wide attributes applied to every request
    pub attributes: Attributes,
}

impl ContextConfig {
    /// Create a default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Set the backend kind
    pub fn backend(mut self, kind: BackendKind) -> Self {
        self.backend = kind;
        self
    }

    /// Set the native driver
    pub fn driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    /// Set the application name
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Set the application id
    pub fn application_id(mut self, id: impl Into<String>) -> Self {
        self.application_id = Some(id.into());
        self
    }

    /// Add a context-wide attribute
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr;

    #[test]
    fn test_builder() {
        let config = ContextConfig::new()
            .driver("pulse")
            .application_id("org.example.Bell")
            .attribute(attr::CANBERRA_VOLUME, "-6.0");

        assert_eq!(config.backend, BackendKind::Null);
        assert_eq!(config.driver.as_deref(), Some("pulse"));
        assert_eq!(config.application_id.as_deref(), Some("org.example.Bell"));
        assert_eq!(config.attributes.get(attr::CANBERRA_VOLUME), Some("-6.0"));
    }

    #[test]
    fn test_from_json() {
        let config = ContextConfig::from_json(
            r#"{
                "backend": "canberra",
                "application_name": "Bell",
                "attributes": { "canberra.force_channel": "front-left" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Canberra);
        assert_eq!(config.application_name.as_deref(), Some("Bell"));
        assert_eq!(config.driver, None);
        assert_eq!(
            config.attributes.get(attr::CANBERRA_FORCE_CHANNEL),
            Some("front-left")
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        assert!(matches!(
            ContextConfig::from_json(r#"{ "drvier": "pulse" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        let err = ContextConfig::from_file("/nonexistent/gsound.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/gsound.json"));
    }
}
