//! Loader configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-widget configuration forwarded to the frame in `configure` messages.
pub type WidgetOptions = serde_json::Map<String, Value>;

/// What to do when a widget URL has no usable origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginPolicy {
    /// Deliver with the wildcard origin `*` and log a warning.
    #[default]
    Permissive,
    /// Refuse to deliver, and only accept `load` from the exact origin.
    Strict,
}

/// Widget loader options.
///
/// Missing fields fall back to their defaults, so a partial object from the
/// host merges over the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderOptions {
    /// Run `load()` when the page signals it is ready.
    pub autoload: bool,
    /// Marker class identifying placeholders.
    pub class_name: String,
    /// Origin handling for outbound and inbound messages.
    pub origin_policy: OriginPolicy,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            autoload: true,
            class_name: Self::DEFAULT_CLASS_NAME.to_string(),
            origin_policy: OriginPolicy::default(),
        }
    }
}

impl LoaderOptions {
    /// Default placeholder marker class.
    pub const DEFAULT_CLASS_NAME: &'static str = "md-widget";

    /// Parse options from a JSON object, filling gaps with defaults.
    ///
    /// # Errors
    /// Returns error if a present field has the wrong type.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Set `autoload`.
    #[must_use]
    pub const fn with_autoload(mut self, autoload: bool) -> Self {
        self.autoload = autoload;
        self
    }

    /// Set the marker class.
    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Set the origin policy.
    #[must_use]
    pub const fn with_origin_policy(mut self, origin_policy: OriginPolicy) -> Self {
        self.origin_policy = origin_policy;
        self
    }

    /// Class added to a container once its frame has navigated.
    #[must_use]
    pub fn loaded_class(&self) -> String {
        format!("{}-loaded", self.class_name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoaderOptions::default();
        assert!(options.autoload);
        assert_eq!(options.class_name, "md-widget");
        assert_eq!(options.origin_policy, OriginPolicy::Permissive);
        assert_eq!(options.loaded_class(), "md-widget-loaded");
    }

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let options = LoaderOptions::from_json(json!({ "autoload": false })).unwrap();
        assert!(!options.autoload);
        assert_eq!(options.class_name, "md-widget");

        let options = LoaderOptions::from_json(json!({
            "className": "acme-widget",
            "originPolicy": "strict"
        }))
        .unwrap();
        assert!(options.autoload);
        assert_eq!(options.class_name, "acme-widget");
        assert_eq!(options.origin_policy, OriginPolicy::Strict);
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        assert!(LoaderOptions::from_json(json!({ "autoload": "yes" })).is_err());
    }
}
