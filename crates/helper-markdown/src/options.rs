//! Configuration layers.
//!
//! An [`Options`] value is one layer of configuration: a shallow map from
//! option name to JSON value, plus an optional highlight function. Layers
//! are merged left to right by the resolver; see [`crate::resolve`].
//!
//! Keys the renderer does not know are kept as-is, so a layer can carry
//! options meant for other consumers of the same map.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Recognized option names.
pub mod keys {
    /// Allow raw HTML passthrough.
    pub const HTML: &str = "html";
    /// Convert single newlines into line breaks.
    pub const BREAKS: &str = "breaks";
    /// Turn bare URLs and emails into links.
    pub const LINKIFY: &str = "linkify";
    /// CSS class prefix for fenced code blocks.
    pub const LANG_PREFIX: &str = "langPrefix";
    /// Legacy alias of [`LANG_PREFIX`].
    pub const LANG: &str = "lang";
    /// Highlight function, or a falsy value to disable highlighting.
    pub const HIGHLIGHT: &str = "highlight";
    /// Smart quotes and dashes.
    pub const TYPOGRAPHER: &str = "typographer";
    /// Self-closing `<br />` and `<hr />`.
    pub const XHTML_OUT: &str = "xhtmlOut";
}

/// Caller-supplied highlight function, called as `(code, lang)`.
pub type HighlightFn = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// One layer of configuration.
#[derive(Clone, Default)]
pub struct Options {
    values: Map<String, Value>,
    highlight: Option<HighlightFn>,
}

impl Options {
    /// Create an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, builder style.
    ///
    /// ```
    /// use helper_markdown::Options;
    ///
    /// let options = Options::new().set("linkify", true).set("langPrefix", "lang-");
    /// assert_eq!(options.get("langPrefix").and_then(|v| v.as_str()), Some("lang-"));
    /// ```
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Get a value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Check whether a value is set for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Install a highlight function.
    ///
    /// A highlight function replaces the built-in highlighter entirely,
    /// including its fallback handling.
    #[must_use]
    pub fn with_highlight<F>(mut self, highlight: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        self.highlight = Some(Arc::new(highlight));
        self.values.remove(keys::HIGHLIGHT);
        self
    }

    /// The installed highlight function, if any.
    pub fn highlight(&self) -> Option<&HighlightFn> {
        self.highlight.as_ref()
    }

    /// True when the layer sets nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.highlight.is_none()
    }

    /// Iterate over the plain values of this layer.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// The plain values as a JSON map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Shallow-merge `other` into `self`; keys in `other` win.
    ///
    /// A `highlight` value in `other` clears a highlight function from an
    /// earlier layer, and a highlight function in `other` replaces any
    /// earlier `highlight` value.
    pub fn merge(&mut self, other: &Options) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
        if other.values.contains_key(keys::HIGHLIGHT) {
            self.highlight = None;
        }
        if let Some(highlight) = &other.highlight {
            self.highlight = Some(Arc::clone(highlight));
            self.values.remove(keys::HIGHLIGHT);
        }
    }

    /// Parse a layer from a TOML table.
    ///
    /// ```
    /// use helper_markdown::Options;
    ///
    /// let options = Options::from_toml_str("linkify = true\nlangPrefix = \"lang-\"").unwrap();
    /// assert_eq!(options.get("linkify"), Some(&serde_json::Value::Bool(true)));
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let values: Map<String, Value> = toml::from_str(text)?;
        Ok(Self::from(values))
    }

    /// Parse a layer from a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        match serde_json::from_str(text)? {
            Value::Object(values) => Ok(Self::from(values)),
            other => Err(ConfigError::NotATable(json_kind(&other))),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("values", &self.values)
            .field("highlight", &self.highlight.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl From<Map<String, Value>> for Options {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            values,
            highlight: None,
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Options {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self::from(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect::<Map<_, _>>(),
        )
    }
}

/// JavaScript-style truthiness of an option value.
///
/// `null`, `false`, `0` and `""` are false; everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of an option value; `null` becomes the empty string.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_later_layer_wins() {
        let mut base = Options::new().set("html", true).set("breaks", true);
        base.merge(&Options::new().set("html", false).set("typographer", true));

        assert_eq!(base.get("html"), Some(&json!(false)));
        assert_eq!(base.get("breaks"), Some(&json!(true)));
        assert_eq!(base.get("typographer"), Some(&json!(true)));
    }

    #[test]
    fn test_merge_keeps_unknown_keys() {
        let mut base = Options::new();
        base.merge(&Options::new().set("quotes", "«»"));
        assert_eq!(base.get("quotes"), Some(&json!("«»")));
    }

    #[test]
    fn test_merge_highlight_value_clears_function() {
        let mut base = Options::new().with_highlight(|code, _| code.to_owned());
        base.merge(&Options::new().set("highlight", false));

        assert!(base.highlight().is_none());
        assert_eq!(base.get("highlight"), Some(&json!(false)));
    }

    #[test]
    fn test_merge_highlight_function_replaces_value() {
        let mut base = Options::new().set("highlight", false);
        base.merge(&Options::new().with_highlight(|_, _| String::new()));

        assert!(base.highlight().is_some());
        assert!(!base.contains_key("highlight"));
    }

    #[test]
    fn test_merge_does_not_touch_other() {
        let other = Options::new().set("html", false);
        let mut base = Options::new().set("html", true);
        base.merge(&other);
        base.insert("breaks", false);

        assert!(!other.contains_key("breaks"));
    }

    #[test]
    fn test_is_empty() {
        assert!(Options::new().is_empty());
        assert!(!Options::new().set("html", true).is_empty());
        assert!(!Options::new().with_highlight(|c, _| c.to_owned()).is_empty());
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("lang-")), "lang-");
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!(7)), "7");
    }

    #[test]
    fn test_from_toml_str() {
        let options = Options::from_toml_str("breaks = false\nlangPrefix = \"hl-\"\n").unwrap();
        assert_eq!(options.get("breaks"), Some(&json!(false)));
        assert_eq!(options.get("langPrefix"), Some(&json!("hl-")));
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let err = Options::from_toml_str("breaks = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_from_json_str() {
        let options = Options::from_json_str(r#"{"linkify": true, "extra": [1, 2]}"#).unwrap();
        assert_eq!(options.get("linkify"), Some(&json!(true)));
        assert_eq!(options.get("extra"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_from_json_str_not_an_object() {
        let err = Options::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::NotATable("an array")));
        assert_eq!(
            err.to_string(),
            "Configuration error: expected a table of options, found an array"
        );
    }

    #[test]
    fn test_from_iterator() {
        let options: Options = [("html", json!(false)), ("lang", json!("x-"))]
            .into_iter()
            .collect();
        assert_eq!(options.get("lang"), Some(&json!("x-")));
    }
}
