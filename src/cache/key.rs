//! Cache Key Module
//!
//! Builds deterministic string keys from a base namespace and a parameter bag.

use serde_json::Value;

// == Public Constants ==
/// Separator used when a bag does not name one
pub const DEFAULT_SEPARATOR: &str = ":";

/// Keys longer than this (in characters) are rejected
pub const MAX_KEY_LENGTH: usize = 250;

// == Param Bag ==
/// Ordered set of named parameters plus optional prefix, suffix and separator.
///
/// Parameters keep insertion order, which is the order they appear in the
/// key. Setting an existing name again replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamBag {
    prefix: Option<String>,
    suffix: Option<String>,
    separator: Option<String>,
    params: Vec<(String, Value)>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Adds or replaces a named parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    /// Adds a parameter only when a value is present.
    pub fn opt_param<V: Into<Value>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(name, v),
            None => self,
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn separator_str(&self) -> &str {
        self.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR)
    }
}

// == Build Key ==
/// Composes `[prefix, base, name<sep>value..., suffix]` joined by the separator.
///
/// Null parameters are skipped. Strings are used verbatim, arrays and objects
/// are JSON-encoded, everything else uses its JSON text. Parameter values are
/// escaped so they can never contain the separator or whitespace: `%` becomes
/// `%25`, and each separator or whitespace byte is percent-encoded.
pub fn build_key(base: &str, bag: &ParamBag) -> String {
    let sep = bag.separator_str();
    let mut parts: Vec<String> = Vec::with_capacity(bag.params.len() + 3);

    if let Some(prefix) = &bag.prefix {
        parts.push(prefix.clone());
    }
    parts.push(base.to_string());

    for (name, value) in &bag.params {
        if let Some(text) = stringify(value) {
            parts.push(format!("{}{}{}", name, sep, escape(&text, sep)));
        }
    }

    if let Some(suffix) = &bag.suffix {
        parts.push(suffix.clone());
    }

    parts.join(sep)
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn escape(text: &str, sep: &str) -> String {
    let mut escaped = text.replace('%', "%25");
    if !sep.is_empty() {
        escaped = escaped.replace(sep, &percent_encode(sep));
    }
    if escaped.chars().any(char::is_whitespace) {
        escaped = escaped
            .chars()
            .map(|c| {
                if c.is_whitespace() {
                    percent_encode(c.encode_utf8(&mut [0; 4]))
                } else {
                    c.to_string()
                }
            })
            .collect();
    }
    escaped
}

fn percent_encode(text: &str) -> String {
    text.bytes().map(|b| format!("%{:02X}", b)).collect()
}

/// Escapes a single key component the way `build_key` escapes parameter
/// values under the default separator.
pub fn escape_component(text: &str) -> String {
    escape(text, DEFAULT_SEPARATOR)
}

// == Key Validation ==
/// Returns true for keys that are non-empty, at most `MAX_KEY_LENGTH`
/// characters, and free of whitespace.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.chars().count() <= MAX_KEY_LENGTH
        && !key.chars().any(char::is_whitespace)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_key_list_literal() {
        let bag = ParamBag::new().param("page", 1).param("limit", 10);
        assert_eq!(
            build_key("categories:all", &bag),
            "categories:all:page:1:limit:10"
        );
    }

    #[test]
    fn test_build_key_is_deterministic() {
        let bag = ParamBag::new().param("page", 1).param("limit", 10);
        assert_eq!(build_key("categories:all", &bag), build_key("categories:all", &bag));
    }

    #[test]
    fn test_build_key_page_changes_key() {
        let page1 = ParamBag::new().param("page", 1).param("limit", 10);
        let page2 = ParamBag::new().param("page", 2).param("limit", 10);
        assert_ne!(
            build_key("categories:all", &page1),
            build_key("categories:all", &page2)
        );
    }

    #[test]
    fn test_build_key_insertion_order_matters() {
        let a = ParamBag::new().param("page", 1).param("limit", 10);
        let b = ParamBag::new().param("limit", 10).param("page", 1);
        assert_ne!(build_key("k", &a), build_key("k", &b));
    }

    #[test]
    fn test_build_key_prefix_suffix_separator() {
        let bag = ParamBag::new()
            .prefix("v1")
            .suffix("json")
            .separator("|")
            .param("id", "abc");
        assert_eq!(build_key("categories", &bag), "v1|categories|id|abc|json");
    }

    #[test]
    fn test_build_key_skips_null() {
        let bag = ParamBag::new()
            .param("page", 1)
            .param("gender", Value::Null)
            .opt_param::<String>("search", None);
        assert_eq!(build_key("categories:all", &bag), "categories:all:page:1");
    }

    #[test]
    fn test_build_key_json_encodes_composites() {
        let bag = ParamBag::new()
            .separator("/")
            .param("ids", json!([1, 2]))
            .param("filter", json!({"a": true}));
        assert_eq!(
            build_key("x", &bag),
            r#"x/ids/[1,2]/filter/{"a":true}"#
        );
    }

    #[test]
    fn test_build_key_escapes_separator_in_values() {
        let bag = ParamBag::new().param("search", "a:b%c");
        assert_eq!(build_key("categories:all", &bag), "categories:all:search:a%3Ab%25c");
    }

    #[test]
    fn test_build_key_escapes_whitespace() {
        let bag = ParamBag::new().param("search", "red shoes");
        let key = build_key("categories:all", &bag);
        assert_eq!(key, "categories:all:search:red%20shoes");
        assert!(is_valid_key(&key));
    }

    #[test]
    fn test_escape_component() {
        assert_eq!(escape_component("a:b c"), "a%3Ab%20c");
        assert_eq!(escape_component("plain-slug"), "plain-slug");
    }

    #[test]
    fn test_param_replaces_in_place() {
        let bag = ParamBag::new()
            .param("page", 1)
            .param("limit", 10)
            .param("page", 3);
        assert_eq!(bag.len(), 2);
        assert_eq!(build_key("k", &bag), "k:page:3:limit:10");
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("categories:all:page:1"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("has space"));
        assert!(!is_valid_key("tab\there"));
        assert!(is_valid_key(&"k".repeat(MAX_KEY_LENGTH)));
        assert!(!is_valid_key(&"k".repeat(MAX_KEY_LENGTH + 1)));
    }
}
