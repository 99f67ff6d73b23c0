use core::fmt;

use indexmap::IndexMap;
use serde_json::Value;

/// Free-form annotations attached to an [`ErrorContext`].
///
/// Keys are strings and values may be of any JSON-representable type, so the
/// same set can carry a request id, a retry count and a nested structure at
/// once. Insertion order is preserved. Inserting an existing key replaces its
/// value without moving it.
///
/// Reporters decide how to represent values. Backends that only understand
/// string tags should convert through [`stringify`] (or
/// [`to_tags`](Self::to_tags)).
///
/// [`ErrorContext`]: crate::ErrorContext
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorDetails(IndexMap<String, Value>);

impl ErrorDetails {
    /// Creates an empty set of details.
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Inserts a value, returning the previous value stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Converts every entry into a string-valued tag using [`stringify`].
    ///
    /// ```
    /// use snitch::ErrorDetails;
    ///
    /// let mut details = ErrorDetails::new();
    /// details.insert("attempt", 3);
    /// details.insert("route", "/upload");
    ///
    /// let tags: Vec<_> = details.to_tags().collect();
    /// assert_eq!(
    ///     tags,
    ///     [
    ///         ("attempt".to_string(), "3".to_string()),
    ///         ("route".to_string(), "/upload".to_string()),
    ///     ]
    /// );
    /// ```
    pub fn to_tags(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.0
            .iter()
            .map(|(key, value)| (key.clone(), stringify(value)))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ErrorDetails {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a ErrorDetails {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={}", Stringified(value))?;
        }
        Ok(())
    }
}

struct Stringified<'a>(&'a Value);

impl fmt::Display for Stringified<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::String(s) => f.write_str(s),
            // Numbers, booleans, null and compound values use serde_json's
            // compact rendering, which is stable for a given value.
            other => fmt::Display::fmt(other, f),
        }
    }
}

/// Renders a detail value as a plain string.
///
/// Strings are returned verbatim (without JSON quotes). Numbers, booleans and
/// `null` use their usual textual form. Arrays and objects are rendered as
/// compact JSON, with object keys in insertion order.
///
/// ```
/// use serde_json::json;
/// use snitch::stringify;
///
/// assert_eq!(stringify(&json!(42)), "42");
/// assert_eq!(stringify(&json!(true)), "true");
/// assert_eq!(stringify(&json!("plain")), "plain");
/// assert_eq!(stringify(&json!({"id": 7, "tags": ["a", "b"]})), r#"{"id":7,"tags":["a","b"]}"#);
/// ```
#[must_use]
pub fn stringify(value: &Value) -> String {
    Stringified(value).to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!(-7)), "-7");
        assert_eq!(stringify(&json!(1.5)), "1.5");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!(false)), "false");
        assert_eq!(stringify(&Value::Null), "null");
        assert_eq!(stringify(&json!("")), "");
        assert_eq!(stringify(&json!("with \"quotes\"")), "with \"quotes\"");
    }

    #[test]
    fn test_stringify_nested_is_deterministic() {
        let value = json!({"b": [1, {"c": null}], "a": "x"});
        let first = stringify(&value);
        assert_eq!(first, r#"{"b":[1,{"c":null}],"a":"x"}"#);
        assert_eq!(first, stringify(&value.clone()));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut details = ErrorDetails::new();
        assert!(details.insert("first", 1).is_none());
        details.insert("second", 2);
        assert_eq!(details.insert("first", "one"), Some(json!(1)));

        let keys: Vec<_> = details.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["first", "second"]);
        assert_eq!(details.get("first"), Some(&json!("one")));
        assert_eq!(details.len(), 2);
    }

    #[test]
    fn test_from_iterator_and_display() {
        let details: ErrorDetails = [("user", json!("ada")), ("retries", json!(3))]
            .into_iter()
            .collect();
        assert_eq!(details.to_string(), "user=ada, retries=3");
        assert!(ErrorDetails::new().to_string().is_empty());
        assert!(ErrorDetails::default().is_empty());
    }
}
