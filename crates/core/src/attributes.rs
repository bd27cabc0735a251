//! Free-form attribute maps attached to subjects, users and resources.

use std::collections::BTreeMap;

/// String-keyed attribute map with arbitrary JSON scalar/structured values.
///
/// Ordered so equality and serialization are deterministic.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Look up a string attribute; non-string values are treated as absent.
pub fn str_attr<'a>(attrs: &'a Attributes, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(|v| v.as_str())
}
