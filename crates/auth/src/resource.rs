use serde::{Deserialize, Serialize};

use shopfront_core::Attributes;

/// Resource kind that matches every resource in a policy rule.
pub const ANY_KIND: &str = "*";

/// Well-known resource kinds gated by the policy table.
pub mod kinds {
    pub const USER: &str = "user";
    pub const ORDER: &str = "order";
    pub const PRODUCT: &str = "product";
    pub const CUSTOMER: &str = "customer";
    pub const CATEGORY: &str = "category";
}

/// The object an action is performed against.
///
/// Built ad hoc by callers at check time and never persisted. Attributes carry
/// whatever the policy conditions inspect (e.g. `owner_id`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Resource {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            attributes: Attributes::new(),
        }
    }

    pub fn with_id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(attributes);
        self
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{}", self.kind, id),
            None => f.write_str(&self.kind),
        }
    }
}
