use serde::{Deserialize, Serialize};

use shopfront_core::Attributes;

use crate::Role;

/// Identity asserted for the duration of one request.
///
/// Constructed fresh per request from a validated token, or left anonymous when
/// no credential was presented. Never stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    #[serde(default)]
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Subject {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
            ..Default::default()
        }
    }

    /// The caller that presented no credential at all.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_empty() && self.role.is_empty()
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}
