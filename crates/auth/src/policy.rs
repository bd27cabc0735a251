//! Attribute-based policy engine.
//!
//! The rule table is an ordered, immutable list. Evaluation walks it in order
//! and the first rule that matches `(role, action, kind)` *and* whose condition
//! holds grants access. There are no deny rules: no grant means deny.
//!
//! - No IO
//! - No panics
//! - Deterministic for identical inputs

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use shopfront_core::attributes::str_attr;

use crate::resource::{kinds, ANY_KIND};
use crate::{Action, Resource, Role, Subject};

/// Subject value a condition compares against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectField {
    Id,
    Username,
    Role,
    /// A string attribute from the subject's attribute map.
    Attribute(String),
}

impl SubjectField {
    fn value<'a>(&self, subject: &'a Subject) -> Option<&'a str> {
        match self {
            SubjectField::Id => Some(subject.id.as_str()),
            SubjectField::Username => Some(subject.username.as_str()),
            SubjectField::Role => Some(subject.role.as_str()),
            SubjectField::Attribute(key) => str_attr(&subject.attributes, key),
        }
    }
}

/// Predicate over `(Subject, Resource)` attached to a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Always,
    /// `resource.attributes[resource_key]` is a string equal to the subject field.
    AttributeEquals {
        subject: SubjectField,
        resource_key: String,
    },
}

impl Condition {
    /// Ownership check: `resource.attributes["owner_id"] == subject.id`.
    pub fn owner(resource_key: impl Into<String>) -> Self {
        Condition::AttributeEquals {
            subject: SubjectField::Id,
            resource_key: resource_key.into(),
        }
    }

    pub fn holds(&self, subject: &Subject, resource: &Resource) -> bool {
        match self {
            Condition::Always => true,
            Condition::AttributeEquals {
                subject: field,
                resource_key,
            } => match (field.value(subject), str_attr(&resource.attributes, resource_key)) {
                (Some(expected), Some(actual)) => expected == actual,
                _ => false,
            },
        }
    }
}

/// Static grant: `role` may perform `action` on `resource_kind` when `condition` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub role: Role,
    pub action: Action,
    /// Exact resource kind, or `"*"` for any kind.
    pub resource_kind: String,
    pub condition: Condition,
}

impl PolicyRule {
    /// Unconditional grant.
    pub fn allow(role: Role, action: Action, resource_kind: impl Into<String>) -> Self {
        Self {
            role,
            action,
            resource_kind: resource_kind.into(),
            condition: Condition::Always,
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Whether the rule's `(role, action, kind)` selects this request.
    pub fn applies_to(&self, subject: &Subject, action: Action, resource: &Resource) -> bool {
        self.role == subject.role
            && self.action == action
            && (self.resource_kind == ANY_KIND || self.resource_kind == resource.kind)
    }
}

/// Outcome of an evaluation, with the index of the granting rule (for audit logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub granted: bool,
    pub matched_rule: Option<usize>,
}

impl Decision {
    const DENIED: Decision = Decision {
        granted: false,
        matched_rule: None,
    };
}

/// Ordered, read-only rule set shared across requests.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    rules: Arc<[PolicyRule]>,
}

impl PolicyEngine {
    pub fn new(rules: impl IntoIterator<Item = PolicyRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    pub fn rules(&self) -> &[PolicyRule] {
        &self.rules
    }

    pub fn evaluate(&self, subject: &Subject, action: Action, resource: &Resource) -> bool {
        self.decide(subject, action, resource).granted
    }

    pub fn decide(&self, subject: &Subject, action: Action, resource: &Resource) -> Decision {
        self.rules
            .iter()
            .position(|rule| {
                rule.applies_to(subject, action, resource) && rule.condition.holds(subject, resource)
            })
            .map(|idx| Decision {
                granted: true,
                matched_rule: Some(idx),
            })
            .unwrap_or(Decision::DENIED)
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

/// The built-in rule table.
///
/// Order matters only for audit output (which rule granted); grants are
/// monotonic so the decision itself does not depend on it.
pub fn default_rules() -> Vec<PolicyRule> {
    let mut rules: Vec<PolicyRule> = Action::ALL
        .into_iter()
        .map(|action| PolicyRule::allow(Role::ADMIN, action, ANY_KIND))
        .collect();

    rules.push(PolicyRule::allow(Role::USER, Action::Read, kinds::USER));
    rules.push(
        PolicyRule::allow(Role::USER, Action::Update, kinds::CUSTOMER).when(Condition::owner("owner_id")),
    );
    rules.push(PolicyRule::allow(Role::USER, Action::Read, ANY_KIND));

    rules
}
