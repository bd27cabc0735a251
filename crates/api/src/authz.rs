//! API-side authorization guard.
//!
//! Handlers describe the target as a `Resource` and check it against the
//! caller before touching any record store.

use shopfront_auth::{Action, AuthError, Resource, Subject};
use shopfront_core::Entity;

use crate::app::services::SharedAuth;

/// Describe a stored entity as a policy resource: its kind, id and the
/// attributes it exposes to policy conditions.
pub fn resource_for<E>(kind: &str, entity: &E) -> Resource
where
    E: Entity,
    E::Id: ToString,
{
    Resource::new(kind)
        .with_id(entity.id().to_string())
        .with_attributes(entity.policy_attributes())
}

/// Check `action` on `resource` for `subject`; a denial is `Unauthorized`.
pub fn guard(auth: &SharedAuth, subject: &Subject, action: Action, resource: &Resource) -> Result<(), AuthError> {
    auth.require(subject, action, resource)
}
