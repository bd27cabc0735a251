//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Attributes exposed to attribute-based policy checks (e.g. `owner_id`).
    ///
    /// Entities without policy-relevant attributes can keep the default.
    fn policy_attributes(&self) -> crate::Attributes {
        crate::Attributes::new()
    }
}
