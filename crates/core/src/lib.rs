//! `shopfront-core`: shared building blocks for the shopfront services.
//!
//! Pure types only: identifiers, attribute maps and the domain error model.

pub mod attributes;
pub mod entity;
pub mod error;
pub mod id;

pub use attributes::Attributes;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, UserId};
