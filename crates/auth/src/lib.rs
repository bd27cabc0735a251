//! `shopfront-auth`: bearer tokens, attribute-based access policy and the
//! authorization service that composes them.
//!
//! Decoupled from HTTP and RPC transports; those live in `shopfront-api`.

pub mod action;
pub mod password;
pub mod policy;
pub mod resource;
pub mod roles;
pub mod service;
pub mod subject;
pub mod token;
pub mod user;

pub use action::{Action, UnknownAction};
pub use password::{hash_password, verify_password, verify_password_or_dummy, PasswordError};
pub use policy::{default_rules, Condition, Decision, PolicyEngine, PolicyRule, SubjectField};
pub use resource::{kinds, Resource, ANY_KIND};
pub use roles::Role;
pub use service::{AuthError, AuthService};
pub use subject::Subject;
pub use token::{TokenClaims, TokenCodec, TokenError, DEFAULT_TTL_HOURS};
pub use user::{InMemoryUserStore, NewUser, StoreError, User, UserChanges, UserStore};
