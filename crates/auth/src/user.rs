//! Persisted user records and the credential store port.
//!
//! The store itself is an external collaborator (a relational table in
//! production). This module defines the contract plus an in-memory
//! implementation for tests/dev.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use shopfront_core::{Attributes, Entity, UserId};

use crate::{Role, Subject};

// ─────────────────────────────────────────────────────────────────────────────
// User record
// ─────────────────────────────────────────────────────────────────────────────

/// Durable identity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// PHC hash of the credential secret. Never exposed by transports.
    pub credential: String,
    pub role: Role,
    #[serde(default)]
    pub attributes: Attributes,
}

impl User {
    /// The subject this user acts as once authenticated.
    pub fn to_subject(&self) -> Subject {
        Subject::new(self.id.to_string(), self.role.clone())
            .with_username(self.username.clone())
            .with_attributes(self.attributes.clone())
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a user (plaintext password, hashed by the service).
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub attributes: Option<Attributes>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Store port
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store failure: {0}")]
    Backend(String),
}

/// Credential store contract consumed by the authorization service.
///
/// Implementations serialize conflicting writes themselves.
pub trait UserStore: Send + Sync {
    fn get_by_username(&self, username: &str) -> Result<User, StoreError>;
    fn get_by_id(&self, id: &UserId) -> Result<User, StoreError>;
    fn create(&self, user: User) -> Result<(), StoreError>;

    /// Replace a stored record wholesale.
    ///
    /// Last writer wins: a caller that read the record earlier may overwrite
    /// changes made since. Use `update_with` for partial updates.
    fn update(&self, user: User) -> Result<(), StoreError>;

    /// Read, modify and write one record as a single atomic step, returning
    /// the stored result. The username uniqueness rule still applies.
    fn update_with(&self, id: &UserId, change: &mut dyn FnMut(&mut User)) -> Result<User, StoreError>;

    fn list(&self) -> Result<Vec<User>, StoreError>;
}

impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    fn get_by_username(&self, username: &str) -> Result<User, StoreError> {
        (**self).get_by_username(username)
    }

    fn get_by_id(&self, id: &UserId) -> Result<User, StoreError> {
        (**self).get_by_id(id)
    }

    fn create(&self, user: User) -> Result<(), StoreError> {
        (**self).create(user)
    }

    fn update(&self, user: User) -> Result<(), StoreError> {
        (**self).update(user)
    }

    fn update_with(&self, id: &UserId, change: &mut dyn FnMut(&mut User)) -> Result<User, StoreError> {
        (**self).update_with(id, change)
    }

    fn list(&self) -> Result<Vec<User>, StoreError> {
        (**self).list()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory user store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

fn poisoned() -> StoreError {
    StoreError::Backend("user store lock poisoned".to_string())
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStore for InMemoryUserStore {
    fn get_by_username(&self, username: &str) -> Result<User, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        map.values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn get_by_id(&self, id: &UserId) -> Result<User, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        map.get(id).cloned().ok_or(StoreError::NotFound)
    }

    fn create(&self, user: User) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user id {} already exists", user.id)));
        }
        if map.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!("username '{}' is taken", user.username)));
        }
        map.insert(user.id, user);
        Ok(())
    }

    fn update(&self, user: User) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        if map.values().any(|u| u.id != user.id && u.username == user.username) {
            return Err(StoreError::Conflict(format!("username '{}' is taken", user.username)));
        }
        map.insert(user.id, user);
        Ok(())
    }

    fn update_with(&self, id: &UserId, change: &mut dyn FnMut(&mut User)) -> Result<User, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let mut user = map.get(id).cloned().ok_or(StoreError::NotFound)?;
        change(&mut user);
        user.id = *id;
        if map.values().any(|u| u.id != user.id && u.username == user.username) {
            return Err(StoreError::Conflict(format!("username '{}' is taken", user.username)));
        }
        map.insert(user.id, user.clone());
        Ok(user)
    }

    fn list(&self) -> Result<Vec<User>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut users: Vec<User> = map.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}
