//! Authorization service: login, token validation, policy checks and
//! policy-gated user management.

use thiserror::Error;
use tracing::{debug, info, warn};

use shopfront_core::UserId;

use crate::password::{hash_password, verify_password_or_dummy, PasswordError};
use crate::resource::kinds;
use crate::user::{NewUser, StoreError, User, UserChanges, UserStore};
use crate::{Action, PolicyEngine, Resource, Subject, TokenCodec, TokenError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Bad credentials at login, or authenticated but not permitted.
    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Credential(#[from] PasswordError),
}

/// Composes the token codec, the policy engine and a credential store.
///
/// Holds no mutable state of its own; share it behind an `Arc`.
#[derive(Debug)]
pub struct AuthService<S> {
    codec: TokenCodec,
    policy: PolicyEngine,
    store: S,
}

impl<S: UserStore> AuthService<S> {
    /// Service with the built-in policy table.
    pub fn new(codec: TokenCodec, store: S) -> Self {
        Self::with_policy(codec, PolicyEngine::default(), store)
    }

    pub fn with_policy(codec: TokenCodec, policy: PolicyEngine, store: S) -> Self {
        Self { codec, policy, store }
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────────

    /// Authenticate by username/password and issue a token.
    ///
    /// Unknown users, wrong passwords and store failures all surface as
    /// `Unauthorized`, and all of them pay for one Argon2 verification.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = match self.store.get_by_username(username) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(username, error = %e, "login lookup failed");
                None
            }
        };

        let verified = verify_password_or_dummy(user.as_ref().map(|u| u.credential.as_str()), password);
        let user = match user {
            Some(user) if verified => user,
            Some(_) => {
                debug!(username, "login credential mismatch");
                return Err(AuthError::Unauthorized);
            }
            None => return Err(AuthError::Unauthorized),
        };

        let token = self.generate_token(&user.to_subject())?;
        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(token)
    }

    pub fn generate_token(&self, subject: &Subject) -> Result<String, AuthError> {
        Ok(self.codec.issue(subject)?)
    }

    pub fn validate_token(&self, token: &str) -> Result<Subject, AuthError> {
        Ok(self.codec.verify(token)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authorization
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluate the policy table.
    ///
    /// Never fails with the built-in conditions; the `Result` leaves room for
    /// conditions that consult fallible sources.
    pub fn authorize(&self, subject: &Subject, action: Action, resource: &Resource) -> Result<bool, AuthError> {
        let decision = self.policy.decide(subject, action, resource);
        if decision.granted {
            debug!(
                subject = %subject.id,
                role = %subject.role,
                action = %action,
                resource = %resource,
                rule = ?decision.matched_rule,
                "authorization granted"
            );
        } else {
            info!(
                subject = %subject.id,
                role = %subject.role,
                action = %action,
                resource = %resource,
                "authorization denied"
            );
        }
        Ok(decision.granted)
    }

    /// `authorize`, with a denial turned into `Unauthorized`.
    pub fn require(&self, subject: &Subject, action: Action, resource: &Resource) -> Result<(), AuthError> {
        if self.authorize(subject, action, resource)? {
            Ok(())
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User management (each gated on the `user` resource kind)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_user(&self, subject: &Subject, new: NewUser) -> Result<User, AuthError> {
        self.require(subject, Action::Create, &Resource::new(kinds::USER))?;

        validate_username(&new.username)?;
        validate_password(&new.password)?;

        let user = User {
            id: UserId::new(),
            username: new.username,
            credential: hash_password(&new.password)?,
            role: new.role,
            attributes: new.attributes,
        };
        self.store.create(user.clone())?;

        info!(actor = %subject.id, user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Apply a partial update.
    ///
    /// Inputs are validated and a new password hashed before the store is
    /// touched; the store applies the changes in one atomic step, so
    /// concurrent partial updates to different fields do not overwrite each
    /// other.
    pub fn update_user(&self, subject: &Subject, id: &UserId, changes: UserChanges) -> Result<User, AuthError> {
        self.require(subject, Action::Update, &Resource::new(kinds::USER).with_id(id))?;

        if let Some(username) = &changes.username {
            validate_username(username)?;
        }
        let credential = match &changes.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let user = self.store.update_with(id, &mut |user: &mut User| {
            if let Some(username) = &changes.username {
                user.username = username.clone();
            }
            if let Some(credential) = &credential {
                user.credential = credential.clone();
            }
            if let Some(role) = &changes.role {
                user.role = role.clone();
            }
            if let Some(attributes) = &changes.attributes {
                user.attributes = attributes.clone();
            }
        })?;

        info!(actor = %subject.id, user_id = %user.id, "user updated");
        Ok(user)
    }

    pub fn get_user(&self, subject: &Subject, id: &UserId) -> Result<User, AuthError> {
        self.require(subject, Action::Read, &Resource::new(kinds::USER).with_id(id))?;
        Ok(self.store.get_by_id(id)?)
    }

    pub fn list_users(&self, subject: &Subject) -> Result<Vec<User>, AuthError> {
        self.require(subject, Action::Read, &Resource::new(kinds::USER))?;
        Ok(self.store.list()?)
    }

    /// Seed a user without a policy check.
    ///
    /// Process bootstrap only: creating users otherwise requires an admin,
    /// so the first admin has to come from somewhere.
    pub fn bootstrap_user(&self, new: NewUser) -> Result<User, AuthError> {
        match self.store.get_by_username(&new.username) {
            Ok(existing) => {
                warn!(username = %existing.username, "bootstrap user already exists; skipping");
                return Ok(existing);
            }
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        validate_username(&new.username)?;
        validate_password(&new.password)?;
        let user = User {
            id: UserId::new(),
            username: new.username,
            credential: hash_password(&new.password)?,
            role: new.role,
            attributes: new.attributes,
        };
        self.store.create(user.clone())?;
        info!(user_id = %user.id, role = %user.role, "bootstrap user created");
        Ok(user)
    }
}

fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() {
        return Err(AuthError::Validation("username cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::Validation("password cannot be empty".to_string()));
    }
    Ok(())
}
