use serde::{Deserialize, Serialize};

use shopfront_auth::{NewUser, Role, Subject, User, UserChanges};
use shopfront_core::{Attributes, UserId};

use crate::app::services::Customer;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub attributes: Attributes,
}

fn default_role() -> Role {
    Role::USER
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        NewUser {
            username: req.username,
            password: req.password,
            role: req.role,
            attributes: req.attributes,
        }
    }
}

/// `PUT /users/:id` body; omitted fields are left unchanged.
pub type UpdateUserRequest = UserChanges;

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub email: Option<String>,
    /// Defaults to the caller.
    pub owner_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Transport view of a user. The credential hash is never exposed.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub attributes: Attributes,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            attributes: user.attributes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub id: String,
    pub role: Role,
    pub attributes: Attributes,
    pub anonymous: bool,
}

impl From<&Subject> for WhoAmI {
    fn from(subject: &Subject) -> Self {
        Self {
            id: subject.id.clone(),
            role: subject.role.clone(),
            attributes: subject.attributes.clone(),
            anonymous: subject.is_anonymous(),
        }
    }
}

pub fn customer_to_json(c: &Customer) -> serde_json::Value {
    serde_json::json!({
        "id": c.id.to_string(),
        "name": c.name,
        "email": c.email,
        "owner_id": c.owner_id,
    })
}
