//! Service wiring: the authorization service, its user store and the
//! customer directory used by the customer routes.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use serde::Serialize;
use tracing::info;

use shopfront_auth::{AuthError, AuthService, InMemoryUserStore, NewUser, Role, TokenCodec, UserStore};
use shopfront_core::{Attributes, CustomerId, DomainError, DomainResult, Entity};

use crate::config::ApiConfig;

/// Authorization service over a type-erased user store.
pub type SharedAuth = Arc<AuthService<Arc<dyn UserStore>>>;

pub struct AppServices {
    pub auth: SharedAuth,
    pub customers: CustomerDirectory,
}

/// Wire services from config, seeding the bootstrap admin when configured.
pub fn build_services(config: &ApiConfig) -> Result<AppServices, AuthError> {
    let codec = TokenCodec::new(config.jwt_secret.as_bytes()).with_ttl(config.token_ttl);
    let store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
    let auth = Arc::new(AuthService::new(codec, store));

    if let Some(admin) = &config.bootstrap_admin {
        auth.bootstrap_user(NewUser {
            username: admin.username.clone(),
            password: admin.password.clone(),
            role: Role::ADMIN,
            attributes: Attributes::new(),
        })?;
    }

    info!(rules = auth.policy().rules().len(), "services initialized");
    Ok(AppServices {
        auth,
        customers: CustomerDirectory::new(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer directory
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: Option<String>,
    /// Subject id of the user who owns this record.
    pub owner_id: String,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn policy_attributes(&self) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("owner_id".to_string(), self.owner_id.clone().into());
        attrs
    }
}

/// In-memory customer records.
#[derive(Debug, Default)]
pub struct CustomerDirectory {
    inner: RwLock<HashMap<CustomerId, Customer>>,
}

fn poisoned() -> DomainError {
    DomainError::internal("customer directory lock poisoned")
}

impl CustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, customer: Customer) -> DomainResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&customer.id) {
            return Err(DomainError::conflict(format!("customer {} already exists", customer.id)));
        }
        map.insert(customer.id, customer);
        Ok(())
    }

    pub fn get(&self, id: &CustomerId) -> DomainResult<Customer> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        map.get(id).cloned().ok_or_else(DomainError::not_found)
    }

    pub fn list(&self) -> DomainResult<Vec<Customer>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut items: Vec<Customer> = map.values().cloned().collect();
        items.sort_by_key(|c| c.id);
        Ok(items)
    }

    /// Apply `change` to a stored record and return the result.
    pub fn update(&self, id: &CustomerId, change: impl FnOnce(&mut Customer)) -> DomainResult<Customer> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        let customer = map.get_mut(id).ok_or_else(DomainError::not_found)?;
        change(customer);
        Ok(customer.clone())
    }

    /// Delete a record, returning what was stored.
    pub fn remove(&self, id: &CustomerId) -> DomainResult<Customer> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(id).ok_or_else(DomainError::not_found)
    }
}
