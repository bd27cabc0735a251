//! Customer records: every call is gated on a `customer` resource carrying
//! the record's `owner_id`.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use shopfront_auth::{kinds, Action, Resource};
use shopfront_core::CustomerId;

use crate::app::services::{AppServices, Customer};
use crate::app::{dto, errors};
use crate::authz::{guard, resource_for};
use crate::context::Caller;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", get(get_customer).patch(update_customer).delete(delete_customer))
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
    Json(body): Json<dto::CreateCustomerRequest>,
) -> axum::response::Response {
    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name cannot be empty");
    }

    let customer = Customer {
        id: CustomerId::new(),
        name: body.name,
        email: body.email,
        owner_id: body.owner_id.unwrap_or_else(|| subject.id.clone()),
    };
    let resource = resource_for(kinds::CUSTOMER, &customer);
    if let Err(e) = guard(&services.auth, &subject, Action::Create, &resource) {
        return errors::auth_error_to_response(e);
    }

    if let Err(e) = services.customers.insert(customer.clone()) {
        return errors::domain_error_to_response(e);
    }

    (StatusCode::CREATED, Json(dto::customer_to_json(&customer))).into_response()
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
) -> axum::response::Response {
    if let Err(e) = guard(&services.auth, &subject, Action::Read, &Resource::new(kinds::CUSTOMER)) {
        return errors::auth_error_to_response(e);
    }

    match services.customers.list() {
        Ok(customers) => {
            let items = customers.iter().map(dto::customer_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
    Path(id): Path<String>,
) -> axum::response::Response {
    let customer = match load(&services, &id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let resource = resource_for(kinds::CUSTOMER, &customer);
    if let Err(e) = guard(&services.auth, &subject, Action::Read, &resource) {
        return errors::auth_error_to_response(e);
    }

    (StatusCode::OK, Json(dto::customer_to_json(&customer))).into_response()
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCustomerRequest>,
) -> axum::response::Response {
    let customer = match load(&services, &id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let resource = resource_for(kinds::CUSTOMER, &customer);
    if let Err(e) = guard(&services.auth, &subject, Action::Update, &resource) {
        return errors::auth_error_to_response(e);
    }

    if matches!(&body.name, Some(name) if name.trim().is_empty()) {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "name cannot be empty");
    }

    let updated = services.customers.update(&customer.id, |c| {
        if let Some(name) = body.name {
            c.name = name;
        }
        if let Some(email) = body.email {
            c.email = Some(email);
        }
    });

    match updated {
        Ok(c) => (StatusCode::OK, Json(dto::customer_to_json(&c))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(subject): Caller,
    Path(id): Path<String>,
) -> axum::response::Response {
    let customer = match load(&services, &id) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let resource = resource_for(kinds::CUSTOMER, &customer);
    if let Err(e) = guard(&services.auth, &subject, Action::Delete, &resource) {
        return errors::auth_error_to_response(e);
    }

    match services.customers.remove(&customer.id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn load(services: &AppServices, id: &str) -> Result<Customer, axum::response::Response> {
    let id = id.parse::<CustomerId>().map_err(errors::domain_error_to_response)?;
    services.customers.get(&id).map_err(errors::domain_error_to_response)
}
