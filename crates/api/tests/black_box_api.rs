use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use shopfront_api::config::ApiConfig;

const JWT_SECRET: &str = "test-secret";
const ADMIN_USERNAME: &str = "root";
const ADMIN_PASSWORD: &str = "root-password";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let config = ApiConfig::new(JWT_SECRET).with_bootstrap_admin(ADMIN_USERNAME, ADMIN_PASSWORD);
        let app = shopfront_api::app::build_app(&config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token(&self, username: &str, password: &str) -> String {
        let res = self.login(username, password).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_user(&self, admin_token: &str, username: &str, password: &str) -> Value {
        let res = self
            .client
            .post(self.url("/users"))
            .bearer_auth(admin_token)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: &str, role: &str, expires_in: ChronoDuration) -> String {
    let claims = json!({
        "sub": sub,
        "role": role,
        "exp": (Utc::now() + expires_in).timestamp(),
        "attr": {},
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn invalid_credentials_are_rejected_on_public_routes_too() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/auth/login"))
        .header("authorization", "Token garbage")
        .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_auth_header");

    let res = srv
        .client
        .get(srv.url("/health"))
        .header("authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // An empty header is the same as no header.
    let res = srv.client.get(srv.url("/health")).header("authorization", "").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_issues_a_token_that_identifies_the_user() {
    let srv = TestServer::spawn().await;
    let token = srv.token(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "admin");
    assert_eq!(body["anonymous"], false);
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let srv = TestServer::spawn().await;

    let wrong_password = srv.login(ADMIN_USERNAME, "nope").await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let unknown_user = srv.login("mallory", ADMIN_PASSWORD).await;
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn requests_without_credentials_run_as_anonymous() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["anonymous"], true);

    // Anonymous is granted nothing.
    let res = srv.client.get(srv.url("/customers")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_or_invalid_credentials_are_rejected() {
    let srv = TestServer::spawn().await;
    let foreign = mint_jwt("another-secret", "u-1", "admin", ChronoDuration::minutes(5));

    for header in [
        "Token abc".to_string(),
        "Bearer".to_string(),
        "Bearer a b".to_string(),
        "Bearer not-a-jwt".to_string(),
        format!("Bearer {foreign}"),
    ] {
        let res = srv
            .client
            .get(srv.url("/whoami"))
            .header("authorization", header.as_str())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header: {header}");
    }
}

#[tokio::test]
async fn expired_tokens_are_reported_as_expired() {
    let srv = TestServer::spawn().await;
    let expired = mint_jwt(JWT_SECRET, "u-1", "admin", ChronoDuration::minutes(-5));

    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(expired)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "token_expired");
}

#[tokio::test]
async fn only_admins_manage_users() {
    let srv = TestServer::spawn().await;
    let admin = srv.token(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let bob = srv.create_user(&admin, "bob", "bob-password").await;
    assert_eq!(bob["username"], "bob");
    assert_eq!(bob["role"], "user");
    assert!(bob.get("credential").is_none());

    let bob_token = srv.token("bob", "bob-password").await;

    let res = srv
        .client
        .post(srv.url("/users"))
        .bearer_auth(&bob_token)
        .json(&json!({ "username": "eve", "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    // Regular users may read users.
    let res = srv
        .client
        .get(srv.url("/users"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    // Duplicate usernames conflict.
    let res = srv
        .client
        .post(srv.url("/users"))
        .bearer_auth(&admin)
        .json(&json!({ "username": "bob", "password": "other" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn user_lookup_and_update() {
    let srv = TestServer::spawn().await;
    let admin = srv.token(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let bob = srv.create_user(&admin, "bob", "bob-password").await;
    let bob_id = bob["id"].as_str().unwrap();

    let res = srv
        .client
        .get(srv.url(&format!("/users/{bob_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .client
        .put(srv.url(&format!("/users/{bob_id}")))
        .bearer_auth(&admin)
        .json(&json!({ "password": "new-password", "attributes": { "region": "eu" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["attributes"]["region"], "eu");

    assert_eq!(srv.login("bob", "bob-password").await.status(), StatusCode::UNAUTHORIZED);
    let bob_token = srv.token("bob", "new-password").await;

    // Attributes travel in the token.
    let res = srv
        .client
        .get(srv.url("/whoami"))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["attributes"]["region"], "eu");

    let missing = format!("/users/{}", shopfront_core::UserId::new());
    let res = srv.client.get(srv.url(&missing)).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv.client.get(srv.url("/users/not-an-id")).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn customer_updates_are_limited_to_owners() {
    let srv = TestServer::spawn().await;
    let admin = srv.token(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let bob = srv.create_user(&admin, "bob", "bob-password").await;
    let bob_id = bob["id"].as_str().unwrap().to_string();
    let bob_token = srv.token("bob", "bob-password").await;

    let create = |owner: String| {
        srv.client
            .post(srv.url("/customers"))
            .bearer_auth(&admin)
            .json(&json!({ "name": "Acme", "owner_id": owner }))
            .send()
    };

    let res = create(bob_id.clone()).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let owned: Value = res.json().await.unwrap();

    let res = create("someone-else".to_string()).await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let foreign: Value = res.json().await.unwrap();

    let patch = |id: &str| {
        srv.client
            .patch(srv.url(&format!("/customers/{id}")))
            .bearer_auth(&bob_token)
            .json(&json!({ "name": "Renamed" }))
            .send()
    };

    let res = patch(owned["id"].as_str().unwrap()).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Renamed");

    let res = patch(foreign["id"].as_str().unwrap()).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Reads are open to any user.
    let res = srv
        .client
        .get(srv.url(&format!("/customers/{}", foreign["id"].as_str().unwrap())))
        .bearer_auth(&bob_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Users cannot create customers.
    let res = srv
        .client
        .post(srv.url("/customers"))
        .bearer_auth(&bob_token)
        .json(&json!({ "name": "Mine" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .get(srv.url(&format!("/customers/{}", shopfront_core::CustomerId::new())))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_admins_delete_customers() {
    let srv = TestServer::spawn().await;
    let admin = srv.token(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let bob = srv.create_user(&admin, "bob", "bob-password").await;
    let bob_token = srv.token("bob", "bob-password").await;

    let res = srv
        .client
        .post(srv.url("/customers"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Acme", "owner_id": bob["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let owned: Value = res.json().await.unwrap();
    let path = format!("/customers/{}", owned["id"].as_str().unwrap());

    // Owning a record does not grant deleting it.
    let res = srv.client.delete(srv.url(&path)).bearer_auth(&bob_token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv.client.delete(srv.url(&path)).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.client.get(srv.url(&path)).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = srv.client.delete(srv.url(&path)).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
