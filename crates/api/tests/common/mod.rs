#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use unilib_api::auth::jwt::{generate_access_token, JwtConfig};
use unilib_api::auth::password::hash_password;
use unilib_api::config::ServerConfig;
use unilib_api::router::build_app_router;
use unilib_api::state::AppState;
use unilib_core::catalog::CopyCounts;
use unilib_core::roles::Role;
use unilib_core::types::DbId;
use unilib_db::models::book::CreateBook;
use unilib_db::models::user::{CreateUser, User};
use unilib_db::repositories::{BookRepo, UserRepo};

/// Password given to every user created by [`create_user`].
pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        public_base_url: "http://localhost:5173".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with the production middleware stack.
///
/// No dispatcher is subscribed, so published events are dropped.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

/// Insert an active user with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str, role: Role) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@uni.test"),
            first_name: username.to_string(),
            last_name: "Tester".to_string(),
            university_id: format!("U-{username}"),
            phone: None,
            address: None,
            password_hash: hash_password(TEST_PASSWORD).unwrap(),
            role,
        },
    )
    .await
    .unwrap()
}

/// A valid bearer token for `user`, signed with the test secret.
pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.role, &test_config().jwt).unwrap()
}

/// Insert a book with `copies` copies, all on the shelf.
pub async fn create_book(pool: &PgPool, isbn: &str, title: &str, copies: i32) -> DbId {
    BookRepo::create(
        pool,
        &CreateBook {
            title: title.to_string(),
            author: "Test Author".to_string(),
            isbn: isbn.to_string(),
            publisher: None,
            category_id: None,
            publication_date: None,
            description: None,
            total_copies: copies,
        },
        CopyCounts::new_book(copies).unwrap(),
    )
    .await
    .unwrap()
    .id
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn send_json_auth(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send_json_auth(app, Method::POST, uri, body, token).await
}

/// POST with no body (action endpoints such as `/return`).
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
