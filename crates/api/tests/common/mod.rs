#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use storefront_api::auth::jwt::{generate_access_token, JwtConfig};
use storefront_api::auth::password::hash_password;
use storefront_api::config::{ServerConfig, MEDIA_URL_PREFIX};
use storefront_api::router::build_app_router;
use storefront_api::state::AppState;
use storefront_core::image_url::DeploymentMode;
use storefront_core::storage::LocalBlobStore;
use storefront_db::models::user::{CreateUser, User};
use storefront_db::{MemoryStore, UserStore};

pub const TEST_PASSWORD: &str = "test_password_123!";

/// A PNG signature followed by the start of an IHDR chunk.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// Build a test `ServerConfig` writing media into `media_root`.
pub fn test_config(media_root: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        mode: DeploymentMode::Production,
        public_base_url: "https://shop.example.com".to_string(),
        media_root: media_root.to_path_buf(),
        max_upload_bytes: 1024 * 1024,
        trust_proxy_headers: false,
        database_url: None,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 60,
        },
        bootstrap_staff: None,
    }
}

/// The application running over an in-memory store and a temporary media root.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub config: ServerConfig,
    pub router: Router,
    _media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Like `new`, with `adjust` applied to the test config first.
    pub fn with_config(adjust: impl FnOnce(&mut ServerConfig)) -> Self {
        let media = tempfile::tempdir().expect("tempdir should be created");
        let mut config = test_config(media.path());
        adjust(&mut config);
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(LocalBlobStore::new(media.path(), MEDIA_URL_PREFIX));

        let state = AppState::new(store.clone(), blobs, config.clone());
        let router = build_app_router(state, &config);

        Self {
            store,
            config,
            router,
            _media: media,
        }
    }

    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Insert a user directly and return it with a valid access token.
    pub async fn create_user(&self, username: &str, is_staff: bool) -> (User, String) {
        let user = self
            .store
            .create_user(&CreateUser {
                username: username.to_string(),
                email: format!("{username}@test.com"),
                password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
                is_staff,
            })
            .await
            .expect("user creation should succeed");
        let token = generate_access_token(user.id, &user.username, is_staff, &self.config.jwt)
            .expect("token generation should succeed");
        (user, token)
    }

    /// Path of a stored media reference (`/media/...`) on disk.
    pub fn media_path(&self, reference: &str) -> std::path::PathBuf {
        let relative = reference
            .strip_prefix(MEDIA_URL_PREFIX)
            .unwrap_or(reference)
            .trim_start_matches('/');
        self.config.media_root.join(relative)
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, builder(Method::GET, uri, None).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, builder(Method::GET, uri, Some(token)).body(Body::empty()).unwrap()).await
}

/// GET with an explicit `Host` header.
pub async fn get_with_host(app: Router, uri: &str, host: &str) -> Response {
    let request = builder(Method::GET, uri, None)
        .header(HOST, host)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// GET as seen behind a reverse proxy: internal `Host` plus forwarded headers.
pub async fn get_via_proxy(app: Router, uri: &str, forwarded_host: &str) -> Response {
    let request = builder(Method::GET, uri, None)
        .header(HOST, "backend:3000")
        .header("x-forwarded-host", forwarded_host)
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Request<Body> {
    builder(method, uri, token)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, builder(Method::DELETE, uri, Some(token)).body(Body::empty()).unwrap()).await
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "storefront-test-boundary";

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// Send a multipart request, optionally authenticated and with a `Host` header.
pub async fn send_multipart(
    app: Router,
    method: Method,
    uri: &str,
    form: MultipartForm,
    token: Option<&str>,
    host: Option<&str>,
) -> Response {
    let mut builder = builder(method, uri, token).header(
        CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(host) = host {
        builder = builder.header(HOST, host);
    }
    send(app, builder.body(Body::from(form.finish())).unwrap()).await
}
