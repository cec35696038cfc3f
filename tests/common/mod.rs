#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use cargo_edge_functions::{api::routes::create_router, config::Settings, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::MockServer;

pub const SERVICE_ROLE_KEY: &str = "service-role-test-key";
pub const EMAIL_API_KEY: &str = "re_test_key";
pub const PROVIDER_ID: &str = "test-project";
pub const PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");

/// Settings with every external service pointed at `uri`
pub fn test_settings(uri: &str) -> Settings {
    let mut settings = Settings::default();

    settings.database.url = uri.to_string();
    settings.database.service_role_key = SERVICE_ROLE_KEY.to_string();
    settings.database.timeout_ms = 5000;

    settings.email.api_url = uri.to_string();
    settings.email.api_key = EMAIL_API_KEY.to_string();
    settings.email.timeout_ms = 5000;

    settings.fleet.api_url = uri.to_string();
    settings.fleet.provider_id = PROVIDER_ID.to_string();
    settings.fleet.client_email = "fleet@test-project.iam.gserviceaccount.com".to_string();
    settings.fleet.private_key = PRIVATE_KEY.to_string();
    settings.fleet.token_uri = format!("{}/token", uri);
    settings.fleet.timeout_ms = 5000;

    settings
}

pub struct TestApp {
    pub server: MockServer,
    pub router: Router,
}

pub async fn setup() -> TestApp {
    setup_with(|_| {}).await
}

/// Start a mock server and build the router, letting the caller tweak settings
pub async fn setup_with(configure: impl FnOnce(&mut Settings)) -> TestApp {
    let server = MockServer::start().await;

    let mut settings = test_settings(&server.uri());
    configure(&mut settings);

    let state = AppState::from_settings(settings).expect("state");
    let router = create_router(Arc::new(state));

    TestApp { server, router }
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, body)
    }
}
