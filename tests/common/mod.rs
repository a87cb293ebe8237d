//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use serde_json::Value;

use session_vault::clock::ManualClock;
use session_vault::config::{AccountConfig, VaultConfig};
use session_vault::http::build_router;
use session_vault::lifecycle::{bootstrap_with_clock, Services};
use session_vault::security::Role;

pub const KEY_HEX: &str = "4f1c2a9be07d3a5c6e8f0b1d2c3e4f5a6b7c8d9e0f1a2b3c4d5e6f708192a3b4";

pub const THERAPIST_TOKEN: &str = "therapist-token-0001";
pub const OTHER_THERAPIST_TOKEN: &str = "therapist-token-0002";
pub const ADMIN_TOKEN: &str = "admin-token-000000001";
pub const SUPERVISOR_TOKEN: &str = "supervisor-token-0001";
pub const RECEPTION_TOKEN: &str = "reception-token-00001";

pub const START_MS: u64 = 1_700_000_000_000;

fn account(id: &str, role: Role, token: &str) -> AccountConfig {
    AccountConfig {
        id: id.to_string(),
        role,
        token: token.to_string(),
    }
}

pub fn test_config() -> VaultConfig {
    let mut config = VaultConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.encryption.key_hex = Some(KEY_HEX.to_string());
    config.accounts = vec![
        account("t1", Role::Therapist, THERAPIST_TOKEN),
        account("t2", Role::Therapist, OTHER_THERAPIST_TOKEN),
        account("a1", Role::Admin, ADMIN_TOKEN),
        account("s1", Role::Supervisor, SUPERVISOR_TOKEN),
        account("r1", Role::Receptionist, RECEPTION_TOKEN),
    ];
    config
}

pub struct TestApp {
    pub router: Router,
    pub services: Services,
    pub clock: Arc<ManualClock>,
}

pub async fn spawn_app(config: VaultConfig) -> TestApp {
    let clock = Arc::new(ManualClock::new(START_MS));
    let services = bootstrap_with_clock(&config, clock.clone())
        .await
        .expect("bootstrap should succeed");
    let router = build_router(services.state.clone(), &config);
    TestApp {
        router,
        services,
        clock,
    }
}

pub async fn test_app() -> TestApp {
    spawn_app(test_config()).await
}

/// Build a request as if it arrived from `client`.
pub fn request_from(
    client: &str,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let mut request = builder.body(body).unwrap();
    let addr: SocketAddr = format!("{client}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    request_from("127.0.0.1", method, uri, token, body)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
