#![allow(dead_code)]

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Redirect;
use axum::routing::{any, get};
use axum::{Json, Router};
use once_cell::sync::Lazy;
use rest_mcp::app::App;
use rest_mcp::services::config::BridgeConfig;
use rest_mcp::services::logger::{LogLevel, Logger};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const LARGE_BODY_BYTES: usize = 50_000;
pub const SLOW_ROUTE_DELAY: Duration = Duration::from_secs(3);

pub fn restore_env(key: &str, previous: Option<String>) {
    match previous {
        Some(value) => std::env::set_var(key, value),
        None => std::env::remove_var(key),
    }
}

pub fn quiet_logger() -> Logger {
    Logger::with_level("test", LogLevel::Error)
}

pub fn app_for(config: BridgeConfig) -> App {
    App::from_config(config, quiet_logger()).expect("app must build")
}

async fn user() -> Json<Value> {
    Json(json!({ "id": 1, "name": "Ada" }))
}

async fn missing() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

async fn crash() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string())
}

async fn large() -> String {
    "x".repeat(LARGE_BODY_BYTES)
}

async fn redirect_loop() -> Redirect {
    Redirect::temporary("/loop")
}

async fn slow() -> &'static str {
    tokio::time::sleep(SLOW_ROUTE_DELAY).await;
    "late"
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Value> {
    let mut seen = Map::new();
    for (name, value) in headers.iter() {
        seen.insert(
            name.as_str().to_string(),
            Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
        );
    }
    Json(json!({
        "method": method.as_str(),
        "headers": seen,
        "body": body,
    }))
}

/// Starts a local API on an ephemeral port and returns its base URL.
pub async fn spawn_mock_api() -> String {
    let app = Router::new()
        .route("/users/1", get(user))
        .route("/missing", get(missing))
        .route("/crash", get(crash))
        .route("/large", get(large))
        .route("/loop", get(redirect_loop))
        .route("/slow", get(slow))
        .route("/echo", any(echo));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock api");
    let addr = listener.local_addr().expect("mock api addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock api");
    });
    format!("http://{}", addr)
}
