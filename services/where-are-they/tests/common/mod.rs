#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use where_are_they::{repo::MemoryStore, routes::create_router, AppState, Config, Gateways};

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(Config::default(), |gateways| gateways)
    }

    /// Builds the app over the in-memory store, letting a test swap gateways
    /// or tune the config first.
    pub fn with(config: Config, customize: impl FnOnce(Gateways) -> Gateways) -> Self {
        let store = MemoryStore::new();
        let gateways = customize(Gateways::in_memory(store.clone()));
        Self {
            router: create_router(AppState::new(gateways, config)),
            store,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }
}

pub fn api(path: &str) -> String {
    format!("/where/are/they{}", path)
}
