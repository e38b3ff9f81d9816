#![allow(dead_code)]

use adinusa_provider::{ProviderConfig, Session};
use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";

#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

impl Call {
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

#[derive(Default)]
struct Inner {
    routes: HashMap<String, (u16, Value)>,
    calls: Vec<Call>,
}

/// In-process stand-in for the platform API. Unscripted routes answer 404.
#[derive(Clone)]
pub struct FakeApi {
    pub url: String,
    inner: Arc<Mutex<Inner>>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let inner = Arc::new(Mutex::new(Inner::default()));
        let app = Router::new().fallback(handle).with_state(inner.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            url: format!("http://{addr}"),
            inner,
        }
    }

    /// Scripts the reply for `"METHOD /path"`; a later call replaces it.
    pub fn on(&self, route: &str, status: u16, body: Value) -> &Self {
        self.inner
            .lock()
            .unwrap()
            .routes
            .insert(route.to_string(), (status, body));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn routes_called(&self) -> Vec<String> {
        self.calls().iter().map(Call::route).collect()
    }

    pub fn calls_to(&self, route: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.route() == route).collect()
    }

    pub fn session(&self) -> Session {
        Session::with_token(&self.url, TOKEN)
    }

    pub fn config(&self) -> ProviderConfig {
        ProviderConfig::new(&self.url, &self.url, "admin", "secret").unwrap()
    }

    /// One course "Docker" (id 3) with batches "Batch 1" (id 10) and "Batch 2" (id 11).
    pub fn with_catalog(&self) -> &Self {
        self.on(
            "GET /courses/",
            200,
            serde_json::json!([
                {"id": 1, "title": "Linux Fundamentals"},
                {"id": 3, "title": "Docker"}
            ]),
        )
        .on(
            "GET /admin/batchs/?course_id=3",
            200,
            serde_json::json!([
                {"id": 10, "batch": "Batch 1", "course": 3},
                {"id": 11, "batch": "Batch 2", "course": 3}
            ]),
        )
    }
}

async fn handle(
    State(inner): State<Arc<Mutex<Inner>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let call = Call {
        method: method.to_string(),
        path,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    };
    let route = call.route();

    let mut guard = inner.lock().unwrap();
    guard.calls.push(call);
    match guard.routes.get(&route).cloned() {
        Some((204, _)) => StatusCode::NO_CONTENT.into_response(),
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, Json(body)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
