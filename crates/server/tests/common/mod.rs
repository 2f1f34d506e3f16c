//! Common test utilities for in-process API testing.
//!
//! Builds the real router around a fresh store and dispatcher so tests can
//! submit purchases over HTTP and inspect the resulting pool state.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use ticketrush_core::{
    Config, Dispatcher, DispatcherConfig, MemorySink, OutcomeSink, PoolConfig, TicketStore,
};
use ticketrush_server::api::create_router;
use ticketrush_server::state::AppState;

/// In-process server with direct handles on its store and dispatcher.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub store: Arc<TicketStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub outcomes: Arc<MemorySink>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with `total_tickets` and no processing delay.
    pub async fn new(total_tickets: usize) -> Self {
        Self::with_dispatcher_config(total_tickets, DispatcherConfig::immediate()).await
    }

    /// Create a fixture with a custom dispatcher configuration.
    pub async fn with_dispatcher_config(total_tickets: usize, dispatcher: DispatcherConfig) -> Self {
        let config = Config {
            pool: PoolConfig { total_tickets },
            dispatcher: dispatcher.clone(),
            ..Default::default()
        };

        let store = Arc::new(TicketStore::new(total_tickets));
        let outcomes = Arc::new(MemorySink::new());
        let dispatcher = Arc::new(Dispatcher::new(
            dispatcher,
            Arc::clone(&store),
            Arc::clone(&outcomes) as Arc<dyn OutcomeSink>,
        ));
        dispatcher
            .start()
            .await
            .expect("Failed to start dispatcher");

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&dispatcher),
            Arc::clone(&outcomes),
        ));
        let router = create_router(state);

        Self {
            router,
            store,
            dispatcher,
            outcomes,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a GET request and return the raw body as text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
