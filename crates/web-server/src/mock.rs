//! A stand-in for the upstream price-history provider.
//!
//! Serves per-ticker price series and a catalog on the provider's paths so the
//! service can be run and tested without network access or a real token.

use axum::{
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const NOT_FOUND_MESSAGE: &str = "Stock data not found for given query";

#[derive(Debug, Clone, Default)]
pub struct MockUpstream {
    catalog: Value,
    series: HashMap<String, Value>,
    required_token: Option<String>,
    requests: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self {
            catalog: json!({ "stocks": {} }),
            ..Self::default()
        }
    }

    /// Seven NVDA samples from a half-hour window, with a matching catalog.
    pub fn nvda_fixture() -> Self {
        Self::new()
            .with_catalog(json!({ "stocks": { "Nvidia Corporation": "NVDA" } }))
            .with_series("NVDA", nvda_points())
    }

    pub fn with_catalog(mut self, catalog: Value) -> Self {
        self.catalog = catalog;
        self
    }

    /// Registers the JSON array served for `ticker`, whatever the window.
    pub fn with_series(mut self, ticker: &str, points: Value) -> Self {
        self.series.insert(ticker.to_string(), points);
        self
    }

    /// Rejects requests that do not carry `Authorization: Bearer <token>`.
    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    /// Number of requests received so far, across all clones.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn router(&self) -> Router {
        let state = Arc::new(self.clone());
        Router::new()
            .route("/stocks", get(catalog))
            .route("/stocks/:ticker", get(price_history))
            .layer(middleware::from_fn_with_state(state.clone(), authorize))
            .with_state(state)
    }
}

async fn authorize(State(mock): State<Arc<MockUpstream>>, request: Request, next: Next) -> Response {
    mock.requests.fetch_add(1, Ordering::SeqCst);

    if let Some(token) = &mock.required_token {
        let expected = format!("Bearer {}", token);
        let presented = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected.as_str()) {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid authorization token" })),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn catalog(State(mock): State<Arc<MockUpstream>>) -> Json<Value> {
    Json(mock.catalog.clone())
}

async fn price_history(
    Path(ticker): Path<String>,
    State(mock): State<Arc<MockUpstream>>,
) -> Response {
    match mock.series.get(&ticker) {
        Some(points) => Json(points.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": NOT_FOUND_MESSAGE })),
        )
            .into_response(),
    }
}

fn nvda_points() -> Value {
    json!([
        { "price": 666.66595, "lastUpdatedAt": "2025-05-08T04:11:42.465706306Z" },
        { "price": 212.9439, "lastUpdatedAt": "2025-05-08T04:14:39.465201105Z" },
        { "price": 163.42203, "lastUpdatedAt": "2025-05-08T04:23:30.465542126Z" },
        { "price": 231.95296, "lastUpdatedAt": "2025-05-08T04:26:27.4658491Z" },
        { "price": 124.95156, "lastUpdatedAt": "2025-05-08T04:30:23.465940341Z" },
        { "price": 459.09558, "lastUpdatedAt": "2025-05-08T04:39:14.464887447Z" },
        { "price": 998.27924, "lastUpdatedAt": "2025-05-08T04:42:55.464999999Z" }
    ])
}
