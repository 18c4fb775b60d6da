use aggregator::error::AggregatorError;
use api_client::error::ApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt::Display;
use thiserror::Error;

/// Returned by `GET /stocks` when the catalog cannot be fetched.
pub const FETCH_STOCKS_FAILED: &str = "Failed to fetch stocks";
/// Returned by `GET /stocks/:ticker` when the price history cannot be fetched.
pub const FETCH_STOCK_DATA_FAILED: &str = "Failed to fetch stock data";
/// Returned by `GET /stockcorrelation` when either price history cannot be fetched.
pub const CORRELATION_FAILED: &str = "Failed to calculate correlation";
/// Returned when the query string itself cannot be decoded.
pub const INVALID_QUERY: &str = "Invalid query string";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),
    /// `message` is the endpoint's public error text; `source` is logged only.
    #[error("{message}: {source}")]
    Upstream {
        message: &'static str,
        #[source]
        source: ApiError,
    },
}

impl AppError {
    /// Attaches the endpoint's public failure message to an aggregator error.
    pub fn with_context(err: AggregatorError, message: &'static str) -> Self {
        match err {
            AggregatorError::Validation(msg) => AppError::Validation(msg),
            AggregatorError::Upstream(source) => AppError::Upstream { message, source },
        }
    }

    /// A query string the extractor could not decode, such as a repeated
    /// single-valued key. The decoder's own wording is logged, not returned.
    pub fn invalid_query(rejection: impl Display) -> Self {
        tracing::debug!(%rejection, "Could not decode query string.");
        AppError::Validation(INVALID_QUERY.to_string())
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(message) => {
                tracing::debug!(%message, "Rejected request.");
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::Upstream { message, source } => {
                tracing::error!(error = %source, "{}.", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message.to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
