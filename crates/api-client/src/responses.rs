use serde::Deserialize;

/// The body the provider sends alongside a non-success status,
/// e.g. `{"error": "Stock data not found for given query"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
