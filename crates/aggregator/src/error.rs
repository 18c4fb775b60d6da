use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregatorError {
    /// The request itself is malformed; the message is safe to show the caller.
    #[error("{0}")]
    Validation(String),

    #[error("Upstream provider error: {0}")]
    Upstream(#[from] api_client::error::ApiError),
}
