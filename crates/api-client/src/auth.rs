use crate::error::ApiError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// Builds the default headers carrying the provider's bearer credential.
///
/// The header value is marked sensitive so that it is never printed by
/// reqwest's or our own debug output.
///
/// # Arguments
///
/// * `token` - The bearer token, without the `Bearer ` prefix.
pub fn bearer_headers(token: &str) -> Result<HeaderMap, ApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
        .map_err(|_| ApiError::InvalidConfig("upstream token contains invalid characters".to_string()))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}
