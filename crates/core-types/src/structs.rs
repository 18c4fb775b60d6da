use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Field names follow the upstream provider's camelCase JSON so that price
// histories can be passed back to our own clients unchanged.

/// A single price sample for a ticker, as reported by the upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub price: f64,
    pub last_updated_at: DateTime<Utc>,
}

/// The price samples for one ticker over a requested window, in the order the
/// provider returned them. The order is not guaranteed to be chronological.
pub type PriceSeries = Vec<PricePoint>;

/// Extracts the raw price values of a series, preserving order.
pub fn prices(series: &[PricePoint]) -> Vec<f64> {
    series.iter().map(|point| point.price).collect()
}

/// The response of the single-ticker average endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAverage {
    pub average_stock_price: f64,
    pub price_history: PriceSeries,
}

/// The per-ticker part of a correlation response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub average_price: f64,
    pub price_history: PriceSeries,
}

/// The response of the two-ticker correlation endpoint.
///
/// `correlation` lies in `[-1, 1]`, and is exactly `0.0` whenever the inputs
/// were degenerate (empty, unequal length or constant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub correlation: f64,
    pub stocks: BTreeMap<String, AggregationResult>,
}
