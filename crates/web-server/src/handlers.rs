use crate::error::{AppError, CORRELATION_FAILED, FETCH_STOCKS_FAILED, FETCH_STOCK_DATA_FAILED};
use crate::AppState;
use aggregator::parse_window;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{Query as MultiQuery, QueryRejection as MultiQueryRejection};
use core_types::CorrelationResult;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::sync::Arc;

/// The only `aggregation` mode the service computes itself.
const AGGREGATION_AVERAGE: &str = "average";

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    minutes: Option<String>,
    aggregation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CorrelationQuery {
    minutes: Option<String>,
    #[serde(default)]
    ticker: Vec<String>,
}

/// # GET /stocks
/// Passes the provider's ticker catalog through.
pub async fn get_stocks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Box<RawValue>>, AppError> {
    let catalog = state
        .aggregator
        .list_stocks()
        .await
        .map_err(|e| AppError::with_context(e, FETCH_STOCKS_FAILED))?;
    Ok(Json(catalog))
}

/// # GET /stocks/:ticker?minutes=m&aggregation=average
/// With `aggregation=average`, returns the average price over the last `m`
/// minutes and the history it was computed from. Otherwise the provider's
/// price history is passed through.
pub async fn get_stock(
    Path(ticker): Path<String>,
    State(state): State<Arc<AppState>>,
    query: Result<Query<StockQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(AppError::invalid_query)?;
    let fail = |e| AppError::with_context(e, FETCH_STOCK_DATA_FAILED);
    let window = parse_window(query.minutes.as_deref()).map_err(fail)?;

    if query.aggregation.as_deref() == Some(AGGREGATION_AVERAGE) {
        let average = state
            .aggregator
            .get_stock_average(&ticker, window)
            .await
            .map_err(fail)?;
        Ok(Json(average).into_response())
    } else {
        let history = state
            .aggregator
            .get_stock_history(&ticker, window)
            .await
            .map_err(fail)?;
        Ok(Json(history).into_response())
    }
}

/// # GET /stockcorrelation?minutes=m&ticker=A&ticker=B
/// Pearson correlation of two tickers' prices over the last `m` minutes.
pub async fn get_stock_correlation(
    State(state): State<Arc<AppState>>,
    query: Result<MultiQuery<CorrelationQuery>, MultiQueryRejection>,
) -> Result<Json<CorrelationResult>, AppError> {
    let MultiQuery(query) = query.map_err(AppError::invalid_query)?;
    let fail = |e| AppError::with_context(e, CORRELATION_FAILED);
    let window = parse_window(query.minutes.as_deref()).map_err(fail)?;

    let result = state
        .aggregator
        .get_stock_correlation(&query.ticker, window)
        .await
        .map_err(fail)?;
    Ok(Json(result))
}
