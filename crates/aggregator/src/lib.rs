use crate::error::AggregatorError;
use analytics::{average, correlation};
use api_client::PriceFetcher;
use core_types::{
    prices, AggregationResult, CorrelationResult, PriceSeries, StockAverage, WindowMinutes,
};
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod error;

/// Validation message for a correlation request without exactly two tickers.
pub const EXACTLY_TWO_TICKERS: &str = "Exactly 2 tickers must be specified";
/// Validation message for a `minutes` value that is not a positive integer.
pub const INVALID_WINDOW: &str = "minutes must be a positive integer";

/// Parses the optional `minutes` query value of a request.
///
/// An empty or blank value counts as absent, so the default window applies.
pub fn parse_window(minutes: Option<&str>) -> Result<Option<WindowMinutes>, AggregatorError> {
    minutes
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            raw.parse::<WindowMinutes>()
                .map_err(|_| AggregatorError::Validation(INVALID_WINDOW.to_string()))
        })
        .transpose()
}

/// The request orchestrator: one operation per endpoint.
///
/// Holds no per-request state. Every call performs fresh upstream fetches,
/// so a single instance is shared by all request handlers.
#[derive(Clone)]
pub struct StockAggregator {
    fetcher: Arc<dyn PriceFetcher>,
    default_window: WindowMinutes,
}

impl StockAggregator {
    pub fn new(fetcher: Arc<dyn PriceFetcher>, default_window: WindowMinutes) -> Self {
        Self {
            fetcher,
            default_window,
        }
    }

    /// Average price of `ticker` over `window` (or the default window),
    /// together with the series it was computed from.
    pub async fn get_stock_average(
        &self,
        ticker: &str,
        window: Option<WindowMinutes>,
    ) -> Result<StockAverage, AggregatorError> {
        let window = window.unwrap_or(self.default_window);
        let series = self.fetcher.fetch_series(ticker, Some(window)).await?;

        Ok(StockAverage {
            average_stock_price: average(&prices(&series)),
            price_history: series,
        })
    }

    /// The provider's price history for `ticker`, passed through byte for
    /// byte. The window is only forwarded when the caller gave one.
    pub async fn get_stock_history(
        &self,
        ticker: &str,
        window: Option<WindowMinutes>,
    ) -> Result<Box<RawValue>, AggregatorError> {
        Ok(self.fetcher.fetch_raw(ticker, window).await?)
    }

    /// Pearson correlation of two tickers' prices over the same window.
    ///
    /// Both series are fetched concurrently; the first failure drops the
    /// other fetch and fails the whole request. Prices are paired by their
    /// position in each series, not by timestamp.
    pub async fn get_stock_correlation(
        &self,
        tickers: &[String],
        window: Option<WindowMinutes>,
    ) -> Result<CorrelationResult, AggregatorError> {
        let (first, second) = match tickers {
            [first, second]
                if !first.trim().is_empty() && !second.trim().is_empty() && first != second =>
            {
                (first.as_str(), second.as_str())
            }
            _ => return Err(AggregatorError::Validation(EXACTLY_TWO_TICKERS.to_string())),
        };

        let window = Some(window.unwrap_or(self.default_window));
        let (first_series, second_series) = tokio::try_join!(
            self.fetcher.fetch_series(first, window),
            self.fetcher.fetch_series(second, window),
        )?;

        let first_prices = prices(&first_series);
        let second_prices = prices(&second_series);
        if first_prices.len() != second_prices.len() {
            tracing::debug!(
                first,
                second,
                first_len = first_prices.len(),
                second_len = second_prices.len(),
                "Series lengths differ; correlation is reported as 0."
            );
        }
        let coefficient = correlation(&first_prices, &second_prices);

        let mut stocks = BTreeMap::new();
        stocks.insert(first.to_string(), summarize(first_series, &first_prices));
        stocks.insert(second.to_string(), summarize(second_series, &second_prices));

        Ok(CorrelationResult {
            correlation: coefficient,
            stocks,
        })
    }

    /// The provider's ticker catalog, passed through byte for byte.
    pub async fn list_stocks(&self) -> Result<Box<RawValue>, AggregatorError> {
        Ok(self.fetcher.list_stocks().await?)
    }
}

fn summarize(series: PriceSeries, prices: &[f64]) -> AggregationResult {
    AggregationResult {
        average_price: average(prices),
        price_history: series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use core_types::PricePoint;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// How the fake provider answers for one ticker.
    #[derive(Clone)]
    enum Reply {
        Series(Vec<f64>),
        DelayedSeries(Duration, Vec<f64>),
        Fail,
        Hang,
    }

    /// Deliberately not in key order, to show nothing re-sorts it.
    const CATALOG: &str = r#"{"stocks":{"Zeta Corp":"ZZZ","Apple Inc.":"AAPL"}}"#;

    #[derive(Default)]
    struct FakeFetcher {
        replies: HashMap<String, Reply>,
        calls: Mutex<Vec<(String, Option<u32>)>>,
    }

    impl FakeFetcher {
        fn with(mut self, ticker: &str, reply: Reply) -> Self {
            self.replies.insert(ticker.to_string(), reply);
            self
        }

        fn calls(&self) -> Vec<(String, Option<u32>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn series(prices: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2025, 5, 8, 4, 0, 0).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                price,
                last_updated_at: start + chrono::Duration::minutes(i as i64),
            })
            .collect()
    }

    #[async_trait]
    impl PriceFetcher for FakeFetcher {
        async fn fetch_series(
            &self,
            ticker: &str,
            window: Option<WindowMinutes>,
        ) -> Result<PriceSeries, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((ticker.to_string(), window.map(WindowMinutes::get)));
            match self.replies.get(ticker).cloned() {
                Some(Reply::Series(prices)) => Ok(series(&prices)),
                Some(Reply::DelayedSeries(delay, prices)) => {
                    tokio::time::sleep(delay).await;
                    Ok(series(&prices))
                }
                Some(Reply::Hang) => std::future::pending().await,
                Some(Reply::Fail) | None => Err(ApiError::Status {
                    status: 404,
                    message: "Stock data not found for given query".to_string(),
                }),
            }
        }

        async fn fetch_raw(
            &self,
            ticker: &str,
            window: Option<WindowMinutes>,
        ) -> Result<Box<RawValue>, ApiError> {
            let points = self.fetch_series(ticker, window).await?;
            serde_json::value::to_raw_value(&points)
                .map_err(|e| ApiError::Deserialization(e.to_string()))
        }

        async fn list_stocks(&self) -> Result<Box<RawValue>, ApiError> {
            RawValue::from_string(CATALOG.to_string())
                .map_err(|e| ApiError::Deserialization(e.to_string()))
        }
    }

    fn aggregator(fetcher: Arc<FakeFetcher>) -> StockAggregator {
        StockAggregator::new(fetcher, WindowMinutes::new(5).unwrap())
    }

    fn tickers(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_optional_window() {
        assert_eq!(parse_window(None).unwrap(), None);
        assert_eq!(parse_window(Some("30")).unwrap().map(WindowMinutes::get), Some(30));
        assert!(matches!(
            parse_window(Some("abc")),
            Err(AggregatorError::Validation(msg)) if msg == INVALID_WINDOW
        ));
    }

    #[test]
    fn blank_window_counts_as_absent() {
        assert_eq!(parse_window(Some("")).unwrap(), None);
        assert_eq!(parse_window(Some("   ")).unwrap(), None);
        assert_eq!(parse_window(Some(" 10 ")).unwrap().map(WindowMinutes::get), Some(10));
    }

    #[tokio::test]
    async fn blank_window_falls_back_to_default() {
        let fetcher = Arc::new(FakeFetcher::default().with("NVDA", Reply::Series(vec![2.0, 4.0])));
        let window = parse_window(Some("")).unwrap();
        aggregator(fetcher.clone())
            .get_stock_average("NVDA", window)
            .await
            .unwrap();
        assert_eq!(fetcher.calls(), vec![("NVDA".to_string(), Some(5))]);
    }

    #[tokio::test]
    async fn average_uses_default_window_and_keeps_order() {
        let fetcher = Arc::new(FakeFetcher::default().with("NVDA", Reply::Series(vec![3.0, 1.0, 8.0])));
        let result = aggregator(fetcher.clone())
            .get_stock_average("NVDA", None)
            .await
            .unwrap();

        assert_eq!(result.average_stock_price, 4.0);
        assert_eq!(prices(&result.price_history), vec![3.0, 1.0, 8.0]);
        assert_eq!(fetcher.calls(), vec![("NVDA".to_string(), Some(5))]);
    }

    #[tokio::test]
    async fn average_of_empty_series_is_zero() {
        let fetcher = Arc::new(FakeFetcher::default().with("EMPTY", Reply::Series(vec![])));
        let window = WindowMinutes::new(30).ok();
        let result = aggregator(fetcher.clone())
            .get_stock_average("EMPTY", window)
            .await
            .unwrap();

        assert_eq!(result.average_stock_price, 0.0);
        assert!(result.price_history.is_empty());
        assert_eq!(fetcher.calls(), vec![("EMPTY".to_string(), Some(30))]);
    }

    #[tokio::test]
    async fn average_surfaces_upstream_failure() {
        let fetcher = Arc::new(FakeFetcher::default());
        let err = aggregator(fetcher).get_stock_average("NOPE", None).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Upstream(_)));
    }

    #[tokio::test]
    async fn history_forwards_window_only_when_given() {
        let fetcher = Arc::new(FakeFetcher::default().with("NVDA", Reply::Series(vec![1.0])));
        let agg = aggregator(fetcher.clone());

        let raw = agg.get_stock_history("NVDA", None).await.unwrap();
        let raw: Value = serde_json::from_str(raw.get()).unwrap();
        assert_eq!(raw[0]["price"], 1.0);
        agg.get_stock_history("NVDA", WindowMinutes::new(15).ok()).await.unwrap();

        assert_eq!(
            fetcher.calls(),
            vec![("NVDA".to_string(), None), ("NVDA".to_string(), Some(15))]
        );
    }

    #[tokio::test]
    async fn correlation_requires_exactly_two_distinct_tickers() {
        let fetcher = Arc::new(FakeFetcher::default().with("AAA", Reply::Series(vec![1.0, 2.0])));
        let agg = aggregator(fetcher.clone());

        for bad in [
            tickers(&[]),
            tickers(&["AAA"]),
            tickers(&["AAA", "AAA"]),
            tickers(&["AAA", ""]),
            tickers(&["AAA", "BBB", "CCC"]),
        ] {
            let err = agg.get_stock_correlation(&bad, None).await.unwrap_err();
            assert!(matches!(err, AggregatorError::Validation(ref msg) if msg == EXACTLY_TWO_TICKERS));
        }
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn correlation_of_identical_series_is_one() {
        let prices_ = vec![10.0, 12.0, 11.0, 15.0, 14.0];
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with("AAA", Reply::Series(prices_.clone()))
                .with("BBB", Reply::Series(prices_)),
        );
        let result = aggregator(fetcher.clone())
            .get_stock_correlation(&tickers(&["AAA", "BBB"]), WindowMinutes::new(10).ok())
            .await
            .unwrap();

        assert!((result.correlation - 1.0).abs() < 1e-9);
        assert_eq!(result.stocks.len(), 2);
        assert_eq!(result.stocks["AAA"].average_price, 12.4);
        let mut calls = fetcher.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![("AAA".to_string(), Some(10)), ("BBB".to_string(), Some(10))]
        );
    }

    #[tokio::test]
    async fn correlation_keeps_ticker_identity_when_completion_order_flips() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with("SLOW", Reply::DelayedSeries(Duration::from_millis(50), vec![1.0, 2.0, 3.0]))
                .with("FAST", Reply::Series(vec![30.0, 20.0, 10.0])),
        );
        let result = aggregator(fetcher)
            .get_stock_correlation(&tickers(&["SLOW", "FAST"]), None)
            .await
            .unwrap();

        assert!((result.correlation + 1.0).abs() < 1e-9);
        assert_eq!(result.stocks["SLOW"].average_price, 2.0);
        assert_eq!(result.stocks["FAST"].average_price, 20.0);
        assert_eq!(prices(&result.stocks["SLOW"].price_history), vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn correlation_of_unequal_lengths_is_zero() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with("AAA", Reply::Series(vec![1.0, 2.0, 3.0]))
                .with("BBB", Reply::Series(vec![1.0, 2.0])),
        );
        let result = aggregator(fetcher)
            .get_stock_correlation(&tickers(&["AAA", "BBB"]), None)
            .await
            .unwrap();

        assert_eq!(result.correlation, 0.0);
        assert_eq!(result.stocks["BBB"].average_price, 1.5);
    }

    #[tokio::test]
    async fn correlation_fails_on_either_fetch_without_retry() {
        for order in [["AAA", "BAD"], ["BAD", "AAA"]] {
            let fetcher = Arc::new(
                FakeFetcher::default()
                    .with("AAA", Reply::Series(vec![1.0, 2.0]))
                    .with("BAD", Reply::Fail),
            );
            let err = aggregator(fetcher.clone())
                .get_stock_correlation(&tickers(&order), None)
                .await
                .unwrap_err();

            assert!(matches!(err, AggregatorError::Upstream(_)));
            let bad_calls = fetcher.calls().iter().filter(|(t, _)| t == "BAD").count();
            assert_eq!(bad_calls, 1);
        }
    }

    #[tokio::test]
    async fn failing_fetch_abandons_its_sibling() {
        let fetcher = Arc::new(
            FakeFetcher::default()
                .with("STUCK", Reply::Hang)
                .with("BAD", Reply::Fail),
        );
        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            aggregator(fetcher).get_stock_correlation(&tickers(&["STUCK", "BAD"]), None),
        )
        .await
        .expect("the failed fetch should end the join without waiting for its sibling");

        assert!(matches!(outcome, Err(AggregatorError::Upstream(_))));
    }

    #[tokio::test]
    async fn catalog_is_passed_through() {
        let fetcher = Arc::new(FakeFetcher::default());
        let catalog = aggregator(fetcher).list_stocks().await.unwrap();
        assert_eq!(catalog.get(), CATALOG);
    }
}
