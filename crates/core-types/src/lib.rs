pub mod error;
pub mod structs;
pub mod window;

// Re-export the core types to provide a clean public API.
pub use error::CoreError;
pub use structs::{prices, AggregationResult, CorrelationResult, PricePoint, PriceSeries, StockAverage};
pub use window::WindowMinutes;
