//! # Stock Aggregation Statistics
//!
//! The numeric core of the service: the windowed average and the Pearson
//! correlation of two price sequences.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** Every function here takes plain `f64` slices and returns a
//!   plain `f64`. There is no I/O, no allocation beyond iteration and no state.
//! - **Degenerate inputs yield zero:** Empty input, mismatched lengths and
//!   constant sequences return `0.0` rather than `NaN` or an error, so results
//!   can always be serialized as JSON numbers.
//!
//! ## Public API
//!
//! - `average`: arithmetic mean, `0.0` on empty input.
//! - `correlation`: Pearson coefficient with Bessel's correction.
//! - `sample_std_dev` / `sample_covariance`: the (n - 1) building blocks.

pub mod stats;

pub use stats::{average, correlation, sample_covariance, sample_std_dev};
