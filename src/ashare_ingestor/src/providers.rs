//! Provider abstraction for the daily A-share feeds.
//!
//! This module defines the [`MarketDataProvider`] trait, the single seam between
//! the pipeline and whatever vendor serves the data. The pipeline only ever asks
//! for "today's" hot-rank list and "today's" spot board; each call returns a
//! polars [`DataFrame`] whose headers are the vendor's own column names.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn MarketDataProvider`), so tests can substitute an in-memory provider.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use ashare_ingestor::providers::{MarketDataProvider, ProviderError};
//! use polars::prelude::*;
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl MarketDataProvider for Canned {
//!     async fn hot_rank(&self) -> Result<DataFrame, ProviderError> {
//!         Ok(DataFrame::empty())
//!     }
//!
//!     async fn spot_quotes(&self) -> Result<DataFrame, ProviderError> {
//!         Ok(DataFrame::empty())
//!     }
//! }
//! ```

pub mod eastmoney;

use async_trait::async_trait;
use polars::prelude::{DataFrame, PolarsError};
use snafu::{Backtrace, Snafu};

/// Source of the two daily snapshots.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Current popularity ranking.
    ///
    /// Must contain a `代码` column; an empty frame means "nothing today".
    async fn hot_rank(&self) -> Result<DataFrame, ProviderError>;

    /// Current spot quotes for the whole market.
    ///
    /// Must contain `代码` and `名称` plus the price columns the spot filter
    /// inspects (`今开`, `最新价`, `最高`, `最低`).
    async fn spot_quotes(&self) -> Result<DataFrame, ProviderError>;
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `MarketDataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout, bad JSON).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider answered with a non-success status.
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The payload parsed but did not have the expected shape.
    #[snafu(display("Unexpected payload: {message}"))]
    Payload {
        message: String,
        backtrace: Backtrace,
    },

    /// The payload could not be assembled into a frame.
    #[snafu(display("Failed to build frame: {source}"))]
    Frame {
        source: PolarsError,
        backtrace: Backtrace,
    },
}
