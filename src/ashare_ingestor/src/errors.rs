use thiserror::Error;

use crate::{config::ConfigError, io::history::HistoryError, merge::MergeError, providers::ProviderInitError};

/// The unified error type for the `ashare_ingestor` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be loaded or are invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The data provider could not be constructed.
    #[error("Provider initialization error: {0}")]
    ProviderInit(#[from] ProviderInitError),

    /// Reading or writing a history file failed.
    #[error("History storage error: {0}")]
    History(#[from] HistoryError),

    /// The snapshot could not be merged into the history.
    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),
}
