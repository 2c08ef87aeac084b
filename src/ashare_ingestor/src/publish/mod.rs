//! Publishing persisted history files somewhere durable.
//!
//! The pipeline only knows the [`Publisher`] trait: "make this file public
//! under this label". The git implementation commits and pushes; tests and
//! `--no-publish` runs use [`NoopPublisher`].

pub mod git;

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub use git::GitPublisher;

#[derive(Debug, Error)]
pub enum PublishError {
    /// The publishing command could not be started at all.
    #[error("failed to run `{step}`")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and reported failure.
    #[error("`{step}` exited with {status}: {stderr}")]
    Failed {
        step: String,
        status: String,
        stderr: String,
    },

    #[error("`{step}` did not finish within {secs}s")]
    Timeout { step: String, secs: u64 },
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes the file at `path`; `label` describes the change (e.g. a
    /// commit message carrying the run date).
    async fn publish(&self, path: &Path, label: &str) -> Result<(), PublishError>;
}

/// Publisher that does nothing, for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl Publisher for NoopPublisher {
    async fn publish(&self, path: &Path, label: &str) -> Result<(), PublishError> {
        debug!(path = %path.display(), label, "publishing disabled");
        Ok(())
    }
}
