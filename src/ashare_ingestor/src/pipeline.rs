//! One daily run: fetch, merge, persist and publish each dataset, then log.
//!
//! Datasets are processed one after another and never influence each other:
//! a dataset that fails at any stage is reported and the next one still runs.
//! Failure classes map to process exit codes through [`RunReport::exit_code`].

use std::path::Path;

use polars::prelude::DataFrame;
use tracing::{error, info, warn};

use crate::{
    config::Settings,
    errors::Error,
    fetcher::fetch,
    io::history::{load_history, persist_history},
    merge::merge,
    models::dataset::Dataset,
    providers::{MarketDataProvider, eastmoney::EastMoneyProvider},
    publish::{GitPublisher, NoopPublisher, Publisher},
    run_log::RunLog,
    tz::RunClock,
};

/// What went wrong for a dataset, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Failure {
    /// Nothing was fetched; the history was left alone.
    Fetch,
    /// The history was updated locally but could not be published.
    Publish,
    /// The history could not be loaded, merged or written.
    Persist,
}

impl Failure {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Fetch => 2,
            Self::Publish => 3,
            Self::Persist => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetReport {
    pub dataset: Dataset,
    /// Rows in today's snapshot, `None` when the fetch was skipped.
    pub fetched: Option<usize>,
    /// Rows in the history after the merge, `None` when nothing was written.
    pub stored: Option<usize>,
    pub failure: Option<Failure>,
}

impl DatasetReport {
    fn skipped(dataset: Dataset) -> Self {
        Self {
            dataset,
            fetched: None,
            stored: None,
            failure: Some(Failure::Fetch),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Local wall-clock time of the run, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub datasets: Vec<DatasetReport>,
}

impl RunReport {
    pub fn dataset(&self, dataset: Dataset) -> Option<&DatasetReport> {
        self.datasets.iter().find(|d| d.dataset == dataset)
    }

    /// True when every processed dataset produced a snapshot.
    pub fn all_fetched(&self) -> bool {
        self.datasets.iter().all(|d| d.fetched.is_some())
    }

    /// `0` on full success, otherwise the code of the most severe failure.
    pub fn exit_code(&self) -> u8 {
        self.datasets
            .iter()
            .filter_map(|d| d.failure)
            .max()
            .map_or(0, Failure::exit_code)
    }
}

pub struct Pipeline<'a> {
    provider: &'a dyn MarketDataProvider,
    publisher: &'a dyn Publisher,
    settings: &'a Settings,
    clock: RunClock,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        provider: &'a dyn MarketDataProvider,
        publisher: &'a dyn Publisher,
        settings: &'a Settings,
        clock: RunClock,
    ) -> Self {
        Self {
            provider,
            publisher,
            settings,
            clock,
        }
    }

    /// Runs every dataset in order and appends the outcome to the run log.
    pub async fn run(&self, datasets: &[Dataset]) -> RunReport {
        let mut reports = Vec::with_capacity(datasets.len());
        for &dataset in datasets {
            reports.push(self.run_dataset(dataset).await);
        }

        let report = RunReport {
            timestamp: self.clock.timestamp(),
            datasets: reports,
        };
        RunLog::new(self.settings.log_path()).record(&report);
        report
    }

    pub async fn run_dataset(&self, dataset: Dataset) -> DatasetReport {
        let Some(snapshot) = fetch(self.provider, dataset, &self.clock).await else {
            return DatasetReport::skipped(dataset);
        };
        let fetched = snapshot.height();
        let path = self.settings.history_path(dataset);

        let stored = match update_history(dataset, snapshot, &path) {
            Ok(stored) => stored,
            Err(err) => {
                error!(%dataset, path = %path.display(), error = %err, "history update failed, not publishing");
                return DatasetReport {
                    dataset,
                    fetched: Some(fetched),
                    stored: None,
                    failure: Some(Failure::Persist),
                };
            }
        };

        let label = format!("{} {}", self.settings.publish.commit_prefix, self.clock.today());
        let failure = match self.publisher.publish(&path, &label).await {
            Ok(()) => None,
            Err(err) => {
                warn!(%dataset, path = %path.display(), error = %err, "publish failed, local history kept");
                Some(Failure::Publish)
            }
        };

        info!(%dataset, fetched, stored, "dataset done");
        DatasetReport {
            dataset,
            fetched: Some(fetched),
            stored: Some(stored),
            failure,
        }
    }
}

/// Loads, merges and rewrites one history file. Returns the stored row count.
pub fn update_history(dataset: Dataset, snapshot: DataFrame, path: &Path) -> Result<usize, Error> {
    let existing = load_history(path)?;
    let merged = merge(existing, snapshot, &dataset.key())?;
    persist_history(&merged, path)?;
    Ok(merged.height())
}

/// Builds the production collaborators from `settings` and runs `datasets`.
pub async fn run_daily(settings: &Settings, datasets: &[Dataset]) -> Result<RunReport, Error> {
    let clock = RunClock::now_in(settings.tz()?);
    let provider = EastMoneyProvider::new(&settings.provider)?;
    let publisher: Box<dyn Publisher> = if settings.publish.enabled {
        Box::new(GitPublisher::new(&settings.base_dir, &settings.publish))
    } else {
        Box::new(NoopPublisher)
    };

    info!(base_dir = %settings.base_dir.display(), date = %clock.today(), "starting run");
    let pipeline = Pipeline::new(&provider, publisher.as_ref(), settings, clock);
    Ok(pipeline.run(datasets).await)
}
