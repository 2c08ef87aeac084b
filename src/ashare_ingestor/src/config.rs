//! Runtime settings: file locations, time zone, provider and publish options.
//!
//! Settings come from an optional TOML file. Every key has a default, so the
//! binary runs with no file at all; the base directory then comes from
//! `$GITHUB_WORKSPACE` (the checkout the scheduled job runs in) or falls back
//! to the current directory. Relative file names are resolved against
//! `base_dir`; absolute ones are used as given.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use shared_utils::env::dir_from_env_or;
use thiserror::Error;

use crate::{models::dataset::Dataset, tz::parse_tz};

/// Environment variable providing the default base directory.
pub const BASE_DIR_ENV: &str = "GITHUB_WORKSPACE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown time zone: {0}")]
    InvalidTimezone(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding the history files, the run log and the git checkout.
    pub base_dir: PathBuf,
    /// IANA zone that defines "today" for the date stamp.
    pub timezone: String,
    pub rank_file: PathBuf,
    pub spot_file: PathBuf,
    pub log_file: PathBuf,
    pub provider: ProviderSettings,
    pub publish: PublishSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: dir_from_env_or(BASE_DIR_ENV, "."),
            timezone: "Asia/Shanghai".to_string(),
            rank_file: PathBuf::from("hot_rank.csv.gz"),
            spot_file: PathBuf::from("a_spot.csv.gz"),
            log_file: PathBuf::from("log.txt"),
            provider: ProviderSettings::default(),
            publish: PublishSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderSettings {
    /// Per-request timeout for every HTTP call.
    pub request_timeout_secs: u64,
    /// Rows per page when paging through the spot-quote board.
    pub page_size: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishSettings {
    /// When false, history files are written but never committed.
    pub enabled: bool,
    /// Commit message prefix; the run date is appended.
    pub commit_prefix: String,
    /// Committer identity written to the repository config before committing.
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    /// Upper bound for each git subprocess.
    pub timeout_secs: u64,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            commit_prefix: "更新数据".to_string(),
            user_name: Some("github-actions".to_string()),
            user_email: Some("github-actions@github.com".to_string()),
            timeout_secs: 120,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or returns the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        parse_tz(&self.timezone).ok_or_else(|| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Location of the gzip CSV history for `dataset`.
    pub fn history_path(&self, dataset: Dataset) -> PathBuf {
        let file = match dataset {
            Dataset::Rank => &self.rank_file,
            Dataset::Spot => &self.spot_file,
        };
        self.base_dir.join(file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.base_dir.join(&self.log_file)
    }
}
