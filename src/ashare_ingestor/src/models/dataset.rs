//! The two daily feeds and the constants that identify their rows.

use std::fmt;

use clap::ValueEnum;

/// Column holding the security code in every stored table.
pub const CODE_COLUMN: &str = "代码";

/// Column holding the run date (`YYYY-MM-DD`) in every stored table.
pub const DATE_COLUMN: &str = "日期";

/// A named daily feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Dataset {
    /// Popularity ranking (top 100 most-watched securities).
    Rank,
    /// Spot quotes for the whole A-share market.
    Spot,
}

impl Dataset {
    /// Every dataset, in the order a daily run processes them.
    pub const ALL: [Dataset; 2] = [Dataset::Rank, Dataset::Spot];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Spot => "spot",
        }
    }

    /// Human-facing label used in the run log.
    pub fn label(self) -> &'static str {
        match self {
            Self::Rank => "人气榜",
            Self::Spot => "行情数据",
        }
    }

    /// The key that must be unique in this dataset's history.
    pub fn key(self) -> DedupKey {
        DedupKey::new(CODE_COLUMN, DATE_COLUMN)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The (code, date) column pair identifying one observation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DedupKey {
    pub code: String,
    pub date: String,
}

impl DedupKey {
    pub fn new(code: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            date: date.into(),
        }
    }

    pub fn columns(&self) -> [&str; 2] {
        [&self.code, &self.date]
    }
}
