//! Append-only, human-readable run log: one line per run.
//!
//! ```text
//! 2024-01-02 15:30:00 ✅ 人气榜：100条。行情数据：4987条
//! 2024-01-03 15:30:00 ❌ 人气榜：没有获取到新数据，跳过。行情数据：4990条
//! ```

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::pipeline::{DatasetReport, Failure, RunReport};

pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the line for `report`. Write failures are logged, never raised.
    pub fn record(&self, report: &RunReport) {
        let line = format_line(report);
        if let Err(err) = self.append(&line) {
            warn!(path = %self.path.display(), error = %err, "could not append to run log");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

/// Renders the log line for a run.
///
/// The glyph is ✅ only when every dataset produced a snapshot; local
/// storage or publish problems are noted after the affected dataset's count.
pub fn format_line(report: &RunReport) -> String {
    let glyph = if report.all_fetched() { "✅" } else { "❌" };
    let parts: Vec<String> = report.datasets.iter().map(describe).collect();
    format!("{} {} {}", report.timestamp, glyph, parts.join("。"))
}

fn describe(d: &DatasetReport) -> String {
    let label = d.dataset.label();
    let Some(n) = d.fetched else {
        return format!("{label}：没有获取到新数据，跳过");
    };
    match d.failure {
        Some(Failure::Persist) => format!("{label}：{n}条（保存失败）"),
        Some(Failure::Publish) => format!("{label}：{n}条（推送失败）"),
        _ => format!("{label}：{n}条"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dataset::Dataset;
    use tempfile::TempDir;

    fn ok(dataset: Dataset, n: usize) -> DatasetReport {
        DatasetReport {
            dataset,
            fetched: Some(n),
            stored: Some(n),
            failure: None,
        }
    }

    #[test]
    fn both_fetched_is_a_success_line() {
        let report = RunReport {
            timestamp: "2024-01-02 15:30:00".into(),
            datasets: vec![ok(Dataset::Rank, 100), ok(Dataset::Spot, 4987)],
        };
        assert_eq!(
            format_line(&report),
            "2024-01-02 15:30:00 ✅ 人气榜：100条。行情数据：4987条"
        );
    }

    #[test]
    fn skipped_dataset_is_a_failure_line() {
        let report = RunReport {
            timestamp: "2024-01-03 15:30:00".into(),
            datasets: vec![
                DatasetReport {
                    dataset: Dataset::Rank,
                    fetched: None,
                    stored: None,
                    failure: Some(Failure::Fetch),
                },
                DatasetReport {
                    failure: Some(Failure::Publish),
                    ..ok(Dataset::Spot, 4990)
                },
            ],
        };
        assert_eq!(
            format_line(&report),
            "2024-01-03 15:30:00 ❌ 人气榜：没有获取到新数据，跳过。行情数据：4990条（推送失败）"
        );
    }

    #[test]
    fn record_appends_lines() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::new(dir.path().join("log.txt"));
        let report = RunReport {
            timestamp: "2024-01-02 15:30:00".into(),
            datasets: vec![ok(Dataset::Rank, 1)],
        };

        log.record(&report);
        log.record(&report);

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn unwritable_log_does_not_panic() {
        let dir = TempDir::new().unwrap();
        let log = RunLog::new(dir.path().join("missing/dir/log.txt"));
        log.record(&RunReport {
            timestamp: "t".into(),
            datasets: vec![],
        });
        assert!(!log.path().exists());
    }
}
