use std::path::PathBuf;

use clap::Parser;

use crate::models::dataset::Dataset;

/// Fetch today's A-share snapshots, merge them into history and publish.
///
/// With no arguments every dataset is processed using default settings.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dataset to process; repeat to select several (default: all)
    #[arg(long = "dataset", value_enum)]
    pub datasets: Vec<Dataset>,

    /// Write history files but skip the git commit and push
    #[arg(long)]
    pub no_publish: bool,
}

impl Cli {
    /// Selected datasets in processing order, without repeats.
    pub fn selected_datasets(&self) -> Vec<Dataset> {
        if self.datasets.is_empty() {
            return Dataset::ALL.to_vec();
        }
        Dataset::ALL
            .into_iter()
            .filter(|d| self.datasets.contains(d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_selects_everything() {
        let cli = Cli::try_parse_from(["ashare-ingestor"]).unwrap();
        assert_eq!(cli.selected_datasets(), vec![Dataset::Rank, Dataset::Spot]);
        assert!(!cli.no_publish);
        assert!(cli.config.is_none());
    }

    #[test]
    fn datasets_are_deduplicated_and_ordered() {
        let cli = Cli::try_parse_from([
            "ashare-ingestor",
            "--dataset",
            "spot",
            "--dataset",
            "rank",
            "--dataset",
            "spot",
            "--no-publish",
        ])
        .unwrap();
        assert_eq!(cli.selected_datasets(), vec![Dataset::Rank, Dataset::Spot]);
        assert!(cli.no_publish);
    }

    #[test]
    fn unknown_dataset_is_rejected() {
        assert!(Cli::try_parse_from(["ashare-ingestor", "--dataset", "bonds"]).is_err());
    }
}
