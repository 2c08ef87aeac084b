//! Daily A-share snapshot collector.
//!
//! Fetches the EastMoney hot-rank list and spot board, merges each into a
//! gzip CSV history keyed by (code, date), publishes the files and appends a
//! status line to a run log. See [`pipeline::run_daily`] for the entry point.

pub mod cli;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod io;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod publish;
pub mod run_log;
pub mod tz;
