//! Incremental merge of a fresh snapshot into the stored history.
//!
//! ## Contract
//! The merged frame holds exactly one row per `(code, date)` pair. When the
//! same pair appears in both inputs the incoming row wins, so re-running a
//! day's fetch replaces that day's rows instead of duplicating them.
//!
//! ## Schema drift
//! Before the union, columns that are entirely null are dropped from each side
//! independently. The sides may then disagree on their column sets; the
//! diagonal concat carries the union, and cells a side never had stay null.
//! The stored column set can therefore narrow when a vendor stops sending a
//! field.
//!
//! ## Key comparison
//! Both sides are cast to text before stacking. A code read back from CSV
//! (`"600001"`) and the same code fetched as a number therefore collide.
//!
//! ## Shortcuts
//! - No history (or a history with zero rows): the snapshot becomes the
//!   history after deduplicating it on its own.
//! - Empty snapshot: the history is returned untouched, row for row.

use polars::{functions::concat_df_diagonal, prelude::*};
use thiserror::Error;
use tracing::debug;

use crate::models::{
    dataset::DedupKey,
    frame::{as_text, drop_all_null_columns, has_column},
};

#[derive(Debug, Error)]
pub enum MergeError {
    /// A key column is absent, so rows cannot be identified.
    #[error("{side} frame has no `{column}` column")]
    MissingKeyColumn { side: &'static str, column: String },

    #[error("frame operation failed: {0}")]
    Frame(#[from] PolarsError),
}

/// Merges `incoming` into `existing`, keeping the last row per key.
pub fn merge(
    existing: Option<DataFrame>,
    incoming: DataFrame,
    key: &DedupKey,
) -> Result<DataFrame, MergeError> {
    let Some(existing) = existing.filter(|df| df.height() > 0) else {
        ensure_key_columns(&incoming, key, "incoming")?;
        return Ok(dedup_keep_last(as_text(&incoming)?, key)?);
    };

    if incoming.height() == 0 {
        return Ok(existing);
    }

    let (existing, dropped_existing) = drop_all_null_columns(&existing)?;
    let (incoming, dropped_incoming) = drop_all_null_columns(&incoming)?;
    if !dropped_existing.is_empty() || !dropped_incoming.is_empty() {
        debug!(
            ?dropped_existing,
            ?dropped_incoming,
            "dropped all-null columns before merge"
        );
    }

    ensure_key_columns(&existing, key, "existing")?;
    ensure_key_columns(&incoming, key, "incoming")?;

    let stacked = concat_df_diagonal(&[as_text(&existing)?, as_text(&incoming)?])?;
    Ok(dedup_keep_last(stacked, key)?)
}

/// Removes rows whose key repeats later in the frame.
///
/// Survivors keep their relative order. Null key cells compare equal to each
/// other, so two rows that both lack a date still collapse into one.
pub fn dedup_keep_last(df: DataFrame, key: &DedupKey) -> PolarsResult<DataFrame> {
    let before = df.height();
    let subset = vec![key.code.as_str().into(), key.date.as_str().into()];
    let deduped = df
        .lazy()
        .unique_stable(Some(subset), UniqueKeepStrategy::Last)
        .collect()?;

    let removed = before - deduped.height();
    if removed > 0 {
        debug!(removed, "dropped duplicate rows");
    }
    Ok(deduped)
}

fn ensure_key_columns(df: &DataFrame, key: &DedupKey, side: &'static str) -> Result<(), MergeError> {
    match key.columns().into_iter().find(|c| !has_column(df, c)) {
        Some(column) => Err(MergeError::MissingKeyColumn {
            side,
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}
