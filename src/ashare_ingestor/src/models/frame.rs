//! Small helpers over polars [`DataFrame`]s shared by the fetcher, the merge
//! and the history files.
//!
//! Snapshots and histories are plain `DataFrame`s whose headers are the
//! vendor's own column names. A null cell is a missing value. Histories read
//! back from disk are all-`String`, so codes such as `000001` keep their
//! leading zeros; [`as_text`] brings a typed snapshot onto the same footing
//! before the two are stacked.

use polars::prelude::*;

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_columns().iter().map(|c| c.name().to_string()).collect()
}

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// True when `column` is absent or holds no value in any row.
///
/// Columns of an empty frame are all-null by this definition.
pub fn is_all_null(df: &DataFrame, column: &str) -> bool {
    df.column(column)
        .map_or(true, |c| c.null_count() == c.len())
}

/// Removes every all-null column and returns the names that were removed,
/// in their former order.
pub fn drop_all_null_columns(df: &DataFrame) -> PolarsResult<(DataFrame, Vec<String>)> {
    let (kept, dropped): (Vec<&Column>, Vec<&Column>) = df
        .get_columns()
        .iter()
        .partition(|c| c.null_count() < c.len());

    let dropped = dropped.iter().map(|c| c.name().to_string()).collect();
    let kept = DataFrame::new(kept.into_iter().cloned().collect())?;
    Ok((kept, dropped))
}

/// Casts every column to `String`.
pub fn as_text(df: &DataFrame) -> PolarsResult<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| c.cast(&DataType::String))
        .collect::<PolarsResult<Vec<_>>>()?;
    DataFrame::new(columns)
}

/// Sets `column` to `value` on every row, appending the column if new.
pub fn fill_text(df: &mut DataFrame, column: &str, value: &str) -> PolarsResult<()> {
    let filled = Column::new(column.into(), vec![value; df.height()]);
    df.with_column(filled)?;
    Ok(())
}

/// Selects and renames columns in one pass.
///
/// The output has exactly the target columns of `mapping`, in mapping order.
/// A source column that is missing yields an all-null target.
pub fn project(df: &DataFrame, mapping: &[(&str, &str)]) -> PolarsResult<DataFrame> {
    let height = df.height();
    let columns = mapping
        .iter()
        .map(|&(from, to)| match df.column(from) {
            Ok(c) => {
                let mut c = c.clone();
                c.rename(to.into());
                c
            }
            Err(_) => Column::full_null(to.into(), height, &DataType::String),
        })
        .collect();
    DataFrame::new(columns)
}

/// Cells of `column` rendered as text; all `None` when the column is absent.
pub fn text_values(df: &DataFrame, column: &str) -> PolarsResult<Vec<Option<String>>> {
    let Ok(c) = df.column(column) else {
        return Ok(vec![None; df.height()]);
    };
    let text = c.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Keeps the rows whose entry in `keep` is true.
pub fn retain_rows(df: &DataFrame, keep: &[bool]) -> PolarsResult<DataFrame> {
    let mask: BooleanChunked = keep.iter().copied().collect();
    df.filter(&mask)
}
