//! Turns a provider call into a dated snapshot, or nothing.
//!
//! Provider failures never escape this module: a dataset that cannot be
//! fetched today is skipped with a warning and the run carries on with the
//! other one.

use polars::prelude::*;
use tracing::{info, warn};

use crate::{
    models::{
        dataset::{CODE_COLUMN, DATE_COLUMN, Dataset},
        frame::{fill_text, project, retain_rows, text_values},
    },
    providers::MarketDataProvider,
    tz::RunClock,
};

/// At least one of these must be present for a spot row to be kept.
pub const SPOT_PRICE_COLUMNS: [&str; 4] = ["今开", "最新价", "最高", "最低"];

/// Shanghai main board, Shenzhen main board and ChiNext.
pub const SPOT_CODE_PREFIXES: [&str; 3] = ["60", "00", "30"];

/// Name column of the raw spot board.
pub const SPOT_NAME_COLUMN: &str = "名称";

/// Securities under special treatment carry this marker in their name.
pub const SPECIAL_TREATMENT_MARKER: &str = "ST";

/// Stored spot columns: (board header, stored header).
pub const SPOT_PROJECTION: [(&str, &str); 13] = [
    ("日期", "日期"),
    ("名称", "股票名称"),
    ("代码", "代码"),
    ("今开", "开盘"),
    ("最新价", "收盘"),
    ("最高", "最高"),
    ("最低", "最低"),
    ("成交量", "成交量"),
    ("成交额", "成交额"),
    ("振幅", "振幅"),
    ("涨跌幅", "涨跌幅"),
    ("涨跌额", "涨跌额"),
    ("换手率", "换手率"),
];

/// Fetches `dataset` and stamps every row with the run date.
///
/// Returns `None` when the provider fails or returns zero rows.
pub async fn fetch(
    provider: &dyn MarketDataProvider,
    dataset: Dataset,
    clock: &RunClock,
) -> Option<DataFrame> {
    let result = match dataset {
        Dataset::Rank => provider.hot_rank().await,
        Dataset::Spot => provider.spot_quotes().await,
    };

    let raw = match result {
        Ok(df) => df,
        Err(err) => {
            warn!(%dataset, error = %err, "provider call failed, skipping dataset");
            return None;
        }
    };

    if raw.height() == 0 {
        warn!(%dataset, "provider returned no rows, skipping dataset");
        return None;
    }

    let snapshot = match shape(raw, dataset, &clock.today()) {
        Ok(df) => df,
        Err(err) => {
            warn!(%dataset, error = %err, "could not shape snapshot, skipping dataset");
            return None;
        }
    };

    info!(%dataset, rows = snapshot.height(), date = %clock.today(), "snapshot fetched");
    Some(snapshot)
}

fn shape(raw: DataFrame, dataset: Dataset, date: &str) -> PolarsResult<DataFrame> {
    let fetched = raw.height();
    let keep: Vec<bool> = text_values(&raw, CODE_COLUMN)?
        .iter()
        .map(Option::is_some)
        .collect();
    let mut df = retain_rows(&raw, &keep)?;
    if df.height() < fetched {
        warn!(%dataset, dropped = fetched - df.height(), "dropped rows without a code");
    }

    fill_text(&mut df, DATE_COLUMN, date)?;

    match dataset {
        Dataset::Rank => Ok(df),
        Dataset::Spot => prepare_spot(&df),
    }
}

/// Filters the raw spot board and reduces it to the stored columns.
///
/// A row stays when its code is on one of [`SPOT_CODE_PREFIXES`], its name
/// does not carry [`SPECIAL_TREATMENT_MARKER`], and at least one of
/// [`SPOT_PRICE_COLUMNS`] has a value.
pub fn prepare_spot(board: &DataFrame) -> PolarsResult<DataFrame> {
    let codes = text_values(board, CODE_COLUMN)?;
    let names = text_values(board, SPOT_NAME_COLUMN)?;
    let prices = SPOT_PRICE_COLUMNS
        .iter()
        .map(|c| text_values(board, c))
        .collect::<PolarsResult<Vec<_>>>()?;

    let keep: Vec<bool> = (0..board.height())
        .map(|i| {
            let priced = prices.iter().any(|col| col[i].is_some());
            let on_board = codes[i]
                .as_deref()
                .is_some_and(|code| SPOT_CODE_PREFIXES.iter().any(|p| code.starts_with(p)));
            let flagged = names[i]
                .as_deref()
                .is_some_and(|name| name.contains(SPECIAL_TREATMENT_MARKER));
            priced && on_board && !flagged
        })
        .collect();

    project(&retain_rows(board, &keep)?, &SPOT_PROJECTION)
}
