use std::collections::HashMap;

use polars::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value as Json};

use crate::{
    models::dataset::CODE_COLUMN,
    providers::eastmoney::params::{
        FieldKind, HOT_RANK_COLUMN, HOT_RANK_QUOTE_FIELDS, QuoteField, SPOT_FIELDS, SPOT_SEQ_COLUMN,
    },
};

/// One entry of the hot-rank list.
#[derive(Deserialize, Debug)]
pub struct HotRankItem {
    /// Exchange-prefixed code, e.g. `SZ000001`.
    pub sc: String,
    /// Current rank, starting at 1.
    pub rk: i64,
}

#[derive(Deserialize, Debug)]
pub struct HotRankResponse {
    #[serde(default)]
    pub data: Option<Vec<HotRankItem>>,
}

/// Quote rows keyed by `f`-numbered field ids.
pub type QuoteRow = Map<String, Json>;

#[derive(Deserialize, Debug)]
pub struct QuoteListData {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub diff: Vec<QuoteRow>,
}

/// Envelope shared by the `ulist.np` and `clist` endpoints.
#[derive(Deserialize, Debug)]
pub struct QuoteListResponse {
    #[serde(default)]
    pub data: Option<QuoteListData>,
}

// EastMoney sends "-" for fields that have no value today (suspended
// securities have no open price, for instance); those become nulls.
fn is_placeholder(s: &str) -> bool {
    s.is_empty() || s == "-"
}

pub fn text_cell(raw: Option<&Json>) -> Option<String> {
    match raw? {
        Json::String(s) if is_placeholder(s) => None,
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn float_cell(raw: Option<&Json>) -> Option<f64> {
    match raw? {
        Json::Number(n) => n.as_f64(),
        Json::String(s) if !is_placeholder(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn int_cell(raw: Option<&Json>) -> Option<i64> {
    match raw? {
        Json::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Json::String(s) if !is_placeholder(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Builds one typed column from the given quote rows. A missing row yields
/// a null cell.
pub fn quote_column<'a>(rows: &[Option<&'a QuoteRow>], (id, header, kind): QuoteField) -> Column {
    let raw = |row: &Option<&'a QuoteRow>| (*row).and_then(|q| q.get(id));
    let name = PlSmallStr::from(header);
    match kind {
        FieldKind::Text => Column::new(name, rows.iter().map(|r| text_cell(raw(r))).collect::<Vec<_>>()),
        FieldKind::Int => Column::new(name, rows.iter().map(|r| int_cell(raw(r))).collect::<Vec<_>>()),
        FieldKind::Float => Column::new(name, rows.iter().map(|r| float_cell(raw(r))).collect::<Vec<_>>()),
    }
}

/// Joins the ranking with the quotes fetched for it, keyed by bare code.
///
/// Columns: `当前排名, 代码, 股票名称, 最新价, 涨跌额, 涨跌幅`. Ranked codes the
/// quote endpoint did not return keep their rank with null quote fields.
pub fn hot_rank_frame(items: &[HotRankItem], quotes: &HashMap<String, QuoteRow>) -> PolarsResult<DataFrame> {
    let matched: Vec<Option<&QuoteRow>> = items
        .iter()
        .map(|item| item.sc.get(2..).and_then(|code| quotes.get(code)))
        .collect();

    let mut columns = vec![
        Column::new(HOT_RANK_COLUMN.into(), items.iter().map(|i| i.rk).collect::<Vec<_>>()),
        Column::new(CODE_COLUMN.into(), items.iter().map(|i| i.sc.as_str()).collect::<Vec<_>>()),
    ];
    columns.extend(HOT_RANK_QUOTE_FIELDS.into_iter().map(|f| quote_column(&matched, f)));
    DataFrame::new(columns)
}

/// Lays out the spot board: a 1-based `序号` followed by every mapped field.
pub fn spot_frame(rows: &[QuoteRow]) -> PolarsResult<DataFrame> {
    let rows: Vec<Option<&QuoteRow>> = rows.iter().map(Some).collect();
    let seq: Vec<i64> = (1..=rows.len() as i64).collect();

    let mut columns = vec![Column::new(SPOT_SEQ_COLUMN.into(), seq)];
    columns.extend(SPOT_FIELDS.into_iter().map(|f| quote_column(&rows, f)));
    DataFrame::new(columns)
}
