use serde::Serialize;

pub const HOT_RANK_URL: &str = "https://emappdata.eastmoney.com/stockrank/getAllCurrentList";
pub const QUOTE_LIST_URL: &str = "https://push2.eastmoney.com/api/qt/ulist.np/get";
pub const SPOT_BOARD_URL: &str = "https://82.push2.eastmoney.com/api/qt/clist/get";

/// Public token the web front-end sends with quote requests.
const QUOTE_UT: &str = "f057cbcbce2a86e2866ab8877db1d059";
const BOARD_UT: &str = "bd1d9ddb04089700cf9c27f6f7426281";

/// Shanghai main board, Shenzhen main board, ChiNext, STAR and Beijing boards.
const A_SHARE_BOARDS: &str = "m:0 t:6,m:0 t:80,m:1 t:2,m:1 t:23,m:0 t:81 s:2048";

/// Number of entries the hot-rank endpoint serves.
pub const HOT_RANK_SIZE: u32 = 100;

/// Column carrying the hot-rank position.
pub const HOT_RANK_COLUMN: &str = "当前排名";

/// How a quote field is typed in the resulting frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Int,
    Float,
}

/// A quote field: (field id, header, kind).
pub type QuoteField = (&'static str, &'static str, FieldKind);

/// Quote fields requested for hot-rank entries, in output order after the
/// rank and code columns.
pub const HOT_RANK_QUOTE_FIELDS: [QuoteField; 4] = [
    ("f14", "股票名称", FieldKind::Text),
    ("f2", "最新价", FieldKind::Float),
    ("f4", "涨跌额", FieldKind::Float),
    ("f3", "涨跌幅", FieldKind::Float),
];

/// Row-number column the spot board is prefixed with.
pub const SPOT_SEQ_COLUMN: &str = "序号";

/// Spot board fields, in output order.
pub const SPOT_FIELDS: [QuoteField; 22] = [
    ("f12", "代码", FieldKind::Text),
    ("f14", "名称", FieldKind::Text),
    ("f2", "最新价", FieldKind::Float),
    ("f3", "涨跌幅", FieldKind::Float),
    ("f4", "涨跌额", FieldKind::Float),
    ("f5", "成交量", FieldKind::Int),
    ("f6", "成交额", FieldKind::Float),
    ("f7", "振幅", FieldKind::Float),
    ("f15", "最高", FieldKind::Float),
    ("f16", "最低", FieldKind::Float),
    ("f17", "今开", FieldKind::Float),
    ("f18", "昨收", FieldKind::Float),
    ("f10", "量比", FieldKind::Float),
    ("f8", "换手率", FieldKind::Float),
    ("f9", "市盈率-动态", FieldKind::Float),
    ("f23", "市净率", FieldKind::Float),
    ("f20", "总市值", FieldKind::Float),
    ("f21", "流通市值", FieldKind::Float),
    ("f22", "涨速", FieldKind::Float),
    ("f11", "5分钟涨跌", FieldKind::Float),
    ("f24", "60日涨跌幅", FieldKind::Float),
    ("f25", "年初至今涨跌幅", FieldKind::Float),
];

/// JSON body of the hot-rank request.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotRankRequest {
    pub app_id: &'static str,
    pub global_id: &'static str,
    pub market_type: &'static str,
    pub page_no: u32,
    pub page_size: u32,
}

impl Default for HotRankRequest {
    fn default() -> Self {
        Self {
            app_id: "appId01",
            global_id: "786e4c21-70dc-435a-93bb-38",
            market_type: "",
            page_no: 1,
            page_size: HOT_RANK_SIZE,
        }
    }
}

/// Converts a prefixed code such as `SZ000001` into the `market.code` secid
/// the quote endpoints expect (`0.000001`).
pub fn secid_for(prefixed: &str) -> Option<String> {
    let (market, code) = prefixed.split_at_checked(2)?;
    let market_id = match market.to_ascii_uppercase().as_str() {
        "SH" => "1",
        "SZ" | "BJ" => "0",
        _ => return None,
    };
    (!code.is_empty()).then(|| format!("{market_id}.{code}"))
}

fn field_list(fields: &[QuoteField]) -> String {
    fields.iter().map(|(id, _, _)| *id).collect::<Vec<_>>().join(",")
}

/// Query for quoting an explicit list of securities.
pub fn quote_query(secids: &[String]) -> Vec<(&'static str, String)> {
    let mut fields = field_list(&HOT_RANK_QUOTE_FIELDS);
    fields.push_str(",f12");
    vec![
        ("ut", QUOTE_UT.to_string()),
        ("fltt", "2".to_string()),
        ("invt", "2".to_string()),
        ("fields", fields),
        ("secids", secids.join(",")),
    ]
}

/// Query for one page of the spot board, ordered by code.
pub fn spot_query(page: u32, page_size: u32) -> Vec<(&'static str, String)> {
    vec![
        ("pn", page.to_string()),
        ("pz", page_size.to_string()),
        ("po", "1".to_string()),
        ("np", "1".to_string()),
        ("ut", BOARD_UT.to_string()),
        ("fltt", "2".to_string()),
        ("invt", "2".to_string()),
        ("fid", "f12".to_string()),
        ("fs", A_SHARE_BOARDS.to_string()),
        ("fields", field_list(&SPOT_FIELDS)),
    ]
}
