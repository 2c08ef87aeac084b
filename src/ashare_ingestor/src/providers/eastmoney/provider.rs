use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use polars::prelude::DataFrame;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    config::ProviderSettings,
    providers::{
        ApiSnafu, ClientBuildSnafu, FrameSnafu, MarketDataProvider, PayloadSnafu,
        ProviderError, ProviderInitError, ReqwestSnafu,
        eastmoney::{
            params::{
                HOT_RANK_URL, HotRankRequest, QUOTE_LIST_URL, SPOT_BOARD_URL, quote_query,
                secid_for, spot_query,
            },
            response::{HotRankResponse, QuoteListResponse, QuoteRow, hot_rank_frame, spot_frame},
        },
    },
};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Hard stop for board paging in case `total` is reported inconsistently.
const MAX_BOARD_PAGES: u32 = 500;

pub struct EastMoneyProvider {
    client: Client,
    page_size: u32,
}

impl EastMoneyProvider {
    /// Creates a new EastMoney provider.
    ///
    /// The endpoints are public; only the timeout and page size are configurable.
    pub fn new(settings: &ProviderSettings) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            page_size: settings.page_size.max(1),
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let response = request.send().await.context(ReqwestSnafu)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                message: format!("{status}: {body}"),
            }
            .fail();
        }

        response.json::<T>().await.context(ReqwestSnafu)
    }
}

/// Whether the board has been read to the end after `collected` rows.
///
/// Without a reported `total` only an empty page ends the paging.
fn board_exhausted(collected: usize, total: Option<u64>) -> bool {
    total.is_some_and(|t| collected as u64 >= t)
}

#[async_trait]
impl MarketDataProvider for EastMoneyProvider {
    async fn hot_rank(&self) -> Result<DataFrame, ProviderError> {
        let ranks: HotRankResponse = self
            .send_json(self.client.post(HOT_RANK_URL).json(&HotRankRequest::default()))
            .await?;
        let items = ranks.data.unwrap_or_default();

        if items.is_empty() {
            return hot_rank_frame(&[], &HashMap::new()).context(FrameSnafu);
        }

        let secids: Vec<String> = items.iter().filter_map(|i| secid_for(&i.sc)).collect();
        if secids.is_empty() {
            return PayloadSnafu {
                message: "hot-rank codes carry no known exchange prefix",
            }
            .fail();
        }

        let quotes: QuoteListResponse = self
            .send_json(self.client.get(QUOTE_LIST_URL).query(&quote_query(&secids)))
            .await?;
        let by_code: HashMap<String, QuoteRow> = quotes
            .data
            .map(|d| d.diff)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|q| {
                let code = q.get("f12")?.as_str()?.to_string();
                Some((code, q))
            })
            .collect();
        debug!(ranked = items.len(), quoted = by_code.len(), "hot rank fetched");

        hot_rank_frame(&items, &by_code).context(FrameSnafu)
    }

    async fn spot_quotes(&self) -> Result<DataFrame, ProviderError> {
        let mut rows: Vec<QuoteRow> = Vec::new();

        for page in 1..=MAX_BOARD_PAGES {
            let resp: QuoteListResponse = self
                .send_json(
                    self.client
                        .get(SPOT_BOARD_URL)
                        .query(&spot_query(page, self.page_size)),
                )
                .await?;

            let Some(data) = resp.data else { break };
            if data.diff.is_empty() {
                break;
            }
            rows.extend(data.diff);

            debug!(page, rows = rows.len(), total = ?data.total, "spot board page fetched");
            if board_exhausted(rows.len(), data.total) {
                break;
            }
        }

        spot_frame(&rows).context(FrameSnafu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::frame::{has_column, text_values};

    #[test]
    fn paging_stops_at_reported_total() {
        assert!(!board_exhausted(100, Some(250)));
        assert!(board_exhausted(250, Some(250)));
        assert!(board_exhausted(300, Some(250)));
    }

    #[test]
    fn paging_continues_without_total() {
        assert!(!board_exhausted(100, None));
        assert!(!board_exhausted(0, None));
    }

    #[tokio::test]
    #[ignore]
    async fn live_hot_rank_has_codes() {
        // Hits the public EastMoney endpoint.
        let provider = EastMoneyProvider::new(&ProviderSettings::default()).expect("client");
        let df = provider.hot_rank().await.expect("hot rank");

        assert!(df.height() > 0, "Expected at least one ranked security");
        assert!(text_values(&df, "代码").unwrap()[0].is_some());
    }

    #[tokio::test]
    #[ignore]
    async fn live_spot_board_pages_through() {
        let settings = ProviderSettings {
            page_size: 500,
            ..ProviderSettings::default()
        };
        let provider = EastMoneyProvider::new(&settings).expect("client");
        let df = provider.spot_quotes().await.expect("spot");

        assert!(df.height() > 500, "Expected more than one page of quotes");
        assert!(has_column(&df, "今开"));
    }
}
