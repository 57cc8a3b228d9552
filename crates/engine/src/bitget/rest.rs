use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use common::{Candle, CandleInterval, Error, MarketDataSource, Result};

const CANDLES_PATH: &str = "/api/v2/spot/market/candles";
const SUCCESS_CODE: &str = "00000";

/// REST client for Bitget spot market data.
///
/// The candles endpoint is public, so no request signing is done here.
pub struct BitgetClient {
    base_url: String,
    http: Client,
}

impl BitgetClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn public_get(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        let url = format!("{}{path}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("HTTP {status}: {body}")));
        }
        if !status.is_success() {
            return Err(Error::Exchange(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl MarketDataSource for BitgetClient {
    async fn candles(
        &self,
        symbol: &str,
        interval: CandleInterval,
        limit: u32,
    ) -> Result<Vec<Candle>> {
        let symbol = market_symbol(symbol);
        debug!(symbol = %symbol, interval = %interval, limit, "Requesting candles from Bitget");
        let query = [
            ("symbol", symbol),
            ("granularity", interval.bitget_granularity().to_string()),
            ("limit", limit.to_string()),
        ];
        let body = self.public_get(CANDLES_PATH, &query).await?;
        parse_candles(&body)
    }
}

/// `BTC/USDT` → `BTCUSDT`. Already-joined symbols pass through upper-cased.
pub fn market_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| !matches!(c, '/' | '-' | '_'))
        .collect::<String>()
        .to_uppercase()
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CandlesResponse {
    code: String,
    #[serde(default)]
    msg: String,
    data: Option<Vec<Vec<String>>>,
}

/// Parse a candles response body into candles sorted oldest first.
///
/// Rows are `[ts, open, high, low, close, baseVolume, usdtVolume, quoteVolume]`
/// with every field string-encoded.
pub fn parse_candles(body: &str) -> Result<Vec<Candle>> {
    let resp: CandlesResponse = serde_json::from_str(body)?;

    if resp.code != SUCCESS_CODE {
        return Err(Error::Exchange(format!("code {}: {}", resp.code, resp.msg)));
    }

    let mut candles = resp
        .data
        .unwrap_or_default()
        .iter()
        .map(|row| parse_row(row))
        .collect::<Result<Vec<_>>>()?;
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

fn parse_row(row: &[String]) -> Result<Candle> {
    if row.len() < 6 {
        return Err(Error::Malformed(format!(
            "candle row has {} fields, expected at least 6",
            row.len()
        )));
    }

    let ts_ms: i64 = row[0]
        .parse()
        .map_err(|_| Error::Malformed(format!("bad candle timestamp '{}'", row[0])))?;
    let timestamp: DateTime<Utc> = Utc
        .timestamp_millis_opt(ts_ms)
        .single()
        .ok_or_else(|| Error::Malformed(format!("candle timestamp out of range: {ts_ms}")))?;

    Ok(Candle {
        timestamp,
        open: number(&row[1], "open")?,
        high: number(&row[2], "high")?,
        low: number(&row[3], "low")?,
        close: number(&row[4], "close")?,
        volume: number(&row[5], "volume")?,
    })
}

fn number(field: &str, name: &str) -> Result<f64> {
    field
        .parse()
        .map_err(|_| Error::Malformed(format!("bad candle {name} '{field}'")))
}
