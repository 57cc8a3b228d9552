use std::sync::Arc;

use tracing::{info, warn};

use common::{Candle, CandleInterval, Error, MarketDataSource, PriceSample, Result};

/// Number of trailing candles echoed to the log on every fetch.
const PREVIEW_LEN: usize = 3;

/// Pulls recent candles for one pair and reduces them to the latest close.
pub struct MarketDataFetcher {
    source: Arc<dyn MarketDataSource>,
    symbol: String,
    interval: CandleInterval,
    limit: u32,
}

impl MarketDataFetcher {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        symbol: impl Into<String>,
        interval: CandleInterval,
        limit: u32,
    ) -> Self {
        Self {
            source,
            symbol: symbol.into(),
            interval,
            limit,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Fetch candles and return the latest close.
    ///
    /// Every failure is logged here with an ASCII-only description and handed
    /// back as `Err`; the caller only has to decide whether to skip the cycle.
    pub async fn fetch_price(&self) -> Result<PriceSample> {
        info!(symbol = %self.symbol, interval = %self.interval, "Fetching market data...");

        let result = self
            .source
            .candles(&self.symbol, self.interval, self.limit)
            .await
            .and_then(|candles| {
                log_preview(&candles);
                latest_close(&candles)
            });

        match &result {
            Ok(price) => info!(price = price.value, "Close price: {price}"),
            Err(e) => warn!(symbol = %self.symbol, "Market data error: {}", e.sanitized()),
        }
        result
    }
}

/// Close of the most recent candle. An empty batch is `Error::NoCandles`.
pub fn latest_close(candles: &[Candle]) -> Result<PriceSample> {
    let last = candles
        .iter()
        .max_by_key(|c| c.timestamp)
        .ok_or(Error::NoCandles)?;
    PriceSample::from_candle(last)
}

fn log_preview(candles: &[Candle]) {
    let start = candles.len().saturating_sub(PREVIEW_LEN);
    let preview = candles[start..]
        .iter()
        .map(Candle::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    info!(count = candles.len(), "Recent candles: [{preview}]");
}
