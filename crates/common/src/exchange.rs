use async_trait::async_trait;

use crate::{Candle, CandleInterval, Result};

/// Source of recent OHLCV candles.
///
/// `BitgetClient` implements this against the live exchange. Tests plug in
/// fakes that return canned candles or errors.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` of the most recent candles for `symbol`.
    /// Candles may come back in any order.
    async fn candles(&self, symbol: &str, interval: CandleInterval, limit: u32)
        -> Result<Vec<Candle>>;
}

/// Single-turn text completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `prompt` as one user message and return the raw completion text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
