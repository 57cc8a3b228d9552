use std::time::Duration;

use tracing::info;

use crate::{CandleInterval, Error, Result};

/// All configuration loaded from environment variables at startup.
///
/// Credentials are never validated: a missing key becomes an empty string and
/// the first request that needs it fails. Optional settings fall back to
/// defaults, but a value that is present and unparseable is an error.
#[derive(Clone)]
pub struct Config {
    // Completion service
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub llm_timeout: Duration,

    // Exchange
    pub bitget_api_key: String,
    pub bitget_secret: String,
    pub bitget_base_url: String,

    // Polling
    pub symbol: String,
    pub interval: CandleInterval,
    pub candle_limit: u32,
    pub poll_interval: Duration,
}

impl Config {
    pub const DEFAULT_MODEL: &'static str = "gpt-3.5-turbo";
    pub const DEFAULT_OPENAI_BASE_URL: &'static str = "https://api.openai.com";
    pub const DEFAULT_BITGET_BASE_URL: &'static str = "https://api.bitget.com";
    pub const DEFAULT_SYMBOL: &'static str = "BTC/USDT";

    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval = match lookup("CANDLE_INTERVAL") {
            Some(v) => v.parse()?,
            None => CandleInterval::default(),
        };

        Ok(Config {
            openai_api_key: lookup("OPENAI_API_KEY").unwrap_or_default(),
            openai_model: lookup("OPENAI_MODEL").unwrap_or_else(|| Self::DEFAULT_MODEL.to_string()),
            openai_base_url: lookup("OPENAI_BASE_URL")
                .unwrap_or_else(|| Self::DEFAULT_OPENAI_BASE_URL.to_string()),
            llm_timeout: Duration::from_secs(parse_or(&lookup, "LLM_TIMEOUT_SECS", 10)?),
            bitget_api_key: lookup("BITGET_API_KEY").unwrap_or_default(),
            bitget_secret: lookup("BITGET_SECRET_KEY").unwrap_or_default(),
            bitget_base_url: lookup("BITGET_BASE_URL")
                .unwrap_or_else(|| Self::DEFAULT_BITGET_BASE_URL.to_string()),
            symbol: btc_symbol(lookup("SYMBOL"))?,
            interval,
            candle_limit: parse_or(&lookup, "CANDLE_LIMIT", 100)?,
            poll_interval: Duration::from_secs(parse_or(&lookup, "POLL_INTERVAL_SECS", 60)?),
        })
    }

    /// Log which credentials are present. Values are masked.
    pub fn log_credentials(&self) {
        info!("Checking API keys...");
        info!(key = "OPENAI_API_KEY", value = %mask(&self.openai_api_key), "Credential");
        info!(key = "BITGET_API_KEY", value = %mask(&self.bitget_api_key), "Credential");
        info!(key = "BITGET_SECRET_KEY", value = %mask(&self.bitget_secret), "Credential");
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .field("openai_base_url", &self.openai_base_url)
            .field("llm_timeout", &self.llm_timeout)
            .field("bitget_api_key", &mask(&self.bitget_api_key))
            .field("bitget_secret", &mask(&self.bitget_secret))
            .field("bitget_base_url", &self.bitget_base_url)
            .field("symbol", &self.symbol)
            .field("interval", &self.interval)
            .field("candle_limit", &self.candle_limit)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

/// The prompt is written about BTC, so the pair must have BTC as its base.
fn btc_symbol(value: Option<String>) -> Result<String> {
    let Some(symbol) = value else {
        return Ok(Config::DEFAULT_SYMBOL.to_string());
    };
    let upper = symbol.trim().to_ascii_uppercase();
    let is_btc = match upper.split_once(['/', '-', '_']) {
        Some((base, quote)) => base == "BTC" && !quote.is_empty(),
        None => upper.starts_with("BTC") && upper.len() > 3,
    };
    if is_btc {
        Ok(symbol.trim().to_string())
    } else {
        Err(Error::Config(format!("SYMBOL must be a BTC pair, got '{symbol}'")))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{key} is not a valid number: '{v}'"))),
        None => Ok(default),
    }
}

/// `"<missing>"` for empty values, otherwise the last four characters.
pub fn mask(value: &str) -> String {
    if value.is_empty() {
        return "<missing>".to_string();
    }
    let tail: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.openai_api_key, "");
        assert_eq!(cfg.bitget_api_key, "");
        assert_eq!(cfg.openai_model, "gpt-3.5-turbo");
        assert_eq!(cfg.symbol, "BTC/USDT");
        assert_eq!(cfg.interval, CandleInterval::OneMinute);
        assert_eq!(cfg.candle_limit, 100);
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.llm_timeout, Duration::from_secs(10));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("BITGET_API_KEY", "bg-key"),
            ("BITGET_SECRET_KEY", "bg-secret"),
            ("SYMBOL", "BTC/USDC"),
            ("CANDLE_INTERVAL", "15m"),
            ("POLL_INTERVAL_SECS", "30"),
            ("LLM_TIMEOUT_SECS", " 5 "),
        ]))
        .unwrap();
        assert_eq!(cfg.openai_api_key, "sk-test");
        assert_eq!(cfg.bitget_secret, "bg-secret");
        assert_eq!(cfg.symbol, "BTC/USDC");
        assert_eq!(cfg.interval, CandleInterval::FifteenMinutes);
        assert_eq!(cfg.poll_interval, Duration::from_secs(30));
        assert_eq!(cfg.llm_timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_numbers_and_intervals_are_errors() {
        assert!(Config::from_lookup(lookup_from(&[("POLL_INTERVAL_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CANDLE_INTERVAL", "7m")])).is_err());
    }

    #[test]
    fn symbol_must_be_a_btc_pair() {
        for ok in ["BTC/USDT", "btc-usdc", "BTCUSDT", " BTC_EUR "] {
            assert!(Config::from_lookup(lookup_from(&[("SYMBOL", ok)])).is_ok(), "{ok}");
        }
        for bad in ["ETH/USDT", "WBTC/USDT", "BTC", "BTC/", "SOLUSDT"] {
            let err = Config::from_lookup(lookup_from(&[("SYMBOL", bad)])).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{bad}");
        }
    }

    #[test]
    fn mask_hides_all_but_tail() {
        assert_eq!(mask(""), "<missing>");
        assert_eq!(mask("sk-abcdef1234"), "****1234");
        assert_eq!(mask("ab"), "****ab");
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let cfg = Config::from_lookup(lookup_from(&[("BITGET_SECRET_KEY", "supersecretvalue")]))
            .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("supersecretvalue"));
        assert!(dbg.contains("****alue"));
    }
}
