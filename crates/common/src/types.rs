use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// One OHLCV sample as returned by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Candle open time.
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl std::fmt::Display for Candle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}, {}, {}]",
            self.timestamp.timestamp_millis(),
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume
        )
    }
}

/// Latest close price extracted from a candle batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSample {
    /// Build a sample from the close of `candle`.
    /// Zero, negative and non-finite closes are `Error::InvalidPrice`.
    pub fn from_candle(candle: &Candle) -> crate::Result<Self> {
        if !candle.close.is_finite() || candle.close <= 0.0 {
            return Err(Error::InvalidPrice(candle.close));
        }
        Ok(Self {
            value: candle.close,
            timestamp: candle.timestamp,
        })
    }
}

impl std::fmt::Display for PriceSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_price(self.value))
    }
}

/// Render a price the way a float literal reads: whole numbers keep a
/// trailing `.0` (`67000.0`, not `67000`).
pub fn format_price(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Model response text, ASCII-only and trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalText(String);

impl SignalText {
    /// Placeholder used when no completion could be obtained.
    pub const NO_SIGNAL: &'static str = "no signal";

    pub fn new(raw: &str) -> Self {
        Self(crate::sanitize_ascii(raw).trim().to_string())
    }

    pub fn no_signal() -> Self {
        Self(Self::NO_SIGNAL.to_string())
    }

    pub fn is_no_signal(&self) -> bool {
        self.0 == Self::NO_SIGNAL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignalText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Interpreted direction of a model response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Long,
    Short,
    Unclear,
}

impl Signal {
    /// The line logged when the decision is "executed".
    pub fn action_label(&self) -> &'static str {
        match self {
            Signal::Long => "LONG POSITION ENTERED",
            Signal::Short => "SHORT POSITION ENTERED",
            Signal::Unclear => "NO CLEAR SIGNAL",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Long => write!(f, "long"),
            Signal::Short => write!(f, "short"),
            Signal::Unclear => write!(f, "unclear"),
        }
    }
}

/// Candle timeframe, written the ccxt way (`1m`, `4h`, `1d`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CandleInterval {
    #[default]
    OneMinute,
    ThreeMinutes,
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    SixHours,
    TwelveHours,
    OneDay,
    OneWeek,
    OneMonth,
}

impl CandleInterval {
    /// Granularity string used by the Bitget v2 spot candles endpoint.
    pub fn bitget_granularity(&self) -> &'static str {
        match self {
            CandleInterval::OneMinute => "1min",
            CandleInterval::ThreeMinutes => "3min",
            CandleInterval::FiveMinutes => "5min",
            CandleInterval::FifteenMinutes => "15min",
            CandleInterval::ThirtyMinutes => "30min",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::SixHours => "6h",
            CandleInterval::TwelveHours => "12h",
            CandleInterval::OneDay => "1day",
            CandleInterval::OneWeek => "1week",
            CandleInterval::OneMonth => "1M",
        }
    }
}

impl FromStr for CandleInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `1M` (month) and `1m` (minute) differ only by case.
        match s.trim() {
            "1m" => Ok(CandleInterval::OneMinute),
            "3m" => Ok(CandleInterval::ThreeMinutes),
            "5m" => Ok(CandleInterval::FiveMinutes),
            "15m" => Ok(CandleInterval::FifteenMinutes),
            "30m" => Ok(CandleInterval::ThirtyMinutes),
            "1h" => Ok(CandleInterval::OneHour),
            "4h" => Ok(CandleInterval::FourHours),
            "6h" => Ok(CandleInterval::SixHours),
            "12h" => Ok(CandleInterval::TwelveHours),
            "1d" => Ok(CandleInterval::OneDay),
            "1w" => Ok(CandleInterval::OneWeek),
            "1M" => Ok(CandleInterval::OneMonth),
            other => Err(Error::Config(format!("unsupported candle interval '{other}'"))),
        }
    }
}

impl std::fmt::Display for CandleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CandleInterval::OneMinute => "1m",
            CandleInterval::ThreeMinutes => "3m",
            CandleInterval::FiveMinutes => "5m",
            CandleInterval::FifteenMinutes => "15m",
            CandleInterval::ThirtyMinutes => "30m",
            CandleInterval::OneHour => "1h",
            CandleInterval::FourHours => "4h",
            CandleInterval::SixHours => "6h",
            CandleInterval::TwelveHours => "12h",
            CandleInterval::OneDay => "1d",
            CandleInterval::OneWeek => "1w",
            CandleInterval::OneMonth => "1M",
        };
        f.write_str(s)
    }
}

/// Where the cycle driver currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverState {
    #[default]
    Idle,
    Running,
    Stopped,
}

impl std::fmt::Display for DriverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverState::Idle => write!(f, "idle"),
            DriverState::Running => write!(f, "running"),
            DriverState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result of one fetch → generate → interpret pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No usable price; the completion service was not called.
    PriceUnavailable,
    Decided {
        price: PriceSample,
        text: SignalText,
        signal: Signal,
    },
}
