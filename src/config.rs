//! Scanner configuration
//!
//! Loaded from a TOML file or from environment variables (a `.env` file in
//! the working directory is honoured). Every field has a default.
//!
//! ```toml
//! market = "us"
//! symbols = ["AAPL", "MSFT"]
//! scan_time = "15:30"
//! history_days = 10
//!
//! [detector]
//! shadow_body_ratio = 2.5
//! trend_lookback = 4
//! ```

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::detectors::InvertedHammerDetector;
use crate::scan::{ScanConfig, DEFAULT_MAX_WORKERS, DEFAULT_WINDOW_LEN};
use crate::{Result, ScanError};

/// Nifty 50 plus key mid-caps
#[rustfmt::skip]
pub const NSE_STOCKS: &[&str] = &[
    "RELIANCE.NS", "TCS.NS", "HDFCBANK.NS", "INFY.NS", "ICICIBANK.NS",
    "HINDUNILVR.NS", "SBIN.NS", "BHARTIARTL.NS", "KOTAKBANK.NS", "ITC.NS",
    "LT.NS", "AXISBANK.NS", "BAJFINANCE.NS", "ASIANPAINT.NS", "MARUTI.NS",
    "HCLTECH.NS", "SUNPHARMA.NS", "TITAN.NS", "ULTRACEMCO.NS", "NESTLEIND.NS",
    "WIPRO.NS", "BAJAJFINSV.NS", "ONGC.NS", "NTPC.NS", "POWERGRID.NS",
    "M&M.NS", "TATAMOTORS.NS", "ADANIENT.NS", "ADANIPORTS.NS", "COALINDIA.NS",
    "JSWSTEEL.NS", "TATASTEEL.NS", "TECHM.NS", "HDFCLIFE.NS", "SBILIFE.NS",
    "BRITANNIA.NS", "GRASIM.NS", "INDUSINDBK.NS", "CIPLA.NS", "DRREDDY.NS",
    "EICHERMOT.NS", "DIVISLAB.NS", "BPCL.NS", "APOLLOHOSP.NS", "TATACONSUM.NS",
    "HEROMOTOCO.NS", "UPL.NS", "DABUR.NS", "PIDILITIND.NS", "HAVELLS.NS",
];

/// US large caps
#[rustfmt::skip]
pub const US_STOCKS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA",
    "META", "TSLA", "BRK-B", "JPM", "V",
    "JNJ", "WMT", "PG", "MA", "UNH",
    "HD", "DIS", "BAC", "ADBE", "CRM",
    "NFLX", "CSCO", "PFE", "TMO", "ABT",
    "INTC", "AMD", "QCOM", "TXN", "AVGO",
];

pub const DEFAULT_HISTORY_DAYS: usize = 15;

// ============================================================
// MARKET
// ============================================================

/// Exchange whose built-in symbol list is scanned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Market {
    #[default]
    Nse,
    Us,
}

impl Market {
    pub fn default_symbols(self) -> &'static [&'static str] {
        match self {
            Market::Nse => NSE_STOCKS,
            Market::Us => US_STOCKS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Market::Nse => "NSE",
            Market::Us => "US",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NSE" => Ok(Market::Nse),
            "US" => Ok(Market::Us),
            other => Err(ScanError::Config(format!(
                "market must be 'NSE' or 'US', got '{other}'"
            ))),
        }
    }
}

impl Serialize for Market {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Market {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(d)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================
// SCANNER CONFIG
// ============================================================

/// Bot credentials for Telegram delivery; both are needed to send
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// Everything a scan run needs, passed explicitly to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub market: Market,
    /// Explicit universe; empty means the market's built-in list
    pub symbols: Vec<String>,
    /// Daily trigger time for the external scheduler
    #[serde(with = "hhmm")]
    pub scan_time: NaiveTime,
    pub history_days: usize,
    pub window_len: usize,
    pub max_workers: usize,
    pub detector: InvertedHammerDetector,
    pub telegram: TelegramConfig,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            market: Market::default(),
            symbols: Vec::new(),
            scan_time: NaiveTime::from_hms_opt(14, 45, 0).unwrap_or_default(),
            history_days: DEFAULT_HISTORY_DAYS,
            window_len: DEFAULT_WINDOW_LEN,
            max_workers: DEFAULT_MAX_WORKERS,
            detector: InvertedHammerDetector::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl ScannerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ScanError::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Build from process environment, loading `.env` first if present.
    ///
    /// Recognised variables: `MARKET`, `SYMBOLS` (comma separated),
    /// `SCAN_TIME` (`HH:MM`), `HISTORY_DAYS`, `WINDOW_LEN`, `MAX_WORKERS`,
    /// `TELEGRAM_BOT_TOKEN`, `TELEGRAM_CHAT_ID`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // a missing .env is fine
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; unset variables keep defaults
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(market) = lookup("MARKET") {
            config.market = market.parse()?;
        }
        if let Some(symbols) = lookup("SYMBOLS") {
            config.symbols = symbols
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(time) = lookup("SCAN_TIME") {
            config.scan_time = hhmm::parse(&time)?;
        }
        if let Some(days) = lookup("HISTORY_DAYS") {
            config.history_days = parse_count("HISTORY_DAYS", &days)?;
        }
        if let Some(len) = lookup("WINDOW_LEN") {
            config.window_len = parse_count("WINDOW_LEN", &len)?;
        }
        if let Some(workers) = lookup("MAX_WORKERS") {
            config.max_workers = parse_count("MAX_WORKERS", &workers)?;
        }
        let non_empty = |key: &str| lookup(key).filter(|v: &String| !v.trim().is_empty());
        config.telegram.bot_token = non_empty("TELEGRAM_BOT_TOKEN");
        config.telegram.chat_id = non_empty("TELEGRAM_CHAT_ID");

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_days == 0 {
            return Err(ScanError::InvalidConfig("history_days must be > 0".into()));
        }
        self.scan_config().validate()
    }

    /// The symbols to scan: explicit list, or the market default
    pub fn symbols(&self) -> Vec<String> {
        if self.symbols.is_empty() {
            self.market
                .default_symbols()
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.symbols.clone()
        }
    }

    /// Engine configuration derived from this config
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new(self.symbols())
            .window_len(self.window_len)
            .max_workers(self.max_workers)
            .detector(self.detector)
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value.trim().parse().map_err(|_| {
        ScanError::Config(format!("{key} must be a non-negative integer, got '{value}'"))
    })
}

/// `HH:MM` (seconds optional) serde format for [`NaiveTime`]
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::{Result, ScanError};

    pub fn parse(value: &str) -> Result<NaiveTime> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .map_err(|_| ScanError::Config(format!("scan time must be HH:MM, got '{value}'")))
    }

    pub fn serialize<S: Serializer>(
        time: &NaiveTime,
        s: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<NaiveTime, D::Error> {
        let value = String::deserialize(d)?;
        parse(&value).map_err(serde::de::Error::custom)
    }
}
