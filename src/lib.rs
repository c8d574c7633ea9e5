//! # hammerscan - daily Inverted Hammer scanner
//!
//! Classifies the most recent daily bar of each configured instrument as an
//! Inverted Hammer (small body near the low, long upper shadow, prior
//! downtrend) and aggregates the matches across a symbol universe.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use hammerscan::prelude::*;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2026, 2, d).unwrap();
//! let bars = vec![
//!     Bar::new(day(16), 106.0, 107.0, 104.0, 105.0),
//!     Bar::new(day(17), 104.5, 105.0, 102.5, 103.0),
//!     Bar::new(day(18), 103.0, 103.5, 101.5, 102.0),
//!     Bar::new(day(19), 100.0, 110.0, 99.75, 101.0),
//! ];
//!
//! let detector = InvertedHammerDetector::with_defaults();
//! assert!(detector.classify(&bars).unwrap().is_match());
//!
//! let source = MemorySource::new().with_symbol("ACME", bars);
//! let engine = ScanEngine::new(ScanConfig::new(["ACME"]).window_len(4)).unwrap();
//! let report = engine.run(&source);
//! assert_eq!(report.matches.len(), 1);
//! ```

pub mod alert;
pub mod config;
pub mod detectors;
pub mod scan;
pub mod telegram;

pub mod prelude {
    pub use crate::{
        // Notification
        alert::{format_history_message, format_scan_message, LogNotifier, Notifier},
        telegram::TelegramNotifier,
        // Configuration
        config::{Market, ScannerConfig, TelegramConfig},
        // Detectors
        detectors::*,
        // Scanning
        scan::{
            BarSource, FetchFailure, HistoryReport, MatchResult, MemorySource, ScanConfig,
            ScanEngine, ScanReport,
        },
        // Types
        Bar,
        FetchError,
        OHLCExt,
        Period,
        Ratio,
        Result,
        // Errors
        ScanError,
        OHLC,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, ScanError>;

/// Failure reported by a market-data source for one symbol
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("insufficient history: need {need} bars, got {got}")]
    InsufficientHistory { need: usize, got: usize },

    #[error("provider error: {0}")]
    Provider(String),
}

/// Errors that can occur while configuring or running a scan
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insufficient data: need {need} bars, got {got}")]
    InsufficientData { need: usize, got: usize },

    #[error("Invalid bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: &'static str },

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Notification failed: {0}")]
    Notify(String),
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(ScanError::InvalidValue("Ratio cannot be NaN or infinite"));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ScanError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Period in bars (must be > 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Period(usize);

impl Period {
    /// Create a new Period, validating value is > 0
    pub fn new(value: usize) -> Result<Self> {
        if value == 0 {
            return Err(ScanError::InvalidValue("Period must be > 0"));
        }
        Ok(Self(value))
    }

    #[doc(hidden)]
    pub const fn new_const(value: usize) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }
}

impl serde::Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = usize::deserialize(d)?;
        Period::new(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core OHLC data trait
pub trait OHLC {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
}

impl<T: OHLC + ?Sized> OHLC for &T {
    fn open(&self) -> f64 {
        (**self).open()
    }

    fn high(&self) -> f64 {
        (**self).high()
    }

    fn low(&self) -> f64 {
        (**self).low()
    }

    fn close(&self) -> f64 {
        (**self).close()
    }
}

/// Extension trait with computed candle geometry
pub trait OHLCExt: OHLC {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn body_top(&self) -> f64 {
        self.open().max(self.close())
    }

    #[inline]
    fn body_bottom(&self) -> f64 {
        self.open().min(self.close())
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.body_top()
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.body_bottom() - self.low()
    }

    /// Validate OHLC consistency: finite non-negative prices,
    /// `low <= open, close <= high`
    fn validate(&self) -> Result<()> {
        let values = [self.open(), self.high(), self.low(), self.close()];
        if values.iter().any(|v| v.is_nan()) {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if values.iter().any(|v| v.is_infinite()) {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        if values.iter().any(|v| *v < 0.0) {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "negative price",
            });
        }
        if self.high() < self.low() {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "high < low",
            });
        }
        if self.body_bottom() < self.low() || self.body_top() > self.high() {
            return Err(ScanError::InvalidBar {
                index: 0,
                reason: "body outside high/low range",
            });
        }
        Ok(())
    }
}

impl<T: OHLC + ?Sized> OHLCExt for T {}

// ============================================================
// BAR
// ============================================================

/// One daily OHLC observation
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bar {
    pub date: chrono::NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(date: chrono::NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }
}

impl OHLC for Bar {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

// ============================================================
// TESTS
// ============================================================
