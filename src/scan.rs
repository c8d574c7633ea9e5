//! Multi-symbol scan orchestration
//!
//! [`ScanEngine`] fetches a window of daily bars for every configured symbol
//! through a [`BarSource`], classifies the last bar and collects the matches.
//! A failing symbol is recorded in the report and never aborts the scan.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detectors::{CandleMetrics, InvertedHammerDetector};
use crate::{Bar, FetchError, Result, ScanError};

/// Default number of daily bars requested per symbol (about one month)
pub const DEFAULT_WINDOW_LEN: usize = 22;
/// Default size of the worker pool
pub const DEFAULT_MAX_WORKERS: usize = 4;

// ============================================================
// DATA SOURCE
// ============================================================

/// Market-data collaborator.
///
/// `fetch` returns up to `count` most recent daily bars, oldest first. A
/// source may return fewer; the detector rejects windows that are too short.
pub trait BarSource: Sync {
    fn fetch(&self, symbol: &str, count: usize) -> std::result::Result<Vec<Bar>, FetchError>;
}

impl<F> BarSource for F
where
    F: Fn(&str, usize) -> std::result::Result<Vec<Bar>, FetchError> + Sync,
{
    fn fetch(&self, symbol: &str, count: usize) -> std::result::Result<Vec<Bar>, FetchError> {
        self(symbol, count)
    }
}

/// In-memory source keyed by symbol
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bars: HashMap<String, Vec<Bar>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.bars.insert(symbol.into(), bars);
    }
}

impl BarSource for MemorySource {
    fn fetch(&self, symbol: &str, count: usize) -> std::result::Result<Vec<Bar>, FetchError> {
        let bars = self
            .bars
            .get(symbol)
            .ok_or_else(|| FetchError::SymbolNotFound(symbol.to_string()))?;
        Ok(bars[bars.len().saturating_sub(count)..].to_vec())
    }
}

// ============================================================
// RESULTS
// ============================================================

/// A symbol whose latest (or historical) bar qualified
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub symbol: String,
    pub bar: Bar,
    pub metrics: CandleMetrics,
}

impl MatchResult {
    fn new(symbol: &str, bar: Bar) -> Self {
        Self {
            symbol: symbol.to_string(),
            metrics: CandleMetrics::of(&bar),
            bar,
        }
    }
}

/// A symbol that produced no verdict
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{symbol}: {error}")]
pub struct FetchFailure {
    pub symbol: String,
    pub error: ScanError,
}

/// Outcome of a latest-bar scan, in configuration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub scanned: usize,
    pub matches: Vec<MatchResult>,
    pub failures: Vec<FetchFailure>,
}

impl ScanReport {
    pub fn matched_symbols(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.symbol.as_str())
    }
}

/// Outcome of a history scan, newest bar first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryReport {
    pub days: usize,
    pub scanned: usize,
    pub matches: Vec<MatchResult>,
    pub failures: Vec<FetchFailure>,
}

// ============================================================
// CONFIG
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub symbols: Vec<String>,
    pub window_len: usize,
    pub max_workers: usize,
    pub detector: InvertedHammerDetector,
}

impl ScanConfig {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            window_len: DEFAULT_WINDOW_LEN,
            max_workers: DEFAULT_MAX_WORKERS,
            detector: InvertedHammerDetector::default(),
        }
    }

    pub fn window_len(mut self, window_len: usize) -> Self {
        self.window_len = window_len;
        self
    }

    pub fn max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn detector(mut self, detector: InvertedHammerDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.validate_config()?;
        if self.window_len < self.detector.min_bars() {
            return Err(ScanError::InvalidConfig(format!(
                "window_len {} is shorter than the {} bars the detector needs",
                self.window_len,
                self.detector.min_bars()
            )));
        }
        if self.max_workers == 0 {
            return Err(ScanError::InvalidConfig("max_workers must be > 0".into()));
        }
        Ok(())
    }
}

// ============================================================
// ENGINE
// ============================================================

type SymbolOutcome<T> = std::result::Result<T, FetchFailure>;

/// Scans a symbol universe on a bounded worker pool
pub struct ScanEngine {
    config: ScanConfig,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for ScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ScanEngine {
    /// Validate `config`, drop duplicate symbols (first occurrence wins) and
    /// start a pool of `max_workers` threads.
    pub fn new(mut config: ScanConfig) -> Result<Self> {
        config.validate()?;

        let mut seen = HashSet::new();
        config.symbols.retain(|s| seen.insert(s.clone()));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers)
            .thread_name(|i| format!("hammerscan-{i}"))
            .build()
            .map_err(|e| ScanError::InvalidConfig(format!("worker pool: {e}")))?;

        Ok(Self { config, pool })
    }

    #[inline]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Classify the latest bar of every configured symbol
    pub fn run<B: BarSource + ?Sized>(&self, source: &B) -> ScanReport {
        self.run_with(&self.config.symbols, source)
    }

    /// Classify the latest bar of each of `symbols`, in the given order
    pub fn run_with<S, B>(&self, symbols: &[S], source: &B) -> ScanReport
    where
        S: AsRef<str> + Sync,
        B: BarSource + ?Sized,
    {
        info!(
            symbols = symbols.len(),
            workers = self.config.max_workers,
            "Starting scan"
        );

        let outcomes: Vec<SymbolOutcome<Option<MatchResult>>> = self.pool.install(|| {
            symbols
                .par_iter()
                .map(|s| self.scan_latest(s.as_ref(), source))
                .collect()
        });

        let mut report = ScanReport {
            scanned: symbols.len(),
            ..ScanReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(Some(m)) => report.matches.push(m),
                Ok(None) => {}
                Err(failure) => report.failures.push(failure),
            }
        }

        info!(
            matches = report.matches.len(),
            failures = report.failures.len(),
            "Scan complete"
        );
        report
    }

    /// Every qualifying bar within the last `days` bars of each symbol
    pub fn run_history<B: BarSource + ?Sized>(&self, source: &B, days: usize) -> HistoryReport {
        let symbols = &self.config.symbols;
        let count = self
            .config
            .window_len
            .max(days.saturating_add(self.config.detector.min_bars() - 1));
        info!(days, symbols = symbols.len(), "Starting history scan");

        let outcomes: Vec<SymbolOutcome<Vec<MatchResult>>> = self.pool.install(|| {
            symbols
                .par_iter()
                .map(|s| self.scan_history(s, source, count, days))
                .collect()
        });

        let mut report = HistoryReport {
            days,
            scanned: symbols.len(),
            ..HistoryReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(hits) => report.matches.extend(hits),
                Err(failure) => report.failures.push(failure),
            }
        }
        // stable: same-day hits keep configuration order
        report.matches.sort_by(|a, b| b.bar.date.cmp(&a.bar.date));

        info!(
            matches = report.matches.len(),
            failures = report.failures.len(),
            "History scan complete"
        );
        report
    }

    fn scan_latest<B: BarSource + ?Sized>(
        &self,
        symbol: &str,
        source: &B,
    ) -> SymbolOutcome<Option<MatchResult>> {
        let bars = source
            .fetch(symbol, self.config.window_len)
            .map_err(|e| failure(symbol, e.into()))?;
        let verdict = self
            .config
            .detector
            .classify(&bars)
            .map_err(|e| failure(symbol, e))?;

        match bars.last() {
            Some(&bar) if verdict.is_match() => {
                info!(%symbol, date = %bar.date, close = bar.close, "Inverted Hammer");
                Ok(Some(MatchResult::new(symbol, bar)))
            }
            _ => {
                debug!(%symbol, ?verdict, "No pattern");
                Ok(None)
            }
        }
    }

    fn scan_history<B: BarSource + ?Sized>(
        &self,
        symbol: &str,
        source: &B,
        count: usize,
        days: usize,
    ) -> SymbolOutcome<Vec<MatchResult>> {
        let bars = source
            .fetch(symbol, count)
            .map_err(|e| failure(symbol, e.into()))?;
        let hits = self
            .config
            .detector
            .scan_history(&bars, days)
            .map_err(|e| failure(symbol, e))?;

        Ok(hits
            .into_iter()
            .map(|i| {
                let bar = bars[i];
                info!(%symbol, date = %bar.date, "Historical Inverted Hammer");
                MatchResult::new(symbol, bar)
            })
            .collect())
    }
}

fn failure(symbol: &str, error: ScanError) -> FetchFailure {
    warn!(%symbol, %error, "Skipping symbol");
    FetchFailure {
        symbol: symbol.to_string(),
        error,
    }
}
