//! Inverted Hammer classifier
//!
//! A small real body at the bottom of the bar, a long upper shadow, almost no
//! lower shadow, after a run of strictly declining closes.

use serde::{Deserialize, Serialize};

use super::helpers::{self, *};
use crate::{OHLCExt, Period, Ratio, Result, ScanError, OHLC};

// ============================================================
// VERDICT
// ============================================================

/// Geometry of the candidate bar, kept for downstream formatting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleMetrics {
    pub body: f64,
    pub upper_shadow: f64,
    pub lower_shadow: f64,
    pub range: f64,
    /// `None` for a zero body
    pub upper_shadow_to_body: Option<f64>,
}

impl CandleMetrics {
    pub fn of<T: OHLC + ?Sized>(bar: &T) -> Self {
        let body = bar.body();
        let upper_shadow = bar.upper_shadow();
        Self {
            body,
            upper_shadow,
            lower_shadow: bar.lower_shadow(),
            range: bar.range(),
            upper_shadow_to_body: (body > 0.0).then(|| upper_shadow / body),
        }
    }
}

/// Outcome of classifying the last bar of a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub long_upper_shadow: bool,
    pub small_lower_shadow: bool,
    pub body_in_lower_zone: bool,
    pub prior_downtrend: bool,
    pub metrics: CandleMetrics,
}

impl Verdict {
    /// All four conditions hold
    #[inline]
    pub fn is_match(&self) -> bool {
        self.is_shape_match() && self.prior_downtrend
    }

    /// The candle shape qualifies, ignoring the trend
    #[inline]
    pub fn is_shape_match(&self) -> bool {
        self.long_upper_shadow && self.small_lower_shadow && self.body_in_lower_zone
    }
}

// ============================================================
// DETECTOR
// ============================================================

/// Inverted Hammer detector with tunable thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvertedHammerDetector {
    /// Upper shadow >= body * shadow_body_ratio
    pub shadow_body_ratio: f64,
    /// Lower shadow <= body * lower_shadow_tolerance
    pub lower_shadow_tolerance: Ratio,
    /// Body top <= low + range / body_zone_divisor
    pub body_zone_divisor: f64,
    /// Declining closes required before the candidate
    pub trend_lookback: Period,
}

impl Default for InvertedHammerDetector {
    fn default() -> Self {
        Self {
            shadow_body_ratio: helpers::SHADOW_BODY_RATIO,
            lower_shadow_tolerance: Ratio::new_const(helpers::LOWER_SHADOW_TOLERANCE),
            body_zone_divisor: helpers::BODY_ZONE_DIVISOR,
            trend_lookback: Period::new_const(helpers::TREND_LOOKBACK),
        }
    }
}

impl InvertedHammerDetector {
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Shortest window `classify` accepts: the trend bars plus the candidate
    #[inline]
    pub fn min_bars(&self) -> usize {
        self.trend_lookback.get() + 1
    }

    pub fn validate_config(&self) -> Result<()> {
        if !self.shadow_body_ratio.is_finite() || self.shadow_body_ratio <= 0.0 {
            return Err(ScanError::InvalidConfig(format!(
                "shadow_body_ratio must be positive and finite, got {}",
                self.shadow_body_ratio
            )));
        }
        if !self.body_zone_divisor.is_finite() || self.body_zone_divisor < 1.0 {
            return Err(ScanError::InvalidConfig(format!(
                "body_zone_divisor must be finite and >= 1, got {}",
                self.body_zone_divisor
            )));
        }
        if self.trend_lookback.get() < 2 {
            return Err(ScanError::InvalidConfig(format!(
                "trend_lookback must be >= 2, got {}",
                self.trend_lookback.get()
            )));
        }
        Ok(())
    }

    /// Classify the last bar of `bars`.
    ///
    /// Only the last `min_bars()` bars are consulted. Each of them must pass
    /// [`OHLCExt::validate`]; a malformed bar is rejected with
    /// [`ScanError::InvalidBar`] carrying its index in `bars`.
    pub fn classify<T: OHLC>(&self, bars: &[T]) -> Result<Verdict> {
        let need = self.min_bars();
        if bars.len() < need {
            return Err(ScanError::InsufficientData {
                need,
                got: bars.len(),
            });
        }
        let last = bars.len() - 1;
        validate_span(bars, bars.len() - need)?;
        Ok(self.evaluate(&bars[bars.len() - need..last], &bars[last]))
    }

    /// `classify`, with any error read as "no match"
    pub fn matches<T: OHLC>(&self, bars: &[T]) -> bool {
        self.classify(bars).is_ok_and(|v| v.is_match())
    }

    /// Indices of every qualifying bar among the last `last_n` bars.
    ///
    /// Bar `i` is judged on `bars[..=i]` exactly as `classify` would judge it,
    /// so the earliest `trend_lookback` bars can never qualify.
    pub fn scan_history<T: OHLC>(&self, bars: &[T], last_n: usize) -> Result<Vec<usize>> {
        let need = self.min_bars();
        if bars.len() < need {
            return Err(ScanError::InsufficientData {
                need,
                got: bars.len(),
            });
        }
        let first = (need - 1).max(bars.len().saturating_sub(last_n));
        validate_span(bars, first + 1 - need)?;

        Ok((first..bars.len())
            .filter(|&i| self.evaluate(&bars[i + 1 - need..i], &bars[i]).is_match())
            .collect())
    }

    /// `prior` holds the `trend_lookback` bars before `candidate`, all validated
    fn evaluate<T: OHLC>(&self, prior: &[T], candidate: &T) -> Verdict {
        let metrics = CandleMetrics::of(candidate);

        Verdict {
            long_upper_shadow: is_long_upper_shadow(
                metrics.upper_shadow,
                metrics.body,
                self.shadow_body_ratio,
            ),
            small_lower_shadow: is_small_lower_shadow(
                metrics.lower_shadow,
                metrics.body,
                self.lower_shadow_tolerance.get(),
            ),
            body_in_lower_zone: is_body_in_lower_zone(
                candidate.body_top(),
                candidate.low(),
                metrics.range,
                self.body_zone_divisor,
            ),
            prior_downtrend: is_strictly_declining(prior.iter().map(|b| b.close())),
            metrics,
        }
    }
}

fn validate_span<T: OHLC>(bars: &[T], from: usize) -> Result<()> {
    for (i, bar) in bars.iter().enumerate().skip(from) {
        bar.validate().map_err(|e| match e {
            ScanError::InvalidBar { reason, .. } => ScanError::InvalidBar { index: i, reason },
            other => other,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct TestBar {
        o: f64,
        h: f64,
        l: f64,
        c: f64,
    }

    impl OHLC for TestBar {
        fn open(&self) -> f64 {
            self.o
        }

        fn high(&self) -> f64 {
            self.h
        }

        fn low(&self) -> f64 {
            self.l
        }

        fn close(&self) -> f64 {
            self.c
        }
    }

    fn tb(o: f64, h: f64, l: f64, c: f64) -> TestBar {
        TestBar { o, h, l, c }
    }

    fn downtrend() -> Vec<TestBar> {
        vec![
            tb(106.0, 107.0, 104.0, 105.0),
            tb(104.5, 105.0, 102.5, 103.0),
            tb(103.0, 103.5, 101.5, 102.0),
        ]
    }

    #[test]
    fn test_defaults() {
        let d = InvertedHammerDetector::default();
        assert_eq!(d.min_bars(), 4);
        assert!(d.validate_config().is_ok());
    }

    #[test]
    fn test_validate_config_rejects_bad_values() {
        let mut d = InvertedHammerDetector::default();
        d.shadow_body_ratio = 0.0;
        assert!(d.validate_config().is_err());

        let mut d = InvertedHammerDetector::default();
        d.trend_lookback = Period::new(1).unwrap();
        assert!(d.validate_config().is_err());

        let mut d = InvertedHammerDetector::default();
        d.body_zone_divisor = 0.5;
        assert!(d.validate_config().is_err());

        let mut d = InvertedHammerDetector::default();
        d.body_zone_divisor = f64::NAN;
        assert!(d.validate_config().is_err());

        let mut d = InvertedHammerDetector::default();
        d.body_zone_divisor = 1.0;
        assert!(d.validate_config().is_ok());
    }

    #[test]
    fn test_metrics() {
        let m = CandleMetrics::of(&tb(100.0, 110.0, 99.75, 101.0));
        assert_eq!(m.body, 1.0);
        assert_eq!(m.upper_shadow, 9.0);
        assert_eq!(m.lower_shadow, 0.25);
        assert_eq!(m.range, 10.25);
        assert_eq!(m.upper_shadow_to_body, Some(9.0));

        let doji = CandleMetrics::of(&tb(100.0, 110.0, 100.0, 100.0));
        assert_eq!(doji.upper_shadow_to_body, None);
    }

    #[test]
    fn test_classify_uses_only_tail() {
        // An uptrend far back in history must not matter
        let mut bars = vec![tb(90.0, 91.0, 89.0, 90.5), tb(91.0, 92.0, 90.0, 91.5)];
        bars.extend(downtrend());
        bars.push(tb(100.0, 110.0, 99.75, 101.0));

        assert!(InvertedHammerDetector::default().classify(&bars).unwrap().is_match());
    }

    #[test]
    fn test_invalid_bar_index_is_absolute() {
        let mut bars = vec![tb(90.0, 91.0, 89.0, 90.5)];
        bars.extend(downtrend());
        bars[2] = tb(104.5, 102.0, 103.0, 103.0); // high < low
        bars.push(tb(100.0, 110.0, 99.75, 101.0));

        let err = InvertedHammerDetector::default().classify(&bars).unwrap_err();
        assert_eq!(
            err,
            ScanError::InvalidBar {
                index: 2,
                reason: "high < low"
            }
        );
    }

    #[test]
    fn test_malformed_bar_outside_tail_is_ignored() {
        let mut bars = vec![tb(100.0, 90.0, 95.0, 92.0)];
        bars.extend(downtrend());
        bars.push(tb(100.0, 110.0, 99.75, 101.0));

        assert!(InvertedHammerDetector::default().matches(&bars));
    }

    #[test]
    fn test_scan_history_respects_last_n() {
        let mut bars = downtrend();
        bars.push(tb(100.0, 110.0, 99.75, 101.0)); // index 3, match
        bars.push(tb(101.0, 102.0, 100.0, 101.5)); // index 4, no match

        let d = InvertedHammerDetector::default();
        assert_eq!(d.scan_history(&bars, 2).unwrap(), vec![3]);
        assert_eq!(d.scan_history(&bars, 1).unwrap(), Vec::<usize>::new());
        assert_eq!(d.scan_history(&bars, 100).unwrap(), vec![3]);
    }

    #[test]
    fn test_scan_history_insufficient() {
        let d = InvertedHammerDetector::default();
        assert_eq!(
            d.scan_history(&downtrend(), 5),
            Err(ScanError::InsufficientData { need: 4, got: 3 })
        );
    }
}
