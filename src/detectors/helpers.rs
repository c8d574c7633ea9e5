//! Geometric predicates shared by the candle classifiers
//!
//! No predicate divides by a candle-derived quantity, so zero-body and
//! zero-range candles are handled without special cases.

// ============================================================
// DEFAULT THRESHOLDS
// ============================================================

/// Upper shadow must be at least this many bodies long
pub const SHADOW_BODY_RATIO: f64 = 2.0;
/// Lower shadow may be at most this fraction of the body
pub const LOWER_SHADOW_TOLERANCE: f64 = 0.25;
/// Body top must sit within `range / BODY_ZONE_DIVISOR` above the low
pub const BODY_ZONE_DIVISOR: f64 = 3.0;
/// Number of bars before the candidate that must show declining closes
pub const TREND_LOOKBACK: usize = 3;

// ============================================================
// SHAPE PREDICATES
// ============================================================

/// Upper shadow is at least `ratio` times the body.
///
/// A zero body only qualifies with a strictly positive upper shadow, so a flat
/// bar (open = high = low = close) never passes.
#[inline]
pub fn is_long_upper_shadow(upper_shadow: f64, body: f64, ratio: f64) -> bool {
    if body <= 0.0 {
        return upper_shadow > 0.0;
    }
    upper_shadow >= body * ratio
}

/// Lower shadow is at most `tolerance` times the body.
///
/// With a zero body this reduces to "no lower shadow at all".
#[inline]
pub fn is_small_lower_shadow(lower_shadow: f64, body: f64, tolerance: f64) -> bool {
    lower_shadow <= body * tolerance
}

/// Body top lies within `range / divisor` of the low.
///
/// `divisor` is a configuration constant (>= 1), never derived from the bar.
#[inline]
pub fn is_body_in_lower_zone(body_top: f64, low: f64, range: f64, divisor: f64) -> bool {
    body_top <= low + range / divisor
}

// ============================================================
// TREND PREDICATES
// ============================================================

/// Each close is strictly below the one before it.
///
/// Fewer than two closes carry no trend and return false.
#[inline]
pub fn is_strictly_declining(closes: impl IntoIterator<Item = f64>) -> bool {
    let mut iter = closes.into_iter();
    let Some(mut prev) = iter.next() else {
        return false;
    };
    let mut seen = 1usize;
    for close in iter {
        if close >= prev || close.is_nan() {
            return false;
        }
        prev = close;
        seen += 1;
    }
    seen >= 2
}
