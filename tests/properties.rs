//! Property tests for the Inverted Hammer classifier.

use chrono::{Days, NaiveDate};
use hammerscan::prelude::*;
use proptest::prelude::*;

/// A bar satisfying `low <= open, close <= high`
fn valid_bar() -> impl Strategy<Value = (f64, f64, f64, f64)> {
    (1.0f64..1000.0, 0.0f64..50.0, 0.0f64..50.0, 0.0f64..50.0).prop_map(|(low, a, b, up)| {
        let open = low + a;
        let close = low + b;
        (open, open.max(close) + up, low, close)
    })
}

fn series(bars: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
    bars.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Bar::new(start + Days::new(i as u64), o, h, l, c))
        .collect()
}

proptest! {
    /// Same window, same verdict.
    #[test]
    fn classify_is_idempotent(bars in prop::collection::vec(valid_bar(), 4..12)) {
        let detector = InvertedHammerDetector::with_defaults();
        let bars = series(&bars);
        prop_assert_eq!(detector.classify(&bars), detector.classify(&bars));
    }

    /// Valid windows of sufficient length always produce a verdict.
    #[test]
    fn valid_windows_never_error(bars in prop::collection::vec(valid_bar(), 4..12)) {
        let detector = InvertedHammerDetector::with_defaults();
        prop_assert!(detector.classify(&series(&bars)).is_ok());
    }

    /// A short upper shadow rules the bar out no matter what else holds.
    #[test]
    fn short_upper_shadow_never_matches(
        prior in prop::collection::vec(valid_bar(), 3),
        candidate in valid_bar(),
    ) {
        let mut bars = prior;
        bars.push(candidate);
        let bars = series(&bars);
        let v = InvertedHammerDetector::with_defaults().classify(&bars).unwrap();

        if v.metrics.upper_shadow < 2.0 * v.metrics.body {
            prop_assert!(!v.is_match());
        }
    }

    /// Any non-decline among the prior closes rules the bar out.
    #[test]
    fn non_declining_trend_never_matches(
        first in 50.0f64..100.0,
        rise in 0.0f64..5.0,
        drop in 0.1f64..5.0,
        rising_step in 0usize..2,
    ) {
        // closes: one step is flat or rising, the other declines
        let closes = if rising_step == 0 {
            [first, first + rise, first + rise - drop]
        } else {
            [first, first - drop, first - drop + rise]
        };
        let mut bars: Vec<_> = closes.iter().map(|&c| (c, c + 1.0, c - 1.0, c)).collect();
        let low = 40.0;
        bars.push((low, low + 20.0, low, low + 1.0)); // perfect shape

        let v = InvertedHammerDetector::with_defaults().classify(&series(&bars)).unwrap();
        prop_assert!(v.is_shape_match());
        prop_assert!(!v.prior_downtrend);
        prop_assert!(!v.is_match());
    }

    /// Arbitrary (even non-finite) input yields a verdict or an error, never a panic.
    #[test]
    fn arbitrary_input_never_panics(
        bars in prop::collection::vec(any::<(f64, f64, f64, f64)>(), 0..8),
        last_n in 0usize..10,
    ) {
        let detector = InvertedHammerDetector::with_defaults();
        let bars = series(&bars);
        let _ = detector.classify(&bars);
        let _ = detector.scan_history(&bars, last_n);
    }
}
