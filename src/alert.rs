//! Notification seam
//!
//! The scanner hands its reports to a [`Notifier`]. This module owns the
//! Markdown rendering of those reports; delivering the text belongs to the
//! notifier implementation ([`crate::telegram::TelegramNotifier`] for chat
//! delivery, [`LogNotifier`] for dry runs).

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use tracing::info;

use crate::scan::{FetchFailure, HistoryReport, MatchResult, ScanReport};
use crate::Result;

const RULE_WIDTH: usize = 30;
const TIMESTAMP_FORMAT: &str = "%d %b %Y, %H:%M";

/// Consumer of scan results
pub trait Notifier {
    fn notify_scan(&self, report: &ScanReport) -> Result<()>;
    fn notify_history(&self, report: &HistoryReport) -> Result<()>;
}

/// Notifier that only writes the rendered message to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_scan(&self, report: &ScanReport) -> Result<()> {
        let message = format_scan_message(report, chrono::Local::now().naive_local());
        info!(matches = report.matches.len(), "\n{message}");
        Ok(())
    }

    fn notify_history(&self, report: &HistoryReport) -> Result<()> {
        let message = format_history_message(report, chrono::Local::now().naive_local());
        info!(days = report.days, matches = report.matches.len(), "\n{message}");
        Ok(())
    }
}

// ============================================================
// FORMATTING
// ============================================================

/// Render the daily scan report
pub fn format_scan_message(report: &ScanReport, now: NaiveDateTime) -> String {
    let title = "*Inverted Hammer Scanner*";
    let mut out = format!("{title}\n_{}_\n\n", now.format(TIMESTAMP_FORMAT));

    if report.matches.is_empty() {
        out.push_str("No Inverted Hammer patterns detected today.");
        push_failures(&mut out, &report.failures);
        return out;
    }

    let _ = writeln!(out, "*{} stock(s) detected:*", report.matches.len());
    out.push_str(&rule());
    out.push('\n');

    let blocks: Vec<String> = report
        .matches
        .iter()
        .map(|m| {
            format!(
                "*{}*\n  Close: `{:.2}`  |  Date: `{}`\n  Body: `{:.2}`  |  Upper Wick: `{:.2}`\n  Wick/Body Ratio: `{}`",
                display_symbol(&m.symbol),
                m.bar.close,
                m.bar.date,
                m.metrics.body,
                m.metrics.upper_shadow,
                wick_ratio(m),
            )
        })
        .collect();
    out.push_str(&blocks.join("\n\n"));

    let _ = write!(
        out,
        "\n{}\n_Scan for potential bullish reversal. Always confirm with volume & next-day candle._",
        rule()
    );
    push_failures(&mut out, &report.failures);
    out
}

/// Render the history scan report
pub fn format_history_message(report: &HistoryReport, now: NaiveDateTime) -> String {
    let days = report.days;
    let mut out = format!(
        "*Inverted Hammer — Last {days} Days*\n_{}_\n\n",
        now.format(TIMESTAMP_FORMAT)
    );

    if report.matches.is_empty() {
        let _ = write!(
            out,
            "No Inverted Hammer patterns found in the last {days} trading days."
        );
        push_failures(&mut out, &report.failures);
        return out;
    }

    let _ = writeln!(out, "*{} occurrence(s) found:*", report.matches.len());
    out.push_str(&rule());
    out.push('\n');

    let blocks: Vec<String> = report
        .matches
        .iter()
        .map(|m| {
            format!(
                "*{}*  —  `{}`\n  Close: `{:.2}`  |  Upper Wick: `{:.2}`\n  Wick/Body: `{}`",
                display_symbol(&m.symbol),
                m.bar.date,
                m.bar.close,
                m.metrics.upper_shadow,
                wick_ratio(m),
            )
        })
        .collect();
    out.push_str(&blocks.join("\n\n"));

    let _ = write!(
        out,
        "\n{}\n_Historical scan. Verify with volume & follow-through candles._",
        rule()
    );
    push_failures(&mut out, &report.failures);
    out
}

/// Symbol without the NSE exchange suffix
pub fn display_symbol(symbol: &str) -> &str {
    symbol.strip_suffix(".NS").unwrap_or(symbol)
}

fn wick_ratio(m: &MatchResult) -> String {
    match m.metrics.upper_shadow_to_body {
        Some(r) => format!("{r:.2}"),
        None => "N/A".to_string(),
    }
}

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

fn push_failures(out: &mut String, failures: &[FetchFailure]) {
    if failures.is_empty() {
        return;
    }
    let symbols: Vec<&str> = failures.iter().map(|f| display_symbol(&f.symbol)).collect();
    let _ = write!(
        out,
        "\n\n_Skipped {} symbol(s): {}_",
        failures.len(),
        symbols.join(", ")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::CandleMetrics;
    use crate::{Bar, FetchError};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 20)
            .unwrap()
            .and_hms_opt(14, 45, 0)
            .unwrap()
    }

    fn hit(symbol: &str, day: u32, o: f64, h: f64, l: f64, c: f64) -> MatchResult {
        let bar = Bar::new(NaiveDate::from_ymd_opt(2026, 2, day).unwrap(), o, h, l, c);
        MatchResult {
            symbol: symbol.into(),
            metrics: CandleMetrics::of(&bar),
            bar,
        }
    }

    #[test]
    fn test_display_symbol() {
        assert_eq!(display_symbol("RELIANCE.NS"), "RELIANCE");
        assert_eq!(display_symbol("AAPL"), "AAPL");
        assert_eq!(display_symbol("M&M.NS"), "M&M");
    }

    #[test]
    fn test_empty_scan_message() {
        let msg = format_scan_message(&ScanReport::default(), now());
        assert_eq!(
            msg,
            "*Inverted Hammer Scanner*\n_20 Feb 2026, 14:45_\n\nNo Inverted Hammer patterns detected today."
        );
    }

    #[test]
    fn test_scan_message_blocks() {
        let report = ScanReport {
            scanned: 2,
            matches: vec![hit("RELIANCE.NS", 20, 100.0, 110.0, 99.75, 101.0)],
            failures: vec![],
        };
        let msg = format_scan_message(&report, now());

        assert!(msg.starts_with(
            "*Inverted Hammer Scanner*\n_20 Feb 2026, 14:45_\n\n*1 stock(s) detected:*\n"
        ));
        assert!(msg.contains("*RELIANCE*\n  Close: `101.00`  |  Date: `2026-02-20`"));
        assert!(msg.contains("Body: `1.00`  |  Upper Wick: `9.00`"));
        assert!(msg.contains("Wick/Body Ratio: `9.00`"));
        assert!(msg.ends_with("Always confirm with volume & next-day candle._"));
        assert_eq!(msg.matches(&rule()).count(), 2);
    }

    #[test]
    fn test_doji_ratio_is_na() {
        let report = ScanReport {
            scanned: 1,
            matches: vec![hit("AAPL", 20, 100.0, 110.0, 100.0, 100.0)],
            failures: vec![],
        };
        assert!(format_scan_message(&report, now()).contains("Wick/Body Ratio: `N/A`"));
    }

    #[test]
    fn test_failures_listed() {
        let report = ScanReport {
            scanned: 2,
            matches: vec![],
            failures: vec![FetchFailure {
                symbol: "TCS.NS".into(),
                error: FetchError::Network("timeout".into()).into(),
            }],
        };
        let msg = format_scan_message(&report, now());
        assert!(msg.ends_with("\n\n_Skipped 1 symbol(s): TCS_"));
    }

    #[test]
    fn test_history_message() {
        let empty = HistoryReport {
            days: 15,
            ..HistoryReport::default()
        };
        assert!(format_history_message(&empty, now())
            .ends_with("No Inverted Hammer patterns found in the last 15 trading days."));

        let report = HistoryReport {
            days: 15,
            scanned: 1,
            matches: vec![hit("INFY.NS", 18, 100.0, 110.0, 99.75, 101.0)],
            failures: vec![],
        };
        let msg = format_history_message(&report, now());
        assert!(msg.starts_with("*Inverted Hammer — Last 15 Days*"));
        assert!(msg.contains("*1 occurrence(s) found:*"));
        assert!(msg.contains("*INFY*  —  `2026-02-18`"));
        assert!(msg.contains("Wick/Body: `9.00`"));
    }

    #[test]
    fn test_log_notifier_succeeds() {
        assert!(LogNotifier.notify_scan(&ScanReport::default()).is_ok());
        assert!(LogNotifier.notify_history(&HistoryReport::default()).is_ok());
    }
}
