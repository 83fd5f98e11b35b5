// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Rebasing price series to a common starting value of 100
//!
//! Each symbol is anchored to its own first close inside the window, so
//! securities trading at very different prices can share one chart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::prices::{PricePoint, earliest_date, symbols_in_order};

/// Value every rebased series starts from.
pub const REBASE_BASE: f64 = 100.0;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// A price row with its close expressed relative to the symbol's anchor close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebasedPoint {
    pub date: NaiveDate,
    pub symbol: String,
    pub display_name: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub rebased_close: f64,
}

/// Start of the comparison: the window start, pushed forward to the anchor
/// symbol's first traded date when that comes later.
pub fn effective_start(
    series: &[PricePoint],
    window_start: NaiveDate,
    anchor_symbol: &str,
) -> NaiveDate {
    match earliest_date(series, anchor_symbol) {
        Some(first) => window_start.max(first),
        None => window_start,
    }
}

/// Restrict `series` to `[window_start, window_end]` and rebase every symbol
/// to 100 at its first close on or after the effective start.
///
/// Rows without a finite close are dropped. A symbol with no usable row in
/// range, or whose anchor close is zero, is left out entirely. Output keeps
/// symbols in order of first appearance with rows ascending by date.
pub fn normalize(
    series: &[PricePoint],
    window_start: NaiveDate,
    window_end: NaiveDate,
    anchor_symbol: &str,
) -> Vec<RebasedPoint> {
    let window = DateWindow::new(
        effective_start(series, window_start, anchor_symbol),
        window_end,
    );
    if window.is_empty() {
        debug!("Empty comparison window {}", window);
        return Vec::new();
    }

    let mut by_symbol: HashMap<&str, Vec<(&PricePoint, f64)>> = HashMap::new();
    for row in series {
        if !window.contains(row.date) {
            continue;
        }
        match row.close.filter(|c| c.is_finite()) {
            Some(close) => by_symbol.entry(&row.symbol).or_default().push((row, close)),
            None => debug!("Dropping {} {}: no close price", row.symbol, row.date),
        }
    }

    let mut rebased = Vec::new();
    for symbol in symbols_in_order(series) {
        let Some(rows) = by_symbol.get_mut(symbol) else {
            continue;
        };
        rows.sort_by_key(|(r, _)| r.date);

        let anchor_close = rows[0].1;
        if anchor_close == 0.0 {
            warn!(
                "Excluding {}: zero close on anchor date {}",
                symbol, rows[0].0.date
            );
            continue;
        }

        rebased.extend(rows.iter().map(|(row, close)| RebasedPoint {
            date: row.date,
            symbol: row.symbol.clone(),
            display_name: row.display_name.clone(),
            open: row.open,
            high: row.high,
            low: row.low,
            close: *close,
            rebased_close: close / anchor_close * REBASE_BASE,
        }));
    }

    rebased
}

/// [`normalize`] over a [`DateWindow`].
pub fn normalize_window(
    series: &[PricePoint],
    window: DateWindow,
    anchor_symbol: &str,
) -> Vec<RebasedPoint> {
    normalize(series, window.start, window.end, anchor_symbol)
}

/// Per-symbol outcome over the rebased window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub symbol: String,
    pub display_name: String,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub anchor_close: f64,
    pub last_close: f64,
    pub last_rebased: f64,
    /// Change over the window in percent.
    pub change_pct: f64,
}

/// Summarize rebased rows, one entry per symbol in output order.
pub fn summarize(rebased: &[RebasedPoint]) -> Vec<PerformanceSummary> {
    let mut summaries: Vec<PerformanceSummary> = Vec::new();
    for row in rebased {
        match summaries.iter_mut().find(|s| s.symbol == row.symbol) {
            Some(summary) => {
                if row.date >= summary.last_date {
                    summary.last_date = row.date;
                    summary.last_close = row.close;
                    summary.last_rebased = row.rebased_close;
                    summary.change_pct = row.rebased_close - REBASE_BASE;
                }
            }
            None => summaries.push(PerformanceSummary {
                symbol: row.symbol.clone(),
                display_name: row.display_name.clone(),
                first_date: row.date,
                last_date: row.date,
                anchor_close: row.close * REBASE_BASE / row.rebased_close,
                last_close: row.close,
                last_rebased: row.rebased_close,
                change_pct: row.rebased_close - REBASE_BASE,
            }),
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(symbol: &str, date: NaiveDate, close: Option<f64>) -> PricePoint {
        PricePoint {
            date,
            symbol: symbol.to_string(),
            display_name: format!("{} Inc", symbol),
            open: None,
            high: None,
            low: None,
            close,
        }
    }

    #[test]
    fn test_anchor_is_first_date_in_window() {
        let series = vec![
            row("AAA", d(2020, 1, 1), Some(10.0)),
            row("AAA", d(2020, 1, 2), Some(20.0)),
            row("AAA", d(2020, 1, 3), Some(40.0)),
        ];
        let out = normalize(&series, d(2020, 1, 2), d(2020, 1, 3), "AAA");
        let values: Vec<f64> = out.iter().map(|r| r.rebased_close).collect();
        assert_eq!(values.len(), 2);
        assert_abs_diff_eq!(values[0], 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(values[1], 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_anchor_on_non_trading_window_start() {
        // Window opens on a weekend; the next trading day is the anchor.
        let series = vec![
            row("AAA", d(2020, 1, 3), Some(10.0)),
            row("AAA", d(2020, 1, 6), Some(12.0)),
            row("AAA", d(2020, 1, 7), Some(15.0)),
        ];
        let out = normalize(&series, d(2020, 1, 4), d(2020, 1, 31), "AAA");
        assert_eq!(out[0].date, d(2020, 1, 6));
        assert_abs_diff_eq!(out[1].rebased_close, 125.0, epsilon = 1e-9);
    }

    #[test]
    fn test_window_starts_at_anchor_first_trade() {
        let series = vec![
            row("NEW", d(2020, 3, 2), Some(50.0)),
            row("NEW", d(2020, 3, 3), Some(55.0)),
            row("OLD", d(2020, 1, 2), Some(8.0)),
            row("OLD", d(2020, 3, 2), Some(10.0)),
            row("OLD", d(2020, 3, 3), Some(9.0)),
        ];
        assert_eq!(effective_start(&series, d(2020, 1, 1), "NEW"), d(2020, 3, 2));

        let out = normalize(&series, d(2020, 1, 1), d(2020, 12, 31), "NEW");
        assert!(out.iter().all(|r| r.date >= d(2020, 3, 2)));
        let old: Vec<&RebasedPoint> = out.iter().filter(|r| r.symbol == "OLD").collect();
        assert_eq!(old.len(), 2);
        assert_abs_diff_eq!(old[0].rebased_close, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(old[1].rebased_close, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn test_anchors_are_per_symbol() {
        let series = vec![
            row("AAA", d(2020, 1, 2), Some(10.0)),
            row("AAA", d(2020, 1, 3), Some(11.0)),
            row("BBB", d(2020, 1, 3), Some(200.0)),
            row("BBB", d(2020, 1, 4), Some(100.0)),
        ];
        let out = normalize(&series, d(2020, 1, 1), d(2020, 1, 31), "AAA");
        let bbb: Vec<f64> = out
            .iter()
            .filter(|r| r.symbol == "BBB")
            .map(|r| r.rebased_close)
            .collect();
        assert_abs_diff_eq!(bbb[0], 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbb[1], 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_close_rows_dropped_and_zero_anchor_excluded() {
        let series = vec![
            row("AAA", d(2020, 1, 2), None),
            row("AAA", d(2020, 1, 3), Some(4.0)),
            row("AAA", d(2020, 1, 6), Some(f64::NAN)),
            row("AAA", d(2020, 1, 7), Some(6.0)),
            row("ZER", d(2020, 1, 2), Some(0.0)),
            row("ZER", d(2020, 1, 3), Some(1.0)),
        ];
        let out = normalize(&series, d(2020, 1, 1), d(2020, 1, 31), "AAA");
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.symbol == "AAA"));
        assert_eq!(out[0].date, d(2020, 1, 3));
        assert_abs_diff_eq!(out[1].rebased_close, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_symbol_without_rows_in_window_is_excluded() {
        let series = vec![
            row("AAA", d(2020, 1, 2), Some(1.0)),
            row("GONE", d(2019, 6, 1), Some(3.0)),
        ];
        let out = normalize(&series, d(2020, 1, 1), d(2020, 1, 31), "AAA");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol, "AAA");
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let series = vec![row("AAA", d(2020, 1, 2), Some(1.0))];
        assert!(normalize(&series, d(2020, 2, 1), d(2020, 1, 1), "AAA").is_empty());
        assert!(DateWindow::new(d(2020, 2, 1), d(2020, 1, 1)).is_empty());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let window = DateWindow::new(d(2020, 1, 2), d(2020, 1, 3));
        assert!(window.contains(d(2020, 1, 2)));
        assert!(window.contains(d(2020, 1, 3)));
        assert!(!window.contains(d(2020, 1, 4)));

        let series = vec![
            row("AAA", d(2020, 1, 1), Some(1.0)),
            row("AAA", d(2020, 1, 2), Some(2.0)),
            row("AAA", d(2020, 1, 3), Some(4.0)),
            row("AAA", d(2020, 1, 4), Some(8.0)),
        ];
        let out = normalize_window(&series, window, "AAA");
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].rebased_close, 200.0);
    }

    #[test]
    fn test_unknown_anchor_uses_window_start() {
        let series = vec![row("AAA", d(2020, 1, 2), Some(1.0))];
        assert_eq!(effective_start(&series, d(2020, 1, 1), "ZZZ"), d(2020, 1, 1));
        assert_eq!(normalize(&series, d(2020, 1, 1), d(2020, 1, 5), "ZZZ").len(), 1);
    }

    #[test]
    fn test_summarize() {
        let series = vec![
            row("AAA", d(2020, 1, 2), Some(20.0)),
            row("AAA", d(2020, 1, 3), Some(25.0)),
        ];
        let out = normalize(&series, d(2020, 1, 1), d(2020, 1, 31), "AAA");
        let summary = summarize(&out);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].last_date, d(2020, 1, 3));
        assert_abs_diff_eq!(summary[0].anchor_close, 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary[0].change_pct, 25.0, epsilon = 1e-9);
    }
}
