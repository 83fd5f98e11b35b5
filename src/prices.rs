// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Daily price series
//!
//! Price history comes from one CSV per symbol (`<SYMBOL>.csv` with at least
//! `Date`, `Open`, `High`, `Low`, `Close`). The assembler joins the series of
//! a peer set into one table tagged with symbol and display name.

use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::catalog::SecurityRecord;
use crate::error::Result;
use crate::peers::PeerSet;

/// One trading day of a single symbol, before tagging.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

impl DailyBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: Some(close),
        }
    }

    /// A bar where only the close is known.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: Some(close),
        }
    }
}

/// One row of the assembled peer table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub symbol: String,
    pub display_name: String,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
}

impl PricePoint {
    fn tagged(bar: DailyBar, security: &SecurityRecord) -> Self {
        Self {
            date: bar.date,
            symbol: security.symbol.clone(),
            display_name: security.display_name.clone(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
        }
    }
}

/// Complete OHLC row for candlestick charts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Lookup of historical daily prices by symbol.
pub trait PriceSource {
    /// Full history for `symbol`, or `None` when the source has no series for it.
    fn daily_bars(&self, symbol: &str) -> Result<Option<Vec<DailyBar>>>;

    /// Symbols this source can serve.
    fn available_symbols(&self) -> Result<Vec<String>>;
}

/// A directory holding one `<SYMBOL>.csv` per security.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
}

impl CsvDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }
}

impl PriceSource for CsvDirectory {
    fn daily_bars(&self, symbol: &str) -> Result<Option<Vec<DailyBar>>> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Ok(None);
        }
        let file = File::open(&path)?;
        let bars = read_daily_bars(file, &path)?;
        debug!("Read {} bars from {}", bars.len(), path.display());
        Ok(Some(bars))
    }

    fn available_symbols(&self) -> Result<Vec<String>> {
        let pattern = format!(
            "{}/*.csv",
            glob::Pattern::escape(&self.dir.to_string_lossy())
        );
        let mut symbols = Vec::new();
        for entry in glob::glob(&pattern)? {
            match entry {
                Ok(path) => {
                    if let Some(stem) = path.file_stem() {
                        symbols.push(stem.to_string_lossy().to_string());
                    }
                }
                Err(e) => debug!("Skipping unreadable entry: {}", e),
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

/// Price series held in memory, keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    series: HashMap<String, Vec<DailyBar>>,
}

impl MemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<DailyBar>) {
        self.series.insert(symbol.into(), bars);
    }

    pub fn with_series(mut self, symbol: impl Into<String>, bars: Vec<DailyBar>) -> Self {
        self.insert(symbol, bars);
        self
    }
}

impl PriceSource for MemoryPriceSource {
    fn daily_bars(&self, symbol: &str) -> Result<Option<Vec<DailyBar>>> {
        Ok(self.series.get(symbol).cloned())
    }

    fn available_symbols(&self) -> Result<Vec<String>> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date")]
    date: String,
    #[serde(alias = "Open", default)]
    open: Option<f64>,
    #[serde(alias = "High", default)]
    high: Option<f64>,
    #[serde(alias = "Low", default)]
    low: Option<f64>,
    #[serde(alias = "Close", default)]
    close: Option<f64>,
}

/// Parse a price-file date, accepting the layouts seen in exported datasets.
pub fn parse_price_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    const DATETIME_FORMATS: [&str; 3] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Read a per-symbol price CSV. Rows that fail to parse are dropped.
pub fn read_daily_bars<R: Read>(source: R, origin: impl AsRef<Path>) -> Result<Vec<DailyBar>> {
    let origin = origin.as_ref();
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);

    let mut bars = Vec::new();
    let mut skipped = 0;
    for (row_num, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping row {} of {}: {}", row_num + 1, origin.display(), e);
                skipped += 1;
                continue;
            }
        };
        let Some(date) = parse_price_date(&row.date) else {
            debug!(
                "Skipping row {} of {}: unparseable date '{}'",
                row_num + 1,
                origin.display(),
                row.date
            );
            skipped += 1;
            continue;
        };
        bars.push(DailyBar {
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
        });
    }

    if skipped > 0 {
        warn!("Skipped {} invalid rows in {}", skipped, origin.display());
    }
    Ok(bars)
}

/// Join the price history of every peer into one table.
pub fn assemble_series(peers: &PeerSet, source: &impl PriceSource) -> Vec<PricePoint> {
    assemble_series_since(peers, source, None)
}

/// Like [`assemble_series`], keeping only rows dated strictly after `floor`.
///
/// Rows follow peer-set order, so the selected security comes first. Within a
/// symbol rows ascend by date and a repeated date keeps its first row. Peers
/// without a series, or whose series cannot be read, are left out.
pub fn assemble_series_since(
    peers: &PeerSet,
    source: &impl PriceSource,
    floor: Option<NaiveDate>,
) -> Vec<PricePoint> {
    let mut table = Vec::new();

    for member in peers.members() {
        let bars = match source.daily_bars(&member.symbol) {
            Ok(Some(bars)) => bars,
            Ok(None) => {
                warn!("No price series for {}, skipping", member.symbol);
                continue;
            }
            Err(e) => {
                warn!("Failed to read price series for {}: {}", member.symbol, e);
                continue;
            }
        };

        let mut rows: Vec<PricePoint> = bars
            .into_iter()
            .filter(|b| floor.is_none_or(|f| b.date > f))
            .map(|b| PricePoint::tagged(b, member))
            .collect();
        rows.sort_by_key(|r| r.date);

        let before = rows.len();
        rows.dedup_by_key(|r| r.date);
        if rows.len() < before {
            warn!(
                "Removed {} duplicate dates for {}",
                before - rows.len(),
                member.symbol
            );
        }

        table.extend(rows);
    }

    info!(
        "Assembled {} price rows for {} securities",
        table.len(),
        symbols_in_order(&table).len()
    );
    table
}

/// Distinct symbols in order of first appearance.
pub fn symbols_in_order(series: &[PricePoint]) -> Vec<&str> {
    let mut symbols: Vec<&str> = Vec::new();
    for row in series {
        if !symbols.contains(&row.symbol.as_str()) {
            symbols.push(&row.symbol);
        }
    }
    symbols
}

/// First date on which `symbol` appears in the table.
pub fn earliest_date(series: &[PricePoint], symbol: &str) -> Option<NaiveDate> {
    series
        .iter()
        .filter(|r| r.symbol == symbol)
        .map(|r| r.date)
        .min()
}

/// Earliest and latest dates across the whole table.
pub fn date_bounds(series: &[PricePoint]) -> Option<(NaiveDate, NaiveDate)> {
    let min = series.iter().map(|r| r.date).min()?;
    let max = series.iter().map(|r| r.date).max()?;
    Some((min, max))
}

/// Drop rows dated before `symbol` first traded. Unchanged if `symbol` is absent.
pub fn trim_to_first_trade(series: Vec<PricePoint>, symbol: &str) -> Vec<PricePoint> {
    match earliest_date(&series, symbol) {
        Some(first) => series.into_iter().filter(|r| r.date >= first).collect(),
        None => series,
    }
}

/// OHLC rows of `symbol` on or after `since`, skipping rows with a missing price.
pub fn candlesticks(series: &[PricePoint], symbol: &str, since: Option<NaiveDate>) -> Vec<Candle> {
    let mut candles: Vec<Candle> = series
        .iter()
        .filter(|r| r.symbol == symbol)
        .filter(|r| since.is_none_or(|s| r.date >= s))
        .filter_map(|r| {
            Some(Candle {
                date: r.date,
                open: r.open?,
                high: r.high?,
                low: r.low?,
                close: r.close?,
            })
        })
        .collect();
    candles.sort_by_key(|c| c.date);
    candles
}
