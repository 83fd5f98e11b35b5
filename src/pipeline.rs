// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! End-to-end peer comparison
//!
//! Chains peer selection, price assembly and rebasing. Every run borrows the
//! catalog and price source read-only and returns freshly built tables, so a
//! newer run simply replaces the previous result.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::peers::{ClassificationField, DEFAULT_MAX_PEERS, PeerSet, select_peers};
use crate::prices::{
    Candle, PricePoint, PriceSource, assemble_series_since, candlesticks, date_bounds,
    trim_to_first_trade,
};
use crate::profile::CompanyProfile;
use crate::rebase::{DateWindow, PerformanceSummary, RebasedPoint, normalize_window, summarize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub classification: ClassificationField,
    pub max_peers: usize,
    /// Rows dated before this are never loaded.
    pub history_floor: Option<NaiveDate>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            classification: ClassificationField::Industry,
            max_peers: DEFAULT_MAX_PEERS,
            history_floor: None,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerComparison {
    pub peers: PeerSet,
    /// Assembled prices, selected security first, starting at its first trade.
    pub series: Vec<PricePoint>,
    /// Window the rebased rows were computed for, `None` without any prices.
    pub window: Option<DateWindow>,
    pub rebased: Vec<RebasedPoint>,
}

impl PeerComparison {
    pub fn selected_symbol(&self) -> &str {
        &self.peers.selected().symbol
    }

    /// Full date range of the assembled prices.
    pub fn available_range(&self) -> Option<DateWindow> {
        date_bounds(&self.series).map(|(start, end)| DateWindow::new(start, end))
    }

    pub fn summary(&self) -> Vec<PerformanceSummary> {
        summarize(&self.rebased)
    }

    pub fn profile(&self) -> CompanyProfile {
        CompanyProfile::from_record(self.peers.selected())
    }

    /// Candlestick rows of the selected security.
    pub fn candles(&self, since: Option<NaiveDate>) -> Vec<Candle> {
        candlesticks(&self.series, self.selected_symbol(), since)
    }

    /// Recompute the rebased rows for another window without reloading prices.
    pub fn rewindow(&self, window: DateWindow) -> Self {
        Self {
            peers: self.peers.clone(),
            series: self.series.clone(),
            window: Some(window),
            rebased: normalize_window(&self.series, window, self.selected_symbol()),
        }
    }
}

/// Catalog and price source bound together with the selection rules.
pub struct PeerPipeline<'a, S: PriceSource> {
    catalog: &'a Catalog,
    source: &'a S,
    options: PipelineOptions,
}

impl<'a, S: PriceSource> PeerPipeline<'a, S> {
    pub fn new(catalog: &'a Catalog, source: &'a S, options: PipelineOptions) -> Self {
        Self {
            catalog,
            source,
            options,
        }
    }

    pub fn select(&self, symbol: &str) -> Result<PeerSet> {
        select_peers(
            self.catalog,
            symbol,
            self.options.classification,
            self.options.max_peers,
        )
    }

    /// Run the whole chain for `symbol_or_name`.
    ///
    /// Without a `window` the rebased rows cover every assembled date.
    pub fn run(&self, symbol_or_name: &str, window: Option<DateWindow>) -> Result<PeerComparison> {
        let symbol = self.catalog.resolve(symbol_or_name)?.symbol.clone();
        let peers = self.select(&symbol)?;

        let series = assemble_series_since(&peers, self.source, self.options.history_floor);
        let series = trim_to_first_trade(series, &symbol);

        let window = window.or_else(|| {
            date_bounds(&series).map(|(start, end)| DateWindow::new(start, end))
        });
        let rebased = match window {
            Some(w) => normalize_window(&series, w, &symbol),
            None => Vec::new(),
        };

        info!(
            "Compared {} against {} peers: {} rebased rows",
            symbol,
            peers.len() - 1,
            rebased.len()
        );

        Ok(PeerComparison {
            peers,
            series,
            window,
            rebased,
        })
    }
}
