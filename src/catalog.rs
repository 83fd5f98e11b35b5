// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Reference catalog of listed securities
//!
//! The catalog is a flat CSV with one row per security. Only `symbol`,
//! `security_name`, `sector` and `industry` are required; locale columns are
//! picked up when present and every other column is ignored.

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{PeerError, Result};

/// Columns a catalog source must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = ["symbol", "security_name", "sector", "industry"];

/// Static metadata for one listed security.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRecord {
    pub symbol: String,
    #[serde(rename = "security_name")]
    pub display_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl SecurityRecord {
    pub fn new(symbol: &str, display_name: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            sector: None,
            industry: None,
            city: None,
            state: None,
            country: None,
        }
    }

    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = Some(sector.to_string());
        self
    }

    pub fn with_industry(mut self, industry: &str) -> Self {
        self.industry = Some(industry.to_string());
        self
    }

    pub fn with_location(mut self, city: &str, state: &str, country: &str) -> Self {
        self.city = Some(city.to_string());
        self.state = Some(state.to_string());
        self.country = Some(country.to_string());
        self
    }
}

/// Read-only, ordered set of securities keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<SecurityRecord>,
}

impl Catalog {
    /// Build a catalog, keeping the first record for any repeated symbol.
    pub fn from_records(records: Vec<SecurityRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if seen.insert(record.symbol.clone()) {
                kept.push(record);
            } else {
                warn!("Duplicate catalog symbol {}, keeping first entry", record.symbol);
            }
        }
        Self { records: kept }
    }

    pub fn records(&self) -> &[SecurityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&SecurityRecord> {
        self.records.iter().find(|r| r.symbol == symbol)
    }

    pub fn find_by_name(&self, display_name: &str) -> Option<&SecurityRecord> {
        self.records.iter().find(|r| r.display_name == display_name)
    }

    /// Resolve a symbol or, failing that, an exact display name.
    pub fn resolve(&self, symbol_or_name: &str) -> Result<&SecurityRecord> {
        self.get(symbol_or_name)
            .or_else(|| self.find_by_name(symbol_or_name))
            .ok_or_else(|| PeerError::SecurityNotFound(symbol_or_name.to_string()))
    }

    /// Drop every record whose display name contains one of `patterns`.
    pub fn without_names<S: AsRef<str>>(self, patterns: &[S]) -> Self {
        if patterns.is_empty() {
            return self;
        }
        let before = self.records.len();
        let records: Vec<SecurityRecord> = self
            .records
            .into_iter()
            .filter(|r| {
                !patterns
                    .iter()
                    .any(|p| r.display_name.contains(p.as_ref()))
            })
            .collect();
        debug!("Excluded {} catalog records by name", before - records.len());
        Self { records }
    }

    /// Securities offered for selection, in catalog order.
    pub fn selectable(&self, marker: Option<&str>) -> Vec<&SecurityRecord> {
        match marker {
            Some(m) if !m.is_empty() => self
                .records
                .iter()
                .filter(|r| r.display_name.contains(m))
                .collect(),
            _ => self.records.iter().collect(),
        }
    }
}

/// Load the catalog from a CSV file.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PeerError::catalog(path, e))?;
    let catalog = read_catalog(file, path)?;
    info!("Loaded {} securities from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Parse a catalog from any CSV reader. `origin` is only used in errors.
pub fn read_catalog<R: Read>(source: R, origin: impl AsRef<Path>) -> Result<Catalog> {
    let origin = origin.as_ref();
    let mut reader = ReaderBuilder::new().trim(Trim::Headers).from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| PeerError::catalog(origin, e))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(PeerError::catalog(
                origin,
                format!("missing required column `{}`", column),
            ));
        }
    }

    let mut records = Vec::new();
    let mut skipped = 0;
    for (row_num, result) in reader.deserialize::<SecurityRecord>().enumerate() {
        match result {
            Ok(record) if !record.symbol.trim().is_empty() => records.push(record),
            Ok(_) => {
                debug!("Skipping catalog row {}: empty symbol", row_num + 1);
                skipped += 1;
            }
            Err(e) => {
                debug!("Skipping catalog row {}: {}", row_num + 1, e);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("Skipped {} unreadable catalog rows in {}", skipped, origin.display());
    }

    Ok(Catalog::from_records(records))
}
