// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Common test utilities and helpers
//!
//! This module provides reusable fixtures for the integration tests:
//! - Catalog CSV files with a configurable set of securities
//! - Price directories holding one `<SYMBOL>.csv` per security
//! - Date helpers

#![allow(dead_code)]

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use csv::Writer;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A catalog row used to build fixture files
#[derive(Debug, Clone)]
pub struct TestSecurity {
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl TestSecurity {
    /// Create a security in the given industry with a generic sector
    pub fn simple(symbol: &str, industry: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: format!("{} Holdings - Common Stock", symbol),
            sector: "Technology".to_string(),
            industry: industry.to_string(),
            city: String::new(),
            state: String::new(),
            country: "United States".to_string(),
        }
    }

    pub fn with_sector(mut self, sector: &str) -> Self {
        self.sector = sector.to_string();
        self
    }
}

/// The six-company catalog used across tests: five "Tech" names and one retailer
pub fn tech_catalog() -> Vec<TestSecurity> {
    vec![
        TestSecurity::simple("AAA", "Tech"),
        TestSecurity::simple("BBB", "Tech"),
        TestSecurity::simple("CCC", "Tech"),
        TestSecurity::simple("DDD", "Tech"),
        TestSecurity::simple("EEE", "Tech"),
        TestSecurity::simple("FFF", "Retail").with_sector("Consumer Services"),
    ]
}

/// Writes a catalog CSV with the reference dataset's column layout
pub fn create_catalog_file(dir: &Path, securities: &[TestSecurity]) -> Result<PathBuf> {
    let path = dir.join("full_financial_stocks_raw.csv");
    let mut writer = Writer::from_path(&path)?;
    writer.write_record([
        "symbol",
        "security_name",
        "listing_exchange",
        "sector",
        "industry",
        "city",
        "state",
        "country",
    ])?;
    for s in securities {
        writer.write_record([
            s.symbol.as_str(),
            s.name.as_str(),
            "Q",
            s.sector.as_str(),
            s.industry.as_str(),
            s.city.as_str(),
            s.state.as_str(),
            s.country.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(path)
}

/// Writes `<dir>/<symbol>.csv` with one row per `(date, close)`.
///
/// Open/High/Low are derived from the close so every row is a complete bar.
pub fn create_price_file(dir: &Path, symbol: &str, closes: &[(NaiveDate, f64)]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.csv", symbol));
    let mut writer = Writer::from_path(&path)?;
    writer.write_record(["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"])?;
    for (date, close) in closes {
        writer.write_record([
            date.format("%Y-%m-%d").to_string(),
            (close * 0.99).to_string(),
            (close * 1.01).to_string(),
            (close * 0.98).to_string(),
            close.to_string(),
            close.to_string(),
            "1000".to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(path)
}

/// Writes a raw price file, for malformed-input tests
pub fn create_raw_price_file(dir: &Path, symbol: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.csv", symbol));
    std::fs::write(&path, contents)?;
    Ok(path)
}

/// Consecutive calendar days starting at `start`, paired with `closes`
pub fn daily(start: NaiveDate, closes: &[f64]) -> Vec<(NaiveDate, f64)> {
    closes
        .iter()
        .enumerate()
        .map(|(i, c)| (start + Duration::days(i as i64), *c))
        .collect()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
}

/// A temp dir holding the tech catalog and price files for every symbol but DDD
pub struct Fixture {
    pub dir: TempDir,
    pub catalog_path: PathBuf,
    pub prices_dir: PathBuf,
}

pub fn create_fixture() -> Result<Fixture> {
    let dir = tempfile::tempdir()?;
    let catalog_path = create_catalog_file(dir.path(), &tech_catalog())?;
    let prices_dir = dir.path().join("stocks");

    create_price_file(&prices_dir, "AAA", &daily(date("2020-01-01"), &[10.0, 20.0, 40.0]))?;
    create_price_file(&prices_dir, "BBB", &daily(date("2019-12-30"), &[5.0, 5.0, 6.0, 7.0, 8.0]))?;
    create_price_file(&prices_dir, "CCC", &daily(date("2020-01-02"), &[100.0, 110.0]))?;
    create_price_file(&prices_dir, "EEE", &daily(date("2020-01-01"), &[1.0, 1.5, 2.0]))?;
    create_price_file(&prices_dir, "FFF", &daily(date("2020-01-01"), &[3.0, 3.0, 3.0]))?;

    Ok(Fixture {
        dir,
        catalog_path,
        prices_dir,
    })
}
