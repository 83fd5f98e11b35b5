// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! CSV export of produced tables

use chrono::Local;
use csv::Writer;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::peers::PeerSet;
use crate::prices::PricePoint;
use crate::rebase::RebasedPoint;

pub const REBASED_HEADERS: [&str; 8] = [
    "symbol",
    "display_name",
    "date",
    "open",
    "high",
    "low",
    "close",
    "rebased_close",
];

pub const PEER_HEADERS: [&str; 7] = [
    "symbol",
    "security_name",
    "industry",
    "sector",
    "city",
    "state",
    "country",
];

fn price(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write rebased rows with the columns in [`REBASED_HEADERS`].
pub fn write_rebased_csv<W: Write>(rows: &[RebasedPoint], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(REBASED_HEADERS)?;
    for row in rows {
        writer.write_record([
            row.symbol.clone(),
            row.display_name.clone(),
            row.date.format("%Y-%m-%d").to_string(),
            price(row.open),
            price(row.high),
            price(row.low),
            row.close.to_string(),
            row.rebased_close.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the assembled price table. Same layout as the rebased export
/// without the `rebased_close` column.
pub fn write_price_table_csv<W: Write>(rows: &[PricePoint], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(&REBASED_HEADERS[..7])?;
    for row in rows {
        writer.write_record([
            row.symbol.clone(),
            row.display_name.clone(),
            row.date.format("%Y-%m-%d").to_string(),
            price(row.open),
            price(row.high),
            price(row.low),
            price(row.close),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the peer set's catalog metadata, selected security first.
pub fn write_peer_table_csv<W: Write>(peers: &PeerSet, out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(PEER_HEADERS)?;
    for member in peers.members() {
        writer.write_record([
            member.symbol.as_str(),
            member.display_name.as_str(),
            member.industry.as_deref().unwrap_or_default(),
            member.sector.as_deref().unwrap_or_default(),
            member.city.as_deref().unwrap_or_default(),
            member.state.as_deref().unwrap_or_default(),
            member.country.as_deref().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Rebased rows as an in-memory CSV document, ready for a download button.
pub fn rebased_to_csv_string(rows: &[RebasedPoint]) -> Result<String> {
    let mut buffer = Vec::new();
    write_rebased_csv(rows, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// `<dir>/<stem>_<YYYYmmdd_HHMMSS>.csv`
pub fn timestamped_path(dir: impl AsRef<Path>, stem: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.as_ref().join(format!("{}_{}.csv", stem, timestamp))
}
