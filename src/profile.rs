// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use serde::Serialize;

use crate::catalog::SecurityRecord;

pub const NOT_AVAILABLE: &str = "Not Available";

/// Descriptive summary of a security built from catalog metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: String,
    /// "sector, industry"
    pub classification: String,
    /// "city, state, country"
    pub headquarters: String,
}

impl CompanyProfile {
    pub fn from_record(record: &SecurityRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            name: record.display_name.clone(),
            classification: join_or_na(&[&record.sector, &record.industry]),
            headquarters: join_or_na(&[&record.city, &record.state, &record.country]),
        }
    }

    /// Label/value pairs in display order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Symbol", self.symbol.as_str()),
            ("Name", self.name.as_str()),
            ("Industry", self.classification.as_str()),
            ("Headquarter", self.headquarters.as_str()),
        ]
    }
}

fn join_or_na(parts: &[&Option<String>]) -> String {
    parts
        .iter()
        .map(|p| match p.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => NOT_AVAILABLE,
        })
        .collect::<Vec<_>>()
        .join(", ")
}
