// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

//! Peer selection
//!
//! A peer set is the selected security followed by other catalog entries that
//! share its classification, in catalog order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

use crate::catalog::{Catalog, SecurityRecord};
use crate::error::{PeerError, Result};

/// Default size of a peer set, selected security included.
pub const DEFAULT_MAX_PEERS: usize = 5;

/// Catalog column used to group comparable companies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationField {
    #[default]
    Industry,
    Sector,
}

impl ClassificationField {
    pub fn name(&self) -> &str {
        match self {
            ClassificationField::Industry => "industry",
            ClassificationField::Sector => "sector",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            ClassificationField::Industry => ClassificationField::Sector,
            ClassificationField::Sector => ClassificationField::Industry,
        }
    }

    /// The record's value for this field, ignoring blanks.
    pub fn value_of<'a>(&self, record: &'a SecurityRecord) -> Option<&'a str> {
        let value = match self {
            ClassificationField::Industry => record.industry.as_deref(),
            ClassificationField::Sector => record.sector.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

impl fmt::Display for ClassificationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassificationField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "industry" => Ok(ClassificationField::Industry),
            "sector" => Ok(ClassificationField::Sector),
            _ => Err(format!(
                "Invalid classification '{}'. Use: industry or sector",
                s
            )),
        }
    }
}

/// The selected security plus its comparable companies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerSet {
    members: Vec<SecurityRecord>,
    /// Field actually used for matching, after any fallback.
    pub classification: ClassificationField,
    /// Shared classification value, `None` when the selection has neither.
    pub classification_value: Option<String>,
}

impl PeerSet {
    /// The selected security. Always the first member.
    pub fn selected(&self) -> &SecurityRecord {
        &self.members[0]
    }

    pub fn members(&self) -> &[SecurityRecord] {
        &self.members
    }

    /// Members other than the selected security.
    pub fn others(&self) -> &[SecurityRecord] {
        &self.members[1..]
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.symbol.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Select up to `max_peers` securities comparable to `selected_symbol`.
///
/// The selected record comes first. The remaining slots are filled with other
/// records sharing its `classification` value, in catalog order, each symbol
/// at most once. When the selected record has no value for `classification`
/// the other field is tried before giving up on peers. A `max_peers` of zero
/// is treated as one.
pub fn select_peers(
    catalog: &Catalog,
    selected_symbol: &str,
    classification: ClassificationField,
    max_peers: usize,
) -> Result<PeerSet> {
    let selected = catalog
        .get(selected_symbol)
        .ok_or_else(|| PeerError::SecurityNotFound(selected_symbol.to_string()))?;
    let max_peers = max_peers.max(1);

    let (field, value) = match classification.value_of(selected) {
        Some(v) => (classification, Some(v)),
        None => {
            let fallback = classification.other();
            let value = fallback.value_of(selected);
            warn!(
                "{} has no {}, matching peers on {} instead",
                selected.symbol, classification, fallback
            );
            (fallback, value)
        }
    };

    let mut seen = HashSet::new();
    seen.insert(selected.symbol.as_str());
    let mut members = vec![selected.clone()];

    if let Some(value) = value {
        let others = catalog
            .records()
            .iter()
            .filter(|r| field.value_of(r) == Some(value))
            .filter(|r| seen.insert(r.symbol.as_str()))
            .take(max_peers - 1);
        members.extend(others.cloned());
    }

    info!(
        "Selected {} peers for {} by {} {:?}",
        members.len() - 1,
        selected.symbol,
        field,
        value.unwrap_or("<none>")
    );

    Ok(PeerSet {
        members,
        classification: field,
        classification_value: value.map(str::to_string),
    })
}
