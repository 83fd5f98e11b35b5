// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the peer comparison pipeline.
///
/// Only the catalog and selection failures abort a run. Bad price rows,
/// missing price files and unusable anchor prices are absorbed where they
/// occur and never show up here.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The reference catalog could not be read or lacks a required column.
    #[error("catalog unavailable at {path}: {reason}", path = .path.display())]
    CatalogUnavailable { path: PathBuf, reason: String },

    /// The requested security is not present in the catalog.
    #[error("security not found in catalog: {0}")]
    SecurityNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl PeerError {
    pub(crate) fn catalog(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PeerError::CatalogUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures the user can fix by picking another security.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PeerError::SecurityNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PeerError>;
