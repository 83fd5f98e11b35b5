// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod peers;
pub mod pipeline;
pub mod prices;
pub mod profile;
pub mod rebase;

pub use catalog::{Catalog, SecurityRecord, load_catalog};
pub use error::{PeerError, Result};
pub use peers::{ClassificationField, PeerSet, select_peers};
pub use pipeline::{PeerComparison, PeerPipeline, PipelineOptions};
pub use prices::{CsvDirectory, MemoryPriceSource, PricePoint, PriceSource, assemble_series};
pub use rebase::{DateWindow, RebasedPoint, normalize};
