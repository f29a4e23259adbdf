//! Export orchestration
//!
//! This module provides the core export logic for Podex, including:
//! - Rate-limited pagination of platform collections
//! - The hierarchical walk over organizations, spaces and applications
//! - Concurrent file downloads
//! - The summary tree and export reporting

pub mod coordinator;
pub mod download;
pub mod fanout;
pub mod naming;
pub mod pagination;
pub mod summary;
pub mod tree;

pub use coordinator::ExportCoordinator;
pub use download::{FileDownloader, WarningPolicy};
pub use fanout::{for_each_bounded, ErrorScope};
pub use pagination::{collect_fan_out, collect_short_pages, Page};
pub use summary::{CollectionTally, Counter, ExportReport, SummaryNode, SUMMARY_FILE};
pub use tree::{ExportSettings, TreeExporter, WalkOutcome};
