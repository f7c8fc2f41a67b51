//! # docfind — Document Catalog with LLM-Ranked Lookup
//!
//! Crawls a directory tree into a flat catalog of document references,
//! persists the catalog per root, and answers natural-language questions by
//! asking an external language model to rank the catalog's paths.
//!
//! ## Library usage
//!
//! The binary is a thin command-line front end. Everything it does goes
//! through [`DocFinder`], which is also the entry point for embedding the
//! indexer in another program.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod error;
pub mod finder;
pub mod query;
pub mod ranking;
pub mod store;

pub use cache::{CacheStats, LruCache, ResultCache};
pub use catalog::{Catalog, DocumentRef};
pub use config::{FinderConfig, IndexFormat};
pub use crawler::{crawl, CrawlReport, ProgressFn};
pub use error::{ErrorKind, FinderError};
pub use finder::DocFinder;
pub use query::{QueryOrchestrator, QueryResult, SearchOutcome};
pub use ranking::{Completion, FinishReason, RankingService, ServiceFailure};
pub use store::{index_name_for, IndexStore, SaveReport};

// ─── Path helpers ────────────────────────────────────────────────────

/// Strip the `\\?\` extended-length path prefix that Windows canonicalize adds.
#[must_use]
pub fn clean_path(p: &str) -> String {
    p.strip_prefix(r"\\?\").unwrap_or(p).to_string()
}

/// Format a byte count as megabytes with one decimal (`"1.5 MB"`).
#[must_use]
pub fn format_mb(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / 1_048_576.0)
}
