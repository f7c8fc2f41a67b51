//! Policy constants and the runtime configuration shared by every component.

use std::path::PathBuf;
use std::time::Duration;

// ─── Policy constants ───────────────────────────────────────────────

/// Deepest directory level (root = 0) whose files are admitted.
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Safety-net bound on a single crawl.
pub const DEFAULT_CRAWL_TIMEOUT: Duration = Duration::from_secs(30);

/// Index files older than this are rebuilt.
pub const DEFAULT_MAX_INDEX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Working-directory subfolder holding index files. The crawler's noise
/// predicate excludes any folder named like this, so indexing the working
/// directory never picks up its own index.
pub const INDEX_SUBDIR: &str = "temp";

pub const DEFAULT_CACHE_CAPACITY: usize = 50;
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_MAX_DOCS_IN_PROMPT: usize = 1000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(1);
pub const DEFAULT_STATS_LOG_INTERVAL: u64 = 20;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Extensions admitted into the catalog (compared lower-cased).
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    // documents
    "txt", "pdf", "docx", "pptx", "hwp", "xlsx", "csv",
    // archives and installers
    "exe", "msi", "dmg", "app", "zip",
    // markup
    "html", "xml", "md", "rtf", "odt",
];

/// Directory names (lower-cased, exact match) that are never descended into.
pub const SYSTEM_DIR_NAMES: &[&str] = &[
    "system32",
    "windows",
    "program files",
    "program files (x86)",
];

/// Substrings (lower-cased) that mark a directory as noise.
pub const NOISE_DIR_FRAGMENTS: &[&str] = &["temp", "cache"];

// ─── Index format ───────────────────────────────────────────────────

/// On-disk representation of a persisted catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexFormat {
    /// Pretty-printed JSON array of `{fileName, path}` records.
    #[default]
    Json,
    /// LZ4-framed bincode record stream behind a magic header.
    Binary,
}

impl IndexFormat {
    /// File extension (with leading dot) used for index files of this format.
    pub fn extension(self) -> &'static str {
        match self {
            IndexFormat::Json => ".json",
            IndexFormat::Binary => ".catalog",
        }
    }
}

// ─── FinderConfig ───────────────────────────────────────────────────

/// Every tunable of the indexer, the store, the cache and the ranking call.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Root directory to crawl.
    pub root: PathBuf,
    pub max_depth: usize,
    /// Crawler worker threads.
    pub workers: usize,
    pub crawl_timeout: Duration,

    pub index_dir: PathBuf,
    pub index_format: IndexFormat,
    pub max_index_age: Duration,

    pub cache_capacity: usize,
    pub stats_log_interval: u64,

    pub top_k: usize,
    pub max_docs_in_prompt: usize,
    pub max_attempts: u32,
    pub backoff_base: Duration,

    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub request_timeout: Duration,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_depth: DEFAULT_MAX_DEPTH,
            workers: default_workers(),
            crawl_timeout: DEFAULT_CRAWL_TIMEOUT,
            index_dir: default_index_dir(),
            index_format: IndexFormat::default(),
            max_index_age: DEFAULT_MAX_INDEX_AGE,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            stats_log_interval: DEFAULT_STATS_LOG_INTERVAL,
            top_k: DEFAULT_TOP_K,
            max_docs_in_prompt: DEFAULT_MAX_DOCS_IN_PROMPT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.1,
            max_output_tokens: 2048,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl FinderConfig {
    /// Default configuration rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// Two workers per hardware thread.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        * 2
}

/// `<cwd>/temp`, or `<local data dir>/docfind` when the working directory
/// cannot be determined.
pub fn default_index_dir() -> PathBuf {
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(INDEX_SUBDIR),
        Err(_) => dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docfind"),
    }
}
