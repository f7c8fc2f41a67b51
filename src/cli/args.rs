//! CLI argument structs for all subcommands.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, ValueEnum};

use docfind::config::{self, FinderConfig, IndexFormat};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    /// `<name>.json`, array of {fileName, path}
    Json,
    /// `<name>.catalog`, LZ4-compressed bincode
    Binary,
}

impl From<FormatArg> for IndexFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Json => IndexFormat::Json,
            FormatArg::Binary => IndexFormat::Binary,
        }
    }
}

/// Options shared by every command that touches an index.
#[derive(Args, Debug, Clone)]
pub struct IndexOptions {
    /// Directory to index
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Deepest folder level whose files are indexed (root = 0)
    #[arg(long, default_value_t = config::DEFAULT_MAX_DEPTH)]
    pub depth: usize,

    /// Number of crawler threads (0 = 2 per CPU)
    #[arg(short, long, default_value = "0")]
    pub threads: usize,

    /// On-disk index format
    #[arg(long, value_enum, default_value = "json")]
    pub format: FormatArg,

    /// Max index age in hours before it is rebuilt
    #[arg(long, default_value = "24")]
    pub max_age_hours: u64,

    /// Folder holding index files (default: ./temp)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Crawl deadline in seconds
    #[arg(long, default_value = "30")]
    pub timeout_secs: u64,
}

/// Options for the ranking service.
#[derive(Args, Debug, Clone)]
pub struct RankingOptions {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, default_value = "")]
    pub api_key: String,

    /// Model name
    #[arg(long, default_value = config::DEFAULT_MODEL)]
    pub model: String,

    /// API base URL
    #[arg(long, default_value = config::DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Number of ranked paths to ask for
    #[arg(long, default_value_t = config::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Attempts per question on rate limiting or unavailability
    #[arg(long, default_value_t = config::DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl IndexOptions {
    pub fn to_config(&self) -> FinderConfig {
        let mut cfg = FinderConfig::for_root(&self.dir);
        cfg.max_depth = self.depth;
        if self.threads > 0 {
            cfg.workers = self.threads;
        }
        cfg.index_format = self.format.into();
        cfg.max_index_age = Duration::from_secs(self.max_age_hours.saturating_mul(3600));
        if let Some(dir) = &self.index_dir {
            cfg.index_dir = dir.clone();
        }
        cfg.crawl_timeout = Duration::from_secs(self.timeout_secs);
        cfg
    }
}

impl RankingOptions {
    pub fn apply(&self, cfg: &mut FinderConfig) {
        cfg.api_key = self.api_key.trim().to_string();
        cfg.model = self.model.clone();
        cfg.endpoint = self.endpoint.clone();
        cfg.top_k = self.top_k;
        cfg.max_attempts = self.max_attempts;
    }
}

#[derive(Parser, Debug)]
#[command(after_long_help = r#"EXAMPLES:
  docfind index -d ~/Documents
  docfind index -d D:\Work --format binary --depth 6

NOTES:
  - Always crawls, even when a fresh index exists (use 'load' to reuse one)
  - The index is written to ./temp/<last folder name>.json by default
"#)]
pub struct IndexArgs {
    #[command(flatten)]
    pub index: IndexOptions,
}

#[derive(Parser, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub index: IndexOptions,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub index: IndexOptions,
}

#[derive(Parser, Debug)]
#[command(after_long_help = r#"EXAMPLES:
  docfind ask "where is the Q3 budget spreadsheet" -d ~/Documents
  GEMINI_API_KEY=... docfind ask "installer for the printer driver" --json

NOTES:
  - Loads the index for --dir, building it first when missing or stale
  - Results are printed one per line as 'path ::: similarity'
"#)]
pub struct AskArgs {
    /// Natural-language question
    pub question: String,

    #[command(flatten)]
    pub index: IndexOptions,

    #[command(flatten)]
    pub ranking: RankingOptions,

    /// Print the {success, taskTime} | {error} JSON envelope
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct ShellArgs {
    #[command(flatten)]
    pub index: IndexOptions,

    #[command(flatten)]
    pub ranking: RankingOptions,
}

#[derive(Parser, Debug)]
pub struct OpenArgs {
    /// A result entry (`/a/b.pdf ::: 0.93`) or a path relative to --dir
    pub item: String,

    /// Indexed root the entry is relative to
    #[arg(short, long, default_value = ".")]
    pub dir: PathBuf,

    /// Print the folder instead of opening it
    #[arg(long)]
    pub print: bool,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Folder holding index files (default: ./temp)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,

    /// Emit JSON
    #[arg(long)]
    pub json: bool,
}
