//! CLI layer: argument parsing, logging setup, command dispatch, and the
//! subcommand implementations.

pub mod args;
mod info;
mod shell;

pub use args::*;

use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docfind::crawler::ProgressFn;
use docfind::finder::result_folder;
use docfind::{format_mb, DocFinder, FinderError, QueryResult};

// ─── CLI ─────────────────────────────────────────────────────────────

/// Index a folder of documents and find them by asking in plain language
#[derive(Parser, Debug)]
#[command(name = "docfind", version, about, after_help = "\
Run 'docfind <COMMAND> --help' for detailed options and examples.\n\
Common options: -d <DIR> (indexed folder), --format json|binary, --api-key (or GEMINI_API_KEY)")]
pub(crate) struct Cli {
    /// Log level for stderr output (error, warn, info, debug, trace). RUST_LOG overrides it.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Crawl a folder and save its index
    Index(IndexArgs),

    /// Load a folder's index, rebuilding it if it cannot be read
    Load(LoadArgs),

    /// Show whether a folder's index is fresh or must be rebuilt
    Status(StatusArgs),

    /// Ask a question and print the ranked document paths
    Ask(AskArgs),

    /// Interactive session: load once, then ask repeatedly
    Shell(ShellArgs),

    /// Open the folder containing a search result
    Open(OpenArgs),

    /// List saved indexes
    Info(InfoArgs),
}

// ─── Main entry point ───────────────────────────────────────────────

pub fn run() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let result = match cli.command {
        Commands::Index(args) => cmd_index(args),
        Commands::Load(args) => cmd_load(args),
        Commands::Status(args) => cmd_status(args),
        Commands::Ask(args) => cmd_ask(args),
        Commands::Shell(args) => shell::cmd_shell(args),
        Commands::Open(args) => cmd_open(args),
        Commands::Info(args) => {
            info::cmd_info(args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}

/// Stderr subscriber. `RUST_LOG` wins over `--log-level` when set.
pub(crate) fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

pub(crate) fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "error" => "error",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        _ => "warn",
    }
}

/// Progress printer for interactive crawls: a counter on stderr every
/// 500 documents.
pub(crate) fn progress_printer() -> impl Fn(usize) + Send + Sync {
    let last = AtomicUsize::new(0);
    move |n| {
        if n % 500 == 0 && last.fetch_max(n, Ordering::Relaxed) < n {
            eprint!("\r  {} documents indexed...", n);
        }
    }
}

pub(crate) fn open_finder(args_index: &IndexOptions, ranking: Option<&RankingOptions>) -> Result<DocFinder, FinderError> {
    let mut cfg = args_index.to_config();
    if let Some(r) = ranking {
        r.apply(&mut cfg);
    }
    DocFinder::new(cfg)
}

// ─── Index commands ─────────────────────────────────────────────────

fn cmd_index(args: IndexArgs) -> Result<(), FinderError> {
    let finder = open_finder(&args.index, None)?;
    let name = finder.index_name();
    let start = Instant::now();
    let progress = progress_printer();
    let message = finder.build_index(&name, Some(&progress as &ProgressFn<'_>));
    eprintln!();
    println!("{}", message);
    eprintln!("Done in {:.2}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn cmd_load(args: LoadArgs) -> Result<(), FinderError> {
    let finder = open_finder(&args.index, None)?;
    let name = finder.index_name();
    let progress = progress_printer();
    let message = finder.load_index(&name, Some(&progress as &ProgressFn<'_>));
    println!("{}", message);
    Ok(())
}

fn cmd_status(args: StatusArgs) -> Result<(), FinderError> {
    let finder = open_finder(&args.index, None)?;
    let name = finder.index_name();
    let path = finder.store().path_for(&name);
    let rebuild = finder.should_rebuild_index(&name);
    println!("Index:  {}", name);
    println!("File:   {}", path.display());
    if let Ok(meta) = std::fs::metadata(&path) {
        println!("Size:   {}", format_mb(meta.len()));
    }
    println!("Status: {}", if rebuild { "rebuild required" } else { "fresh" });
    Ok(())
}

// ─── Query commands ─────────────────────────────────────────────────

fn cmd_ask(args: AskArgs) -> Result<(), FinderError> {
    let finder = open_finder(&args.index, Some(&args.ranking))?;
    let message = finder.ensure_index(None);
    info!(message = %message, "Index ready");
    if finder.catalog().is_empty() {
        eprintln!("{}", message);
    }

    if args.json {
        let result = finder.find_path(&args.question);
        println!("{}", serde_json::to_string_pretty(&result)?);
        if !result.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let outcome = finder.search(&args.question)?;
    print_results(&QueryResult::Success {
        success: outcome.results,
        task_time: outcome.elapsed.as_secs_f64(),
    });
    Ok(())
}

pub(crate) fn print_results(result: &QueryResult) {
    match result {
        QueryResult::Success { success, task_time } => {
            if success.is_empty() {
                println!("No related documents found.");
            }
            for (i, item) in success.iter().enumerate() {
                println!("{:>3}. {}", i + 1, item);
            }
            eprintln!("({} results, {:.2}s)", success.len(), task_time);
        }
        QueryResult::Error { error, .. } => eprintln!("Error: {}", error),
    }
}

// ─── Open ───────────────────────────────────────────────────────────

fn cmd_open(args: OpenArgs) -> Result<(), FinderError> {
    let folder = result_folder(&args.dir, &args.item)?;
    if args.print {
        println!("{}", folder.display());
        return Ok(());
    }
    reveal(&folder)
}

/// Open `folder` in the platform file browser.
pub(crate) fn reveal(folder: &std::path::Path) -> Result<(), FinderError> {
    let program = if cfg!(target_os = "windows") {
        "explorer"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    info!(folder = %folder.display(), program, "Opening folder");
    Command::new(program).arg(folder).spawn()?;
    Ok(())
}
