//! Parallel directory crawler that fills the [`Catalog`].
//!
//! Traversal runs on `ignore`'s work-stealing parallel walker: every
//! directory is a unit of work, subdirectories are pushed back onto the
//! shared queue, and `run` returns only after every queued directory has been
//! visited. Depth, hidden-folder and noise-folder rules are applied in the
//! entry filter so excluded subtrees are never read.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use ignore::{WalkBuilder, WalkState};
use tracing::{debug, info, warn};

use crate::catalog::{extension_of, Catalog, DocumentRef};
use crate::config::{FinderConfig, ALLOWED_EXTENSIONS, NOISE_DIR_FRAGMENTS, SYSTEM_DIR_NAMES};

/// Progress notification: receives the catalog size after each admitted file.
///
/// Called from a dedicated notifier thread, never from a walker thread, so a
/// slow callback delays only its own updates.
pub type ProgressFn<'a> = dyn Fn(usize) + Send + Sync + 'a;

/// Crawl tunables, normally taken from [`FinderConfig`].
#[derive(Debug, Clone, Copy)]
pub struct CrawlOptions {
    pub max_depth: usize,
    pub workers: usize,
    pub timeout: Duration,
}

impl From<&FinderConfig> for CrawlOptions {
    fn from(cfg: &FinderConfig) -> Self {
        Self {
            max_depth: cfg.max_depth,
            workers: cfg.workers,
            timeout: cfg.crawl_timeout,
        }
    }
}

/// Outcome of one crawl. There is no partial/full distinction: the catalog
/// holds whatever was visited.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub admitted: usize,
    /// Entries that could not be read and were skipped.
    pub errors: usize,
    /// The deadline fired before the walk drained.
    pub timed_out: bool,
    pub elapsed: Duration,
}

// ─── Predicates ─────────────────────────────────────────────────────

/// True if `name` has an extension in the allow-list (case-insensitive).
pub fn is_allowed(name: &str) -> bool {
    let ext = extension_of(name);
    !ext.is_empty() && ALLOWED_EXTENSIONS.contains(&ext.as_str())
}

/// System and noise folders: dot-prefixed, OS system directories, and names
/// containing `temp` or `cache`. Pure string rules, case-insensitive.
pub fn is_system_directory(name: &str) -> bool {
    let name = name.to_lowercase();
    name.starts_with('.')
        || SYSTEM_DIR_NAMES.contains(&name.as_str())
        || NOISE_DIR_FRAGMENTS.iter().any(|frag| name.contains(frag))
}

/// A folder that cannot be crawled: missing, not a directory, unreadable or
/// hidden.
pub fn is_folder_invalid(path: &Path) -> bool {
    if !path.is_dir() || is_hidden(path) {
        return true;
    }
    std::fs::read_dir(path).is_err()
}

#[cfg(windows)]
fn is_hidden(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    std::fs::metadata(path)
        .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
        .unwrap_or(false)
}

#[cfg(not(windows))]
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

// ─── Crawl ──────────────────────────────────────────────────────────

/// Clear `catalog` and refill it from `root`.
///
/// Files directly in `root` are at depth 0; a directory at depth `d` is read
/// only while `d <= max_depth`. Unreadable entries are logged and skipped.
///
/// The deadline is `opts.timeout` after the call starts, not after the walk
/// is set up. Workers check it each time the walker hands them an entry, so
/// a directory read that blocks does not trip it until the read returns.
/// When it fires, every worker quits and the catalog keeps what was admitted.
///
/// Sizes go to `progress` through a channel drained by a scoped notifier
/// thread. The call returns after that thread has delivered every update.
pub fn crawl(
    catalog: &Catalog,
    root: &Path,
    opts: CrawlOptions,
    progress: Option<&ProgressFn<'_>>,
) -> CrawlReport {
    let start = Instant::now();
    catalog.clear();

    if is_folder_invalid(root) {
        warn!(root = %root.display(), "Root folder is missing, unreadable or hidden; nothing to crawl");
        return CrawlReport {
            elapsed: start.elapsed(),
            ..CrawlReport::default()
        };
    }

    let workers = opts.workers.max(1);
    info!(root = %root.display(), max_depth = opts.max_depth, workers, "Crawling");

    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false);
    builder.follow_links(false);
    // Walker depth counts the entries inside a folder one deeper than the folder.
    builder.max_depth(Some(opts.max_depth + 1));
    builder.threads(workers);
    builder.filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_some_and(|ft| ft.is_dir()) {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !is_system_directory(&name) && !is_hidden(entry.path())
    });

    let deadline = start + opts.timeout;
    let admitted = AtomicUsize::new(0);
    let errors = AtomicUsize::new(0);
    let timed_out = AtomicBool::new(false);

    thread::scope(|s| {
        let sender = match progress {
            Some(notify) => {
                let (tx, rx) = mpsc::channel::<usize>();
                s.spawn(move || {
                    for size in rx {
                        notify(size);
                    }
                });
                Some(tx)
            }
            None => None,
        };

        builder.build_parallel().run(|| {
            let admitted = &admitted;
            let errors = &errors;
            let timed_out = &timed_out;
            let sender = sender.clone();
            Box::new(move |result| {
                if Instant::now() >= deadline {
                    timed_out.store(true, Ordering::Relaxed);
                    return WalkState::Quit;
                }
                let entry = match result {
                    Ok(entry) => entry,
                    Err(e) => {
                        debug!(error = %e, "Skipping unreadable entry");
                        errors.fetch_add(1, Ordering::Relaxed);
                        return WalkState::Continue;
                    }
                };
                if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                    return WalkState::Continue;
                }
                if !is_allowed(&entry.file_name().to_string_lossy()) {
                    return WalkState::Continue;
                }
                match DocumentRef::from_discovered(root, entry.path()) {
                    Some(doc) => {
                        let size = catalog.push(doc);
                        admitted.fetch_add(1, Ordering::Relaxed);
                        if let Some(tx) = &sender {
                            // The notifier only goes away if the callback panicked.
                            let _ = tx.send(size);
                        }
                    }
                    None => {
                        debug!(path = %entry.path().display(), "Entry outside crawl root, skipped");
                        errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
                WalkState::Continue
            })
        });

        // Close the channel so the notifier drains and exits.
        drop(sender);
    });

    let report = CrawlReport {
        admitted: admitted.into_inner(),
        errors: errors.into_inner(),
        timed_out: timed_out.into_inner(),
        elapsed: start.elapsed(),
    };

    if report.timed_out {
        warn!(
            timeout_secs = opts.timeout.as_secs(),
            admitted = report.admitted,
            "Crawl did not finish in time; catalog holds what completed"
        );
    }
    info!(
        documents = report.admitted,
        skipped = report.errors,
        elapsed_ms = format_args!("{:.1}", report.elapsed.as_secs_f64() * 1000.0),
        "Crawl finished"
    );

    report
}

#[cfg(test)]
#[path = "crawler_tests.rs"]
mod tests;
