//! `DocFinder`: the collaborator-facing facade tying crawler, store, cache
//! and ranking together.
//!
//! Index operations report their outcome as a human-readable message rather
//! than an error: a failed load falls back to a rebuild, and a failed rebuild
//! is described, never raised.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};

use crate::cache::CacheStats;
use crate::catalog::{self, Catalog};
use crate::config::FinderConfig;
use crate::crawler::{self, CrawlOptions, CrawlReport, ProgressFn};
use crate::error::FinderError;
use crate::query::{self, QueryOrchestrator, QueryResult, SearchOutcome};
use crate::ranking::{GeminiClient, RankingService};
use crate::store::{self, IndexStore};

pub struct DocFinder {
    config: FinderConfig,
    catalog: Arc<Catalog>,
    store: IndexStore,
    orchestrator: QueryOrchestrator,
}

impl DocFinder {
    /// Finder backed by the Gemini provider.
    pub fn new(config: FinderConfig) -> Result<Self, FinderError> {
        let client = GeminiClient::from_config(&config).map_err(|e| FinderError::ServicePermanent {
            message: "cannot initialise HTTP client".to_string(),
            source: Some(Box::new(e)),
        })?;
        Ok(Self::with_service(config, Box::new(client)))
    }

    pub fn with_service(config: FinderConfig, service: Box<dyn RankingService>) -> Self {
        let store = IndexStore::from_config(&config);
        let orchestrator = QueryOrchestrator::new(service, &config);
        Self {
            config,
            catalog: Arc::new(Catalog::new()),
            store,
            orchestrator,
        }
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Index name derived from the configured root.
    pub fn index_name(&self) -> String {
        store::index_name_for(&self.config.root)
    }

    pub fn should_rebuild_index(&self, name: &str) -> bool {
        self.store.should_rebuild(name)
    }

    // ─── Index lifecycle ─────────────────────────────────────────

    /// Crawl the root into the catalog, then save it under `name`. Returns
    /// the save outcome as a message.
    pub fn build_index(&self, name: &str, progress: Option<&ProgressFn<'_>>) -> String {
        let report = self.crawl(progress);
        if report.timed_out {
            warn!(documents = report.admitted, "Crawl stopped at the deadline; saving what was found");
        }
        match self.store.save(name, &self.catalog) {
            Ok(saved) => saved.message(),
            Err(e) => {
                error!(index = name, error = %e, "Index save failed");
                format!("Index save failed: {}", e)
            }
        }
    }

    /// Load `name` into the catalog; on any load failure rebuild instead.
    pub fn load_index(&self, name: &str, progress: Option<&ProgressFn<'_>>) -> String {
        match self.store.load_into(name, &self.catalog) {
            Ok(count) => {
                if let Some(p) = progress {
                    p(count);
                }
                format!("Index loaded: {} ({} documents)", self.store.path_for(name).display(), count)
            }
            Err(e) => {
                warn!(index = name, error = %e, "Index load failed, rebuilding");
                self.build_index(name, progress)
            }
        }
    }

    /// Load the root's index when it is fresh, otherwise rebuild it.
    pub fn ensure_index(&self, progress: Option<&ProgressFn<'_>>) -> String {
        let name = self.index_name();
        if self.should_rebuild_index(&name) {
            info!(index = %name, "Building index");
            self.build_index(&name, progress)
        } else {
            self.load_index(&name, progress)
        }
    }

    fn crawl(&self, progress: Option<&ProgressFn<'_>>) -> CrawlReport {
        crawler::crawl(&self.catalog, &self.config.root, CrawlOptions::from(&self.config), progress)
    }

    // ─── Search ──────────────────────────────────────────────────

    pub fn search(&self, question: &str) -> Result<SearchOutcome, FinderError> {
        self.orchestrator.find_path(question, &self.catalog)
    }

    /// `search` wrapped in the `{success, taskTime} | {error}` envelope.
    pub fn find_path(&self, question: &str) -> QueryResult {
        let started = Instant::now();
        QueryResult::from_outcome(self.search(question), started)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.orchestrator.cache_stats()
    }

    pub fn reset_cache_stats(&self) {
        self.orchestrator.reset_cache_stats();
    }

    /// Absolute folder holding a search result entry.
    pub fn folder_for(&self, item: &str) -> Result<PathBuf, FinderError> {
        result_folder(&self.config.root, item)
    }
}

// ─── Folder reveal ──────────────────────────────────────────────────

/// Folder under `root` that holds the result entry `item`
/// (`"/a/b.pdf ::: 0.93"` → `<root>/a`). Fails when the folder is missing.
pub fn result_folder(root: &Path, item: &str) -> Result<PathBuf, FinderError> {
    let path = query::result_path(item);
    if path.is_empty() {
        return Err(FinderError::InvalidInput("result path is blank".to_string()));
    }
    let absolute = catalog::resolve(root, path);
    let folder = catalog::containing_folder(&absolute).ok_or_else(|| {
        FinderError::InvalidInput(format!("no folder for {}", absolute.display()))
    })?;
    if !folder.is_dir() {
        return Err(FinderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("folder does not exist: {}", folder.display()),
        )));
    }
    Ok(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexFormat;
    use crate::ranking::{Completion, ServiceFailure};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Echo;

    impl RankingService for Echo {
        fn complete(&self, _prompt: &str) -> Result<Completion, ServiceFailure> {
            Ok(Completion::stop("/sub/a.txt ::: 0.90"))
        }
    }

    fn visible_tempdir() -> tempfile::TempDir {
        tempfile::Builder::new().prefix("docfind").tempdir().unwrap()
    }

    fn finder_for(root: &Path, index_dir: &Path) -> DocFinder {
        let cfg = FinderConfig {
            index_dir: index_dir.to_path_buf(),
            workers: 2,
            ..FinderConfig::for_root(root)
        };
        DocFinder::with_service(cfg, Box::new(Echo))
    }

    #[test]
    fn test_build_empty_root_reports_failure_and_writes_nothing() {
        let root = visible_tempdir();
        let idx = visible_tempdir();
        let finder = finder_for(root.path(), idx.path());
        let name = finder.index_name();

        let message = finder.build_index(&name, None);
        assert!(message.starts_with("Index save failed"), "{message}");
        assert_eq!(finder.catalog().len(), 0);
        assert!(!finder.store().path_for(&name).exists());
    }

    #[test]
    fn test_build_then_load_roundtrip() {
        let root = visible_tempdir();
        let idx = visible_tempdir();
        fs::create_dir_all(root.path().join("sub")).unwrap();
        fs::write(root.path().join("sub/a.txt"), "x").unwrap();
        fs::write(root.path().join("b.pdf"), "x").unwrap();

        let finder = finder_for(root.path(), idx.path());
        let name = finder.index_name();
        let message = finder.build_index(&name, None);
        assert!(message.contains("2 documents"), "{message}");
        assert!(!finder.should_rebuild_index(&name));

        let other = finder_for(root.path(), idx.path());
        let message = other.load_index(&name, None);
        assert!(message.starts_with("Index loaded"), "{message}");
        let mut paths = other.catalog().paths(usize::MAX);
        paths.sort();
        assert_eq!(paths, vec!["/b.pdf", "/sub/a.txt"]);
    }

    #[test]
    fn test_load_corrupt_index_falls_back_to_rebuild() {
        let root = visible_tempdir();
        let idx = visible_tempdir();
        fs::write(root.path().join("notes.md"), "x").unwrap();

        let finder = finder_for(root.path(), idx.path());
        let name = finder.index_name();
        fs::write(finder.store().path_for(&name), b"{ not json").unwrap();

        let calls = AtomicUsize::new(0);
        let progress: &ProgressFn<'_> = &|_| {
            calls.fetch_add(1, Ordering::Relaxed);
        };
        let message = finder.load_index(&name, Some(progress));
        assert!(message.starts_with("Index saved"), "{message}");
        assert_eq!(finder.catalog().len(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_ensure_index_binary_format() {
        let root = visible_tempdir();
        let idx = visible_tempdir();
        fs::write(root.path().join("a.txt"), "x").unwrap();
        let cfg = FinderConfig {
            index_dir: idx.path().to_path_buf(),
            index_format: IndexFormat::Binary,
            ..FinderConfig::for_root(root.path())
        };
        let finder = DocFinder::with_service(cfg, Box::new(Echo));
        assert!(finder.ensure_index(None).starts_with("Index saved"));
        assert!(finder.ensure_index(None).starts_with("Index loaded"));
        assert!(finder.store().path_for(&finder.index_name()).ends_with(format!("{}.catalog", finder.index_name())));
    }

    #[test]
    fn test_find_path_envelope() {
        let root = visible_tempdir();
        let idx = visible_tempdir();
        let finder = finder_for(root.path(), idx.path());
        assert!(!finder.find_path("").is_success());
        for i in 0..12 {
            finder.catalog().push(crate::DocumentRef::new(format!("{i}.txt"), format!("/{i}.txt")));
        }
        match finder.find_path("which one") {
            QueryResult::Success { success, .. } => assert_eq!(success, vec!["/sub/a.txt ::: 0.90"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_folder_for_result_entry() {
        let root = visible_tempdir();
        let idx = visible_tempdir();
        fs::create_dir_all(root.path().join("sub")).unwrap();
        fs::write(root.path().join("sub/a.txt"), "x").unwrap();
        let finder = finder_for(root.path(), idx.path());

        assert_eq!(finder.folder_for("/sub/a.txt ::: 0.90").unwrap(), root.path().join("sub"));
        assert!(finder.folder_for("/missing/dir/x.txt").is_err());
        assert!(finder.folder_for("  ").is_err());
    }
}
