//! Query orchestration: cache lookup, prompt construction, the retrying
//! ranking call, and parsing of the model's answer into a result list.
//!
//! One call to [`QueryOrchestrator::find_path`] walks
//! validate → cache lookup → (hit: return) | build prompt → call with retry →
//! validate answer → parse → cache store → return.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ResultCache};
use crate::catalog::Catalog;
use crate::config::FinderConfig;
use crate::error::FinderError;
use crate::ranking::{Completion, FinishReason, RankingService};

/// Phrases that mean the model found nothing. Matched case-insensitively
/// anywhere in the answer.
pub const NOT_FOUND_MARKERS: &[&str] = &[
    "not found",
    "no results",
    "no relevant",
    "unable to",
    "cannot find",
    "could not find",
    "sorry",
    "없습니다",
    "실패",
    "죄송",
    "찾을 수 없",
    "않았습니다",
];

/// Separator between a path and its similarity in ranked answers.
pub const SCORE_SEPARATOR: &str = ":::";

// ─── Results ────────────────────────────────────────────────────────

/// A successful search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Ranked entries, most relevant first. Empty means "no matches".
    pub results: Vec<String>,
    pub elapsed: Duration,
    pub from_cache: bool,
}

/// Collaborator-facing envelope: `{success, taskTime}` or `{error, taskTime}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Success {
        success: Vec<String>,
        /// Seconds.
        #[serde(rename = "taskTime")]
        task_time: f64,
    },
    Error {
        error: String,
        /// Seconds spent before the failure.
        #[serde(rename = "taskTime", skip_serializing_if = "Option::is_none")]
        task_time: Option<f64>,
    },
}

impl QueryResult {
    /// Wrap a search that began at `started`. Successes report the search's
    /// own timing; failures report the time elapsed since `started`.
    pub fn from_outcome(outcome: Result<SearchOutcome, FinderError>, started: Instant) -> Self {
        match outcome {
            Ok(o) => QueryResult::Success {
                success: o.results,
                task_time: o.elapsed.as_secs_f64(),
            },
            Err(e) => QueryResult::Error {
                error: e.user_message(),
                task_time: Some(started.elapsed().as_secs_f64()),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success { .. })
    }
}

/// Path part of a result entry (`"/a/b.pdf ::: 0.93"` → `"/a/b.pdf"`).
pub fn result_path(item: &str) -> &str {
    match item.find(SCORE_SEPARATOR) {
        Some(i) => item[..i].trim(),
        None => item.trim(),
    }
}

// ─── Prompt and answer ──────────────────────────────────────────────

/// Ranking prompt for `question` over `paths`. `total` is the catalog size;
/// when it exceeds `paths.len()` the prompt says so.
pub fn build_prompt(question: &str, paths: &[String], total: usize, top_k: usize) -> String {
    let mut prompt = String::with_capacity(256 + paths.iter().map(|p| p.len() + 1).sum::<usize>());
    let _ = writeln!(prompt, "Question: {}", question.trim());
    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "From the document paths below, output the {top_k} paths most relevant to the question, exactly as written."
    );
    let _ = writeln!(
        prompt,
        "Format: path {SCORE_SEPARATOR} similarity, path {SCORE_SEPARATOR} similarity, ..."
    );
    prompt.push_str("(plain text only, similarity with two decimal places, no commentary)\n\n");
    if total > paths.len() {
        let _ = writeln!(
            prompt,
            "Note: only the first {} of {} documents are listed.\n",
            paths.len(),
            total
        );
    }
    prompt.push_str("Documents:\n");
    for (i, path) in paths.iter().enumerate() {
        if i > 0 {
            prompt.push('\n');
        }
        prompt.push_str(path);
    }
    prompt
}

/// True when the answer says nothing matched.
pub fn is_not_found(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    NOT_FOUND_MARKERS.iter().any(|m| lower.contains(m))
}

/// Split an answer on commas and newlines, trimming and dropping empties.
/// A not-found answer yields an empty list.
pub fn parse_answer(answer: &str) -> Vec<String> {
    if is_not_found(answer) {
        return Vec::new();
    }
    answer
        .split([',', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reject an answer that splits into entries none of which names a path.
fn ensure_paths(answer: &str, results: &[String]) -> Result<(), FinderError> {
    if results.is_empty() || results.iter().any(|r| result_path(r).contains(['/', '\\'])) {
        return Ok(());
    }
    let excerpt: String = answer.trim().chars().take(200).collect();
    Err(FinderError::Parsing {
        message: format!("no document path in answer \"{excerpt}\""),
    })
}

/// Accept only a clean finish with non-blank text.
fn validate_completion(completion: Completion) -> Result<String, FinderError> {
    match &completion.finish_reason {
        None | Some(FinishReason::Stop) => {}
        Some(reason) => {
            return Err(FinderError::permanent(format!(
                "generation did not finish cleanly: {}",
                reason.describe()
            )));
        }
    }
    match completion.text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(FinderError::permanent("model returned an empty answer")),
    }
}

// ─── QueryOrchestrator ──────────────────────────────────────────────

type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

pub struct QueryOrchestrator {
    service: Box<dyn RankingService>,
    cache: ResultCache,
    top_k: usize,
    max_docs: usize,
    max_attempts: u32,
    backoff_base: Duration,
    stats_interval: u64,
    searches: AtomicU64,
    sleep: Sleeper,
}

impl QueryOrchestrator {
    pub fn new(service: Box<dyn RankingService>, cfg: &FinderConfig) -> Self {
        Self {
            service,
            cache: ResultCache::new(cfg.cache_capacity),
            top_k: cfg.top_k,
            max_docs: cfg.max_docs_in_prompt,
            max_attempts: cfg.max_attempts.max(1),
            backoff_base: cfg.backoff_base,
            stats_interval: cfg.stats_log_interval,
            searches: AtomicU64::new(0),
            sleep: Box::new(std::thread::sleep),
        }
    }

    /// Replace the backoff sleep (tests record waits instead of sleeping).
    pub fn with_sleeper(mut self, sleep: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn reset_cache_stats(&self) {
        self.cache.reset_stats();
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Answer `question` from `catalog`. Elapsed time covers everything from
    /// the cache lookup to the parsed result.
    pub fn find_path(&self, question: &str, catalog: &Catalog) -> Result<SearchOutcome, FinderError> {
        if question.trim().is_empty() {
            return Err(FinderError::InvalidInput("Please enter a question.".to_string()));
        }

        let start = Instant::now();
        if let Some(results) = self.cache.get(question) {
            debug!(question = %question.trim(), results = results.len(), "Cache hit");
            self.record_search();
            return Ok(SearchOutcome {
                results,
                elapsed: start.elapsed(),
                from_cache: true,
            });
        }

        let total = catalog.len();
        if total == 0 {
            return Err(FinderError::permanent("no documents to search"));
        }
        let paths = catalog.paths(self.max_docs);
        if total > paths.len() {
            warn!(
                documents = total,
                limit = paths.len(),
                "Catalog exceeds prompt limit, sending a prefix"
            );
        }

        if paths.len() < self.top_k {
            debug!(documents = paths.len(), top_k = self.top_k, "Catalog smaller than top-k, returning all");
            self.record_search();
            return Ok(SearchOutcome {
                results: paths,
                elapsed: start.elapsed(),
                from_cache: false,
            });
        }

        let prompt = build_prompt(question, &paths, total, self.top_k);
        debug!(prompt_chars = prompt.len(), documents = paths.len(), "Prompt built");

        let completion = self.call_with_retry(&prompt)?;
        let answer = validate_completion(completion)?;
        let results = parse_answer(&answer);
        ensure_paths(&answer, &results)?;
        if results.is_empty() {
            info!(question = %question.trim(), "Model reported no relevant documents");
        } else {
            self.cache.put(question, results.clone());
        }

        let elapsed = start.elapsed();
        info!(
            results = results.len(),
            elapsed_ms = format_args!("{:.1}", elapsed.as_secs_f64() * 1000.0),
            "Search complete"
        );
        self.record_search();
        Ok(SearchOutcome {
            results,
            elapsed,
            from_cache: false,
        })
    }

    /// Up to `max_attempts` calls. Only transient failures are retried,
    /// waiting `backoff_base * 2^i` after attempt `i`.
    fn call_with_retry(&self, prompt: &str) -> Result<Completion, FinderError> {
        let mut attempt = 0;
        loop {
            match self.service.complete(prompt) {
                Ok(completion) => return Ok(completion),
                Err(failure) if failure.is_transient() => {
                    attempt += 1;
                    warn!(attempt, max_attempts = self.max_attempts, error = %failure, "Ranking call failed");
                    if attempt >= self.max_attempts {
                        return Err(FinderError::ServiceTransient {
                            attempts: attempt,
                            message: failure.to_string(),
                        });
                    }
                    let wait = self.backoff_base.saturating_mul(1 << (attempt - 1).min(16));
                    info!(wait_ms = wait.as_millis() as u64, "Retrying after backoff");
                    (self.sleep)(wait);
                }
                Err(failure) => {
                    warn!(error = %failure, "Ranking call failed permanently");
                    return Err(failure.into());
                }
            }
        }
    }

    fn record_search(&self) {
        let n = self.searches.fetch_add(1, Ordering::Relaxed) + 1;
        if self.stats_interval > 0 && n % self.stats_interval == 0 {
            let stats = self.cache.stats();
            info!(
                searches = n,
                hits = stats.hits,
                misses = stats.misses,
                hit_rate = format_args!("{:.2}", stats.hit_rate * 100.0),
                size = stats.size,
                "Cache statistics"
            );
        }
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
