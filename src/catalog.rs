//! The in-memory document catalog shared by the crawler, the store and the
//! query orchestrator.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

// ─── DocumentRef ────────────────────────────────────────────────────

/// One indexed file.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRef {
    pub file_name: String,
    /// Path relative to the indexed root, with the leading separator kept
    /// (`/reports/q1.pdf`). Fixed at discovery time.
    pub relative_path: String,
    /// Lower-cased extension without the dot.
    pub extension: String,
    /// Reserved for similarity ranking; the LLM path leaves it at zero.
    pub score: f32,
}

impl DocumentRef {
    pub fn new(file_name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let extension = extension_of(&file_name);
        Self {
            file_name,
            relative_path: relative_path.into(),
            extension,
            score: 0.0,
        }
    }

    /// Build a reference for `path` found under `root` by stripping the root
    /// prefix. Returns `None` if `path` is not under `root` or has no name.
    pub fn from_discovered(root: &Path, path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let full = crate::clean_path(&path.to_string_lossy());
        let root_str = crate::clean_path(&root.to_string_lossy());
        let relative = full.strip_prefix(root_str.as_str())?;
        Some(Self::new(file_name, relative))
    }
}

/// Lower-cased extension of a file name, empty if there is none.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

// ─── Persisted record ───────────────────────────────────────────────

/// Persisted shape of a [`DocumentRef`]: name and path only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    #[serde(rename = "fileName", default)]
    pub file_name: String,
    #[serde(default)]
    pub path: String,
}

impl DocumentRecord {
    /// Lenient read of one JSON index element. Missing or null fields become
    /// empty strings and other scalars are stringified. Returns `None` for a
    /// non-object element.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |key: &str| match obj.get(key) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Some(Self {
            file_name: field("fileName"),
            path: field("path"),
        })
    }
}

impl From<&DocumentRef> for DocumentRecord {
    fn from(doc: &DocumentRef) -> Self {
        Self {
            file_name: doc.file_name.clone(),
            path: doc.relative_path.clone(),
        }
    }
}

impl From<DocumentRecord> for DocumentRef {
    fn from(rec: DocumentRecord) -> Self {
        DocumentRef::new(rec.file_name, rec.path)
    }
}

// ─── Catalog ────────────────────────────────────────────────────────

/// Insertion-ordered, thread-safe collection of [`DocumentRef`].
///
/// Crawler workers append concurrently; each append takes the write lock for
/// exactly one insert. Readers may observe a catalog that is mid-rebuild.
#[derive(Debug, Default)]
pub struct Catalog {
    docs: RwLock<Vec<DocumentRef>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one document and return the catalog size after the insert.
    pub fn push(&self, doc: DocumentRef) -> usize {
        let mut docs = self.docs.write().unwrap_or_else(|e| e.into_inner());
        docs.push(doc);
        docs.len()
    }

    pub fn clear(&self) {
        self.docs.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Replace the whole contents in one step.
    pub fn replace(&self, docs: Vec<DocumentRef>) {
        *self.docs.write().unwrap_or_else(|e| e.into_inner()) = docs;
    }

    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<DocumentRef> {
        self.docs.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Relative paths of the first `limit` documents.
    pub fn paths(&self, limit: usize) -> Vec<String> {
        self.docs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .take(limit)
            .map(|d| d.relative_path.clone())
            .collect()
    }

    /// Persisted form of every document.
    pub fn records(&self) -> Vec<DocumentRecord> {
        self.docs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(DocumentRecord::from)
            .collect()
    }
}

// ─── Folder resolution ──────────────────────────────────────────────

/// Absolute path of a catalog entry (or result fragment) under `root`.
pub fn resolve(root: &Path, relative: &str) -> PathBuf {
    let trimmed = relative.trim().trim_start_matches(['/', '\\']);
    root.join(trimmed)
}

/// Folder to reveal for `path`: the parent of a file, the path itself for a
/// directory, and the text before the last separator when nothing exists.
pub fn containing_folder(path: &Path) -> Option<PathBuf> {
    if path.is_dir() {
        return Some(path.to_path_buf());
    }
    if path.is_file() {
        return path.parent().map(Path::to_path_buf);
    }
    let text = path.to_string_lossy();
    let cut = text.rfind(['/', '\\'])?;
    if cut == 0 {
        return None;
    }
    Some(PathBuf::from(&text[..cut]))
}
