//! Index storage: save/load the catalog per logical index name, and decide
//! when a stored index must be rebuilt.
//!
//! Two on-disk formats are supported. JSON files hold a pretty-printed array
//! of `{fileName, path}` records; binary files hold the same records as an
//! LZ4-framed bincode stream behind a 4-byte magic header. Loading sniffs the
//! header, so either format reads back regardless of the configured one.

use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, DocumentRecord, DocumentRef};
use crate::config::{FinderConfig, IndexFormat};
use crate::error::FinderError;
use crate::format_mb;

// ─── LZ4 compression helpers ────────────────────────────────────────

/// Magic bytes identifying binary catalog files.
pub const LZ4_MAGIC: &[u8; 4] = b"DCAT";

/// Save a serializable value with LZ4 frame compression: magic bytes, then
/// LZ4-compressed bincode data.
pub fn save_compressed<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), FinderError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(LZ4_MAGIC)?;
    let mut encoder = lz4_flex::frame::FrameEncoder::new(writer);
    bincode::serialize_into(&mut encoder, data)?;
    let mut writer = encoder.finish().map_err(std::io::Error::other)?;
    writer.flush()?;
    Ok(())
}

/// Load a value written by [`save_compressed`].
pub fn load_compressed<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FinderError> {
    let path_str = path.display().to_string();
    let file = fs::File::open(path).map_err(|e| FinderError::IndexLoad {
        path: path_str.clone(),
        message: format!("cannot open file: {}", e),
    })?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|e| FinderError::IndexLoad {
        path: path_str.clone(),
        message: format!("read error (magic bytes): {}", e),
    })?;
    if &magic != LZ4_MAGIC {
        return Err(FinderError::IndexLoad {
            path: path_str,
            message: "not a binary catalog (bad magic bytes)".to_string(),
        });
    }

    let decoder = lz4_flex::frame::FrameDecoder::new(reader);
    bincode::deserialize_from(decoder).map_err(|e| FinderError::IndexLoad {
        path: path_str,
        message: format!("LZ4 deserialization failed: {}", e),
    })
}

fn has_binary_magic(path: &Path) -> bool {
    let mut magic = [0u8; 4];
    fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .is_ok()
        && &magic == LZ4_MAGIC
}

// ─── Index naming ───────────────────────────────────────────────────

/// Logical index name for a crawl root: its last non-empty path segment.
pub fn index_name_for(root: &Path) -> String {
    let text = crate::clean_path(&root.to_string_lossy());
    let last = text
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .last()
        .unwrap_or("");
    let name: String = last
        .chars()
        .map(|c| if matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    if name.trim().is_empty() || name == "." || name == ".." {
        "root".to_string()
    } else {
        name
    }
}

// ─── IndexStore ─────────────────────────────────────────────────────

/// Result of a successful save.
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub path: PathBuf,
    pub documents: usize,
    pub bytes: u64,
}

impl SaveReport {
    pub fn message(&self) -> String {
        format!(
            "Index saved: {} ({} documents, {})",
            self.path.display(),
            self.documents,
            format_mb(self.bytes)
        )
    }
}

/// Summary of one index file, for listing.
#[derive(Debug, Clone)]
pub struct IndexInfo {
    pub name: String,
    pub path: PathBuf,
    /// `None` when the file cannot be parsed.
    pub documents: Option<usize>,
    pub bytes: u64,
    pub age: Duration,
    pub stale: bool,
}

/// One file per logical index name under a fixed directory.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
    format: IndexFormat,
    max_age: Duration,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>, format: IndexFormat, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            format,
            max_age,
        }
    }

    pub fn from_config(cfg: &FinderConfig) -> Self {
        Self::new(cfg.index_dir.clone(), cfg.index_format, cfg.max_index_age)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<name><extension>`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name.trim(), self.format.extension()))
    }

    /// True when the named index is missing, empty, older than the maximum
    /// age, or cannot be inspected.
    pub fn should_rebuild(&self, name: &str) -> bool {
        if name.trim().is_empty() {
            warn!("Index name is blank; rebuild required");
            return true;
        }
        let path = self.path_for(name);
        let meta = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No index file; rebuild required");
                return true;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot inspect index file; rebuild required");
                return true;
            }
        };
        if meta.len() == 0 {
            warn!(path = %path.display(), "Index file is empty; rebuild required");
            return true;
        }
        let modified = match meta.modified() {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Index modification time unavailable; rebuild required");
                return true;
            }
        };
        let age = SystemTime::now().duration_since(modified).unwrap_or(Duration::ZERO);
        if age > self.max_age {
            info!(
                path = %path.display(),
                age_hours = format_args!("{:.1}", age.as_secs_f64() / 3600.0),
                "Index is stale; rebuild required"
            );
            return true;
        }
        false
    }

    /// Write the catalog under `name`. Refuses a blank name or an empty
    /// catalog, and verifies the written file is non-empty.
    pub fn save(&self, name: &str, catalog: &Catalog) -> Result<SaveReport, FinderError> {
        if name.trim().is_empty() {
            return Err(FinderError::InvalidInput("index name is blank".to_string()));
        }
        let records = catalog.records();
        if records.is_empty() {
            return Err(FinderError::EmptyCatalog);
        }

        let start = Instant::now();
        fs::create_dir_all(&self.dir).map_err(|e| {
            FinderError::SaveFailed(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let path = self.path_for(name);
        match self.format {
            IndexFormat::Json => {
                let file = fs::File::create(&path)?;
                let mut writer = BufWriter::new(file);
                serde_json::to_writer_pretty(&mut writer, &records)?;
                writer.flush()?;
            }
            IndexFormat::Binary => save_compressed(&path, &records)?,
        }

        let bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if bytes == 0 {
            return Err(FinderError::SaveFailed(format!(
                "{} was not written",
                path.display()
            )));
        }

        info!(
            path = %path.display(),
            documents = records.len(),
            size = %format_mb(bytes),
            elapsed_ms = format_args!("{:.1}", start.elapsed().as_secs_f64() * 1000.0),
            "Index saved"
        );
        Ok(SaveReport {
            path,
            documents: records.len(),
            bytes,
        })
    }

    /// Parse the named index. Fails on a missing, empty, corrupt or
    /// document-less file; never touches the catalog.
    pub fn read(&self, name: &str) -> Result<Vec<DocumentRef>, FinderError> {
        if name.trim().is_empty() {
            return Err(FinderError::InvalidInput("index name is blank".to_string()));
        }
        let path = self.path_for(name);
        let docs = read_records(&path)?;
        if docs.is_empty() {
            return Err(FinderError::IndexLoad {
                path: path.display().to_string(),
                message: "index holds no documents".to_string(),
            });
        }
        Ok(docs)
    }

    /// Replace the catalog with the named index. The catalog is left
    /// untouched on failure.
    pub fn load_into(&self, name: &str, catalog: &Catalog) -> Result<usize, FinderError> {
        let start = Instant::now();
        let docs = self.read(name)?;
        let count = docs.len();
        catalog.replace(docs);
        info!(
            index = name,
            documents = count,
            elapsed_ms = format_args!("{:.1}", start.elapsed().as_secs_f64() * 1000.0),
            "Index loaded"
        );
        Ok(count)
    }

    /// Every index file in the store directory, sorted by name.
    pub fn list(&self) -> Vec<IndexInfo> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Vec::new(),
        };

        let mut infos = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let file_name = path.file_name().map(|f| f.to_string_lossy().into_owned()).unwrap_or_default();
            let name = [IndexFormat::Json, IndexFormat::Binary]
                .iter()
                .find_map(|f| file_name.strip_suffix(f.extension()));
            let Some(name) = name else { continue };

            let meta = entry.metadata().ok();
            let bytes = meta.as_ref().map(|m| m.len()).unwrap_or(0);
            let age = meta
                .and_then(|m| m.modified().ok())
                .and_then(|t| SystemTime::now().duration_since(t).ok())
                .unwrap_or(Duration::ZERO);
            let documents = match read_records(&path) {
                Ok(docs) => Some(docs.len()),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Unreadable index file");
                    None
                }
            };
            infos.push(IndexInfo {
                name: name.to_string(),
                path,
                documents,
                bytes,
                age,
                stale: bytes == 0 || age > self.max_age,
            });
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }
}

/// Parse an index file in either format. Records with both fields blank are
/// skipped. A JSON file must hold an array; elements that are not objects are
/// skipped one by one rather than failing the whole load.
fn read_records(path: &Path) -> Result<Vec<DocumentRef>, FinderError> {
    let path_str = path.display().to_string();
    let len = fs::metadata(path)
        .map_err(|e| FinderError::IndexLoad {
            path: path_str.clone(),
            message: format!("file not found or inaccessible: {}", e),
        })?
        .len();
    if len == 0 {
        return Err(FinderError::IndexLoad {
            path: path_str,
            message: "file is empty".to_string(),
        });
    }

    let records: Vec<DocumentRecord> = if has_binary_magic(path) {
        load_compressed(path)?
    } else {
        let file = fs::File::open(path)?;
        let values: Vec<serde_json::Value> =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| FinderError::IndexLoad {
                path: path_str.clone(),
                message: format!("JSON parse failed: {}", e),
            })?;
        let total = values.len();
        let records: Vec<DocumentRecord> = values.iter().filter_map(DocumentRecord::from_json).collect();
        if records.len() < total {
            warn!(path = %path_str, skipped = total - records.len(), "Skipped malformed index records");
        }
        records
    };

    let total = records.len();
    let docs: Vec<DocumentRef> = records
        .into_iter()
        .filter(|r| !(r.file_name.is_empty() && r.path.is_empty()))
        .map(DocumentRef::from)
        .collect();
    if docs.len() < total {
        warn!(path = %path_str, skipped = total - docs.len(), "Skipped blank index records");
    }
    Ok(docs)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
