//! info command: list saved indexes.

use std::time::Duration;

use docfind::config::{default_index_dir, DEFAULT_MAX_INDEX_AGE};
use docfind::store::IndexInfo;
use docfind::{format_mb, IndexFormat, IndexStore};

use super::args::InfoArgs;

pub fn cmd_info(args: InfoArgs) {
    let dir = args.index_dir.unwrap_or_else(default_index_dir);
    let store = IndexStore::new(dir, IndexFormat::default(), DEFAULT_MAX_INDEX_AGE);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info_json(&store)).unwrap_or_default());
        return;
    }

    if !store.dir().exists() {
        eprintln!("No indexes found. Use 'docfind index -d <dir>' to create one.");
        return;
    }

    eprintln!("Index directory: {}", store.dir().display());
    eprintln!();

    let infos = store.list();
    if infos.is_empty() {
        eprintln!("No indexes found.");
        return;
    }
    for info in &infos {
        println!("  {}", describe(info));
    }
}

fn describe(info: &IndexInfo) -> String {
    let docs = match info.documents {
        Some(n) => format!("{} documents", n),
        None => "unreadable".to_string(),
    };
    let stale = if info.stale { " [STALE]" } else { "" };
    let file = info
        .path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "{} -- {}, {}, {:.1}h ago{} ({})",
        info.name,
        docs,
        format_mb(info.bytes),
        hours(info.age),
        stale,
        file
    )
}

fn hours(age: Duration) -> f64 {
    age.as_secs_f64() / 3600.0
}

/// Index inventory as a JSON value.
pub fn info_json(store: &IndexStore) -> serde_json::Value {
    let indexes: Vec<serde_json::Value> = store
        .list()
        .iter()
        .map(|info| {
            serde_json::json!({
                "name": info.name,
                "documents": info.documents,
                "sizeMb": (info.bytes as f64 / 1_048_576.0 * 10.0).round() / 10.0,
                "ageHours": (hours(info.age) * 10.0).round() / 10.0,
                "stale": info.stale,
                "filename": info.path.file_name().map(|f| f.to_string_lossy().into_owned()),
            })
        })
        .collect();
    serde_json::json!({
        "directory": store.dir().display().to_string(),
        "indexes": indexes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfind::{Catalog, DocumentRef};

    #[test]
    fn test_info_json_lists_saved_index() {
        let tmp = tempfile::tempdir().unwrap();
        let store = IndexStore::new(tmp.path(), IndexFormat::Json, DEFAULT_MAX_INDEX_AGE);
        let catalog = Catalog::new();
        catalog.push(DocumentRef::new("a.txt", "/a.txt"));
        store.save("Docs", &catalog).unwrap();

        let value = info_json(&store);
        assert_eq!(value["indexes"][0]["name"], "Docs");
        assert_eq!(value["indexes"][0]["documents"], 1);
        assert_eq!(value["indexes"][0]["stale"], false);
        assert_eq!(value["indexes"][0]["filename"], "Docs.json");
    }

    #[test]
    fn test_describe_unreadable_and_stale() {
        let info = IndexInfo {
            name: "Broken".to_string(),
            path: "/idx/Broken.json".into(),
            documents: None,
            bytes: 0,
            age: Duration::from_secs(7200),
            stale: true,
        };
        let line = describe(&info);
        assert!(line.contains("unreadable"), "{line}");
        assert!(line.contains("2.0h ago [STALE]"), "{line}");
    }
}
