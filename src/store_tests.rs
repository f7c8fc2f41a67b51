    use super::*;

    const DAY: Duration = Duration::from_secs(86_400);

    fn store(dir: &Path, format: IndexFormat) -> IndexStore {
        IndexStore::new(dir.join("temp"), format, DAY)
    }

    fn sample_catalog() -> Catalog {
        let catalog = Catalog::new();
        catalog.push(DocumentRef::new("b.txt", "/b.txt"));
        catalog.push(DocumentRef::new("a.pdf", "/x/a.pdf"));
        catalog.push(DocumentRef::new("c.md", "/x/y/c.md"));
        catalog
    }

    fn pairs(docs: &[DocumentRef]) -> Vec<(String, String)> {
        docs.iter()
            .map(|d| (d.file_name.clone(), d.relative_path.clone()))
            .collect()
    }

    // ─── Naming ──────────────────────────────────────────────────

    #[test]
    fn test_index_name_for_last_segment() {
        assert_eq!(index_name_for(Path::new("/home/me/Documents")), "Documents");
        assert_eq!(index_name_for(Path::new("/home/me/Documents/")), "Documents");
        assert_eq!(index_name_for(Path::new(r"D:\Work\Reports")), "Reports");
        assert_eq!(index_name_for(Path::new("/")), "root");
        assert_eq!(index_name_for(Path::new("C:")), "C_");
    }

    #[test]
    fn test_path_for_uses_format_extension() {
        let s = IndexStore::new("/idx", IndexFormat::Json, DAY);
        assert_eq!(s.path_for("Docs"), PathBuf::from("/idx/Docs.json"));
        let s = IndexStore::new("/idx", IndexFormat::Binary, DAY);
        assert_eq!(s.path_for("Docs"), PathBuf::from("/idx/Docs.catalog"));
    }

    // ─── should_rebuild ──────────────────────────────────────────

    #[test]
    fn test_should_rebuild_blank_name() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        assert!(s.should_rebuild(""));
        assert!(s.should_rebuild("   "));
    }

    #[test]
    fn test_should_rebuild_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        assert!(s.should_rebuild("Docs"));
    }

    #[test]
    fn test_should_rebuild_empty_file() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(s.path_for("Docs"), b"").unwrap();
        assert!(s.should_rebuild("Docs"));
    }

    #[test]
    fn test_should_rebuild_fresh_index_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        s.save("Docs", &sample_catalog()).unwrap();
        assert!(!s.should_rebuild("Docs"));
        assert_eq!(s.should_rebuild("Docs"), s.should_rebuild("Docs"));
    }

    #[test]
    fn test_should_rebuild_stale_index() {
        let tmp = tempfile::tempdir().unwrap();
        let s = IndexStore::new(tmp.path(), IndexFormat::Json, Duration::ZERO);
        s.save("Docs", &sample_catalog()).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(s.should_rebuild("Docs"));
    }

    // ─── save ────────────────────────────────────────────────────

    #[test]
    fn test_save_empty_catalog_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        let err = s.save("Docs", &Catalog::new()).unwrap_err();
        assert!(matches!(err, FinderError::EmptyCatalog));
        assert!(!s.path_for("Docs").exists());
    }

    #[test]
    fn test_save_blank_name_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        let err = s.save(" ", &sample_catalog()).unwrap_err();
        assert!(matches!(err, FinderError::InvalidInput(_)));
    }

    #[test]
    fn test_save_creates_directory_and_reports() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        assert!(!s.dir().exists());
        let report = s.save("Docs", &sample_catalog()).unwrap();
        assert!(s.dir().is_dir());
        assert_eq!(report.documents, 3);
        assert!(report.bytes > 0);
        assert!(report.message().contains("3 documents"));
    }

    #[test]
    fn test_json_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        s.save("Docs", &sample_catalog()).unwrap();
        let raw = fs::read_to_string(s.path_for("Docs")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["fileName"], "b.txt");
        assert_eq!(value[0]["path"], "/b.txt");
        assert!(value[0].get("score").is_none());
    }

    #[test]
    fn test_binary_layout_starts_with_magic() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Binary);
        s.save("Docs", &sample_catalog()).unwrap();
        let raw = fs::read(s.path_for("Docs")).unwrap();
        assert_eq!(&raw[..4], LZ4_MAGIC);
    }

    // ─── load ────────────────────────────────────────────────────

    #[test]
    fn test_roundtrip_preserves_order_in_both_formats() {
        for format in [IndexFormat::Json, IndexFormat::Binary] {
            let tmp = tempfile::tempdir().unwrap();
            let s = store(tmp.path(), format);
            let original = sample_catalog();
            s.save("Docs", &original).unwrap();

            let loaded = Catalog::new();
            assert_eq!(s.load_into("Docs", &loaded).unwrap(), 3);
            assert_eq!(pairs(&loaded.snapshot()), pairs(&original.snapshot()), "{:?}", format);
        }
    }

    #[test]
    fn test_load_twice_is_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        s.save("Docs", &sample_catalog()).unwrap();
        let first = s.read("Docs").unwrap();
        let second = s.read("Docs").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_sniffs_binary_under_json_name() {
        let tmp = tempfile::tempdir().unwrap();
        let bin = store(tmp.path(), IndexFormat::Binary);
        bin.save("Docs", &sample_catalog()).unwrap();
        let json = store(tmp.path(), IndexFormat::Json);
        fs::copy(bin.path_for("Docs"), json.path_for("Docs")).unwrap();
        assert_eq!(json.read("Docs").unwrap().len(), 3);
    }

    #[test]
    fn test_load_failure_leaves_catalog_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        let catalog = sample_catalog();
        assert!(s.load_into("Missing", &catalog).is_err());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_load_rejects_corrupt_json() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(s.path_for("Docs"), b"[{\"fileName\": \"a.txt\", ").unwrap();
        let err = s.read("Docs").unwrap_err();
        assert!(err.to_string().contains("JSON parse failed"), "{}", err);
    }

    #[test]
    fn test_load_rejects_wrong_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(s.path_for("Docs"), br#"{"fileName": "a.txt"}"#).unwrap();
        assert!(s.read("Docs").is_err());
    }

    #[test]
    fn test_load_rejects_truncated_binary() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Binary);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(s.path_for("Docs"), b"DCAT\x04\x22garbage").unwrap();
        let err = s.read("Docs").unwrap_err();
        assert!(err.to_string().contains("deserialization failed"), "{}", err);
    }

    #[test]
    fn test_load_blank_records_only_is_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(s.path_for("Docs"), br#"[{"fileName": "", "path": ""}, {}]"#).unwrap();
        let err = s.read("Docs").unwrap_err();
        assert!(err.to_string().contains("no documents"), "{}", err);
    }

    #[test]
    fn test_load_skips_blank_records() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(
            s.path_for("Docs"),
            br#"[{"fileName": "a.txt", "path": "/a.txt"}, {}, {"path": "/b.txt"}]"#,
        )
        .unwrap();
        let docs = s.read("Docs").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].file_name, "");
        assert_eq!(docs[1].relative_path, "/b.txt");
    }

    #[test]
    fn test_load_null_field_keeps_record() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(
            s.path_for("Docs"),
            br#"[{"fileName": "a.txt", "path": "/a.txt"}, {"fileName": null, "path": "/b.txt"}, {"fileName": "c.txt", "path": "/c.txt"}]"#,
        )
        .unwrap();
        let docs = s.read("Docs").unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[1].file_name, "");
        assert_eq!(docs[1].relative_path, "/b.txt");
    }

    #[test]
    fn test_load_skips_non_object_elements() {
        let tmp = tempfile::tempdir().unwrap();
        let s = store(tmp.path(), IndexFormat::Json);
        fs::create_dir_all(s.dir()).unwrap();
        fs::write(
            s.path_for("Docs"),
            br#"[{"fileName": "a.txt", "path": "/a.txt"}, 42, {"fileName": "c.txt", "path": "/c.txt"}]"#,
        )
        .unwrap();
        let docs = s.read("Docs").unwrap();
        let paths: Vec<&str> = docs.iter().map(|d| d.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["/a.txt", "/c.txt"]);
    }

    // ─── list ────────────────────────────────────────────────────

    #[test]
    fn test_list_reports_each_index() {
        let tmp = tempfile::tempdir().unwrap();
        let json = store(tmp.path(), IndexFormat::Json);
        let bin = store(tmp.path(), IndexFormat::Binary);
        json.save("Alpha", &sample_catalog()).unwrap();
        bin.save("Beta", &sample_catalog()).unwrap();
        fs::write(json.dir().join("notes.txt"), b"ignored").unwrap();
        fs::write(json.path_for("Broken"), b"{").unwrap();

        let infos = json.list();
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Broken"]);
        assert_eq!(infos[0].documents, Some(3));
        assert_eq!(infos[1].documents, Some(3));
        assert_eq!(infos[2].documents, None);
        assert!(!infos[0].stale);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(store(tmp.path(), IndexFormat::Json).list().is_empty());
    }
