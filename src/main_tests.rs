    use super::cli::*;
    use clap::Parser;
    use docfind::IndexFormat;
    use std::path::PathBuf;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("docfind").chain(args.iter().copied())).unwrap()
    }

    // ─── Argument parsing ────────────────────────────────

    #[test]
    fn test_index_defaults_map_to_config() {
        let cli = parse(&["index", "-d", "/data/docs"]);
        let Commands::Index(args) = cli.command else { panic!("expected index") };
        let cfg = args.index.to_config();
        assert_eq!(cfg.root, PathBuf::from("/data/docs"));
        assert_eq!(cfg.max_depth, 4);
        assert_eq!(cfg.index_format, IndexFormat::Json);
        assert_eq!(cfg.max_index_age, Duration::from_secs(24 * 3600));
        assert!(cfg.workers >= 2);
    }

    #[test]
    fn test_index_overrides() {
        let cli = parse(&[
            "index", "-d", "/d", "--depth", "2", "-t", "3", "--format", "binary",
            "--max-age-hours", "1", "--index-dir", "/idx", "--timeout-secs", "5",
        ]);
        let Commands::Index(args) = cli.command else { panic!("expected index") };
        let cfg = args.index.to_config();
        assert_eq!(cfg.max_depth, 2);
        assert_eq!(cfg.workers, 3);
        assert_eq!(cfg.index_format, IndexFormat::Binary);
        assert_eq!(cfg.max_index_age, Duration::from_secs(3600));
        assert_eq!(cfg.index_dir, PathBuf::from("/idx"));
        assert_eq!(cfg.crawl_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_ask_ranking_options() {
        let cli = parse(&[
            "ask", "where is the budget", "--api-key", " k123 ", "--top-k", "5", "--json",
        ]);
        let Commands::Ask(args) = cli.command else { panic!("expected ask") };
        assert_eq!(args.question, "where is the budget");
        assert!(args.json);
        let mut cfg = args.index.to_config();
        args.ranking.apply(&mut cfg);
        assert_eq!(cfg.api_key, "k123");
        assert_eq!(cfg.top_k, 5);
        assert_eq!(cfg.model, docfind::config::DEFAULT_MODEL);
    }

    #[test]
    fn test_global_log_flags() {
        let cli = parse(&["info", "--log-level", "debug", "--log-format", "json"]);
        assert_eq!(cli.log_level, "debug");
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(level_directive("DEBUG"), "debug");
        assert_eq!(level_directive("bogus"), "warn");
    }

    #[test]
    fn test_open_requires_item() {
        assert!(Cli::try_parse_from(["docfind", "open"]).is_err());
        let cli = parse(&["open", "/a/b.pdf ::: 0.9", "-d", "/root", "--print"]);
        let Commands::Open(args) = cli.command else { panic!("expected open") };
        assert_eq!(args.item, "/a/b.pdf ::: 0.9");
        assert!(args.print);
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Cli::try_parse_from(["docfind", "index", "--format", "xml"]).is_err());
    }
