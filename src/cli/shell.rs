//! Interactive question loop over one loaded index.

use std::io::{self, BufRead, Write};

use docfind::crawler::ProgressFn;
use docfind::{DocFinder, FinderError};

use super::args::ShellArgs;
use super::{open_finder, print_results, progress_printer, reveal};

const HELP: &str = "\
Type a question and press Enter.
  :open <n>   open the folder of result n from the last answer
  :stats      show cache statistics
  :reset      reset cache statistics
  :reload     rebuild the index
  :quit       exit";

/// Meta command or question parsed from one input line.
#[derive(Debug, PartialEq)]
pub(crate) enum Line<'a> {
    Empty,
    Quit,
    Help,
    Stats,
    Reset,
    Reload,
    Open(usize),
    Unknown(&'a str),
    Question(&'a str),
}

pub(crate) fn parse_line(line: &str) -> Line<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Line::Empty;
    }
    let Some(meta) = line.strip_prefix(':') else {
        return Line::Question(line);
    };
    let mut parts = meta.split_whitespace();
    match parts.next().unwrap_or("") {
        "q" | "quit" | "exit" => Line::Quit,
        "h" | "help" => Line::Help,
        "stats" => Line::Stats,
        "reset" => Line::Reset,
        "reload" => Line::Reload,
        "open" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n > 0 => Line::Open(n),
            _ => Line::Unknown(line),
        },
        _ => Line::Unknown(line),
    }
}

pub fn cmd_shell(args: ShellArgs) -> Result<(), FinderError> {
    let finder = open_finder(&args.index, Some(&args.ranking))?;
    let progress = progress_printer();
    let message = finder.ensure_index(Some(&progress as &ProgressFn<'_>));
    eprintln!("\n{}", message);
    eprintln!("{} documents in catalog. Type :help for commands.", finder.catalog().len());

    let stdin = io::stdin();
    let mut last: Vec<String> = Vec::new();
    loop {
        eprint!("> ");
        io::stderr().flush()?;
        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        match parse_line(&input) {
            Line::Empty => {}
            Line::Quit => break,
            Line::Help => eprintln!("{}", HELP),
            Line::Stats => eprintln!("{}", finder.cache_stats()),
            Line::Reset => {
                finder.reset_cache_stats();
                eprintln!("Cache statistics reset.");
            }
            Line::Reload => {
                let name = finder.index_name();
                eprintln!("\n{}", finder.build_index(&name, Some(&progress as &ProgressFn<'_>)));
            }
            Line::Open(n) => open_result(&finder, &last, n),
            Line::Unknown(cmd) => eprintln!("Unknown command: {} (try :help)", cmd),
            Line::Question(q) => {
                let result = finder.find_path(q);
                if let docfind::QueryResult::Success { success, .. } = &result {
                    last = success.clone();
                }
                print_results(&result);
            }
        }
    }
    eprintln!("{}", finder.cache_stats());
    Ok(())
}

fn open_result(finder: &DocFinder, last: &[String], n: usize) {
    let Some(item) = last.get(n - 1) else {
        eprintln!("No result #{}", n);
        return;
    };
    match finder.folder_for(item).and_then(|f| reveal(&f)) {
        Ok(()) => {}
        Err(e) => eprintln!("Error: {}", e.user_message()),
    }
}
