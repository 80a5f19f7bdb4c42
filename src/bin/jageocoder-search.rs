//! jageocoder-search - Look up an address notation against a built
//! dictionary and print the matching node(s).
//!
//! Grounded on the clap-derive style of `src/bin/rsmarisa-lookup.rs`.

use clap::Parser;
use jageocoder::config::SearchConfig;
use jageocoder::engine::LocalTree;
use jageocoder::TreeHandle;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "jageocoder-search")]
#[command(about = "Search a jageocoder dictionary for matching address nodes")]
#[command(version)]
struct Args {
    /// Dictionary directory (containing node_store.bin and trie.bin).
    #[arg(short = 'd', long, value_name = "DIR")]
    db_dir: Option<PathBuf>,

    /// Return every match, not only the longest.
    #[arg(long)]
    all: bool,

    /// Don't require nodes to have coordinates.
    #[arg(long)]
    allow_missing_coordinates: bool,

    /// Increase logging verbosity (can be repeated).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Address notation to search for (default: read queries from stdin).
    query: Option<String>,
}

fn main() {
    let args = Args::parse();
    stderrlog::new()
        .module(module_path!())
        .verbosity(args.verbose as usize + 1)
        .init()
        .ok();

    let db_dir = match args.db_dir.clone() {
        Some(d) => d,
        None => match LocalTree::default_db_dir() {
            Ok(d) => d,
            Err(e) => {
                eprintln!("error: {e}");
                process::exit(1);
            }
        },
    };

    let mut tree = match LocalTree::open(&db_dir) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to open dictionary at {}: {}", db_dir.display(), e);
            process::exit(10);
        }
    };

    if let Err(e) = tree.set_search_config(SearchConfig {
        best_only: !args.all,
        require_coordinates: !args.allow_missing_coordinates,
        ..SearchConfig::default()
    }) {
        eprintln!("error: {e}");
        process::exit(2);
    }

    let run_query = |tree: &mut LocalTree, query: &str| {
        match tree.search_node(query) {
            Ok(outcome) => {
                for result in &outcome.results {
                    println!(
                        "{}\t{}\t{}\t{}",
                        result.matched,
                        result.fullname.join(""),
                        result
                            .coordinates
                            .map(|(x, y)| format!("{x},{y}"))
                            .unwrap_or_else(|| "-".to_string()),
                        result.level,
                    );
                }
                if !outcome.unmatched.is_empty() {
                    eprintln!("unmatched: {}", outcome.unmatched);
                }
            }
            Err(e) => eprintln!("error: search failed: {e}"),
        }
    };

    match args.query {
        Some(q) => run_query(&mut tree, &q),
        None => {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(l) => run_query(&mut tree, &l),
                    Err(e) => {
                        eprintln!("error: failed to read query: {e}");
                        process::exit(20);
                    }
                }
            }
        }
    }
}
