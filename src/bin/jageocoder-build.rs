//! jageocoder-build - Build a node store, TRIE, and Cho-Aza master table
//! from a JSON address-tree fixture.
//!
//! This is not the real MLIT address-base ingestion pipeline (out of
//! scope); it loads a nested JSON tree description and flattens it into
//! the on-disk formats the engine reads. Grounded on the clap-derive
//! style of `src/bin/rsmarisa-build.rs`.

use clap::Parser;
use jageocoder::aza::AzaMaster;
use jageocoder::base::{AddressLevel, NodeId, INVALID_NODE_ID};
use jageocoder::node::{AddressNode, NodeStore};
use jageocoder::normalize::standardize;
use jageocoder::trie::AddressTrie;
use serde::Deserialize;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "jageocoder-build")]
#[command(about = "Build a jageocoder dictionary from a JSON address-tree fixture")]
#[command(version)]
struct Args {
    /// Input JSON fixture describing the address tree.
    input: PathBuf,

    /// Output directory for node_store.bin and trie.bin.
    #[arg(short = 'o', long, value_name = "DIR")]
    output: PathBuf,

    /// Increase logging verbosity (can be repeated).
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Deserialize)]
struct InputNode {
    name: String,
    level: u8,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    priority: u32,
    #[serde(default)]
    note: String,
    #[serde(default)]
    children: Vec<InputNode>,
}

fn flatten(input: &InputNode, parent_id: NodeId, nodes: &mut Vec<AddressNode>) -> NodeId {
    let id = nodes.len() as NodeId;
    let level = AddressLevel::from_u8(input.level).unwrap_or_else(|| {
        eprintln!("error: invalid address level {} for node '{}'", input.level, input.name);
        process::exit(1);
    });

    nodes.push(AddressNode {
        id,
        name: input.name.clone(),
        name_index: standardize(&input.name, false),
        coordinates: match (input.x, input.y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        },
        level,
        priority: input.priority,
        note: input.note.clone(),
        parent_id,
        sibling_id: id + 1,
    });

    for child in &input.children {
        flatten(child, id, nodes);
    }

    let end = nodes.len() as NodeId;
    nodes[id as usize].sibling_id = end;
    end
}

/// Path of concatenated `name_index` strings from PREF down to `id`.
fn cumulative_path(nodes: &[AddressNode], id: NodeId) -> String {
    let mut chain = Vec::new();
    let mut cur = &nodes[id as usize];
    loop {
        chain.push(cur.name_index.as_str());
        if cur.parent_id == INVALID_NODE_ID {
            break;
        }
        cur = &nodes[cur.parent_id as usize];
    }
    chain.reverse();
    chain.concat()
}

fn main() {
    let args = Args::parse();
    stderrlog::new()
        .module(module_path!())
        .verbosity(args.verbose as usize + 1)
        .init()
        .ok();

    let content = match std::fs::read_to_string(&args.input) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: failed to read {}: {}", args.input.display(), e);
            process::exit(10);
        }
    };

    let roots: Vec<InputNode> = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: failed to parse {}: {}", args.input.display(), e);
            process::exit(11);
        }
    };

    let mut nodes: Vec<AddressNode> = Vec::new();
    for root in &roots {
        flatten(root, INVALID_NODE_ID, &mut nodes);
    }

    let mut trie = AddressTrie::new();
    for node in &nodes {
        if node.level > AddressLevel::Oaza || node.is_noname() {
            continue;
        }
        let path = cumulative_path(&nodes, node.id);
        // Index every suffix of the path, per spec.md's TrieEntry shape
        // ("all suffixes of those concatenations").
        for (start, _) in path.char_indices() {
            trie.insert(path[start..].to_string(), node.id);
        }
    }

    let store = match NodeStore::from_nodes(nodes) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: inconsistent node tree: {e}");
            process::exit(12);
        }
    };

    if let Err(e) = std::fs::create_dir_all(&args.output) {
        eprintln!("error: failed to create {}: {}", args.output.display(), e);
        process::exit(13);
    }

    if let Err(e) = store.save(&args.output.join("node_store.bin")) {
        eprintln!("error: failed to write node_store.bin: {e}");
        process::exit(14);
    }
    if let Err(e) = trie.save(&args.output.join("trie.bin")) {
        eprintln!("error: failed to write trie.bin: {e}");
        process::exit(15);
    }

    let aza_master = AzaMaster::default();
    match serde_json::to_string(&aza_master) {
        Ok(json) => {
            if let Err(e) = std::fs::write(args.output.join("aza_master.json"), json) {
                eprintln!("error: failed to write aza_master.json: {e}");
                process::exit(16);
            }
        }
        Err(e) => {
            eprintln!("error: failed to serialize aza master table: {e}");
            process::exit(17);
        }
    }

    eprintln!("#nodes: {}", store.len());
    eprintln!("#trie keys: {}", trie.num_keys());
}
