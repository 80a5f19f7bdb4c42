//! End-to-end tests exercising normalize/node/trie/walker/engine
//! together, against the concrete scenarios spec.md documents.
//!
//! Fixtures are built the same way `jageocoder-build` flattens a nested
//! tree and indexes every suffix of each node's cumulative ancestor
//! path, just assembled in-process instead of round-tripping through
//! JSON.

use jageocoder::aza::AzaMaster;
use jageocoder::base::{AddressLevel, NodeId, INVALID_NODE_ID};
use jageocoder::config::SearchConfig;
use jageocoder::engine::LocalTree;
use jageocoder::node::{AddressNode, NodeStore};
use jageocoder::normalize::standardize;
use jageocoder::trie::AddressTrie;
use jageocoder::TreeHandle;

/// A node plus its children, before ids are assigned.
struct Spec {
    name: &'static str,
    level: AddressLevel,
    coordinates: Option<(f64, f64)>,
    children: Vec<Spec>,
}

impl Spec {
    fn branch(name: &'static str, level: AddressLevel, children: Vec<Spec>) -> Self {
        Spec {
            name,
            level,
            coordinates: None,
            children,
        }
    }

    fn leaf(name: &'static str, level: AddressLevel) -> Self {
        Spec {
            name,
            level,
            coordinates: Some((139.0, 35.0)),
            children: Vec::new(),
        }
    }
}

fn flatten(spec: &Spec, parent_id: NodeId, nodes: &mut Vec<AddressNode>) -> NodeId {
    let id = nodes.len() as NodeId;
    nodes.push(AddressNode {
        id,
        name: spec.name.to_string(),
        name_index: standardize(spec.name, false),
        coordinates: spec.coordinates,
        level: spec.level,
        priority: 0,
        note: String::new(),
        parent_id,
        sibling_id: id + 1,
    });
    for child in &spec.children {
        flatten(child, id, nodes);
    }
    let end = nodes.len() as NodeId;
    nodes[id as usize].sibling_id = end;
    end
}

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

fn build_tree(roots: Vec<Spec>) -> LocalTree {
    let mut nodes = Vec::new();
    for root in &roots {
        flatten(root, INVALID_NODE_ID, &mut nodes);
    }

    let mut trie = AddressTrie::new();
    for node in &nodes {
        if node.level > AddressLevel::Oaza || node.is_noname() {
            continue;
        }
        let path = cumulative_path(&nodes, node.id);
        for (start, _) in path.char_indices() {
            trie.insert(path[start..].to_string(), node.id);
        }
    }

    let store = NodeStore::from_nodes(nodes).unwrap();
    LocalTree::new(store, trie, AzaMaster::default())
}

/// Scenario 1: multi-level chome/banchi match with the trailing
/// building number left unmatched (no BLD node in the fixture).
#[test]
fn test_tama_ochiai_chome_banchi() {
    let mut tree = build_tree(vec![Spec::branch(
        "東京都",
        AddressLevel::Pref,
        vec![Spec::branch(
            "多摩市",
            AddressLevel::City,
            vec![Spec::branch(
                "落合",
                AddressLevel::Oaza,
                vec![Spec::branch(
                    "一丁目",
                    AddressLevel::Aza,
                    vec![Spec::leaf("15番地", AddressLevel::Block)],
                )],
            )],
        )],
    )]);

    let outcome = tree.search_node("多摩市落合1-15-2").unwrap();
    assert_eq!(outcome.results.len(), 1);
    let r = &outcome.results[0];
    assert_eq!(r.fullname, vec!["東京都", "多摩市", "落合", "一丁目", "15番地"]);
    assert_eq!(r.level, AddressLevel::Block);
    assert_eq!(r.matched, "多摩市落合1-15-");
}

/// Scenario 3: same rule shape as scenario 1 (exact-prefix descent then
/// optional-postfix elision at chome and banchi level), different
/// ward/oaza names.
#[test]
fn test_shinjuku_nishishinjuku_chome_ban() {
    let mut tree = build_tree(vec![Spec::branch(
        "東京都",
        AddressLevel::Pref,
        vec![Spec::branch(
            "新宿区",
            AddressLevel::City,
            vec![Spec::branch(
                "西新宿",
                AddressLevel::Oaza,
                vec![Spec::branch(
                    "二丁目",
                    AddressLevel::Aza,
                    vec![Spec::leaf("8番", AddressLevel::Block)],
                )],
            )],
        )],
    )]);

    let outcome = tree.search_node("新宿区西新宿2-8-1").unwrap();
    assert_eq!(outcome.results.len(), 1);
    let r = &outcome.results[0];
    assert_eq!(r.fullname, vec!["東京都", "新宿区", "西新宿", "二丁目", "8番"]);
    assert_eq!(r.matched, "新宿区西新宿2-8-");
}

/// A query that matches nothing past the city name still returns that
/// city as the best (backtrack-to-self) candidate, and reports the rest
/// of the query as unmatched.
#[test]
fn test_backtrack_to_self_when_no_child_matches() {
    let mut tree = build_tree(vec![Spec::branch(
        "東京都",
        AddressLevel::Pref,
        vec![Spec::branch(
            "多摩市",
            AddressLevel::City,
            vec![Spec::leaf("落合", AddressLevel::Oaza)],
        )],
    )]);
    tree.set_search_config(SearchConfig {
        require_coordinates: false,
        ..SearchConfig::default()
    })
    .unwrap();

    let outcome = tree.search_node("多摩市xyz").unwrap();
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].fullname, vec!["東京都", "多摩市"]);
    assert_eq!(outcome.unmatched, "xyz");
}

/// `require_coordinates` (the default) drops a backtrack-to-self
/// candidate that has no coordinates at all.
#[test]
fn test_require_coordinates_filters_uncoordinated_results() {
    let mut tree = build_tree(vec![Spec::branch(
        "東京都",
        AddressLevel::Pref,
        vec![Spec::branch(
            "多摩市",
            AddressLevel::City,
            vec![Spec::leaf("落合", AddressLevel::Oaza)],
        )],
    )]);

    let outcome = tree.search_node("多摩市xyz").unwrap();
    assert!(outcome.results.is_empty());
}

/// A coordinate-less backtrack-to-self candidate is kept, with
/// coordinates backfilled from a sibling under the same parent.
#[test]
fn test_require_coordinates_backfills_from_sibling() {
    let mut tree = build_tree(vec![Spec::branch(
        "東京都",
        AddressLevel::Pref,
        vec![
            Spec::branch("多摩市", AddressLevel::City, vec![]),
            Spec::leaf("稲城市", AddressLevel::City),
        ],
    )]);

    let outcome = tree.search_node("多摩市xyz").unwrap();
    assert_eq!(outcome.results.len(), 1);
    let r = &outcome.results[0];
    assert_eq!(r.fullname, vec!["東京都", "多摩市"]);
    assert_eq!(r.coordinates, Some((139.0, 35.0)));
}
