use chrono::Utc;
use pagepresence_common::protocol::records::{parse_elements, parse_presence};
use pagepresence_common::tree::build_forest;
use pagepresence_common::types::{find_in_forest, Element, PresenceEntry, TreeNode};

fn presence(subject: &str, target: &str) -> PresenceEntry {
    PresenceEntry::new(subject, Some(target), "#E53935", Utc::now())
}

fn shape(nodes: &[TreeNode]) -> Vec<(String, Vec<String>)> {
    nodes
        .iter()
        .map(|node| (node.id.clone(), node.children.iter().map(|child| child.id.clone()).collect()))
        .collect()
}

fn load_fixture() -> serde_json::Value {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/page.json");
    let content = std::fs::read_to_string(path).expect("fixture file should be readable");
    serde_json::from_str(&content).expect("fixture file should be valid JSON")
}

#[test]
fn nested_reference_paths_form_parent_and_child() {
    let elements = vec![
        Element::new("p", "urn:x:/page/card"),
        Element::new("c", "urn:x:/page/card/jcr:content/title"),
    ];

    let forest = build_forest(&elements, &[]);

    assert_eq!(shape(&forest), vec![("p".to_string(), vec!["c".to_string()])]);
    assert!(forest[0].children[0].children.is_empty());
}

#[test]
fn underscore_suffixed_target_attaches_under_block() {
    let elements = vec![Element::new("p", "/page/card")];
    let forest = build_forest(&elements, &[presence("u1", "p_title")]);

    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].id, "p");
    let orphan = &forest[0].children[0];
    assert_eq!(orphan.id, "p_title");
    assert!(orphan.is_orphan);
    assert_eq!(orphan.property_hint.as_deref(), Some("title"));
}

#[test]
fn unknown_target_without_elements_is_a_root_orphan() {
    let forest = build_forest(&[], &[presence("u1", "unknown")]);

    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].id, "unknown");
    assert!(forest[0].is_orphan);
    assert!(forest[0].children.is_empty());
}

#[test]
fn identical_inputs_build_identical_forests() {
    let elements = vec![
        Element::new("p", "urn:x:/page/card"),
        Element::new("c", "urn:x:/page/card/jcr:content/title"),
        Element::new("q", "/other"),
    ];
    let snapshot = vec![presence("u1", "p_title"), presence("u2", "ghost")];

    let first = build_forest(&elements, &snapshot);
    let second = build_forest(&elements.clone(), &snapshot.clone());

    assert_eq!(first, second);
}

#[test]
fn realistic_page_fixture() {
    let fixture = load_fixture();
    let elements = parse_elements(&fixture["elements"].to_string()).expect("elements should parse");
    let snapshot = parse_presence(&fixture["presence"].to_string()).expect("presence should parse");
    assert_eq!(elements.len(), 5);
    assert_eq!(snapshot.len(), 5);

    let forest = build_forest(&elements, &snapshot);

    // Roots: the page root and the unplaceable orphan, ordered by sort key.
    let roots: Vec<&str> = forest.iter().map(|node| node.id.as_str()).collect();
    assert_eq!(roots, vec!["root", "detached-widget"]);

    let root = &forest[0];
    let children: Vec<&str> = root.children.iter().map(|node| node.id.as_str()).collect();
    // `/content/dam/...` (teaser, explicit parent) sorts before `/content/site/...`.
    assert_eq!(children, vec!["teaser", "card", "hero"]);

    let card = find_in_forest(&forest, "card").unwrap();
    let card_children: Vec<&str> = card.children.iter().map(|node| node.id.as_str()).collect();
    assert_eq!(card_children, vec!["card-title", "card_subtitle"]);
    assert_eq!(card.children[1].property_hint.as_deref(), Some("subtitle"));

    let hero = find_in_forest(&forest, "hero").unwrap();
    assert_eq!(hero.children.len(), 1);
    assert!(hero.children[0].is_orphan);
    assert_eq!(hero.children[0].property_hint.as_deref(), Some("alt"));

    let detached = find_in_forest(&forest, "detached-widget").unwrap();
    assert!(detached.is_orphan);
    assert_eq!(detached.property_hint, None);
}
