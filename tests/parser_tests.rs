//! End-to-end parsing and layout behaviour

use bridgechart::layout::{assign_levels, layout, LayoutConfig};
use bridgechart::parser::{parse, Edge, NodeKind};
use pretty_assertions::assert_eq;

const LOGIN: &str = r#"ts()
p["Check login"]
d<"Valid?">
te()
.....
ts()
a>
p["Check login"]
a>
d<"Valid?">
a*Yes*>
te()
"#;

#[test]
fn test_login_scenario() {
    let mut diagram = parse(LOGIN);
    let kinds: Vec<NodeKind> = diagram.nodes.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::TerminatorStart,
            NodeKind::Process,
            NodeKind::Decision,
            NodeKind::TerminatorEnd
        ]
    );
    assert_eq!(
        diagram.edges,
        vec![
            Edge::new(0, 1, None),
            Edge::new(1, 2, None),
            Edge::new(2, 3, Some("Yes".to_string())),
        ]
    );
    assert!(diagram.diagnostics.is_empty());

    let levels = layout(&mut diagram.nodes, &mut diagram.edges, &LayoutConfig::default());
    assert!(diagram.edges.iter().all(|e| !e.is_back_reference));
    assert_eq!(levels.get(3), 3);
}

#[test]
fn test_parse_is_deterministic() {
    let sources = [
        LOGIN,
        "p[A]\np[B]\n...\np[A]\nma*x*>[\np[B]\n]\na>!p[A]",
        "garbage\n...\nmore garbage\n]]]\na>",
    ];
    for source in sources {
        assert_eq!(parse(source), parse(source));
    }
}

#[test]
fn test_duplicate_declaration_is_one_node() {
    let diagram = parse("p[\"Same\"]\np[ \"Same\" ]\nte()\n...\np[\"Same\"]\na>\nte()\np[\"Same\"]\na>\nte()");
    assert_eq!(diagram.nodes.len(), 2);
    assert_eq!(diagram.edges, vec![Edge::new(0, 1, None)]);
}

#[test]
fn test_quote_styles_extract_same_text() {
    let texts: Vec<String> = ["p[Go home]", "p[\"Go home\"]", "p['Go home']", "p[\"\"\"Go home\"\"\"]", "p['''Go home''']"]
        .iter()
        .map(|source| parse(source).nodes[0].text.clone())
        .collect();
    assert!(texts.iter().all(|t| t == "Go home"), "{:?}", texts);
}

#[test]
fn test_structural_cycle_is_broken() {
    let mut diagram = parse("p[A]\np[B]\n...\np[A]\na>\np[B]\na>\np[A]");
    assert_eq!(diagram.edges.len(), 2);
    assert!(diagram.edges.iter().all(|e| !e.is_back_reference));

    let levels = assign_levels(&diagram.nodes, &mut diagram.edges);
    assert!(diagram.edges.iter().any(|e| e.is_back_reference));
    for edge in diagram.edges.iter().filter(|e| !e.is_back_reference) {
        assert!(levels.get(edge.to) > levels.get(edge.from));
    }
}

#[test]
fn test_dangling_references_produce_no_edges() {
    let diagram = parse("p[A]\n...\np[A]\na>!p[Nowhere]\np[A]\nma>[\np[Ghost]\n]");
    assert!(diagram.edges.is_empty());
    assert_eq!(diagram.diagnostics.len(), 2);
}

#[test]
fn test_malformed_lines_are_skipped() {
    let diagram = parse("p[A]\n%%%\nte()\n...\np[A]\nzz\na>\nte()");
    assert_eq!(diagram.nodes.len(), 2);
    assert_eq!(diagram.edges, vec![Edge::new(0, 1, None)]);
    assert_eq!(diagram.diagnostics.len(), 2);
}

#[test]
fn test_levels_increase_along_forward_edges() {
    let source = "ts()\nd<Ok?>\np[Left]\np[Right]\np[Join]\nte()\n...\n\
                  ts()\na>\nd<Ok?>\nma>[\np[Left]\np[Right]\n]\np[Join] ma<[\np[Left]\np[Right]\n]\n\
                  p[Join]\na>\nte()\nte() a>!ts()";
    let mut diagram = parse(source);
    let levels = layout(&mut diagram.nodes, &mut diagram.edges, &LayoutConfig::default());
    for edge in diagram.edges.iter().filter(|e| !e.is_back_reference) {
        assert!(levels.get(edge.to) > levels.get(edge.from), "{:?}", edge);
    }
    assert_eq!(levels.get(5), 4);
    // Rows never overlap
    for a in &diagram.nodes {
        for b in &diagram.nodes {
            if a.id < b.id && a.y == b.y {
                assert!(a.bounds().right() <= b.x || b.bounds().right() <= a.x);
            }
        }
    }
}
