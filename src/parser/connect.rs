//! Structure phase: arrows, back-references and groups

use std::slice::Iter;

use super::ast::NodeId;
use super::grammar::{self, Arrow};
use super::{skip_normalized, DiagramBuilder, SourceLine};
use crate::error::Diagnostic;

pub(super) fn connect(builder: &mut DiagramBuilder, lines: &[SourceLine<'_>]) {
    let mut walker = Walker {
        builder,
        previous: None,
        pending: None,
    };
    let mut lines = lines.iter();
    while let Some(line) = lines.next() {
        walker.statement(line, &mut lines);
    }
}

/// Cursor state while walking the structure lines
struct Walker<'b> {
    builder: &'b mut DiagramBuilder,
    previous: Option<NodeId>,
    pending: Option<Arrow>,
}

impl Walker<'_> {
    fn statement<'s, 'a>(&mut self, line: &SourceLine<'a>, rest: &mut Iter<'s, SourceLine<'a>>) {
        if self.inline_back_reference(line) {
            return;
        }

        if let Some((arrow, target)) = grammar::parse_back_reference(line.text) {
            self.pending = None;
            match (self.previous.take(), self.builder.resolve(&target)) {
                (Some(source), Some(target)) => self.builder.link(source, target, &arrow, true),
                (None, _) => self.builder.warn(Diagnostic::MissingSource {
                    span: line.span.clone(),
                }),
                (_, None) => self.unresolved(target, line),
            }
            return;
        }

        if let Some(arrow) = grammar::parse_group_open(line.text) {
            let anchor = self.previous;
            if anchor.is_none() {
                self.builder.warn(Diagnostic::MissingSource {
                    span: line.span.clone(),
                });
            }
            let body = self.group_body(line, rest);
            self.group(anchor, &arrow, &body);
            return;
        }

        if let Some((reference, arrow)) = split_merge(line.text) {
            let anchor = match self.builder.resolve(reference) {
                Some(anchor) => {
                    self.arrive(anchor);
                    Some(anchor)
                }
                None => {
                    self.unresolved(reference.to_string(), line);
                    self.previous
                }
            };
            let body = self.group_body(line, rest);
            self.group(anchor, &arrow, &body);
            return;
        }

        if let Some(arrow) = grammar::parse_arrow(line.text) {
            self.pending = Some(arrow);
            return;
        }

        if let Some((node, _)) = self.builder.longest_prefix(line.text) {
            self.arrive(node);
            return;
        }

        self.builder.warn(Diagnostic::UnrecognizedStatement {
            text: line.text.to_string(),
            span: line.span.clone(),
        });
    }

    /// `<ref><arrow>!<target>` on one line
    fn inline_back_reference(&mut self, line: &SourceLine<'_>) -> bool {
        let Some((source, len)) = self.builder.longest_prefix(line.text) else {
            return false;
        };
        let remainder = skip_normalized(line.text, len).trim();
        let Some((arrow, target)) = grammar::parse_back_reference(remainder) else {
            return false;
        };

        self.arrive(source);
        match self.builder.resolve(&target) {
            Some(target) => self.builder.link(source, target, &arrow, true),
            None => self.unresolved(target, line),
        }
        self.previous = None;
        true
    }

    /// Make `node` the current block, completing a pending arrow into it
    fn arrive(&mut self, node: NodeId) {
        if let (Some(previous), Some(arrow)) = (self.previous, self.pending.take()) {
            self.builder.link(previous, node, &arrow, false);
        }
        self.pending = None;
        self.previous = Some(node);
    }

    /// Collect group lines up to the closing `]`
    fn group_body<'s, 'a>(
        &mut self,
        open: &SourceLine<'a>,
        rest: &mut Iter<'s, SourceLine<'a>>,
    ) -> Vec<&'s SourceLine<'a>> {
        let mut body = Vec::new();
        for line in rest.by_ref() {
            if line.text == "]" {
                return body;
            }
            body.push(line);
        }
        self.builder.warn(Diagnostic::UnclosedGroup {
            span: open.span.clone(),
        });
        body
    }

    /// Connect each group member to the anchor
    ///
    /// An arrow line inside the group labels the next member only; members
    /// without one take the group label.
    fn group(&mut self, anchor: Option<NodeId>, group: &Arrow, body: &[&SourceLine<'_>]) {
        let mut label: Option<String> = None;
        for line in body {
            if let Some(arrow) = grammar::parse_arrow(line.text) {
                label = arrow.label;
                continue;
            }
            let own_label = label.take();
            let Some(member) = self.builder.resolve(line.text) else {
                self.unresolved(line.text.to_string(), line);
                continue;
            };
            if let Some(anchor) = anchor {
                let arrow = Arrow {
                    label: own_label.or_else(|| group.label.clone()),
                    direction: group.direction,
                };
                self.builder.link(anchor, member, &arrow, false);
            }
        }
    }

    fn unresolved(&mut self, token: String, line: &SourceLine<'_>) {
        let suggestions = self.builder.suggest(&token);
        self.builder.warn(Diagnostic::UnresolvedReference {
            token,
            span: line.span.clone(),
            suggestions,
        });
    }
}

/// Split `<ref>ma...[` into the reference and the group arrow
fn split_merge(line: &str) -> Option<(&str, Arrow)> {
    line.match_indices("ma")
        .filter(|(index, _)| *index > 0)
        .find_map(|(index, _)| {
            let reference = line[..index].trim();
            let arrow = grammar::parse_group_open(&line[index..])?;
            (!reference.is_empty()).then_some((reference, arrow))
        })
}

#[cfg(test)]
mod tests {
    use crate::error::Diagnostic;
    use crate::parser::{parse, Edge};
    use pretty_assertions::assert_eq;

    const DECLARATIONS: &str = "ts()\np[\"Ask\"]\nd<\"Ok?\">\np[\"Retry\"]\nte()\n";

    fn edges_of(structure: &str) -> Vec<Edge> {
        parse(&format!("{}...\n{}", DECLARATIONS, structure)).edges
    }

    fn edge(from: usize, to: usize, label: Option<&str>) -> Edge {
        Edge::new(from, to, label.map(str::to_string))
    }

    fn back(from: usize, to: usize, label: Option<&str>) -> Edge {
        Edge::back_reference(from, to, label.map(str::to_string))
    }

    #[test]
    fn test_sequential_chain() {
        let edges = edges_of("ts()\na>\np[\"Ask\"]\na*Go*>\nd<\"Ok?\">");
        assert_eq!(edges, vec![edge(0, 1, None), edge(1, 2, Some("Go"))]);
    }

    #[test]
    fn test_backward_arrow_reverses_edge() {
        let edges = edges_of("p[\"Ask\"]\na<\nte()");
        assert_eq!(edges, vec![edge(4, 1, None)]);
    }

    #[test]
    fn test_standalone_back_reference() {
        let edges = edges_of("p[\"Retry\"]\na*again*>!p[\"Ask\"]\nte()");
        assert_eq!(edges, vec![back(3, 1, Some("again"))]);
    }

    #[test]
    fn test_standalone_back_reference_resets_previous() {
        let edges = edges_of("p[\"Retry\"]\na>!p[\"Ask\"]\na>\nte()");
        // No block was current when `te()` arrived
        assert_eq!(edges, vec![back(3, 1, None)]);
    }

    #[test]
    fn test_inline_back_reference() {
        let edges = edges_of("d<\"Ok?\">\na*No*>\np[ \"Retry\" ] a>!p[\"Ask\"]");
        assert_eq!(edges, vec![edge(2, 3, Some("No")), back(3, 1, None)]);
    }

    #[test]
    fn test_inline_back_reference_backward() {
        let edges = edges_of("p[\"Retry\"]a<!ts()");
        assert_eq!(edges, vec![back(0, 3, None)]);
    }

    #[test]
    fn test_branch_out_group() {
        let structure = "d<\"Ok?\">\nma*Maybe*>[\na*Yes*\nte()\np[\"Retry\"]\n]\n";
        let edges = edges_of(structure);
        assert_eq!(
            edges,
            vec![edge(2, 4, Some("Yes")), edge(2, 3, Some("Maybe"))]
        );
    }

    #[test]
    fn test_branch_out_keeps_previous() {
        let edges = edges_of("p[\"Ask\"]\nma>[\nte()\n]\na>\nd<\"Ok?\">");
        assert_eq!(edges, vec![edge(1, 4, None), edge(1, 2, None)]);
    }

    #[test]
    fn test_merge_in_group() {
        let structure = "ts()\na>\nte() ma*done*<[\np[\"Ask\"]\np[\"Retry\"]\n]";
        let edges = edges_of(structure);
        assert_eq!(
            edges,
            vec![
                edge(0, 4, None),
                edge(1, 4, Some("done")),
                edge(3, 4, Some("done")),
            ]
        );
    }

    #[test]
    fn test_unclosed_group_runs_to_end() {
        let diagram = parse(&format!("{}...\nts()\nma>[\np[\"Ask\"]\nte()", DECLARATIONS));
        assert_eq!(diagram.edges, vec![edge(0, 1, None), edge(0, 4, None)]);
        assert!(matches!(
            diagram.diagnostics.as_slice(),
            [Diagnostic::UnclosedGroup { .. }]
        ));
    }

    #[test]
    fn test_dangling_references_are_dropped() {
        let diagram = parse(&format!(
            "{}...\nts()\na>\np[\"Nope\"]\na>!p[\"Gone\"]",
            DECLARATIONS
        ));
        assert!(diagram.edges.is_empty());
        assert_eq!(diagram.diagnostics.len(), 2);
        assert!(diagram
            .diagnostics
            .iter()
            .all(|d| matches!(d, Diagnostic::UnrecognizedStatement { .. } | Diagnostic::UnresolvedReference { .. })));
    }

    #[test]
    fn test_typo_gets_a_suggestion() {
        let diagram = parse(&format!("{}...\np[\"Retry\"]\na>!p[\"Ak\"]", DECLARATIONS));
        match diagram.diagnostics.as_slice() {
            [Diagnostic::UnresolvedReference { suggestions, .. }] => {
                assert_eq!(suggestions, &vec![r#"p["Ask"]"#.to_string()]);
            }
            other => panic!("unexpected diagnostics: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_connections_collapse() {
        let edges = edges_of("ts()\na>\np[\"Ask\"]\nts()\na>\np[\"Ask\"]");
        assert_eq!(edges, vec![edge(0, 1, None)]);
    }
}
