//! Parser for Bridge notation
//!
//! A source text has two phases separated by a line of dots. The first phase
//! declares one block per line, the second wires declared blocks together
//! with arrows, back-references and groups:
//!
//! ```text
//! ts()
//! p["Check login"]
//! d<"Valid?">
//! te()
//! ...
//! ts()
//! a>
//! p["Check login"]
//! a>
//! d<"Valid?">
//! a*Yes*>
//! te()
//! ```
//!
//! Parsing is total. Lines that match no notation are skipped and references
//! to undeclared blocks are dropped; both are recorded as diagnostics.

pub mod ast;
mod connect;
mod declare;
mod grammar;
mod source;
mod text;

pub use ast::*;
pub use source::{rewrite_token, NodeEdit};

use crate::error::Diagnostic;
use grammar::Arrow;

/// Parse a source text into blocks, connections and diagnostics
pub fn parse(source: &str) -> Diagram {
    let lines = SourceLine::split(source);
    let separator = lines.iter().position(SourceLine::is_separator);
    let (declarations, structure) = match separator {
        Some(index) => (&lines[..index], &lines[index + 1..]),
        None => (&lines[..], &lines[lines.len()..]),
    };

    let mut builder = DiagramBuilder::default();
    declare::declare(&mut builder, declarations);
    connect::connect(&mut builder, structure);
    let diagram = builder.finish();

    log::debug!(
        "parsed {} blocks, {} connections, {} diagnostics",
        diagram.nodes.len(),
        diagram.edges.len(),
        diagram.diagnostics.len()
    );
    diagram
}

/// Remove all whitespace so tokens compare regardless of spacing
pub(crate) fn normalize(token: &str) -> String {
    token.chars().filter(|c| !c.is_whitespace()).collect()
}

/// A trimmed, non-empty source line with its byte span
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourceLine<'a> {
    pub text: &'a str,
    pub span: Span,
}

impl<'a> SourceLine<'a> {
    fn split(source: &'a str) -> Vec<SourceLine<'a>> {
        let mut offset = 0;
        let mut lines = Vec::new();
        for raw in source.split_inclusive('\n') {
            let text = raw.trim();
            if !text.is_empty() {
                let start = offset + (raw.len() - raw.trim_start().len());
                lines.push(SourceLine {
                    text,
                    span: start..start + text.len(),
                });
            }
            offset += raw.len();
        }
        lines
    }

    fn is_separator(&self) -> bool {
        self.text.chars().all(|c| c == '.')
    }
}

/// Accumulates blocks and connections while both phases run
#[derive(Debug, Default)]
pub(crate) struct DiagramBuilder {
    nodes: Vec<Node>,
    /// Normalized source token of each node, indexed by id
    keys: Vec<String>,
    edges: Vec<Edge>,
    diagnostics: Vec<Diagnostic>,
}

impl DiagramBuilder {
    /// Add a block, or return the existing block with the same token
    pub fn declare(
        &mut self,
        kind: NodeKind,
        text: String,
        token: &str,
        sub_fields: Option<SubFields>,
    ) -> NodeId {
        let key = normalize(token);
        if let Some(id) = self.keys.iter().position(|k| *k == key) {
            return id;
        }
        let id = self.nodes.len();
        let mut node = Node::new(id, kind, text, token);
        node.sub_fields = sub_fields;
        self.nodes.push(node);
        self.keys.push(key);
        id
    }

    /// Block whose token equals `token`, ignoring whitespace
    pub fn resolve(&self, token: &str) -> Option<NodeId> {
        let key = normalize(token);
        self.keys.iter().position(|k| *k == key)
    }

    /// Block with the longest token that prefixes `line`, ignoring whitespace
    ///
    /// Returns the block and the normalized length of its token. On equal
    /// lengths the earliest declared block wins.
    pub fn longest_prefix(&self, line: &str) -> Option<(NodeId, usize)> {
        let line_key = normalize(line);
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, key)| !key.is_empty() && line_key.starts_with(key.as_str()))
            .fold(None, |best, (id, key)| match best {
                Some((_, len)) if len >= key.len() => best,
                _ => Some((id, key.len())),
            })
    }

    /// Connect `anchor` and `other` as the arrow says: `>` runs from the
    /// anchor, `<` runs into it
    pub fn link(&mut self, anchor: NodeId, other: NodeId, arrow: &Arrow, back_reference: bool) {
        let (from, to) = match arrow.direction {
            Direction::Forward => (anchor, other),
            Direction::Backward => (other, anchor),
        };
        let edge = Edge {
            from,
            to,
            label: arrow.label.clone(),
            is_back_reference: back_reference,
        };
        if self.edges.iter().any(|e| e.same_connection(&edge)) {
            log::debug!("skipping duplicate connection {} -> {}", from, to);
            return;
        }
        self.edges.push(edge);
    }

    /// Declared tokens within two edits of `token`, closest first
    pub fn suggest(&self, token: &str) -> Vec<String> {
        let key = normalize(token);
        let mut candidates: Vec<(usize, NodeId)> = self
            .keys
            .iter()
            .enumerate()
            .filter_map(|(id, k)| {
                let dist = levenshtein_distance(k, &key);
                (dist > 0 && dist <= 2).then_some((dist, id))
            })
            .collect();
        candidates.sort();
        candidates
            .into_iter()
            .take(3)
            .map(|(_, id)| self.nodes[id].source_token.clone())
            .collect()
    }

    pub fn warn(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn finish(self) -> Diagram {
        Diagram {
            nodes: self.nodes,
            edges: self.edges,
            diagnostics: self.diagnostics,
        }
    }
}

/// The part of `line` after its first `normalized_len` non-whitespace bytes
pub(crate) fn skip_normalized(line: &str, normalized_len: usize) -> &str {
    let mut consumed = 0;
    for (index, c) in line.char_indices() {
        if consumed >= normalized_len {
            return &line[index..];
        }
        if !c.is_whitespace() {
            consumed += c.len_utf8();
        }
    }
    ""
}

/// Compute Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    // Single rolling row over b
    let mut row: Vec<usize> = (0..=b_chars.len()).collect();
    for (i, ca) in a_chars.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }
    row[b_chars.len()]
}
