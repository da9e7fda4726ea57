//! Declaration phase: one block per line

use super::ast::{NodeKind, SubField, SubFields};
use super::grammar::{self, Block};
use super::text::{extract_text, parse_sub_fields};
use super::{DiagramBuilder, SourceLine};
use crate::error::Diagnostic;

pub(super) fn declare(builder: &mut DiagramBuilder, lines: &[SourceLine<'_>]) {
    let mut lines = lines.iter();
    while let Some(line) = lines.next() {
        let mut token = line.text.to_string();
        let mut span = line.span.clone();

        // A sub-block may spread over several lines until its braces balance
        if token.starts_with("B{") {
            let mut depth = brace_depth(line.text);
            while depth > 0 {
                let Some(next) = lines.next() else { break };
                token.push(' ');
                token.push_str(next.text);
                span.end = next.span.end;
                depth += brace_depth(next.text);
            }
        }

        match grammar::parse_block(&token) {
            Some(block) => {
                let (kind, text, sub_fields) = block_parts(block);
                builder.declare(kind, text, &token, sub_fields);
            }
            None => builder.warn(Diagnostic::UnrecognizedBlock { text: token, span }),
        }
    }
}

fn brace_depth(text: &str) -> i32 {
    text.chars().fold(0, |depth, c| match c {
        '{' => depth + 1,
        '}' => depth - 1,
        _ => depth,
    })
}

fn block_parts(block: Block) -> (NodeKind, String, Option<SubFields>) {
    match block {
        Block::Start => (NodeKind::TerminatorStart, "Start".to_string(), None),
        Block::End => (NodeKind::TerminatorEnd, "End".to_string(), None),
        Block::Connector => (NodeKind::Connector, String::new(), None),
        Block::Terminator(payload) => (NodeKind::Terminator, extract_text(&payload), None),
        Block::Process(payload) => (NodeKind::Process, extract_text(&payload), None),
        Block::Io(payload) => (NodeKind::Io, extract_text(&payload), None),
        Block::Decision(payload) => (NodeKind::Decision, extract_text(&payload), None),
        Block::SubBlock(content) => {
            let fields = parse_sub_fields(&content);
            let text = fields
                .get(&SubField::TopMiddle)
                .or_else(|| fields.get(&SubField::TopLeft))
                .cloned()
                .unwrap_or_else(|| "Block".to_string());
            (NodeKind::SubBlock, text, Some(fields))
        }
    }
}
