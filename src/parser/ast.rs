//! Data model produced by the parser: blocks (nodes) and connections (edges)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::layout::{BoundingBox, Point};
use crate::theme::Palette;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Identifier of a block, assigned sequentially in declaration order
pub type NodeId = usize;

/// Kind of flowchart block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    TerminatorStart,
    TerminatorEnd,
    Terminator,
    Process,
    Decision,
    Io,
    Connector,
    SubBlock,
}

impl NodeKind {
    pub const ALL: [NodeKind; 8] = [
        NodeKind::TerminatorStart,
        NodeKind::TerminatorEnd,
        NodeKind::Terminator,
        NodeKind::Process,
        NodeKind::Decision,
        NodeKind::Io,
        NodeKind::Connector,
        NodeKind::SubBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::TerminatorStart => "terminator_start",
            NodeKind::TerminatorEnd => "terminator_end",
            NodeKind::Terminator => "terminator",
            NodeKind::Process => "process",
            NodeKind::Decision => "decision",
            NodeKind::Io => "io",
            NodeKind::Connector => "connector",
            NodeKind::SubBlock => "sub_block",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Whether the block's label can be edited inline
    ///
    /// `ts()` and `te()` carry no text in their notation, so a new label
    /// could not be written back to the source.
    pub fn has_editable_text(&self) -> bool {
        !matches!(
            self,
            NodeKind::TerminatorStart | NodeKind::TerminatorEnd | NodeKind::Connector | NodeKind::SubBlock
        )
    }

    /// Whether the block's label wraps over several lines
    pub fn wraps_text(&self) -> bool {
        matches!(
            self,
            NodeKind::Process | NodeKind::Terminator | NodeKind::Io | NodeKind::Decision
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position tag of a composite block field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubField {
    TopMiddle,
    BottomMiddle,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl SubField {
    pub const ALL: [SubField; 6] = [
        SubField::TopMiddle,
        SubField::BottomMiddle,
        SubField::TopLeft,
        SubField::TopRight,
        SubField::BottomLeft,
        SubField::BottomRight,
    ];

    /// The two-letter tag used in `B{ *tm:... }` notation
    pub fn tag(&self) -> &'static str {
        match self {
            SubField::TopMiddle => "tm",
            SubField::BottomMiddle => "bm",
            SubField::TopLeft => "tl",
            SubField::TopRight => "tr",
            SubField::BottomLeft => "bl",
            SubField::BottomRight => "br",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.tag() == tag)
    }
}

/// Text of a composite block keyed by position
pub type SubFields = BTreeMap<SubField, String>;

/// A flowchart block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_fields: Option<SubFields>,
    /// Trimmed source snippet that declared this block
    pub source_token: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_override: Option<Palette>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_override: Option<NodeKind>,
}

impl Node {
    pub fn new(
        id: NodeId,
        kind: NodeKind,
        text: impl Into<String>,
        source_token: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
            sub_fields: None,
            source_token: source_token.into(),
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            style_override: None,
            shape_override: None,
        }
    }

    pub fn with_sub_fields(mut self, fields: SubFields) -> Self {
        self.sub_fields = Some(fields);
        self
    }

    /// Kind used for drawing: the shape override if set, else the real kind
    pub fn shape(&self) -> NodeKind {
        self.shape_override.unwrap_or(self.kind)
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    pub fn sub_field(&self, field: SubField) -> Option<&str> {
        self.sub_fields
            .as_ref()
            .and_then(|fields| fields.get(&field))
            .map(String::as_str)
    }
}

/// A directed connection between two blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub is_back_reference: bool,
}

impl Edge {
    pub fn new(from: NodeId, to: NodeId, label: Option<String>) -> Self {
        Self {
            from,
            to,
            label,
            is_back_reference: false,
        }
    }

    pub fn back_reference(from: NodeId, to: NodeId, label: Option<String>) -> Self {
        Self {
            is_back_reference: true,
            ..Self::new(from, to, label)
        }
    }

    /// Whether two edges connect the same blocks with the same label
    pub fn same_connection(&self, other: &Edge) -> bool {
        self.from == other.from && self.to == other.to && self.label == other.label
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}

/// Direction of an arrow notation: `>` or `<`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Result of parsing a source text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diagram {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Lines skipped and references dropped while parsing
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagram {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
