//! The editable scene: blocks, connections and transient interaction state

use serde::{Deserialize, Serialize};

use crate::layout::{self, BoundingBox, Point};
use crate::parser::{Diagram, Edge, Node, NodeId};

/// What the user has selected; at most one thing at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Selection {
    Node(NodeId),
    /// Index into the scene's edge list
    Edge(usize),
}

/// A block being dragged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub node: NodeId,
    /// Block position when the pointer went down
    pub origin: Point,
    /// Pointer position (logical) when it went down
    pub grab: Point,
    /// Set once the pointer travelled past the click threshold
    pub active: bool,
}

/// Deep copy of the scene data, the unit of undo
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    selection: Option<Selection>,
    drag: Option<DragState>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from parser output
    ///
    /// Connections to blocks that do not exist are dropped and repeated
    /// connections collapse to the first one.
    pub fn from_diagram(diagram: Diagram) -> Self {
        let mut scene = Scene {
            nodes: diagram.nodes,
            ..Self::default()
        };
        for edge in diagram.edges {
            scene.add_edge(edge);
        }
        scene
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Both collections at once, for layout
    pub fn parts_mut(&mut self) -> (&mut [Node], &mut [Edge]) {
        (&mut self.nodes, &mut self.edges)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, index: usize) -> Option<&Edge> {
        self.edges.get(index)
    }

    pub fn edge_mut(&mut self, index: usize) -> Option<&mut Edge> {
        self.edges.get_mut(index)
    }

    /// Add a block under a fresh id, which is returned
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = self.nodes.iter().map(|n| n.id + 1).max().unwrap_or(0);
        node.id = id;
        self.nodes.push(node);
        id
    }

    /// Add a connection unless an endpoint is missing or it already exists
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if self.node(edge.from).is_none() || self.node(edge.to).is_none() {
            log::debug!("dropping dangling connection {} -> {}", edge.from, edge.to);
            return false;
        }
        if self.edges.iter().any(|e| e.same_connection(&edge)) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Remove a block and every connection touching it
    pub fn delete_node(&mut self, id: NodeId) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);
        self.edges.retain(|e| !e.touches(id));
        self.selection = None;
        self.drag = None;
        Some(node)
    }

    pub fn delete_edge(&mut self, index: usize) -> Option<Edge> {
        if index >= self.edges.len() {
            return None;
        }
        self.selection = None;
        Some(self.edges.remove(index))
    }

    /// Smallest box around all blocks
    pub fn bounds(&self) -> Option<BoundingBox> {
        layout::bounds(&self.nodes)
    }

    /// Topmost block under a logical point
    pub fn node_at(&self, point: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|n| n.bounds().contains(point))
            .map(|n| n.id)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Replace the data with a snapshot; selection and drag are dropped
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.nodes = snapshot.nodes;
        self.edges = snapshot.edges;
        self.selection = None;
        self.drag = None;
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Change the selection; returns whether it changed
    pub fn select(&mut self, selection: Option<Selection>) -> bool {
        let valid = match selection {
            Some(Selection::Node(id)) => self.node(id).is_some(),
            Some(Selection::Edge(index)) => index < self.edges.len(),
            None => true,
        };
        let selection = if valid { selection } else { None };
        if self.selection == selection {
            return false;
        }
        self.selection = selection;
        true
    }

    pub fn is_selected_node(&self, id: NodeId) -> bool {
        self.selection == Some(Selection::Node(id))
    }

    pub fn is_selected_edge(&self, index: usize) -> bool {
        self.selection == Some(Selection::Edge(index))
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn drag_mut(&mut self) -> Option<&mut DragState> {
        self.drag.as_mut()
    }

    pub fn start_drag(&mut self, node: NodeId, grab: Point) -> bool {
        let Some(origin) = self.node(node).map(|n| Point::new(n.x, n.y)) else {
            return false;
        };
        self.drag = Some(DragState {
            node,
            origin,
            grab,
            active: false,
        });
        true
    }

    pub fn end_drag(&mut self) -> Option<DragState> {
        self.drag.take()
    }
}
