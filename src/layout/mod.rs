//! Layout engine for computing block sizes and positions
//!
//! Blocks are measured, assigned levels along the longest forward path,
//! spread horizontally by the widths of their subtrees, and stacked level by
//! level from the top. Layout is total: an empty diagram is left as is and
//! cycles are broken by demoting edges to back-references.

pub mod config;
pub mod levels;
pub mod measure;
pub mod placement;
pub mod types;
pub mod viewport;

pub use config::LayoutConfig;
pub use levels::{assign_levels, Levels};
pub use measure::{label_lines, measure_node, text_width, wrap_text};
pub use types::*;
pub use viewport::Viewport;

use crate::parser::{Edge, Node};

/// Measure and place every block
///
/// Edges that close a cycle get `is_back_reference` set.
pub fn layout(nodes: &mut [Node], edges: &mut [Edge], config: &LayoutConfig) -> Levels {
    if nodes.is_empty() {
        return Levels::default();
    }
    measure::measure_all(nodes, config);
    arrange(nodes, edges, config)
}

/// Place blocks again without touching their sizes
pub fn arrange(nodes: &mut [Node], edges: &mut [Edge], config: &LayoutConfig) -> Levels {
    if nodes.is_empty() {
        return Levels::default();
    }
    let levels = assign_levels(nodes, edges);
    placement::place(nodes, edges, &levels, config);
    log::debug!(
        "laid out {} blocks on {} levels ({} cycle edges)",
        nodes.len(),
        levels.max().map_or(0, |l| l + 1),
        levels.reclassified.len()
    );
    levels
}

/// Smallest box around all blocks
pub fn bounds(nodes: &[Node]) -> Option<BoundingBox> {
    nodes
        .iter()
        .map(Node::bounds)
        .reduce(|acc, b| acc.union(&b))
}
