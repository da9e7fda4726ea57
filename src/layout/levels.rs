//! Longest-path level assignment with cycle breaking

use std::collections::HashMap;

use crate::parser::{Edge, Node, NodeId};

/// Levels of every block plus the connections demoted to back-references
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Levels {
    levels: HashMap<NodeId, usize>,
    /// Indices of edges reclassified as back-references
    pub reclassified: Vec<usize>,
}

impl Levels {
    pub fn get(&self, node: NodeId) -> usize {
        self.levels.get(&node).copied().unwrap_or(0)
    }

    /// Highest level in use, or `None` without blocks
    pub fn max(&self) -> Option<usize> {
        self.levels.values().copied().max()
    }
}

/// Assign each block the length of the longest forward path into it
///
/// Forward edges push their target one level below their source until
/// nothing changes. Inside a cycle the levels keep climbing, so an edge
/// whose push would pass the block count is flagged as a back-reference
/// when it closes a cycle, and the levels are recomputed from scratch
/// without it. Edges that merely hang off a cycle stay forward.
pub fn assign_levels(nodes: &[Node], edges: &mut [Edge]) -> Levels {
    let index: HashMap<NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id, i))
        .collect();
    let limit = nodes.len();
    let mut reclassified = Vec::new();

    loop {
        let mut levels = vec![0usize; nodes.len()];
        let mut demote = None;
        let mut changed = true;
        'relax: while changed {
            changed = false;
            for (edge_index, edge) in edges.iter().enumerate() {
                if edge.is_back_reference {
                    continue;
                }
                let (Some(&from), Some(&to)) = (index.get(&edge.from), index.get(&edge.to)) else {
                    continue;
                };
                let raised = levels[from] + 1;
                if raised <= levels[to] {
                    continue;
                }
                if raised > limit {
                    if closes_cycle(edges, &index, from, to) {
                        demote = Some(edge_index);
                        break 'relax;
                    }
                    continue;
                }
                levels[to] = raised;
                changed = true;
            }
        }

        match demote {
            Some(edge_index) => {
                let edge = &mut edges[edge_index];
                log::debug!("breaking cycle at connection {} -> {}", edge.from, edge.to);
                edge.is_back_reference = true;
                reclassified.push(edge_index);
            }
            None => {
                let levels = nodes
                    .iter()
                    .zip(levels)
                    .map(|(node, level)| (node.id, level))
                    .collect();
                return Levels {
                    levels,
                    reclassified,
                };
            }
        }
    }
}

/// Whether `to` reaches `from` over the remaining forward edges
fn closes_cycle(edges: &[Edge], index: &HashMap<NodeId, usize>, from: usize, to: usize) -> bool {
    let mut seen = vec![false; index.len()];
    let mut stack = vec![to];
    while let Some(current) = stack.pop() {
        if current == from {
            return true;
        }
        if std::mem::replace(&mut seen[current], true) {
            continue;
        }
        stack.extend(
            edges
                .iter()
                .filter(|edge| !edge.is_back_reference)
                .filter_map(|edge| match (index.get(&edge.from), index.get(&edge.to)) {
                    (Some(&a), Some(&b)) if a == current => Some(b),
                    _ => None,
                }),
        );
    }
    false
}
