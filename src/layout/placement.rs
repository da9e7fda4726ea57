//! Tree-based horizontal placement and level rows

use std::collections::{BTreeMap, HashMap};

use super::config::LayoutConfig;
use super::levels::Levels;
use crate::parser::{Edge, Node, NodeId};

/// Assign `x`/`y` to every block from its level and its primary parent
///
/// Sizes must already be set.
pub fn place(nodes: &mut [Node], edges: &[Edge], levels: &Levels, config: &LayoutConfig) {
    if nodes.is_empty() {
        return;
    }
    let gap = config.horizontal_gap;
    let widths: HashMap<NodeId, f64> = nodes.iter().map(|n| (n.id, n.width)).collect();

    // Primary parent: the first forward edge into a block
    let mut parent: HashMap<NodeId, NodeId> = HashMap::new();
    let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for edge in edges.iter().filter(|e| !e.is_back_reference) {
        if edge.from == edge.to
            || parent.contains_key(&edge.to)
            || !widths.contains_key(&edge.from)
            || !widths.contains_key(&edge.to)
        {
            continue;
        }
        parent.insert(edge.to, edge.from);
        children.entry(edge.from).or_default().push(edge.to);
    }

    // Children sit on deeper levels than their parent, so bottom-up order
    // is descending level
    let mut bottom_up: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
    bottom_up.sort_by_key(|id| std::cmp::Reverse(levels.get(*id)));
    let mut subtree: HashMap<NodeId, f64> = HashMap::new();
    for id in bottom_up {
        let own = widths[&id] + gap;
        let kids: f64 = children
            .get(&id)
            .map_or(0.0, |kids| kids.iter().map(|k| subtree.get(k).copied().unwrap_or(0.0)).sum());
        subtree.insert(id, own.max(kids));
    }

    let mut roots: Vec<NodeId> = nodes
        .iter()
        .map(|n| n.id)
        .filter(|id| !parent.contains_key(id))
        .collect();
    if roots.is_empty() {
        roots.push(nodes[0].id);
    }

    let mut center_x: HashMap<NodeId, f64> = HashMap::new();
    let mut stack: Vec<(NodeId, f64)> = Vec::new();
    let total: f64 = roots.iter().map(|r| subtree[r]).sum();
    let mut cursor = -total / 2.0;
    for root in &roots {
        stack.push((*root, cursor + subtree[root] / 2.0));
        cursor += subtree[root];
    }
    while let Some((id, center)) = stack.pop() {
        if center_x.insert(id, center).is_some() {
            continue;
        }
        let Some(kids) = children.get(&id) else {
            continue;
        };
        let span: f64 = kids.iter().map(|k| subtree[k]).sum();
        let mut cursor = center - span / 2.0;
        for kid in kids {
            stack.push((*kid, cursor + subtree[kid] / 2.0));
            cursor += subtree[kid];
        }
    }

    // Rows by level, pushed apart where neighbours overlap
    let mut rows: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
        rows.entry(levels.get(node.id)).or_default().push(index);
    }
    let mut y = config.top_margin;
    for row in rows.values_mut() {
        let cx = |i: &usize| center_x.get(&nodes[*i].id).copied().unwrap_or(0.0);
        row.sort_by(|a, b| cx(a).total_cmp(&cx(b)));

        let mut previous: Option<(f64, f64)> = None;
        let mut tallest: f64 = 0.0;
        for &index in row.iter() {
            let node = &mut nodes[index];
            let mut center = center_x.get(&node.id).copied().unwrap_or(0.0);
            if let Some((prev_center, prev_width)) = previous {
                let min_distance = prev_width / 2.0 + node.width / 2.0 + gap;
                if center - prev_center < min_distance {
                    center = prev_center + min_distance;
                }
            }
            node.x = center - node.width / 2.0;
            node.y = y;
            tallest = tallest.max(node.height);
            previous = Some((center, node.width));
        }
        y += tallest + config.vertical_gap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::levels::assign_levels;
    use crate::parser::NodeKind;

    fn sized_nodes(count: usize) -> Vec<Node> {
        (0..count)
            .map(|id| {
                let mut node = Node::new(id, NodeKind::Process, format!("n{}", id), "");
                node.width = 100.0;
                node.height = 50.0;
                node
            })
            .collect()
    }

    fn run(nodes: &mut [Node], edges: &mut [Edge]) {
        let config = LayoutConfig::default();
        let levels = assign_levels(nodes, edges);
        place(nodes, edges, &levels, &config);
    }

    #[test]
    fn test_chain_is_vertical_and_centered() {
        let mut nodes = sized_nodes(3);
        let mut edges = vec![Edge::new(0, 1, None), Edge::new(1, 2, None)];
        run(&mut nodes, &mut edges);
        for node in &nodes {
            assert_eq!(node.center().x, 0.0);
        }
        assert_eq!(nodes[0].y, 60.0);
        assert_eq!(nodes[1].y, 170.0);
        assert_eq!(nodes[2].y, 280.0);
    }

    #[test]
    fn test_siblings_split_parent_span() {
        let mut nodes = sized_nodes(3);
        let mut edges = vec![Edge::new(0, 1, None), Edge::new(0, 2, None)];
        run(&mut nodes, &mut edges);
        // Each child subtree is 180 wide, the pair is centered under the root
        assert_eq!(nodes[0].center().x, 0.0);
        assert_eq!(nodes[1].center().x, -90.0);
        assert_eq!(nodes[2].center().x, 90.0);
        assert_eq!(nodes[1].y, nodes[2].y);
    }

    #[test]
    fn test_roots_side_by_side() {
        let mut nodes = sized_nodes(2);
        let mut edges = Vec::new();
        run(&mut nodes, &mut edges);
        assert_eq!(nodes[0].center().x, -90.0);
        assert_eq!(nodes[1].center().x, 90.0);
    }

    #[test]
    fn test_same_level_nodes_never_overlap() {
        // Two parents whose children land on the same level close together
        let mut nodes = sized_nodes(5);
        let mut edges = vec![
            Edge::new(0, 2, None),
            Edge::new(1, 3, None),
            Edge::new(1, 4, None),
            Edge::new(2, 4, None),
        ];
        run(&mut nodes, &mut edges);
        let mut row: Vec<&Node> = nodes.iter().filter(|n| n.y == nodes[3].y).collect();
        row.sort_by(|a, b| a.x.total_cmp(&b.x));
        for pair in row.windows(2) {
            assert!(pair[1].x >= pair[0].bounds().right() + 80.0 - 1e-9);
        }
    }
}
