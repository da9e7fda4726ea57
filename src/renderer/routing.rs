//! Edge routing: anchors, fan-out, curves and back-reference detours
//!
//! Edges leave the bottom center of their source and enter the top center of
//! their target. When several edges share an endpoint, their anchors are
//! spread horizontally, ordered by where the other end sits so that lines do
//! not cross right at the block.

use std::collections::{BTreeMap, HashMap};

use crate::layout::Point;
use crate::parser::{Edge, Node, NodeId};

/// Horizontal distance under which a forward edge is drawn straight
const STRAIGHT_THRESHOLD: f64 = 5.0;
/// Minimum and upward control point offset of forward curves
const CURVE_OFFSET: f64 = 40.0;
/// How far back-reference detours stay left of the blocks they pass
const DETOUR_MARGIN: f64 = 40.0;
/// Extra detour distance per back-reference, cycling every six edges
const DETOUR_STAGGER: f64 = 15.0;
/// Drop below the source before turning left
const DETOUR_DROP: f64 = 20.0;
/// Height above the target where the detour turns in
const DETOUR_ENTER: f64 = 12.0;
/// Segments used to flatten a curve for hit testing
const CURVE_SEGMENTS: usize = 16;

/// Geometry between the two anchors
#[derive(Debug, Clone, PartialEq)]
pub enum RouteShape {
    Straight,
    /// Cubic Bézier with two control points
    Curve { c1: Point, c2: Point },
    /// Axis-aligned polyline through these corners
    Orthogonal(Vec<Point>),
}

/// Which way an arrowhead points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    Down,
    Up,
}

/// A routed edge, in logical coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRoute {
    /// Index of the edge in the scene
    pub edge: usize,
    pub start: Point,
    pub end: Point,
    pub shape: RouteShape,
    pub arrow: ArrowDirection,
    pub back_reference: bool,
}

impl EdgeRoute {
    /// Where the label pill is centered: the middle of the chord
    pub fn label_position(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// SVG path data
    pub fn path_d(&self) -> String {
        let mut d = format!("M{} {}", num(self.start.x), num(self.start.y));
        match &self.shape {
            RouteShape::Straight => {}
            RouteShape::Curve { c1, c2 } => {
                d.push_str(&format!(
                    " C{} {}, {} {}, {} {}",
                    num(c1.x),
                    num(c1.y),
                    num(c2.x),
                    num(c2.y),
                    num(self.end.x),
                    num(self.end.y)
                ));
                return d;
            }
            RouteShape::Orthogonal(corners) => {
                for corner in corners {
                    d.push_str(&format!(" L{} {}", num(corner.x), num(corner.y)));
                }
            }
        }
        d.push_str(&format!(" L{} {}", num(self.end.x), num(self.end.y)));
        d
    }

    /// The route as a polyline; curves are sampled
    pub fn polyline(&self) -> Vec<Point> {
        match &self.shape {
            RouteShape::Straight => vec![self.start, self.end],
            RouteShape::Curve { c1, c2 } => (0..=CURVE_SEGMENTS)
                .map(|i| cubic_point(self.start, *c1, *c2, self.end, i as f64 / CURVE_SEGMENTS as f64))
                .collect(),
            RouteShape::Orthogonal(corners) => std::iter::once(self.start)
                .chain(corners.iter().copied())
                .chain(std::iter::once(self.end))
                .collect(),
        }
    }

    /// Shortest distance from `point` to the drawn route
    pub fn distance_to(&self, point: Point) -> f64 {
        self.polyline()
            .windows(2)
            .map(|w| point.distance_to_segment(w[0], w[1]))
            .fold(f64::INFINITY, f64::min)
    }

    /// Triangle with its tip on the end anchor
    pub fn arrow_head(&self, size: f64) -> [Point; 3] {
        let tip = self.end;
        let back = match self.arrow {
            ArrowDirection::Down => tip.y - size,
            ArrowDirection::Up => tip.y + size,
        };
        [
            tip,
            Point::new(tip.x - size / 2.0, back),
            Point::new(tip.x + size / 2.0, back),
        ]
    }
}

fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

/// Round for SVG output
pub(crate) fn num(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Horizontal anchor offsets per edge: (at source, at target)
///
/// Edges sharing an endpoint are ordered by the center x of their other
/// endpoint, back-references last, and spaced `spread` apart around zero.
pub fn anchor_offsets(nodes: &[Node], edges: &[Edge], spread: f64) -> HashMap<usize, (f64, f64)> {
    let centers: HashMap<NodeId, f64> = nodes.iter().map(|n| (n.id, n.center().x)).collect();
    let mut outgoing: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
    let mut incoming: BTreeMap<NodeId, Vec<usize>> = BTreeMap::new();
    for (index, edge) in edges.iter().enumerate() {
        if !centers.contains_key(&edge.from) || !centers.contains_key(&edge.to) {
            continue;
        }
        outgoing.entry(edge.from).or_default().push(index);
        incoming.entry(edge.to).or_default().push(index);
    }

    let mut offsets: HashMap<usize, (f64, f64)> = HashMap::new();
    let mut fan = |group: &mut Vec<usize>, other: fn(&Edge) -> NodeId, at_source: bool| {
        group.sort_by(|&a, &b| {
            let (ea, eb) = (&edges[a], &edges[b]);
            ea.is_back_reference
                .cmp(&eb.is_back_reference)
                .then(centers[&other(ea)].total_cmp(&centers[&other(eb)]))
        });
        let start = -((group.len() - 1) as f64 * spread) / 2.0;
        for (i, &index) in group.iter().enumerate() {
            let entry = offsets.entry(index).or_insert((0.0, 0.0));
            let offset = start + i as f64 * spread;
            if at_source {
                entry.0 = offset;
            } else {
                entry.1 = offset;
            }
        }
    };
    for group in outgoing.values_mut().filter(|g| g.len() > 1) {
        fan(group, |e| e.to, true);
    }
    for group in incoming.values_mut().filter(|g| g.len() > 1) {
        fan(group, |e| e.from, false);
    }
    offsets
}

/// Route every edge whose endpoints exist
pub fn route_edges(nodes: &[Node], edges: &[Edge], spread: f64) -> Vec<EdgeRoute> {
    let by_id: HashMap<NodeId, &Node> = nodes.iter().map(|n| (n.id, n)).collect();
    let offsets = anchor_offsets(nodes, edges, spread);
    edges
        .iter()
        .enumerate()
        .filter_map(|(index, edge)| {
            let from = by_id.get(&edge.from)?;
            let to = by_id.get(&edge.to)?;
            let (source_offset, target_offset) = offsets.get(&index).copied().unwrap_or((0.0, 0.0));
            let start = Point::new(from.center().x + source_offset, from.bounds().bottom());
            let end = Point::new(to.center().x + target_offset, to.y);
            Some(route(index, edge, start, end, nodes))
        })
        .collect()
}

fn route(index: usize, edge: &Edge, start: Point, end: Point, nodes: &[Node]) -> EdgeRoute {
    let dx = end.x - start.x;
    let dy = end.y - start.y;

    if edge.is_back_reference {
        let stagger = (index % 6) as f64 * DETOUR_STAGGER;
        let top = start.y.min(end.y);
        let bottom = start.y.max(end.y);
        let detour_x = nodes
            .iter()
            .filter(|n| n.bounds().bottom() >= top && n.y <= bottom)
            .map(|n| n.x)
            .fold(start.x.min(end.x), f64::min)
            - DETOUR_MARGIN
            - stagger;
        let corners = vec![
            Point::new(start.x, start.y + DETOUR_DROP),
            Point::new(detour_x, start.y + DETOUR_DROP),
            Point::new(detour_x, end.y - DETOUR_ENTER),
            Point::new(end.x, end.y - DETOUR_ENTER),
        ];
        return EdgeRoute {
            edge: index,
            start,
            end,
            shape: RouteShape::Orthogonal(corners),
            arrow: ArrowDirection::Down,
            back_reference: true,
        };
    }

    let shape = if dx.abs() < STRAIGHT_THRESHOLD {
        RouteShape::Straight
    } else if dy < 0.0 {
        RouteShape::Curve {
            c1: Point::new(start.x, start.y + CURVE_OFFSET),
            c2: Point::new(end.x, end.y - CURVE_OFFSET),
        }
    } else {
        let offset = CURVE_OFFSET.max(dy / 2.0);
        RouteShape::Curve {
            c1: Point::new(start.x, start.y + offset),
            c2: Point::new(end.x, end.y - offset),
        }
    };
    let arrow = if dy < 0.0 {
        ArrowDirection::Up
    } else {
        ArrowDirection::Down
    };
    EdgeRoute {
        edge: index,
        start,
        end,
        shape,
        arrow,
        back_reference: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::NodeKind;

    fn block(id: NodeId, x: f64, y: f64) -> Node {
        let mut node = Node::new(id, NodeKind::Process, format!("n{}", id), "");
        node.x = x;
        node.y = y;
        node.width = 100.0;
        node.height = 50.0;
        node
    }

    #[test]
    fn test_vertical_edge_is_straight() {
        let nodes = vec![block(0, 0.0, 0.0), block(1, 0.0, 110.0)];
        let edges = vec![Edge::new(0, 1, None)];
        let routes = route_edges(&nodes, &edges, 24.0);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].shape, RouteShape::Straight);
        assert_eq!(routes[0].start, Point::new(50.0, 50.0));
        assert_eq!(routes[0].end, Point::new(50.0, 110.0));
        assert_eq!(routes[0].path_d(), "M50 50 L50 110");
        assert_eq!(routes[0].arrow, ArrowDirection::Down);
    }

    #[test]
    fn test_offset_edge_curves() {
        let nodes = vec![block(0, 0.0, 0.0), block(1, 200.0, 250.0)];
        let edges = vec![Edge::new(0, 1, None)];
        let routes = route_edges(&nodes, &edges, 24.0);
        // dy = 200, so the control offset is dy / 2
        assert_eq!(
            routes[0].shape,
            RouteShape::Curve {
                c1: Point::new(50.0, 150.0),
                c2: Point::new(250.0, 150.0),
            }
        );
    }

    #[test]
    fn test_upward_curve_points_up() {
        let nodes = vec![block(0, 0.0, 300.0), block(1, 200.0, 0.0)];
        let edges = vec![Edge::new(0, 1, None)];
        let routes = route_edges(&nodes, &edges, 24.0);
        assert_eq!(routes[0].arrow, ArrowDirection::Up);
        assert_eq!(
            routes[0].shape,
            RouteShape::Curve {
                c1: Point::new(50.0, 390.0),
                c2: Point::new(250.0, -40.0),
            }
        );
    }

    #[test]
    fn test_fan_out_orders_by_target_x_with_back_references_last() {
        let nodes = vec![
            block(0, 0.0, 0.0),
            block(1, 200.0, 200.0),
            block(2, -200.0, 200.0),
            block(3, -400.0, 200.0),
        ];
        let edges = vec![
            Edge::new(0, 1, None),
            Edge::back_reference(0, 3, None),
            Edge::new(0, 2, None),
        ];
        let offsets = anchor_offsets(&nodes, &edges, 24.0);
        assert_eq!(offsets[&2].0, -24.0);
        assert_eq!(offsets[&0].0, 0.0);
        assert_eq!(offsets[&1].0, 24.0);
    }

    #[test]
    fn test_fan_in_offsets_are_symmetric() {
        let nodes = vec![block(0, -200.0, 0.0), block(1, 200.0, 0.0), block(2, 0.0, 200.0)];
        let edges = vec![Edge::new(0, 2, None), Edge::new(1, 2, None)];
        let offsets = anchor_offsets(&nodes, &edges, 24.0);
        assert_eq!(offsets[&0].1, -12.0);
        assert_eq!(offsets[&1].1, 12.0);
    }

    #[test]
    fn test_back_reference_detours_left_of_blocks_between() {
        let nodes = vec![block(0, 0.0, 0.0), block(1, -150.0, 100.0), block(2, 0.0, 200.0)];
        let edges = vec![Edge::back_reference(2, 0, None)];
        let routes = route_edges(&nodes, &edges, 24.0);
        let RouteShape::Orthogonal(corners) = &routes[0].shape else {
            panic!("expected an orthogonal detour");
        };
        assert_eq!(corners[0], Point::new(50.0, 270.0));
        assert_eq!(corners[1], Point::new(-190.0, 270.0));
        assert_eq!(corners[2], Point::new(-190.0, -12.0));
        assert_eq!(corners[3], Point::new(50.0, -12.0));
    }

    #[test]
    fn test_back_reference_stagger() {
        let nodes = vec![block(0, 0.0, 0.0), block(1, 0.0, 100.0)];
        let edges = vec![
            Edge::new(0, 1, None),
            Edge::back_reference(1, 0, Some("again".into())),
        ];
        let routes = route_edges(&nodes, &edges, 24.0);
        let RouteShape::Orthogonal(corners) = &routes[1].shape else {
            panic!("expected an orthogonal detour");
        };
        assert_eq!(corners[1].x, -55.0);
    }

    #[test]
    fn test_distance_to_route() {
        let nodes = vec![block(0, 0.0, 0.0), block(1, 0.0, 110.0)];
        let edges = vec![Edge::new(0, 1, None)];
        let route = &route_edges(&nodes, &edges, 24.0)[0];
        assert_eq!(route.distance_to(Point::new(54.0, 80.0)), 4.0);
        assert_eq!(route.label_position(), Point::new(50.0, 80.0));
    }

    #[test]
    fn test_dangling_edges_are_not_routed() {
        let nodes = vec![block(0, 0.0, 0.0)];
        let edges = vec![Edge::new(0, 5, None)];
        assert!(route_edges(&nodes, &edges, 24.0).is_empty());
    }
}
