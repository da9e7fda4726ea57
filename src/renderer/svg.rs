//! SVG generation from a laid-out scene

use crate::layout::{label_lines, measure::text_box, text_width, BoundingBox, LayoutConfig, Point, Viewport};
use crate::parser::{Edge, Node, NodeKind, SubField};
use crate::scene::Scene;
use crate::theme::{Palette, Theme};

use super::routing::{num, route_edges, EdgeRoute};
use super::SvgConfig;

/// Size of the canvas exported for an empty scene
pub const EMPTY_EXPORT_SIZE: (f64, f64) = (400.0, 300.0);

/// Corner radius of process and sub-block outlines
const CORNER_RADIUS: f64 = 10.0;
/// Distance of sub-block labels from the block edge
const SUB_FIELD_INSET: f64 = 12.0;
/// Grid cells smaller than this on screen are not drawn
const MIN_GRID_CELL: f64 = 8.0;
/// Gap between a selected block and its outline
const SELECTION_GAP: f64 = 4.0;
const DASH: &str = "6 4";

/// Where a scene is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface {
    /// The interactive canvas: grid, view transform and selection marks
    Live(Viewport),
    /// A standalone document at 1:1 scale around the blocks
    Export,
}

/// Build SVG elements incrementally
pub struct SvgBuilder {
    config: SvgConfig,
    defs: Vec<String>,
    styles: Vec<String>,
    backdrop: Vec<String>,
    connections: Vec<String>,
    elements: Vec<String>,
    transform: Option<String>,
    indent: usize,
}

impl SvgBuilder {
    /// Create a new SVG builder
    pub fn new(config: SvgConfig) -> Self {
        Self {
            config,
            defs: vec![],
            styles: vec![],
            backdrop: vec![],
            connections: vec![],
            elements: vec![],
            transform: None,
            indent: 1,
        }
    }

    fn prefix(&self) -> String {
        self.config.class_prefix.clone().unwrap_or_default()
    }

    fn class(&self, name: &str) -> String {
        format!("{}{}", self.prefix(), name)
    }

    fn indent_str(&self) -> String {
        if self.config.pretty_print {
            "  ".repeat(self.indent)
        } else {
            String::new()
        }
    }

    fn newline(&self) -> &str {
        if self.config.pretty_print {
            "\n"
        } else {
            ""
        }
    }

    /// Font stack for every text element
    pub fn add_font_style(&mut self) {
        let prefix = self.prefix();
        self.styles.push(format!(
            ".{prefix}text, .{prefix}label {{ font-family: {}; }}",
            self.config.font_family
        ));
    }

    /// Solid fill behind everything
    pub fn add_background(&mut self, area: BoundingBox, color: &str) {
        self.backdrop.push(format!(
            r#"{}<rect class="{}" x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            self.indent_str(),
            self.class("background"),
            num(area.x),
            num(area.y),
            num(area.width),
            num(area.height),
            escape_xml(color)
        ));
    }

    /// Grid lines that follow the view transform
    pub fn add_grid(&mut self, viewport: &Viewport, color: &str) {
        let cell = self.config.grid_size * viewport.scale;
        if cell < MIN_GRID_CELL {
            return;
        }
        let id = self.class("grid");
        self.defs.push(format!(
            r#"<pattern id="{id}" width="{c}" height="{c}" x="{}" y="{}" patternUnits="userSpaceOnUse"><path d="M{c} 0 L0 0 L0 {c}" fill="none" stroke="{}" stroke-width="1"/></pattern>"#,
            num(viewport.offset_x.rem_euclid(cell)),
            num(viewport.offset_y.rem_euclid(cell)),
            escape_xml(color),
            c = num(cell),
        ));
        self.backdrop.push(format!(
            r#"{}<rect class="{id}" x="0" y="0" width="{}" height="{}" fill="url(#{id})"/>"#,
            self.indent_str(),
            num(viewport.width),
            num(viewport.height)
        ));
    }

    /// Wrap connections and blocks in the view transform
    pub fn set_view_transform(&mut self, viewport: &Viewport) {
        self.transform = Some(format!(
            "translate({} {}) scale({})",
            num(viewport.offset_x),
            num(viewport.offset_y),
            viewport.scale
        ));
        self.indent = 2;
    }

    /// Add a routed edge with its arrowhead and optional label
    pub fn add_edge(
        &mut self,
        route: &EdgeRoute,
        label: Option<&str>,
        stroke: &str,
        selected: bool,
        theme: &Theme,
        layout: &LayoutConfig,
    ) {
        let mut classes = vec![self.class("edge")];
        if route.back_reference {
            classes.push(self.class("back-reference"));
        }
        if selected {
            classes.push(self.class("selected"));
        }
        let (color, width) = if selected {
            (theme.canvas.selection.as_str(), self.config.stroke_width + 1.0)
        } else {
            (stroke, self.config.stroke_width)
        };
        let dash = if route.back_reference {
            format!(r#" stroke-dasharray="{DASH}""#)
        } else {
            String::new()
        };

        let indent = self.indent_str();
        self.connections.push(format!(
            r#"{indent}<g class="{}" data-edge-index="{}">"#,
            classes.join(" "),
            route.edge
        ));
        self.connections.push(format!(
            r#"{indent}  <path d="{}" fill="none" stroke="{}" stroke-width="{}"{}/>"#,
            route.path_d(),
            escape_xml(color),
            width,
            dash
        ));
        let head = route.arrow_head(self.config.arrow_head_size);
        self.connections.push(format!(
            r#"{indent}  <polygon points="{}" fill="{}"/>"#,
            points_attr(&head),
            escape_xml(color)
        ));

        if let Some(label) = label.filter(|l| !l.is_empty()) {
            let at = route.label_position();
            let font = self.config.label_font_size;
            let pill_w = text_width(label, font, layout) + 16.0;
            self.connections.push(format!(
                r#"{indent}  <rect class="{}" x="{}" y="{}" width="{}" height="20" rx="6" fill="{}" stroke="{}" stroke-width="1"/>"#,
                self.class("label-background"),
                num(at.x - pill_w / 2.0),
                num(at.y - 10.0),
                num(pill_w),
                escape_xml(&theme.arrow.label_background),
                escape_xml(&theme.arrow.label_border)
            ));
            self.connections.push(format!(
                r#"{indent}  <text class="{}" x="{}" y="{}" text-anchor="middle" font-size="{}" fill="{}">{}</text>"#,
                self.class("label"),
                num(at.x),
                num(middle_baseline(at.y, font)),
                font,
                escape_xml(&theme.arrow.label),
                escape_xml(label)
            ));
        }
        self.connections.push(format!("{indent}</g>"));
    }

    /// Add a block: glow halo, outline and text
    pub fn add_node(&mut self, node: &Node, palette: &Palette, layout: &LayoutConfig) {
        let shape = node.shape();
        let classes = [self.class("node"), self.class(shape.as_str())];
        self.start_group(&classes, &format!(r#" data-node-id="{}""#, node.id));

        let outline = self.outline(node, layout);
        let indent = self.indent_str();
        self.elements.push(format!(
            r#"{indent}{} class="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            outline,
            self.class("glow"),
            escape_xml(&palette.glow),
            self.config.glow_width
        ));
        self.elements.push(format!(
            r#"{indent}{} class="{}" fill="{}" stroke="{}" stroke-width="{}"/>"#,
            outline,
            self.class("shape"),
            escape_xml(&palette.background),
            escape_xml(&palette.border),
            self.config.stroke_width
        ));

        if shape == NodeKind::SubBlock && node.sub_fields.as_ref().is_some_and(|f| !f.is_empty()) {
            self.add_sub_fields(node, palette, layout);
        } else {
            self.add_label(node, palette, layout);
        }
        self.end_group();
    }

    /// Opening of the element that draws a block's outline, without its
    /// paint attributes or closing
    fn outline(&self, node: &Node, layout: &LayoutConfig) -> String {
        let (x, y, w, h) = (node.x, node.y, node.width, node.height);
        let center = node.center();
        match node.shape() {
            NodeKind::TerminatorStart | NodeKind::TerminatorEnd | NodeKind::Terminator => {
                rect_open(x, y, w, h, h / 2.0)
            }
            NodeKind::Process | NodeKind::SubBlock => rect_open(x, y, w, h, CORNER_RADIUS),
            NodeKind::Decision => format!(
                r#"<polygon points="{}""#,
                points_attr(&[
                    Point::new(center.x, y),
                    Point::new(x + w, center.y),
                    Point::new(center.x, y + h),
                    Point::new(x, center.y),
                ])
            ),
            NodeKind::Io => {
                let skew = layout.io_skew;
                format!(
                    r#"<polygon points="{}""#,
                    points_attr(&[
                        Point::new(x + skew, y),
                        Point::new(x + w, y),
                        Point::new(x + w - skew, y + h),
                        Point::new(x, y + h),
                    ])
                )
            }
            NodeKind::Connector => format!(
                r#"<circle cx="{}" cy="{}" r="{}""#,
                num(center.x),
                num(center.y),
                num(w.min(h) / 2.0)
            ),
        }
    }

    /// Centered, wrapped label
    fn add_label(&mut self, node: &Node, palette: &Palette, layout: &LayoutConfig) {
        let lines = label_lines(node, layout);
        if lines.is_empty() {
            return;
        }
        let text_box = text_box(node.shape(), node.width, layout);
        let (font, line_height) = match node.shape() {
            NodeKind::Connector => (layout.small_font_size, layout.line_height),
            _ => (text_box.font_size, text_box.line_height),
        };
        let center = node.center();
        let first = center.y - (lines.len() as f64 - 1.0) * line_height / 2.0;

        let mut text = format!(
            r#"{}<text class="{}" x="{}" y="{}" text-anchor="middle" font-size="{}" fill="{}">"#,
            self.indent_str(),
            self.class("text"),
            num(center.x),
            num(middle_baseline(first, font)),
            font,
            escape_xml(&palette.text)
        );
        for (i, line) in lines.iter().enumerate() {
            text.push_str(&format!(
                r#"<tspan x="{}" y="{}">{}</tspan>"#,
                num(center.x),
                num(middle_baseline(first + i as f64 * line_height, font)),
                escape_xml(line)
            ));
        }
        text.push_str("</text>");
        self.elements.push(text);
    }

    /// The six positional labels of a composite block
    fn add_sub_fields(&mut self, node: &Node, palette: &Palette, layout: &LayoutConfig) {
        let bounds = node.bounds();
        let center = bounds.center();
        let top = bounds.y + SUB_FIELD_INSET;
        let bottom = bounds.bottom() - SUB_FIELD_INSET;
        let left = bounds.x + SUB_FIELD_INSET;
        let right = bounds.right() - SUB_FIELD_INSET;

        for field in SubField::ALL {
            let Some(text) = node.sub_field(field) else {
                continue;
            };
            let font = match field {
                SubField::TopMiddle | SubField::BottomMiddle => layout.font_size,
                _ => layout.small_font_size,
            };
            let (x, anchor) = match field {
                SubField::TopMiddle | SubField::BottomMiddle => (center.x, "middle"),
                SubField::TopLeft | SubField::BottomLeft => (left, "start"),
                SubField::TopRight | SubField::BottomRight => (right, "end"),
            };
            let y = match field {
                SubField::TopMiddle | SubField::TopLeft | SubField::TopRight => top + font * 0.8,
                _ => bottom - font * 0.2,
            };
            self.elements.push(format!(
                r#"{}<text class="{} {}" x="{}" y="{}" text-anchor="{}" font-size="{}" fill="{}">{}</text>"#,
                self.indent_str(),
                self.class("text"),
                self.class(field.tag()),
                num(x),
                num(y),
                anchor,
                font,
                escape_xml(&palette.text),
                escape_xml(text)
            ));
        }
    }

    /// Dashed outline around a selected block
    pub fn add_selection(&mut self, bounds: BoundingBox, color: &str) {
        let area = bounds.inflate(SELECTION_GAP);
        self.elements.push(format!(
            r#"{}<rect class="{}" x="{}" y="{}" width="{}" height="{}" rx="6" fill="none" stroke="{}" stroke-width="2" stroke-dasharray="{DASH}"/>"#,
            self.indent_str(),
            self.class("selection"),
            num(area.x),
            num(area.y),
            num(area.width),
            num(area.height),
            escape_xml(color)
        ));
    }

    /// Add a group element with classes and extra attributes
    pub fn start_group(&mut self, classes: &[String], attributes: &str) {
        let class_attr = if classes.is_empty() {
            String::new()
        } else {
            format!(r#" class="{}""#, classes.join(" "))
        };
        self.elements
            .push(format!("{}<g{}{}>", self.indent_str(), class_attr, attributes));
        self.indent += 1;
    }

    /// Close a group element
    pub fn end_group(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.elements.push(format!("{}</g>", self.indent_str()));
    }

    /// Build the final SVG string
    pub fn build(self, viewbox: BoundingBox) -> String {
        let nl = self.newline();
        let inner = if self.config.pretty_print { "    " } else { "" };
        let outer = if self.config.pretty_print { "  " } else { "" };

        let mut svg = String::new();

        if self.config.standalone {
            svg.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
            svg.push_str(nl);
        }

        svg.push_str(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}">"#,
            num(viewbox.width),
            num(viewbox.height),
            num(viewbox.x),
            num(viewbox.y),
            num(viewbox.width),
            num(viewbox.height)
        ));
        svg.push_str(nl);

        if !self.styles.is_empty() {
            svg.push_str(outer);
            svg.push_str("<style>");
            svg.push_str(nl);
            for style in &self.styles {
                svg.push_str(inner);
                svg.push_str(style);
                svg.push_str(nl);
            }
            svg.push_str(outer);
            svg.push_str("</style>");
            svg.push_str(nl);
        }

        if !self.defs.is_empty() {
            svg.push_str(outer);
            svg.push_str("<defs>");
            svg.push_str(nl);
            for def in &self.defs {
                svg.push_str(inner);
                svg.push_str(def);
                svg.push_str(nl);
            }
            svg.push_str(outer);
            svg.push_str("</defs>");
            svg.push_str(nl);
        }

        for item in &self.backdrop {
            svg.push_str(item);
            svg.push_str(nl);
        }

        if let Some(transform) = &self.transform {
            svg.push_str(&format!(r#"{outer}<g transform="{transform}">"#));
            svg.push_str(nl);
        }

        // Connections sit under the blocks
        for conn in &self.connections {
            svg.push_str(conn);
            svg.push_str(nl);
        }
        for elem in &self.elements {
            svg.push_str(elem);
            svg.push_str(nl);
        }

        if self.transform.is_some() {
            svg.push_str(outer);
            svg.push_str("</g>");
            svg.push_str(nl);
        }

        svg.push_str("</svg>");
        svg
    }
}

/// Palette a block is drawn with: its override, else its kind's
pub fn node_palette<'a>(node: &'a Node, theme: &'a Theme) -> &'a Palette {
    node.style_override
        .as_ref()
        .unwrap_or_else(|| theme.palette(node.kind))
}

/// Stroke color of an edge: the arrow color, or the target's border for
/// back-references
fn edge_color<'a>(edge: &Edge, scene: &'a Scene, theme: &'a Theme) -> &'a str {
    if edge.is_back_reference {
        if let Some(target) = scene.node(edge.to) {
            return &node_palette(target, theme).border;
        }
    }
    &theme.arrow.color
}

/// Draw a scene onto a surface
pub fn render_scene(
    scene: &Scene,
    theme: &Theme,
    layout: &LayoutConfig,
    config: &SvgConfig,
    surface: Surface,
) -> String {
    let mut builder = SvgBuilder::new(config.clone());
    builder.add_font_style();

    let live = matches!(surface, Surface::Live(_));
    let viewbox = match surface {
        Surface::Live(viewport) => {
            let area = BoundingBox::new(0.0, 0.0, viewport.width, viewport.height);
            builder.add_background(area, &theme.canvas.background);
            builder.add_grid(&viewport, &theme.canvas.grid);
            builder.set_view_transform(&viewport);
            area
        }
        Surface::Export => {
            let area = scene
                .bounds()
                .map(|b| b.inflate(config.viewbox_padding))
                .unwrap_or_else(|| {
                    BoundingBox::new(0.0, 0.0, EMPTY_EXPORT_SIZE.0, EMPTY_EXPORT_SIZE.1)
                });
            builder.add_background(area, &theme.canvas.background);
            area
        }
    };

    for route in route_edges(scene.nodes(), scene.edges(), config.fan_spread) {
        let edge = &scene.edges()[route.edge];
        let selected = live && scene.is_selected_edge(route.edge);
        builder.add_edge(
            &route,
            edge.label.as_deref(),
            edge_color(edge, scene, theme),
            selected,
            theme,
            layout,
        );
    }

    for node in scene.nodes() {
        builder.add_node(node, node_palette(node, theme), layout);
        if live && scene.is_selected_node(node.id) {
            builder.add_selection(node.bounds(), &theme.canvas.selection);
        }
    }

    builder.build(viewbox)
}

/// Baseline that vertically centers text on `y`
fn middle_baseline(y: f64, font_size: f64) -> f64 {
    y + font_size * 0.35
}

fn rect_open(x: f64, y: f64, w: f64, h: f64, radius: f64) -> String {
    format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}""#,
        num(x),
        num(y),
        num(w),
        num(h),
        num(radius)
    )
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", num(p.x), num(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escape special XML characters
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout;
    use crate::parser::parse;
    use crate::scene::Selection;

    fn laid_out(source: &str) -> Scene {
        let mut scene = Scene::from_diagram(parse(source));
        let (nodes, edges) = scene.parts_mut();
        layout(nodes, edges, &LayoutConfig::default());
        scene
    }

    fn export(scene: &Scene) -> String {
        render_scene(
            scene,
            &Theme::default(),
            &LayoutConfig::default(),
            &SvgConfig::default(),
            Surface::Export,
        )
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b"), "a &lt; b");
        assert_eq!(escape_xml("a & b"), "a &amp; b");
        assert_eq!(escape_xml("<tag>"), "&lt;tag&gt;");
    }

    #[test]
    fn test_points_attr() {
        let points = [Point::new(0.0, 0.5), Point::new(10.0, 20.125)];
        assert_eq!(points_attr(&points), "0,0.5 10,20.13");
    }

    #[test]
    fn test_empty_scene_exports_placeholder_canvas() {
        let svg = export(&Scene::new());
        assert!(svg.contains(r#"width="400" height="300" viewBox="0 0 400 300""#));
        assert!(svg.contains(r##"fill="#0a0a0f""##));
        assert!(!svg.contains("data-node-id"));
    }

    #[test]
    fn test_empty_builder_output() {
        let builder = SvgBuilder::new(SvgConfig::new().with_standalone(false).with_pretty_print(false));
        insta::assert_snapshot!(
            builder.build(BoundingBox::new(0.0, 0.0, 40.0, 30.0)),
            @r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="30" viewBox="0 0 40 30"></svg>"#
        );
    }

    #[test]
    fn test_export_draws_every_block_and_edge() {
        let scene = laid_out("ts()\np[\"Work\"]\nd<\"Ok?\">\nte()\n...\nts()\na>\np[\"Work\"]\na>\nd<\"Ok?\">\na*Yes*>\nte()");
        let svg = export(&scene);
        assert_eq!(svg.matches("data-node-id=").count(), 4);
        assert_eq!(svg.matches("data-edge-index=").count(), 3);
        assert!(svg.contains(">Yes</text>"));
        assert!(svg.contains(">Work</tspan>"));
        assert!(svg.contains("bc-decision"));
        // Edges are emitted before blocks
        assert!(svg.find("data-edge-index").unwrap() < svg.find("data-node-id").unwrap());
    }

    #[test]
    fn test_export_viewbox_pads_bounds() {
        let scene = laid_out("p[\"Only\"]");
        let bounds = scene.bounds().unwrap().inflate(60.0);
        let svg = export(&scene);
        assert!(svg.contains(&format!(
            r#"viewBox="{} {} {} {}""#,
            num(bounds.x),
            num(bounds.y),
            num(bounds.width),
            num(bounds.height)
        )));
    }

    #[test]
    fn test_back_reference_is_dashed_in_target_color() {
        let mut scene = laid_out("p[\"A\"]\np[\"B\"]\n...\np[\"A\"]\na>\np[\"B\"]\na>!p[\"A\"]");
        assert!(scene.edges()[1].is_back_reference);
        let theme = Theme::default();
        let border = theme.palette(NodeKind::Process).border.clone();
        scene.select(None);
        let svg = export(&scene);
        assert!(svg.contains(&format!(
            r#"stroke="{}" stroke-width="2" stroke-dasharray="6 4""#,
            border
        )));
    }

    #[test]
    fn test_selection_only_on_live_surface() {
        let mut scene = laid_out("p[\"A\"]");
        scene.select(Some(Selection::Node(0)));
        assert!(!export(&scene).contains("bc-selection"));
        let live = render_scene(
            &scene,
            &Theme::default(),
            &LayoutConfig::default(),
            &SvgConfig::default(),
            Surface::Live(Viewport::new(800.0, 600.0)),
        );
        assert!(live.contains("bc-selection"));
        assert!(live.contains(r#"<g transform="translate(0 0) scale(1)">"#));
        assert!(live.contains(r#"<pattern id="bc-grid""#));
    }

    #[test]
    fn test_grid_hidden_when_zoomed_out() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.scale = 0.2;
        let svg = render_scene(
            &Scene::new(),
            &Theme::default(),
            &LayoutConfig::default(),
            &SvgConfig::default(),
            Surface::Live(viewport),
        );
        assert!(!svg.contains("pattern"));
    }

    #[test]
    fn test_style_override_wins() {
        let mut scene = laid_out("p[\"A\"]");
        scene.node_mut(0).unwrap().style_override =
            Some(Palette::new("#000001", "#000002", "#000003", "#000004"));
        let svg = export(&scene);
        assert!(svg.contains(r##"fill="#000001" stroke="#000002""##));
        assert!(svg.contains(r##"fill="#000003""##));
    }

    #[test]
    fn test_sub_block_draws_positional_labels() {
        let scene = laid_out("B{ *tm:Title *br:v2 }");
        let svg = export(&scene);
        assert!(svg.contains(r#"class="bc-text bc-tm""#));
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains(">v2</text>"));
    }
}
