//! Text measurement and block sizing
//!
//! There is no font rasterizer at layout time, so text width is estimated
//! from the Unicode display width of the string times an average glyph
//! advance. Wide (CJK) characters count as two cells.

use unicode_width::UnicodeWidthStr;

use super::config::LayoutConfig;
use crate::parser::{Node, NodeKind, SubField};

/// Estimated pixel width of `text` at `font_size`
pub fn text_width(text: &str, font_size: f64, config: &LayoutConfig) -> f64 {
    text.width() as f64 * config.glyph_width(font_size)
}

/// Greedy word wrap at `max_width`
///
/// A single word wider than `max_width` stays on its own line. Empty text
/// produces no lines.
pub fn wrap_text(text: &str, max_width: f64, font_size: f64, config: &LayoutConfig) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split(' ') {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if !line.is_empty() && text_width(&candidate, font_size, config) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// How a block's label is laid out inside its shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    /// Width available for one line
    pub max_width: f64,
    pub font_size: f64,
    pub line_height: f64,
}

/// Text box of a block drawn as `shape` with the given outer width
pub fn text_box(shape: NodeKind, width: f64, config: &LayoutConfig) -> TextBox {
    match shape {
        NodeKind::Decision => TextBox {
            max_width: width * 0.55,
            font_size: config.small_font_size,
            line_height: config.decision_line_height,
        },
        NodeKind::Io => TextBox {
            max_width: width - 2.0 * config.io_skew - config.node_padding,
            font_size: config.font_size,
            line_height: config.line_height,
        },
        _ => TextBox {
            max_width: width - config.node_padding,
            font_size: config.font_size,
            line_height: config.line_height,
        },
    }
}

/// Wrapped label lines of a block as it is currently sized
pub fn label_lines(node: &Node, config: &LayoutConfig) -> Vec<String> {
    let shape = node.shape();
    if !shape.wraps_text() {
        return if node.text.is_empty() {
            Vec::new()
        } else {
            vec![node.text.clone()]
        };
    }
    let text_box = text_box(shape, node.width, config);
    wrap_text(&node.text, text_box.max_width, text_box.font_size, config)
}

/// Width and height for a block, from its drawn shape and text
pub fn measure_node(node: &Node, config: &LayoutConfig) -> (f64, f64) {
    let shape = node.shape();
    let text_w = text_width(&node.text, config.font_size, config);
    match shape {
        NodeKind::Connector => {
            let diameter = config.connector_radius * 2.0;
            (diameter, diameter)
        }
        NodeKind::Decision => {
            let side = config.decision_size.max(text_w * 0.8 + 40.0);
            (side, side * 0.7)
        }
        NodeKind::SubBlock => {
            let field_w = |field: SubField| {
                node.sub_field(field)
                    .map_or(0.0, |t| text_width(t, config.font_size, config))
            };
            let (base_w, base_h) = config.sub_block_size;
            let width = base_w
                .max(field_w(SubField::TopMiddle) + 40.0)
                .max(field_w(SubField::BottomMiddle) + 40.0)
                .max(field_w(SubField::TopLeft) + field_w(SubField::TopRight) + 60.0)
                .max(field_w(SubField::BottomLeft) + field_w(SubField::BottomRight) + 60.0);
            (width, base_h)
        }
        NodeKind::TerminatorStart | NodeKind::TerminatorEnd => {
            (box_width(text_w, config), config.terminator_height)
        }
        NodeKind::Terminator | NodeKind::Process | NodeKind::Io => {
            let mut width = box_width(text_w, config);
            if shape == NodeKind::Io {
                width += config.io_skew * 2.0;
            }
            let text_box = text_box(shape, width, config);
            let lines = wrap_text(&node.text, text_box.max_width, text_box.font_size, config);
            let text_h = lines.len() as f64 * text_box.line_height + config.node_padding;
            (width, config.node_height.max(text_h))
        }
    }
}

fn box_width(text_w: f64, config: &LayoutConfig) -> f64 {
    (text_w + config.node_padding * 2.0)
        .max(config.min_node_width)
        .min(config.max_node_width)
}

/// Assign measured sizes to every block
pub fn measure_all(nodes: &mut [Node], config: &LayoutConfig) {
    for node in nodes.iter_mut() {
        let (width, height) = measure_node(node, config);
        node.width = width;
        node.height = height;
    }
}
