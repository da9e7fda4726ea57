//! Configuration for the layout engine

/// Configuration options for measuring and placing blocks
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Narrowest box for text-bearing blocks
    pub min_node_width: f64,

    /// Widest box before text wraps
    pub max_node_width: f64,

    /// Height of a single-line process or io block
    pub node_height: f64,

    /// Horizontal padding around block text
    pub node_padding: f64,

    /// Height of start and end terminators
    pub terminator_height: f64,

    /// Smallest side of a decision rhombus
    pub decision_size: f64,

    /// Horizontal slant of io parallelograms
    pub io_skew: f64,

    /// Radius of connector circles
    pub connector_radius: f64,

    /// Default size of a composite block (width, height)
    pub sub_block_size: (f64, f64),

    /// Gap between neighbouring subtrees
    pub horizontal_gap: f64,

    /// Gap between levels
    pub vertical_gap: f64,

    /// y coordinate of the first level
    pub top_margin: f64,

    /// Font size of block labels in pixels
    pub font_size: f64,

    /// Font size of composite block fields in pixels
    pub small_font_size: f64,

    /// Average glyph advance as a fraction of the font size
    pub glyph_width_ratio: f64,

    /// Distance between wrapped text lines
    pub line_height: f64,

    /// Distance between wrapped lines inside a decision
    pub decision_line_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_node_width: 180.0,
            max_node_width: 280.0,
            node_height: 52.0,
            node_padding: 20.0,
            terminator_height: 46.0,
            decision_size: 90.0,
            io_skew: 16.0,
            connector_radius: 16.0,
            sub_block_size: (240.0, 100.0),
            horizontal_gap: 80.0,
            vertical_gap: 60.0,
            top_margin: 60.0,
            font_size: 13.0,
            small_font_size: 11.0,
            glyph_width_ratio: 7.2 / 13.0,
            line_height: 16.0,
            decision_line_height: 13.0,
        }
    }
}

impl LayoutConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gaps between subtrees and between levels
    pub fn with_gaps(mut self, horizontal: f64, vertical: f64) -> Self {
        self.horizontal_gap = horizontal;
        self.vertical_gap = vertical;
        self
    }

    /// Set the width range of text-bearing blocks
    pub fn with_node_width(mut self, min: f64, max: f64) -> Self {
        self.min_node_width = min;
        self.max_node_width = max.max(min);
        self
    }

    /// Set the label font size
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set the y coordinate of the first level
    pub fn with_top_margin(mut self, margin: f64) -> Self {
        self.top_margin = margin;
        self
    }

    /// Estimated pixel width of one character cell at `font_size`
    pub fn glyph_width(&self, font_size: f64) -> f64 {
        font_size * self.glyph_width_ratio
    }
}
