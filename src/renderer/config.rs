//! Configuration for SVG rendering

/// Configuration options for SVG output
#[derive(Debug, Clone, PartialEq)]
pub struct SvgConfig {
    /// Padding around the diagram in exported documents
    pub viewbox_padding: f64,

    /// Whether to include the XML declaration
    pub standalone: bool,

    /// Whether to format output with indentation
    pub pretty_print: bool,

    /// Prefix for CSS class names (e.g., "bc-" for "bc-node")
    pub class_prefix: Option<String>,

    /// CSS font stack for all text
    pub font_family: String,

    /// Horizontal distance between fanned-out edge anchors
    pub fan_spread: f64,

    /// Length of arrowhead triangles
    pub arrow_head_size: f64,

    /// Stroke width of edges and block outlines
    pub stroke_width: f64,

    /// Stroke width of the glow halo under each block
    pub glow_width: f64,

    /// Background grid cell size at scale 1
    pub grid_size: f64,

    /// Font size of edge labels
    pub label_font_size: f64,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            viewbox_padding: 60.0,
            standalone: true,
            pretty_print: true,
            class_prefix: Some("bc-".to_string()),
            font_family: "Inter, 'Segoe UI', system-ui, sans-serif".to_string(),
            fan_spread: 24.0,
            arrow_head_size: 10.0,
            stroke_width: 2.0,
            glow_width: 10.0,
            grid_size: 30.0,
            label_font_size: 11.0,
        }
    }
}

impl SvgConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the viewBox padding
    pub fn with_viewbox_padding(mut self, padding: f64) -> Self {
        self.viewbox_padding = padding;
        self
    }

    /// Set whether output is standalone
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Set whether to pretty-print output
    pub fn with_pretty_print(mut self, pretty: bool) -> Self {
        self.pretty_print = pretty;
        self
    }

    /// Set the CSS class prefix
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = Some(prefix.into());
        self
    }

    /// Remove the CSS class prefix
    pub fn without_class_prefix(mut self) -> Self {
        self.class_prefix = None;
        self
    }

    /// Set the font stack
    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }
}
