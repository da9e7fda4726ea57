//! bridgechart - flowcharts from Bridge notation
//!
//! This library provides a parser, layout engine, renderer and interactive
//! editor model for Bridge notation flowcharts.
//!
//! # Example
//!
//! ```rust
//! use bridgechart::render;
//!
//! let svg = render("ts()\nte()\n...\nts()\na>\nte()").unwrap();
//! assert!(svg.contains("<svg"));
//! ```

pub mod editor;
pub mod error;
pub mod export;
pub mod layout;
pub mod parser;
pub mod renderer;
pub mod scene;
pub mod theme;

pub use editor::{Editor, EditorEvent, EventKind};
pub use error::Diagnostic;
pub use export::{ExportError, ExportOptions};
pub use layout::{layout, LayoutConfig, Viewport};
pub use parser::{parse, Diagram};
pub use renderer::SvgConfig;
pub use scene::{Scene, Snapshot};
pub use theme::{Theme, ThemeError};

use thiserror::Error;

/// Errors that can occur during the render pipeline
#[derive(Debug, Error)]
pub enum RenderError {
    /// The source declares no blocks
    #[error("nothing to draw: no blocks were declared")]
    Empty,

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

/// Configuration for the complete render pipeline
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Layout configuration
    pub layout: LayoutConfig,
    /// SVG output configuration
    pub svg: SvgConfig,
    /// Colors for blocks, arrows and canvas
    pub theme: Theme,
}

impl RenderConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout configuration
    pub fn with_layout(mut self, config: LayoutConfig) -> Self {
        self.layout = config;
        self
    }

    /// Set the SVG configuration
    pub fn with_svg(mut self, config: SvgConfig) -> Self {
        self.svg = config;
        self
    }

    /// Set the color theme
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

/// Parse and lay out a source text
///
/// Returns the placed scene together with the parse diagnostics, or
/// `RenderError::Empty` when no block was declared.
pub fn build_scene(source: &str, config: &LayoutConfig) -> Result<(Scene, Vec<Diagnostic>), RenderError> {
    let mut diagram = parse(source);
    if diagram.is_empty() {
        return Err(RenderError::Empty);
    }
    let diagnostics = std::mem::take(&mut diagram.diagnostics);
    let mut scene = Scene::from_diagram(diagram);
    let (nodes, edges) = scene.parts_mut();
    layout(nodes, edges, config);
    Ok((scene, diagnostics))
}

/// Render Bridge notation to SVG with default configuration
pub fn render(source: &str) -> Result<String, RenderError> {
    render_with_config(source, &RenderConfig::default())
}

/// Render Bridge notation to SVG with custom configuration
///
/// # Example
///
/// ```rust
/// use bridgechart::{render_with_config, LayoutConfig, RenderConfig, SvgConfig};
///
/// let config = RenderConfig::new()
///     .with_layout(LayoutConfig::default().with_gaps(40.0, 30.0))
///     .with_svg(SvgConfig::default().with_viewbox_padding(20.0));
///
/// let svg = render_with_config("p[\"Work\"]", &config).unwrap();
/// assert!(svg.contains("Work"));
/// ```
pub fn render_with_config(source: &str, config: &RenderConfig) -> Result<String, RenderError> {
    let (scene, _) = build_scene(source, &config.layout)?;
    log::debug!("rendering {} blocks", scene.nodes().len());
    Ok(export::export_svg(&scene, &config.theme, &config.layout, &config.svg))
}

/// Render Bridge notation to PNG bytes
pub fn render_png(source: &str, config: &RenderConfig, options: &ExportOptions) -> Result<Vec<u8>, RenderError> {
    let (scene, _) = build_scene(source, &config.layout)?;
    let png = export::export_png(&scene, &config.theme, &config.layout, &config.svg, options)?;
    Ok(png)
}
