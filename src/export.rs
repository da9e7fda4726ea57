//! Standalone SVG and PNG export
//!
//! Exports draw the scene at 1:1 from logical coordinates, so the current
//! pan and zoom of the canvas never affect the result.

use base64::Engine;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use thiserror::Error;

use crate::layout::LayoutConfig;
use crate::renderer::{render_scene, Surface, SvgConfig};
use crate::scene::Scene;
use crate::theme::Theme;

/// Errors that can occur while rasterizing an export
#[derive(Debug, Error)]
pub enum ExportError {
    /// The generated SVG could not be read back
    #[error("failed to parse generated SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("cannot allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    #[error("failed to encode PNG: {0}")]
    Encode(String),
}

/// Options for raster export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Device pixels per logical pixel
    pub pixel_ratio: f32,
    /// Load installed fonts so labels are rasterized
    pub load_system_fonts: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 2.0,
            load_system_fonts: true,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = ratio;
        self
    }

    pub fn with_system_fonts(mut self, load: bool) -> Self {
        self.load_system_fonts = load;
        self
    }
}

/// The scene as a standalone SVG document
pub fn export_svg(scene: &Scene, theme: &Theme, layout: &LayoutConfig, config: &SvgConfig) -> String {
    render_scene(scene, theme, layout, config, Surface::Export)
}

/// Rasterize an SVG document to PNG bytes
pub fn svg_to_png(svg: &str, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let mut usvg_options = usvg::Options::default();
    if options.load_system_fonts {
        usvg_options.fontdb_mut().load_system_fonts();
    }
    let tree = usvg::Tree::from_str(svg, &usvg_options)?;

    let size = tree.size();
    let ratio = options.pixel_ratio;
    let width = (size.width() * ratio).ceil();
    let height = (size.height() * ratio).ceil();
    if !width.is_finite() || !height.is_finite() || width < 1.0 || height < 1.0 {
        return Err(ExportError::Surface {
            width: 0,
            height: 0,
        });
    }
    let (width, height) = (width as u32, height as u32);

    let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Surface { width, height })?;
    resvg::render(&tree, Transform::from_scale(ratio, ratio), &mut pixmap.as_mut());
    log::debug!("rasterized {}x{} PNG", width, height);

    pixmap
        .encode_png()
        .map_err(|err| ExportError::Encode(err.to_string()))
}

/// The scene rasterized to PNG bytes
pub fn export_png(
    scene: &Scene,
    theme: &Theme,
    layout: &LayoutConfig,
    config: &SvgConfig,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    svg_to_png(&export_svg(scene, theme, layout, config), options)
}

/// PNG bytes as a `data:` URL
pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}
