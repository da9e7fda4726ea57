//! SVG renderer for laid-out scenes
//!
//! Routes edges between block anchors and draws blocks, connections and
//! labels either onto the live canvas (with the view transform and selection
//! marks) or into a standalone export document.

pub mod config;
pub mod routing;
pub mod svg;

pub use config::SvgConfig;
pub use routing::{route_edges, ArrowDirection, EdgeRoute, RouteShape};
pub use svg::{node_palette, render_scene, Surface};
