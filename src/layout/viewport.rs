//! View transform between logical diagram coordinates and the screen

use serde::{Deserialize, Serialize};

use super::types::{BoundingBox, Point};

/// Smallest zoom reachable by interaction
pub const MIN_SCALE: f64 = 0.1;
/// Largest zoom reachable by interaction
pub const MAX_SCALE: f64 = 5.0;
/// Space kept free around the diagram when fitting
pub const FIT_MARGIN: f64 = 100.0;
/// Fit never zooms in further than this
pub const FIT_MAX_SCALE: f64 = 1.5;
/// Fit never zooms out further than this
pub const FIT_MIN_SCALE: f64 = 0.3;

/// Uniform scale plus translation, and the size of the visible surface
///
/// `screen = logical * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            width,
            height,
        }
    }

    pub fn to_logical(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset_x) / self.scale,
            (screen.y - self.offset_y) / self.scale,
        )
    }

    pub fn to_screen(&self, logical: Point) -> Point {
        Point::new(
            logical.x * self.scale + self.offset_x,
            logical.y * self.scale + self.offset_y,
        )
    }

    /// Scale and center `bounds` inside the surface
    pub fn fit(&mut self, bounds: &BoundingBox) {
        let graph_w = bounds.width.max(1.0);
        let graph_h = bounds.height.max(1.0);
        let scale_x = (self.width - FIT_MARGIN) / graph_w;
        let scale_y = (self.height - FIT_MARGIN) / graph_h;
        self.scale = scale_x.min(scale_y).min(FIT_MAX_SCALE).max(FIT_MIN_SCALE);
        self.offset_x = (self.width - graph_w * self.scale) / 2.0 - bounds.x * self.scale;
        self.offset_y = (self.height - graph_h * self.scale) / 2.0 - bounds.y * self.scale;
    }

    /// Multiply the scale by `factor`, keeping the logical point under
    /// `anchor` (screen coordinates) fixed
    ///
    /// Returns whether the scale changed.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) -> bool {
        let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if scale == self.scale {
            return false;
        }
        let logical = self.to_logical(anchor);
        self.scale = scale;
        self.offset_x = anchor.x - logical.x * scale;
        self.offset_y = anchor.y - logical.y * scale;
        true
    }

    /// Zoom around the center of the surface
    pub fn zoom_centered(&mut self, factor: f64) -> bool {
        let center = Point::new(self.width / 2.0, self.height / 2.0);
        self.zoom_at(factor, center)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1200.0, 800.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_between_spaces() {
        let viewport = Viewport {
            scale: 2.0,
            offset_x: 10.0,
            offset_y: -5.0,
            width: 800.0,
            height: 600.0,
        };
        let p = Point::new(12.5, 40.0);
        assert_eq!(viewport.to_logical(viewport.to_screen(p)), p);
    }

    #[test]
    fn test_fit_centers_and_clamps() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.fit(&BoundingBox::new(-90.0, 60.0, 180.0, 52.0));
        assert_eq!(viewport.scale, FIT_MAX_SCALE);
        let center = viewport.to_screen(Point::new(0.0, 86.0));
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);

        viewport.fit(&BoundingBox::new(0.0, 0.0, 100_000.0, 100.0));
        assert_eq!(viewport.scale, FIT_MIN_SCALE);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut viewport = Viewport::new(800.0, 600.0);
        let anchor = Point::new(300.0, 200.0);
        let before = viewport.to_logical(anchor);
        assert!(viewport.zoom_at(1.08, anchor));
        let after = viewport.to_logical(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.scale = MAX_SCALE;
        assert!(!viewport.zoom_centered(1.2));
        viewport.scale = 0.11;
        assert!(viewport.zoom_centered(0.83));
        assert_eq!(viewport.scale, MIN_SCALE);
    }
}
