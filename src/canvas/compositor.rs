//! Canvas Compositor
//!
//! Accumulates paint events into a persistent raster. Every covered pixel is
//! alpha-blended as `new = color * alpha + existing * (1 - alpha)` with
//! `alpha = opacity * color.a / 255`, so repeated paints are order-dependent
//! and the last paint dominates.

use log::trace;

use crate::config::{Background, Resolution, SimulationConfig};
use crate::labware::PixelPoint;
use crate::liquid::Rgba;

use super::raster::Raster;

/// A request to blend a color onto the canvas
#[derive(Debug, Clone, PartialEq)]
pub enum PaintEvent {
    /// A round drop centered on a well
    Drop {
        at: PixelPoint,
        color: Rgba,
        radius: u32,
    },
    /// A line with round caps, drawn for smears
    Stroke {
        from: PixelPoint,
        to: PixelPoint,
        color: Rgba,
        radius: u32,
    },
}

impl PaintEvent {
    pub fn color(&self) -> Rgba {
        match self {
            PaintEvent::Drop { color, .. } | PaintEvent::Stroke { color, .. } => *color,
        }
    }
}

/// Color outside the petri dish
pub const SURROUND_COLOR: Rgba = Rgba::WHITE;

/// Color of the dish rim on paper
pub const DISH_OUTLINE_COLOR: Rgba = Rgba::BLACK;

/// Half the rim thickness in pixels
const DISH_OUTLINE_HALF_WIDTH: f64 = 1.0;

/// Petri dish placement in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dish {
    pub center: (f64, f64),
    pub radius: f64,
}

impl Dish {
    pub fn new(center: (f64, f64), radius: f64) -> Self {
        Self { center, radius }
    }

    fn distance(&self, x: u32, y: u32) -> f64 {
        let dx = x as f64 - self.center.0;
        let dy = y as f64 - self.center.1;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CanvasPixel {
    color: [f32; 4],
    count: u32,
}

/// Fixed-size canvas with per-pixel paint counts
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<CanvasPixel>,
}

impl Canvas {
    pub fn new(resolution: Resolution, background: Rgba) -> Self {
        let size = resolution.width as usize * resolution.height as usize;
        Self {
            width: resolution.width,
            height: resolution.height,
            pixels: vec![
                CanvasPixel {
                    color: background.to_f32(),
                    count: 0,
                };
                size
            ],
        }
    }

    /// Canvas showing a petri dish: filled with the background's dish
    /// color, or only its rim on paper. Dish pixels are unpainted.
    pub fn with_dish(resolution: Resolution, background: Background, dish: Dish) -> Self {
        let mut canvas = Self::new(resolution, SURROUND_COLOR);
        let fill = background.dish_fill();
        for y in 0..canvas.height {
            for x in 0..canvas.width {
                let d = dish.distance(x, y);
                let color = match fill {
                    Some(fill) if d <= dish.radius => fill,
                    None if (d - dish.radius).abs() <= DISH_OUTLINE_HALF_WIDTH => {
                        DISH_OUTLINE_COLOR
                    }
                    _ => continue,
                };
                let i = y as usize * canvas.width as usize + x as usize;
                canvas.pixels[i].color = color.to_f32();
            }
        }
        canvas
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

/// Owns the canvas for one run and applies paint events to it
#[derive(Debug, Clone)]
pub struct CanvasCompositor {
    canvas: Canvas,
    opacity: f32,
}

impl CanvasCompositor {
    pub fn new(resolution: Resolution, background: Background, opacity: f32) -> Self {
        Self {
            canvas: Canvas::new(resolution, background.color()),
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Compositor whose canvas shows a petri dish under the layout
    pub fn with_dish(
        resolution: Resolution,
        background: Background,
        opacity: f32,
        dish: Dish,
    ) -> Self {
        Self {
            canvas: Canvas::with_dish(resolution, background, dish),
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Plain background fill, no dish
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.resolution, config.background, config.opacity)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Blend `color` onto every pixel within `radius` of `(x, y)`.
    /// Pixels outside the canvas are clipped.
    pub fn paint(&mut self, x: i64, y: i64, color: Rgba, radius: u32) {
        let at = PixelPoint::new(x, y);
        self.blend_capsule(at, at, color, radius);
    }

    /// Blend `color` onto every pixel within `radius` of the segment
    /// `from`..`to`. Each pixel is blended once.
    pub fn stroke(&mut self, from: PixelPoint, to: PixelPoint, color: Rgba, radius: u32) {
        self.blend_capsule(from, to, color, radius);
    }

    pub fn apply(&mut self, event: &PaintEvent) {
        match *event {
            PaintEvent::Drop { at, color, radius } => self.paint(at.x, at.y, color, radius),
            PaintEvent::Stroke {
                from,
                to,
                color,
                radius,
            } => self.stroke(from, to, color, radius),
        }
    }

    /// Number of paint events that touched a pixel
    pub fn paint_count(&self, x: i64, y: i64) -> Option<u32> {
        self.canvas
            .index(x, y)
            .map(|i| self.canvas.pixels[i].count)
    }

    /// Immutable 8-bit snapshot of the current canvas
    pub fn export(&self) -> Raster {
        let mut data = Vec::with_capacity(self.canvas.pixels.len() * 4);
        for pixel in &self.canvas.pixels {
            data.extend_from_slice(&Rgba::from_f32(pixel.color).to_array());
        }
        Raster::new(self.canvas.width, self.canvas.height, data)
    }

    fn blend_capsule(&mut self, from: PixelPoint, to: PixelPoint, color: Rgba, radius: u32) {
        let alpha = self.opacity * color.a as f32 / 255.0;
        let src = color.to_f32();
        let r = radius as i64;

        let min_x = from.x.min(to.x) - r;
        let max_x = from.x.max(to.x) + r;
        let min_y = from.y.min(to.y) - r;
        let max_y = from.y.max(to.y) + r;

        // Clip the bounding box to the canvas
        let x0 = min_x.max(0);
        let y0 = min_y.max(0);
        let x1 = max_x.min(self.canvas.width as i64 - 1);
        let y1 = max_y.min(self.canvas.height as i64 - 1);
        if x0 > x1 || y0 > y1 {
            trace!("paint at {:?} fully outside canvas", from);
            return;
        }

        let r_sq = (radius as f64) * (radius as f64);
        for y in y0..=y1 {
            for x in x0..=x1 {
                if distance_sq_to_segment(x, y, from, to) > r_sq {
                    continue;
                }
                if let Some(i) = self.canvas.index(x, y) {
                    let pixel = &mut self.canvas.pixels[i];
                    for (dst, s) in pixel.color.iter_mut().zip(src) {
                        *dst = s * alpha + *dst * (1.0 - alpha);
                    }
                    pixel.count += 1;
                }
            }
        }
    }
}

/// Squared distance from pixel `(x, y)` to the segment `a`..`b`
fn distance_sq_to_segment(x: i64, y: i64, a: PixelPoint, b: PixelPoint) -> f64 {
    let (px, py) = (x as f64, y as f64);
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let len_sq = dx * dx + dy * dy;

    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (ax + t * dx, ay + t * dy);
    (px - cx) * (px - cx) + (py - cy) * (py - cy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compositor(opacity: f32) -> CanvasCompositor {
        CanvasCompositor::new(Resolution::new(20, 20), Background::Black, opacity)
    }

    #[test]
    fn test_new_canvas_is_background() {
        let raster = CanvasCompositor::new(Resolution::new(4, 3), Background::Agar, 1.0).export();
        assert_eq!(raster.width(), 4);
        assert_eq!(raster.height(), 3);
        assert!(raster.pixels().all(|p| p == Rgba::AGAR));
    }

    #[test]
    fn test_opaque_paint_replaces_pixel() {
        let mut comp = compositor(1.0);
        comp.paint(10, 10, Rgba::RED, 2);
        let raster = comp.export();

        assert_eq!(raster.pixel(10, 10), Some(Rgba::RED));
        assert_eq!(raster.pixel(12, 10), Some(Rgba::RED));
        assert_eq!(raster.pixel(12, 12), Some(Rgba::BLACK));
        assert_eq!(comp.paint_count(10, 10), Some(1));
        assert_eq!(comp.paint_count(0, 0), Some(0));
    }

    #[test]
    fn test_blend_formula() {
        let mut comp = compositor(0.5);
        comp.paint(5, 5, Rgba::RED, 0);
        // 255 * 0.5 + 0 * 0.5; alpha 255 * 0.5 + 255 * 0.5
        assert_eq!(comp.export().pixel(5, 5), Some(Rgba::new(128, 0, 0, 255)));

        comp.paint(5, 5, Rgba::BLUE, 0);
        // red 127.5 * 0.5, blue 255 * 0.5
        assert_eq!(comp.export().pixel(5, 5), Some(Rgba::new(64, 0, 128, 255)));
        assert_eq!(comp.paint_count(5, 5), Some(2));
    }

    #[test]
    fn test_blend_is_order_dependent() {
        let mut a = compositor(0.5);
        a.paint(5, 5, Rgba::RED, 0);
        a.paint(5, 5, Rgba::BLUE, 0);
        let mut b = compositor(0.5);
        b.paint(5, 5, Rgba::BLUE, 0);
        b.paint(5, 5, Rgba::RED, 0);

        assert_ne!(a.export().pixel(5, 5), b.export().pixel(5, 5));
    }

    #[test]
    fn test_color_alpha_scales_opacity() {
        let mut comp = compositor(1.0);
        comp.paint(5, 5, Rgba::new(255, 0, 0, 0), 1);
        assert_eq!(comp.export().pixel(5, 5), Some(Rgba::BLACK));
    }

    #[test]
    fn test_edge_paint_is_clipped() {
        let mut comp = compositor(1.0);
        comp.paint(0, 0, Rgba::RED, 3);
        comp.paint(-50, -50, Rgba::BLUE, 3);
        comp.paint(25, 19, Rgba::BLUE, 6);

        let raster = comp.export();
        assert_eq!(raster.pixel(0, 0), Some(Rgba::RED));
        assert_eq!(raster.pixel(3, 0), Some(Rgba::RED));
        assert_eq!(raster.pixel(19, 19), Some(Rgba::BLUE));
        assert_eq!(raster.pixel(10, 10), Some(Rgba::BLACK));
    }

    #[test]
    fn test_stroke_blends_each_pixel_once() {
        let mut comp = compositor(0.5);
        comp.stroke(PixelPoint::new(2, 10), PixelPoint::new(12, 10), Rgba::RED, 2);

        for x in 2..=12 {
            assert_eq!(comp.paint_count(x, 10), Some(1));
        }
        assert_eq!(comp.paint_count(15, 10), Some(0));
        assert_eq!(comp.export().pixel(7, 11), Some(Rgba::new(128, 0, 0, 255)));
    }

    #[test]
    fn test_dish_fill_and_surround() {
        let dish = Dish::new((10.0, 10.0), 5.0);
        let comp =
            CanvasCompositor::with_dish(Resolution::new(20, 20), Background::Agar, 1.0, dish);
        let raster = comp.export();

        assert_eq!(raster.pixel(10, 10), Some(Rgba::AGAR));
        assert_eq!(raster.pixel(15, 10), Some(Rgba::AGAR));
        assert_eq!(raster.pixel(0, 0), Some(SURROUND_COLOR));
        assert_eq!(raster.pixel(17, 10), Some(SURROUND_COLOR));
        assert_eq!(comp.paint_count(10, 10), Some(0));
    }

    #[test]
    fn test_paper_dish_is_outline_only() {
        let dish = Dish::new((10.0, 10.0), 5.0);
        let comp =
            CanvasCompositor::with_dish(Resolution::new(20, 20), Background::Paper, 1.0, dish);
        let raster = comp.export();

        assert_eq!(raster.pixel(15, 10), Some(DISH_OUTLINE_COLOR));
        assert_eq!(raster.pixel(10, 5), Some(DISH_OUTLINE_COLOR));
        assert_eq!(raster.pixel(10, 10), Some(SURROUND_COLOR));
        assert_eq!(raster.pixel(0, 0), Some(SURROUND_COLOR));
    }

    #[test]
    fn test_export_is_snapshot() {
        let mut comp = compositor(1.0);
        let before = comp.export();
        comp.paint(1, 1, Rgba::RED, 0);
        assert_eq!(before.pixel(1, 1), Some(Rgba::BLACK));
        assert_eq!(comp.export().pixel(1, 1), Some(Rgba::RED));
    }
}
