//! Coordinate Mapper
//!
//! Maps labware wells to canvas pixels. The union of all labware extents is
//! scaled uniformly to fit the canvas minus a margin and centered, so a given
//! deck layout and resolution always yield the same pixel for a well.

use crate::config::{Resolution, SimulationConfig};
use crate::error::Result;

use super::geometry::{Labware, WellPosition};

/// Integer pixel coordinate on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelPoint {
    pub x: i64,
    pub y: i64,
}

impl PixelPoint {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Affine deck-to-canvas transform
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapper {
    resolution: Resolution,
    min_x: f64,
    min_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    center: (f64, f64),
    drop_radius: Option<u32>,
    full_drop_volume: f64,
}

impl CoordinateMapper {
    /// Build a mapper fitting every labware onto the configured canvas.
    pub fn new<'a, I>(labware: I, config: &SimulationConfig) -> Self
    where
        I: IntoIterator<Item = &'a Labware>,
    {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for lw in labware {
            let (x0, y0, x1, y1) = lw.extent();
            bounds = Some(match bounds {
                None => (x0, y0, x1, y1),
                Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
            });
        }
        let (min_x, min_y, max_x, max_y) = bounds.unwrap_or((0.0, 0.0, 1.0, 1.0));

        let Resolution { width, height } = config.resolution;
        let margin = config.margin as f64;
        let avail_w = (width as f64 - 2.0 * margin).max(1.0);
        let avail_h = (height as f64 - 2.0 * margin).max(1.0);

        let span_w = (max_x - min_x).max(f64::EPSILON);
        let span_h = (max_y - min_y).max(f64::EPSILON);
        let scale = (avail_w / span_w).min(avail_h / span_h);

        // Center the scaled layout inside the drawable area
        let offset_x = margin + (avail_w - span_w * scale) / 2.0;
        let offset_y = margin + (avail_h - span_h * scale) / 2.0;

        Self {
            resolution: config.resolution,
            min_x,
            min_y,
            scale,
            offset_x,
            offset_y,
            center: (
                offset_x + span_w * scale / 2.0,
                offset_y + span_h * scale / 2.0,
            ),
            drop_radius: config.drop_radius,
            full_drop_volume: config.full_drop_volume,
        }
    }

    /// Pixels per millimetre
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Map a deck position in millimetres to a pixel.
    pub fn deck_to_pixel(&self, x_mm: f64, y_mm: f64) -> PixelPoint {
        PixelPoint::new(
            (self.offset_x + (x_mm - self.min_x) * self.scale).round() as i64,
            (self.offset_y + (y_mm - self.min_y) * self.scale).round() as i64,
        )
    }

    pub fn position_to_pixel(&self, labware: &Labware, pos: WellPosition) -> PixelPoint {
        let (x, y) = labware.well_center(pos);
        self.deck_to_pixel(x, y)
    }

    /// Pixel at the center of `well_id`; fails with `InvalidWell` when the
    /// id is outside the labware grid.
    pub fn well_to_pixel(&self, labware: &Labware, well_id: &str) -> Result<PixelPoint> {
        let pos = labware.position_of(well_id)?;
        Ok(self.position_to_pixel(labware, pos))
    }

    /// Largest paint radius for drops in this labware
    pub fn drop_radius(&self, labware: &Labware) -> u32 {
        match self.drop_radius {
            Some(radius) => radius,
            None => ((labware.well_diameter / 2.0 * self.scale).round() as u32).max(1),
        }
    }

    /// Paint radius for a drop of `volume` µL.
    ///
    /// Drop area grows linearly with volume up to the full drop volume,
    /// where it covers the well. A fixed radius override ignores volume.
    pub fn drop_radius_for(&self, labware: &Labware, volume: f64) -> u32 {
        if let Some(radius) = self.drop_radius {
            return radius;
        }
        let fraction = (volume / self.full_drop_volume).clamp(0.0, 1.0);
        let radius = labware.well_diameter / 2.0 * self.scale * fraction.sqrt();
        (radius.round() as u32).max(1)
    }

    /// Pixel center of the labware layout
    pub fn layout_center(&self) -> (f64, f64) {
        self.center
    }

    /// Radius in pixels of a dish `diameter_mm` wide
    pub fn dish_radius(&self, diameter_mm: f64) -> f64 {
        diameter_mm / 2.0 * self.scale
    }
}
