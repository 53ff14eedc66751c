//! Canvas Module
//!
//! The simulated surface that dispensed liquid is painted onto:
//! - Compositor applying paint events with alpha blending
//! - Raster snapshots handed to the exporter

pub mod compositor;
pub mod raster;

pub use compositor::{Canvas, CanvasCompositor, Dish, PaintEvent};
pub use raster::Raster;
