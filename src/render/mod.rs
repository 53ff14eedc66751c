//! Render Module
//!
//! Serializes finished rasters to image files.

pub mod export;

pub use export::{encode, save, ImageFormat};
