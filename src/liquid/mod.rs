//! Liquids Module
//!
//! Liquid descriptors, mixtures, and color resolution:
//! - Color parsing and the fluorescent protein color table
//! - Mixtures held by wells and the pipette tip
//! - The per-run liquid registry

pub mod color;
pub mod mixture;
pub mod registry;

pub use color::{parse_color, resolve_visual_color, Rgba, PROTEIN_VISUAL_COLORS};
pub use mixture::{Mixture, VOLUME_EPSILON};
pub use registry::{Liquid, LiquidRegistry};
