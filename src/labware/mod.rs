//! Labware Module
//!
//! Deck layout and coordinate mapping:
//! - Labware grid geometry and well identifiers
//! - Deck state (labware placement and well contents)
//! - Coordinate mapper (deck millimetres to canvas pixels)

pub mod deck;
pub mod geometry;
pub mod mapper;

pub use deck::Deck;
pub use geometry::{Labware, WellPosition};
pub use mapper::{CoordinateMapper, PixelPoint};
