//! Bio-art Simulator - Liquid-handling protocol renderer
//!
//! Interprets pipetting protocols (aspirate, dispense, mix, move) against a
//! simulated deck and paints every dispensed drop onto a raster canvas, so a
//! protocol's artwork can be previewed before it runs on a robot.
//!
//! # Architecture
//!
//! - `labware`: plate geometry, deck state and the deck-to-pixel mapper
//! - `liquid`: colors, mixtures and the liquid registry
//! - `protocol`: protocol documents and the interpreter
//! - `canvas`: the blending compositor and raster snapshots
//! - `render`: PNG/JPEG/BMP export

pub mod canvas;
pub mod cli;
pub mod config;
pub mod error;
pub mod labware;
pub mod liquid;
pub mod protocol;
pub mod render;
pub mod simulation;

pub use error::{BioartError, Result};
pub use simulation::{Simulation, SimulationOutput};
