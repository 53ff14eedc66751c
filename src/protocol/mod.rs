//! Protocol Module
//!
//! Protocol documents and their execution:
//! - Action and protocol types
//! - JSON loading and structural validation
//! - The interpreter state machine over the pipette tip

pub mod action;
pub mod interpreter;
pub mod loader;

pub use action::{Action, LabwareSetup, LiquidSpec, Protocol, WellRef};
pub use interpreter::{
    mapper_for, registry_for, run, Interpreter, RunReport, TipState, VolumeTotals,
};
pub use loader::{discover_protocols, load_protocol, parse_protocol, validate_protocol};
