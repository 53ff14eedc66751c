//! Protocol actions and the protocol document
//!
//! Actions form a closed set: aspirate, dispense, mix and move. Each names
//! its target well as `labware:well`, e.g. `"plate:A1"`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::BioartError;
use crate::labware::Labware;
use crate::liquid::Mixture;

/// Reference to a well of a named labware
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WellRef {
    pub labware: String,
    pub well: String,
}

impl WellRef {
    pub fn new(labware: impl Into<String>, well: impl Into<String>) -> Self {
        Self {
            labware: labware.into(),
            well: well.into(),
        }
    }
}

impl TryFrom<String> for WellRef {
    type Error = BioartError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.rsplit_once(':') {
            Some((labware, well)) if !labware.is_empty() && !well.is_empty() => {
                Ok(Self::new(labware, well))
            }
            _ => Err(BioartError::InvalidProtocol {
                reason: format!("well reference '{}' must look like 'labware:A1'", value),
            }),
        }
    }
}

impl From<WellRef> for String {
    fn from(value: WellRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for WellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.labware, self.well)
    }
}

/// A single pipetting step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Draw `volume` µL from a well into the tip, replacing the tip contents
    Aspirate { well: WellRef, volume: f64 },
    /// Release `volume` µL from the tip into a well
    Dispense { well: WellRef, volume: f64 },
    /// Homogenize a well; purely visual
    Mix {
        well: WellRef,
        #[serde(default = "default_mix_cycles")]
        cycles: u32,
    },
    /// Move the pipette over a well
    Move { well: WellRef },
}

fn default_mix_cycles() -> u32 {
    1
}

impl Action {
    pub fn aspirate(labware: &str, well: &str, volume: f64) -> Self {
        Action::Aspirate {
            well: WellRef::new(labware, well),
            volume,
        }
    }

    pub fn dispense(labware: &str, well: &str, volume: f64) -> Self {
        Action::Dispense {
            well: WellRef::new(labware, well),
            volume,
        }
    }

    pub fn mix(labware: &str, well: &str, cycles: u32) -> Self {
        Action::Mix {
            well: WellRef::new(labware, well),
            cycles,
        }
    }

    pub fn move_to(labware: &str, well: &str) -> Self {
        Action::Move {
            well: WellRef::new(labware, well),
        }
    }

    /// Short name used in logs and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Aspirate { .. } => "aspirate",
            Action::Dispense { .. } => "dispense",
            Action::Mix { .. } => "mix",
            Action::Move { .. } => "move",
        }
    }

    pub fn well(&self) -> &WellRef {
        match self {
            Action::Aspirate { well, .. }
            | Action::Dispense { well, .. }
            | Action::Mix { well, .. }
            | Action::Move { well } => well,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Aspirate { well, volume } => write!(f, "aspirate {}µL from {}", volume, well),
            Action::Dispense { well, volume } => write!(f, "dispense {}µL into {}", volume, well),
            Action::Mix { well, cycles } => write!(f, "mix {} x{}", well, cycles),
            Action::Move { well } => write!(f, "move to {}", well),
        }
    }
}

/// A labware definition with the liquid its wells start with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabwareSetup {
    #[serde(flatten)]
    pub labware: Labware,
    /// Initial contents keyed by well id
    #[serde(default)]
    pub contents: BTreeMap<String, Mixture>,
}

/// A liquid definition. Without a color the name is resolved as a protein
/// or color name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A parsed protocol. Immutable once loaded; consumed top to bottom.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Protocol {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub labware: Vec<LabwareSetup>,
    #[serde(default)]
    pub liquids: Vec<LiquidSpec>,
    /// Liquid already in the tip before the first action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_tip: Option<Mixture>,
    /// Require a move to a well before acting on it
    #[serde(default)]
    pub explicit_moves: bool,
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl Protocol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_labware(mut self, labware: Labware) -> Self {
        self.labware.push(LabwareSetup {
            labware,
            contents: BTreeMap::new(),
        });
        self
    }

    /// Put liquid into a well of an already added labware
    pub fn with_contents(mut self, labware: &str, well: &str, mixture: Mixture) -> Self {
        if let Some(setup) = self.labware.iter_mut().find(|s| s.labware.name == labware) {
            setup
                .contents
                .entry(well.to_string())
                .or_default()
                .add(&mixture);
        }
        self
    }

    pub fn with_liquid(mut self, name: &str, color: Option<&str>) -> Self {
        self.liquids.push(LiquidSpec {
            name: name.to_string(),
            color: color.map(str::to_string),
        });
        self
    }

    pub fn with_initial_tip(mut self, mixture: Mixture) -> Self {
        self.initial_tip = Some(mixture);
        self
    }

    pub fn with_explicit_moves(mut self) -> Self {
        self.explicit_moves = true;
        self
    }

    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}
