//! Simulation configuration
//!
//! Canvas resolution, blending opacity and background style. Values come
//! from defaults, an optional JSON file, then command-line overrides.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{BioartError, Result};
use crate::liquid::Rgba;

/// Default canvas edge length in pixels
pub const DEFAULT_CANVAS_SIZE: u32 = 1024;

/// Default margin between the outermost wells and the canvas edge
pub const DEFAULT_MARGIN_PX: u32 = 32;

/// Largest accepted canvas edge in pixels
pub const MAX_CANVAS_DIMENSION: u32 = 16_384;

/// Inner diameter of a standard 90mm/100mm petri dish (mm)
pub const PETRI_INNER_DIAMETER_MM: f64 = 84.0;

/// Dispensed volume whose drop covers a whole well (µL)
pub const DEFAULT_FULL_DROP_VOLUME_UL: f64 = 10.0;

/// Canvas resolution in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both edges within `1..=MAX_CANVAS_DIMENSION`
    pub fn is_valid(&self) -> bool {
        let edge = 1..=MAX_CANVAS_DIMENSION;
        edge.contains(&self.width) && edge.contains(&self.height)
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE, DEFAULT_CANVAS_SIZE)
    }
}

impl FromStr for Resolution {
    type Err = BioartError;

    /// Parse `WIDTHxHEIGHT`, e.g. `800x600`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BioartError::InvalidResolution {
            value: s.to_string(),
        };
        let (w, h) = s
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        let resolution = Self::new(width, height);
        if !resolution.is_valid() {
            return Err(invalid());
        }
        Ok(resolution)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Petri dish background style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    /// Dark agar
    #[default]
    Black,
    /// Beige agar
    Agar,
    /// White paper
    Paper,
}

impl Background {
    /// Fill for a canvas drawn without a dish
    pub fn color(&self) -> Rgba {
        match self {
            Background::Black => Rgba::BLACK,
            Background::Agar => Rgba::AGAR,
            Background::Paper => Rgba::WHITE,
        }
    }

    /// Fill inside the dish; paper only draws the dish outline
    pub fn dish_fill(&self) -> Option<Rgba> {
        match self {
            Background::Black => Some(Rgba::BLACK),
            Background::Agar => Some(Rgba::AGAR),
            Background::Paper => None,
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Black => write!(f, "black"),
            Background::Agar => write!(f, "agar"),
            Background::Paper => write!(f, "paper"),
        }
    }
}

/// Settings for a single simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Output canvas resolution
    pub resolution: Resolution,
    /// Opacity applied to every paint event (0.0 to 1.0)
    pub opacity: f32,
    /// Pixels kept free around the labware layout
    pub margin: u32,
    /// Canvas background
    pub background: Background,
    /// Fixed drop radius in pixels; derived from well diameter and the
    /// dispensed volume when unset
    pub drop_radius: Option<u32>,
    /// Volume (µL) at which a drop fills its well; smaller drops shrink
    /// with the square root of their volume
    pub full_drop_volume: f64,
    /// Petri dish drawn under the layout (mm); `None` fills the whole canvas
    pub dish_diameter: Option<f64>,
    /// Draw smears when the pipette moves away right after dispensing
    pub smears: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            opacity: 1.0,
            margin: DEFAULT_MARGIN_PX,
            background: Background::Black,
            drop_radius: None,
            full_drop_volume: DEFAULT_FULL_DROP_VOLUME_UL,
            dish_diameter: Some(PETRI_INNER_DIAMETER_MM),
            smears: false,
        }
    }
}

impl SimulationConfig {
    /// Small canvas for quick looks (256x256)
    pub fn preview() -> Self {
        Self {
            resolution: Resolution::new(256, 256),
            margin: 8,
            ..Self::default()
        }
    }

    /// Large canvas for printing (2048x2048)
    pub fn poster() -> Self {
        Self {
            resolution: Resolution::new(2048, 2048),
            margin: 64,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields keep defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BioartError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: SimulationConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(BioartError::InvalidProtocol {
                reason: format!("opacity must be within 0..=1, got {}", self.opacity),
            });
        }
        if !self.resolution.is_valid() {
            return Err(BioartError::InvalidResolution {
                value: self.resolution.to_string(),
            });
        }
        let Resolution { width, height } = self.resolution;
        if self.margin.saturating_mul(2) >= width.min(height) {
            return Err(BioartError::InvalidProtocol {
                reason: format!(
                    "margin {}px leaves no drawable area on a {} canvas",
                    self.margin, self.resolution
                ),
            });
        }
        if !self.full_drop_volume.is_finite() || self.full_drop_volume <= 0.0 {
            return Err(BioartError::InvalidProtocol {
                reason: format!(
                    "full drop volume must be positive, got {}",
                    self.full_drop_volume
                ),
            });
        }
        if let Some(diameter) = self.dish_diameter {
            if !diameter.is_finite() || diameter <= 0.0 {
                return Err(BioartError::InvalidProtocol {
                    reason: format!("dish diameter must be positive, got {}", diameter),
                });
            }
        }
        Ok(())
    }
}
