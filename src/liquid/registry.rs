//! Liquid Registry
//!
//! Owns the liquid descriptors referenced by name from wells and the tip,
//! and computes the display color of a mixture.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use super::color::{parse_color, Rgba};
use super::mixture::Mixture;
use crate::error::{BioartError, Result};

/// Immutable liquid descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liquid {
    pub name: String,
    pub color: Rgba,
}

/// Registry of named liquids for a single run
#[derive(Debug, Clone, Default)]
pub struct LiquidRegistry {
    liquids: BTreeMap<String, Liquid>,
}

impl LiquidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a liquid.
    ///
    /// Re-registering the same name with the same color is a no-op; a
    /// different color fails with `DuplicateLiquid`.
    pub fn register(&mut self, name: &str, color: Rgba) -> Result<()> {
        if let Some(existing) = self.liquids.get(name) {
            if existing.color == color {
                return Ok(());
            }
            return Err(BioartError::DuplicateLiquid {
                name: name.to_string(),
            });
        }

        debug!("Registered liquid '{}' as {}", name, color);
        self.liquids.insert(
            name.to_string(),
            Liquid {
                name: name.to_string(),
                color,
            },
        );
        Ok(())
    }

    /// Register a liquid from a color spec (protein name, color name or hex).
    /// Without a spec the liquid name itself is resolved.
    pub fn register_spec(&mut self, name: &str, spec: Option<&str>) -> Result<()> {
        let color = parse_color(spec.unwrap_or(name))?;
        self.register(name, color)
    }

    pub fn get(&self, name: &str) -> Result<&Liquid> {
        self.liquids
            .get(name)
            .ok_or_else(|| BioartError::UnknownLiquid {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.liquids.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.liquids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.liquids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Liquid> {
        self.liquids.values()
    }

    /// Volume- and alpha-weighted linear blend of a mixture's colors.
    ///
    /// RGB channels are weighted by `volume × alpha`, the alpha channel by
    /// volume alone. Constituents are summed in name order, so the result is
    /// bit-identical whatever order the liquids were added in. An empty
    /// mixture is fully transparent.
    pub fn color_of_mixture(&self, mixture: &Mixture) -> Result<Rgba> {
        let mut rgb = [0.0_f64; 3];
        let mut weight_total = 0.0_f64;
        let mut alpha_total = 0.0_f64;
        let mut volume_total = 0.0_f64;

        for (name, volume) in mixture.iter() {
            let color = self.get(name)?.color;
            if volume <= 0.0 {
                continue;
            }
            let alpha = color.a as f64 / 255.0;
            let weight = volume * alpha;
            rgb[0] += weight * color.r as f64;
            rgb[1] += weight * color.g as f64;
            rgb[2] += weight * color.b as f64;
            weight_total += weight;
            alpha_total += volume * color.a as f64;
            volume_total += volume;
        }

        // Empty, or every constituent fully transparent.
        if volume_total <= 0.0 || weight_total <= 0.0 {
            return Ok(Rgba::TRANSPARENT);
        }

        Ok(Rgba::from_f32([
            (rgb[0] / weight_total) as f32,
            (rgb[1] / weight_total) as f32,
            (rgb[2] / weight_total) as f32,
            (alpha_total / volume_total) as f32,
        ]))
    }
}
