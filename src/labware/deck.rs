//! Deck state: labware placed for a run and the liquid held by each well

use std::collections::BTreeMap;

use crate::error::{BioartError, Result};
use crate::liquid::Mixture;

use super::geometry::{Labware, WellPosition};

/// Labware and well contents owned by a single run
#[derive(Debug, Clone, Default)]
pub struct Deck {
    labware: BTreeMap<String, Labware>,
    wells: BTreeMap<(String, WellPosition), Mixture>,
}

impl Deck {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a labware on the deck. Names must be unique.
    pub fn load(&mut self, labware: Labware) -> Result<()> {
        labware.validate()?;
        if self.labware.contains_key(&labware.name) {
            return Err(BioartError::InvalidProtocol {
                reason: format!("labware '{}' is defined twice", labware.name),
            });
        }
        self.labware.insert(labware.name.clone(), labware);
        Ok(())
    }

    pub fn labware(&self, name: &str) -> Result<&Labware> {
        self.labware
            .get(name)
            .ok_or_else(|| BioartError::UnknownLabware {
                name: name.to_string(),
            })
    }

    pub fn all_labware(&self) -> impl Iterator<Item = &Labware> {
        self.labware.values()
    }

    /// Resolve `(labware, well id)` to a validated position
    pub fn resolve(&self, labware: &str, well_id: &str) -> Result<WellPosition> {
        self.labware(labware)?.position_of(well_id)
    }

    /// Contents of a well; empty if nothing was ever added
    pub fn well(&self, labware: &str, pos: WellPosition) -> Mixture {
        self.wells
            .get(&(labware.to_string(), pos))
            .cloned()
            .unwrap_or_default()
    }

    pub fn well_mut(&mut self, labware: &str, pos: WellPosition) -> &mut Mixture {
        self.wells.entry((labware.to_string(), pos)).or_default()
    }

    /// Add liquid to a well by id
    pub fn fill(&mut self, labware: &str, well_id: &str, mixture: &Mixture) -> Result<()> {
        let pos = self.resolve(labware, well_id)?;
        self.well_mut(labware, pos).add(mixture);
        Ok(())
    }

    /// Every well that currently holds liquid, in deck order
    pub fn filled_wells(&self) -> impl Iterator<Item = (&str, WellPosition, &Mixture)> {
        self.wells
            .iter()
            .filter(|(_, m)| !m.is_empty())
            .map(|((name, pos), m)| (name.as_str(), *pos, m))
    }

    /// Total liquid on the deck
    pub fn total_volume(&self) -> f64 {
        self.wells.values().map(Mixture::total).sum()
    }
}
