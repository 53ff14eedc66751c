//! Liquid mixtures held by wells and the pipette tip

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Volumes below this are treated as zero (µL).
pub const VOLUME_EPSILON: f64 = 1e-9;

/// A mapping from liquid name to volume in µL.
///
/// Keys are kept sorted so iteration, serialization and blending are
/// independent of the order in which liquids were added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mixture {
    volumes: BTreeMap<String, f64>,
}

impl Mixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mixture holding a single liquid.
    pub fn single(liquid: impl Into<String>, volume: f64) -> Self {
        let mut mixture = Self::new();
        mixture.add_liquid(liquid, volume);
        mixture
    }

    /// Total volume across all constituents
    pub fn total(&self) -> f64 {
        self.volumes.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() <= VOLUME_EPSILON
    }

    pub fn volume_of(&self, liquid: &str) -> f64 {
        self.volumes.get(liquid).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.volumes.iter().map(|(name, v)| (name.as_str(), *v))
    }

    pub fn add_liquid(&mut self, liquid: impl Into<String>, volume: f64) {
        if volume <= 0.0 {
            return;
        }
        *self.volumes.entry(liquid.into()).or_insert(0.0) += volume;
    }

    /// Add every constituent of `other` to this mixture.
    pub fn add(&mut self, other: &Mixture) {
        for (liquid, volume) in other.iter() {
            self.add_liquid(liquid, volume);
        }
    }

    /// Remove `volume` proportionally from every constituent and return the
    /// removed sample. Callers check the total first; the request is capped at
    /// the available volume.
    pub fn take(&mut self, volume: f64) -> Mixture {
        let total = self.total();
        if total <= VOLUME_EPSILON || volume <= 0.0 {
            return Mixture::new();
        }

        let fraction = (volume / total).min(1.0);
        let mut sample = Mixture::new();
        for (liquid, held) in self.volumes.iter_mut() {
            let portion = *held * fraction;
            *held -= portion;
            sample.add_liquid(liquid.clone(), portion);
        }
        self.volumes.retain(|_, v| *v > VOLUME_EPSILON);
        sample
    }

    pub fn clear(&mut self) {
        self.volumes.clear();
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Mixture {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut mixture = Mixture::new();
        for (liquid, volume) in iter {
            mixture.add_liquid(liquid, volume);
        }
        mixture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_take_is_proportional() {
        let mut well: Mixture = [("red", 30.0), ("blue", 10.0)].into_iter().collect();
        let sample = well.take(20.0);

        assert_relative_eq!(sample.volume_of("red"), 15.0);
        assert_relative_eq!(sample.volume_of("blue"), 5.0);
        assert_relative_eq!(well.total(), 20.0);
        assert_relative_eq!(well.volume_of("red"), 15.0);
    }

    #[test]
    fn test_take_everything_empties() {
        let mut well = Mixture::single("red", 12.5);
        let sample = well.take(12.5);
        assert_relative_eq!(sample.total(), 12.5);
        assert!(well.is_empty());
        assert_eq!(well.iter().count(), 0);
    }

    #[test]
    fn test_add_merges_constituents() {
        let mut well = Mixture::single("red", 5.0);
        well.add(&Mixture::single("red", 2.5));
        well.add(&Mixture::single("blue", 1.0));
        assert_relative_eq!(well.volume_of("red"), 7.5);
        assert_relative_eq!(well.total(), 8.5);
    }

    #[test]
    fn test_non_positive_volumes_ignored() {
        let mut well = Mixture::new();
        well.add_liquid("red", 0.0);
        well.add_liquid("blue", -3.0);
        assert!(well.is_empty());
        assert_eq!(well.iter().count(), 0);
    }
}
