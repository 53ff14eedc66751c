//! Labware geometry
//!
//! A labware is a named grid of wells. Well identifiers are a row label
//! (`A`..`Z`, then `AA`, `AB`, ...) followed by a 1-based column number.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BioartError, Result};

/// Zero-based (row, column) position of a well
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WellPosition {
    pub row: u32,
    pub column: u32,
}

impl WellPosition {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Parse an identifier such as `A1`, `h12` or `AB3`.
    ///
    /// Only the syntax is checked here; grid bounds are checked by
    /// [`Labware::position_of`].
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim();
        let split = id.find(|c: char| !c.is_ascii_alphabetic())?;
        let (letters, digits) = id.split_at(split);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        // Bijective base-26: A=1 .. Z=26, AA=27
        let mut row: u32 = 0;
        for b in letters.bytes() {
            let value = (b.to_ascii_uppercase() - b'A') as u32 + 1;
            row = row.checked_mul(26)?.checked_add(value)?;
        }
        let column: u32 = digits.parse().ok()?;
        if column == 0 {
            return None;
        }

        Some(Self::new(row - 1, column - 1))
    }

    /// Row label for a zero-based row index
    pub fn row_label(row: u32) -> String {
        let mut n = row as u64 + 1;
        let mut label = Vec::new();
        while n > 0 {
            let rem = ((n - 1) % 26) as u8;
            label.push(b'A' + rem);
            n = (n - 1) / 26;
        }
        label.reverse();
        String::from_utf8(label).unwrap_or_default()
    }
}

impl fmt::Display for WellPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", Self::row_label(self.row), self.column + 1)
    }
}

/// A named grid of wells.
///
/// Distances are in millimetres. The origin is the top-left corner of the
/// first well's bounding square in deck coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labware {
    pub name: String,
    pub rows: u32,
    pub columns: u32,
    /// Center-to-center distance between adjacent columns
    pub column_spacing: f64,
    /// Center-to-center distance between adjacent rows
    pub row_spacing: f64,
    pub well_diameter: f64,
    #[serde(default)]
    pub origin: [f64; 2],
}

impl Labware {
    pub fn new(name: impl Into<String>, rows: u32, columns: u32, spacing: f64, diameter: f64) -> Self {
        Self {
            name: name.into(),
            rows,
            columns,
            column_spacing: spacing,
            row_spacing: spacing,
            well_diameter: diameter,
            origin: [0.0, 0.0],
        }
    }

    /// Standard 96-well plate (8x12, 9mm pitch)
    pub fn plate_96(name: impl Into<String>) -> Self {
        Self::new(name, 8, 12, 9.0, 6.4)
    }

    /// Standard 384-well plate (16x24, 4.5mm pitch)
    pub fn plate_384(name: impl Into<String>) -> Self {
        Self::new(name, 16, 24, 4.5, 3.3)
    }

    /// 24-well plate (4x6, 19.3mm pitch)
    pub fn plate_24(name: impl Into<String>) -> Self {
        Self::new(name, 4, 6, 19.3, 15.6)
    }

    pub fn with_origin(mut self, x: f64, y: f64) -> Self {
        self.origin = [x, y];
        self
    }

    /// Resolve a well identifier to its grid position.
    pub fn position_of(&self, well_id: &str) -> Result<WellPosition> {
        WellPosition::parse(well_id)
            .filter(|pos| pos.row < self.rows && pos.column < self.columns)
            .ok_or_else(|| BioartError::InvalidWell {
                labware: self.name.clone(),
                well: well_id.to_string(),
            })
    }

    pub fn contains(&self, pos: WellPosition) -> bool {
        pos.row < self.rows && pos.column < self.columns
    }

    pub fn well_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// All well positions, row-major
    pub fn positions(&self) -> impl Iterator<Item = WellPosition> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.columns).map(move |col| WellPosition::new(row, col)))
    }

    /// Center of a well in deck millimetres
    pub fn well_center(&self, pos: WellPosition) -> (f64, f64) {
        let r = self.well_diameter / 2.0;
        (
            self.origin[0] + pos.column as f64 * self.column_spacing + r,
            self.origin[1] + pos.row as f64 * self.row_spacing + r,
        )
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` in deck millimetres
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let width = self.columns.saturating_sub(1) as f64 * self.column_spacing + self.well_diameter;
        let height = self.rows.saturating_sub(1) as f64 * self.row_spacing + self.well_diameter;
        (
            self.origin[0],
            self.origin[1],
            self.origin[0] + width,
            self.origin[1] + height,
        )
    }

    /// Check the geometry is usable
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| BioartError::InvalidProtocol {
            reason: format!("labware '{}': {}", self.name, reason),
        };
        if self.rows == 0 || self.columns == 0 {
            return Err(invalid("grid must have at least one row and column"));
        }
        if !(self.column_spacing > 0.0 && self.row_spacing > 0.0) {
            return Err(invalid("well spacing must be positive"));
        }
        if !(self.well_diameter > 0.0) || !self.well_diameter.is_finite() {
            return Err(invalid("well diameter must be positive"));
        }
        if !self.origin.iter().all(|v| v.is_finite()) {
            return Err(invalid("origin must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A1", 0, 0)]
    #[test_case("b3", 1, 2)]
    #[test_case(" H12 ", 7, 11)]
    #[test_case("Z1", 25, 0)]
    #[test_case("AA1", 26, 0)]
    #[test_case("AF48", 31, 47)]
    fn test_parse_well_id(id: &str, row: u32, column: u32) {
        assert_eq!(WellPosition::parse(id), Some(WellPosition::new(row, column)));
    }

    #[test_case(""; "empty")]
    #[test_case("A"; "no column")]
    #[test_case("12"; "no row")]
    #[test_case("A0"; "zero column")]
    #[test_case("A1B"; "trailing letters")]
    #[test_case("Ä1"; "non ascii")]
    fn test_parse_rejects(id: &str) {
        assert_eq!(WellPosition::parse(id), None);
    }

    #[test]
    fn test_display_roundtrips_labels() {
        for row in [0, 7, 25, 26, 31, 701, 702] {
            let pos = WellPosition::new(row, 4);
            assert_eq!(WellPosition::parse(&pos.to_string()), Some(pos));
        }
        assert_eq!(WellPosition::new(26, 0).to_string(), "AA1");
    }

    #[test]
    fn test_position_of_checks_bounds() {
        let plate = Labware::new("plate", 2, 2, 9.0, 6.0);
        assert_eq!(plate.position_of("B2").unwrap(), WellPosition::new(1, 1));

        let err = plate.position_of("C1").unwrap_err();
        assert!(matches!(err, BioartError::InvalidWell { ref well, .. } if well == "C1"));
        assert!(plate.position_of("A3").is_err());
        assert!(plate.position_of("nonsense").is_err());
    }

    #[test]
    fn test_well_center_and_extent() {
        let plate = Labware::new("plate", 2, 3, 9.0, 6.0).with_origin(10.0, 20.0);
        assert_eq!(plate.well_center(WellPosition::new(0, 0)), (13.0, 23.0));
        assert_eq!(plate.well_center(WellPosition::new(1, 2)), (31.0, 32.0));
        assert_eq!(plate.extent(), (10.0, 20.0, 34.0, 35.0));
    }

    #[test]
    fn test_positions_cover_grid() {
        let plate = Labware::plate_96("p");
        assert_eq!(plate.positions().count(), plate.well_count());
        assert_eq!(plate.positions().last(), Some(WellPosition::new(7, 11)));
    }

    #[test]
    fn test_validate() {
        assert!(Labware::plate_384("p").validate().is_ok());
        assert!(Labware::new("p", 0, 2, 9.0, 6.0).validate().is_err());
        assert!(Labware::new("p", 2, 2, 0.0, 6.0).validate().is_err());
        assert!(Labware::new("p", 2, 2, 9.0, f64::NAN).validate().is_err());
    }
}
