//! Protocol loading
//!
//! Reads JSON protocol documents and checks them for structural mistakes
//! before any action runs. Batch mode discovers protocols in a directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use super::action::Protocol;
use crate::error::{BioartError, Result};
use crate::labware::Deck;
use crate::liquid::{parse_color, Rgba};

/// File extension of protocol documents
pub const PROTOCOL_EXTENSION: &str = "json";

/// Load and validate a protocol file
pub fn load_protocol(path: &Path) -> Result<Protocol> {
    if !path.exists() {
        return Err(BioartError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    info!("Loading protocol: {}", path.display());
    let content = std::fs::read_to_string(path)?;
    let mut protocol = parse_protocol(&content)?;
    if protocol.name.is_empty() {
        protocol.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(protocol)
}

/// Parse and validate a protocol from JSON text
pub fn parse_protocol(json: &str) -> Result<Protocol> {
    let protocol: Protocol = serde_json::from_str(json)?;
    validate_protocol(&protocol)?;
    debug!(
        "Parsed protocol '{}': {} labware, {} liquids, {} actions",
        protocol.name,
        protocol.labware.len(),
        protocol.liquids.len(),
        protocol.actions.len()
    );
    Ok(protocol)
}

/// Structural checks that need no simulation
pub fn validate_protocol(protocol: &Protocol) -> Result<()> {
    let mut deck = Deck::new();
    for setup in &protocol.labware {
        deck.load(setup.labware.clone())?;
        for (well, mixture) in &setup.contents {
            setup.labware.position_of(well)?;
            check_volumes(mixture.iter(), &format!("{}:{}", setup.labware.name, well))?;
        }
    }

    let mut seen: BTreeMap<&str, Rgba> = BTreeMap::new();
    for liquid in &protocol.liquids {
        if liquid.name.trim().is_empty() {
            return Err(BioartError::InvalidProtocol {
                reason: "liquid with an empty name".to_string(),
            });
        }
        let color = parse_color(liquid.color.as_deref().unwrap_or(&liquid.name))?;
        match seen.insert(liquid.name.as_str(), color) {
            Some(previous) if previous != color => {
                return Err(BioartError::DuplicateLiquid {
                    name: liquid.name.clone(),
                });
            }
            Some(_) => debug!("Liquid '{}' is listed more than once", liquid.name),
            None => {}
        }
    }

    if let Some(tip) = &protocol.initial_tip {
        check_volumes(tip.iter(), "initial tip")?;
    }
    Ok(())
}

fn check_volumes<'a>(volumes: impl Iterator<Item = (&'a str, f64)>, place: &str) -> Result<()> {
    for (liquid, volume) in volumes {
        if !volume.is_finite() || volume < 0.0 {
            return Err(BioartError::InvalidProtocol {
                reason: format!("{} holds an invalid volume of '{}': {}", place, liquid, volume),
            });
        }
    }
    Ok(())
}

/// Every protocol file below `dir`, sorted by path
pub fn discover_protocols(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(BioartError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            BioartError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
        })?;
        let is_protocol = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case(PROTOCOL_EXTENSION));
        if is_protocol {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MINIMAL: &str = r##"{
        "name": "minimal",
        "labware": [
            {"name": "plate", "rows": 2, "columns": 2, "column_spacing": 9, "row_spacing": 9,
             "well_diameter": 6, "contents": {"A1": {"red": 100}}}
        ],
        "liquids": [{"name": "red", "color": "#ff0000"}],
        "actions": [
            {"action": "aspirate", "well": "plate:A1", "volume": 10},
            {"action": "dispense", "well": "plate:B2", "volume": 10}
        ]
    }"##;

    #[test]
    fn test_parse_minimal() {
        let protocol = parse_protocol(MINIMAL).unwrap();
        assert_eq!(protocol.name, "minimal");
        assert_eq!(protocol.labware[0].labware.rows, 2);
        assert_eq!(protocol.labware[0].labware.origin, [0.0, 0.0]);
        assert_eq!(protocol.labware[0].contents["A1"].volume_of("red"), 100.0);
        assert_eq!(protocol.actions.len(), 2);
        assert!(protocol.initial_tip.is_none());
    }

    #[test]
    fn test_rejects_contents_outside_grid() {
        let json = MINIMAL.replace(r#""A1": {"red": 100}"#, r#""C7": {"red": 100}"#);
        let err = parse_protocol(&json).unwrap_err();
        assert!(matches!(err, BioartError::InvalidWell { .. }));
    }

    #[test]
    fn test_rejects_negative_volume() {
        let json = MINIMAL.replace(r#"{"red": 100}"#, r#"{"red": -1}"#);
        let err = parse_protocol(&json).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PROTOCOL");
    }

    #[test]
    fn test_conflicting_liquid_colors() {
        let json = MINIMAL.replace(
            r##"[{"name": "red", "color": "#ff0000"}]"##,
            r##"[{"name": "red", "color": "#ff0000"}, {"name": "red", "color": "blue"}]"##,
        );
        let err = parse_protocol(&json).unwrap_err();
        assert!(matches!(err, BioartError::DuplicateLiquid { ref name } if name == "red"));
    }

    #[test]
    fn test_repeated_liquid_with_same_color_loads() {
        let json = MINIMAL.replace(
            r##"[{"name": "red", "color": "#ff0000"}]"##,
            r##"[{"name": "red", "color": "#ff0000"}, {"name": "red", "color": "red"}]"##,
        );
        let protocol = parse_protocol(&json).unwrap();
        assert_eq!(protocol.liquids.len(), 2);
    }

    #[test]
    fn test_unresolvable_liquid_color() {
        let json = MINIMAL.replace("#ff0000", "not-a-color");
        let err = parse_protocol(&json).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_COLOR");
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = parse_protocol("{ not json").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_load_names_protocol_after_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("smiley.json");
        fs::write(&path, MINIMAL.replace(r#""name": "minimal","#, "")).unwrap();

        let protocol = load_protocol(&path).unwrap();
        assert_eq!(protocol.name, "smiley");
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_protocol(Path::new("/nonexistent/protocol.json")).unwrap_err();
        assert!(matches!(err, BioartError::FileNotFound { .. }));
    }

    #[test]
    fn test_discover_protocols_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.JSON"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.json"), "{}").unwrap();

        let found = discover_protocols(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.JSON", "b.json", "c.json"]);
    }
}
