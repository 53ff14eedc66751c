//! Error handling for the bio-art simulator
//!
//! Every failure the interpreter, registry, mapper or exporter can raise is a
//! variant of [`BioartError`]. Errors are never retried internally: they are
//! either protocol-authoring mistakes or environment failures.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for simulator operations
pub type Result<T> = std::result::Result<T, BioartError>;

/// Main error type for simulator operations
#[derive(Error, Debug)]
pub enum BioartError {
    // Labware Errors
    #[error("Invalid well '{well}' for labware '{labware}'")]
    InvalidWell { labware: String, well: String },

    #[error("Unknown labware: {name}")]
    UnknownLabware { name: String },

    // Liquid Errors
    #[error("Liquid '{name}' is already registered with a different color")]
    DuplicateLiquid { name: String },

    #[error("Unknown liquid: {name}")]
    UnknownLiquid { name: String },

    #[error("Invalid color '{spec}'")]
    InvalidColor { spec: String },

    // Pipetting Errors
    #[error("Insufficient volume in {well}: requested {requested:.3}µL, available {available:.3}µL")]
    InsufficientVolume {
        well: String,
        requested: f64,
        available: f64,
    },

    #[error("Tip holds {available:.3}µL, cannot dispense {requested:.3}µL")]
    EmptyTip { requested: f64, available: f64 },

    #[error("Volume must be a positive number, got {volume}")]
    InvalidVolume { volume: f64 },

    #[error("Pipette is at {current}, not at {target} (protocol requires explicit moves)")]
    NotAtWell { target: String, current: String },

    #[error("Action #{index} ({kind}) failed: {source}")]
    ActionFailed {
        index: usize,
        kind: &'static str,
        #[source]
        source: Box<BioartError>,
    },

    // Protocol / Config Errors
    #[error("Invalid protocol: {reason}")]
    InvalidProtocol { reason: String },

    #[error("Invalid resolution '{value}' (expected WIDTHxHEIGHT)")]
    InvalidResolution { value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    // Export Errors
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to write image: {path}: {source}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image encoding failed: {reason}")]
    Encode { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BioartError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BioartError::InvalidWell { .. } => "INVALID_WELL",
            BioartError::UnknownLabware { .. } => "UNKNOWN_LABWARE",
            BioartError::DuplicateLiquid { .. } => "DUPLICATE_LIQUID",
            BioartError::UnknownLiquid { .. } => "UNKNOWN_LIQUID",
            BioartError::InvalidColor { .. } => "INVALID_COLOR",
            BioartError::InsufficientVolume { .. } => "INSUFFICIENT_VOLUME",
            BioartError::EmptyTip { .. } => "EMPTY_TIP",
            BioartError::InvalidVolume { .. } => "INVALID_VOLUME",
            BioartError::NotAtWell { .. } => "NOT_AT_WELL",
            BioartError::ActionFailed { .. } => "ACTION_FAILED",
            BioartError::InvalidProtocol { .. } => "INVALID_PROTOCOL",
            BioartError::InvalidResolution { .. } => "INVALID_RESOLUTION",
            BioartError::FileNotFound { .. } => "FILE_NOT_FOUND",
            BioartError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            BioartError::IoWrite { .. } => "IO_WRITE",
            BioartError::Encode { .. } => "ENCODE_ERROR",
            BioartError::Io(_) => "IO_ERROR",
            BioartError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// The underlying error for a failed action, or `self` otherwise.
    pub fn root(&self) -> &BioartError {
        match self {
            BioartError::ActionFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns true if the error stems from the protocol itself rather than
    /// the environment (disk, encoder).
    pub fn is_protocol_error(&self) -> bool {
        !matches!(
            self.root(),
            BioartError::IoWrite { .. }
                | BioartError::Encode { .. }
                | BioartError::Io(_)
                | BioartError::FileNotFound { .. }
        )
    }

    /// Returns a user-friendly recovery suggestion.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self.root() {
            BioartError::InvalidWell { .. } => {
                Some("Check the well id against the labware's rows and columns.")
            }
            BioartError::UnknownLiquid { .. } => {
                Some("Declare the liquid in the protocol's \"liquids\" list.")
            }
            BioartError::InsufficientVolume { .. } => {
                Some("Add initial contents to the source well or aspirate less.")
            }
            BioartError::EmptyTip { .. } => {
                Some("Aspirate before dispensing, or declare an \"initial_tip\".")
            }
            BioartError::NotAtWell { .. } => Some("Insert a move action before this step."),
            BioartError::UnsupportedFormat { .. } => Some("Supported formats: png, jpg, bmp."),
            BioartError::IoWrite { .. } => {
                Some("Check that the output directory exists and is writable.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = BioartError::EmptyTip {
            requested: 5.0,
            available: 0.0,
        };
        assert_eq!(err.error_code(), "EMPTY_TIP");
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_action_failed_exposes_root() {
        let err = BioartError::ActionFailed {
            index: 3,
            kind: "dispense",
            source: Box::new(BioartError::EmptyTip {
                requested: 5.0,
                available: 1.0,
            }),
        };
        assert!(matches!(err.root(), BioartError::EmptyTip { .. }));
        assert!(err.to_string().starts_with("Action #3 (dispense) failed"));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn test_io_write_is_environment_error() {
        let err = BioartError::IoWrite {
            path: PathBuf::from("/nope/out.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(!err.is_protocol_error());
        assert_eq!(err.error_code(), "IO_WRITE");
    }
}
