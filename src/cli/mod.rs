//! CLI Module
//!
//! Command-line interface for the bio-art simulator.

pub mod commands;

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Background, Resolution};
use crate::render::ImageFormat;

/// Opentrons bio-art simulator - render pipetting protocols as images
#[derive(Parser, Debug)]
#[command(name = "opentrons-bioart-sim")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Protocol file, or a directory of protocol files
    pub protocol: PathBuf,

    /// Output image (or output directory in batch mode)
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    /// Image format; inferred from the output extension when omitted
    #[arg(short, long, value_enum)]
    pub format: Option<ImageFormat>,

    /// Canvas size as WIDTHxHEIGHT
    #[arg(short, long)]
    pub resolution: Option<Resolution>,

    /// Canvas background
    #[arg(short, long, value_enum)]
    pub background: Option<Background>,

    /// Paint opacity between 0.0 and 1.0
    #[arg(long)]
    pub opacity: Option<f32>,

    /// Draw smears when the pipette leaves a fresh drop
    #[arg(long)]
    pub smears: bool,

    /// Fill the whole canvas instead of drawing a petri dish
    #[arg(long)]
    pub no_dish: bool,

    /// JSON simulation config; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "opentrons-bioart-sim",
            "smiley.json",
            "--save",
            "out.jpg",
            "--format",
            "jpeg",
            "--resolution",
            "640x480",
            "--background",
            "agar",
            "--opacity",
            "0.5",
            "--smears",
        ])
        .unwrap();

        assert_eq!(cli.protocol, PathBuf::from("smiley.json"));
        assert_eq!(cli.save, Some(PathBuf::from("out.jpg")));
        assert_eq!(cli.format, Some(ImageFormat::Jpeg));
        assert_eq!(cli.resolution, Some(Resolution::new(640, 480)));
        assert_eq!(cli.background, Some(Background::Agar));
        assert_eq!(cli.opacity, Some(0.5));
        assert!(cli.smears);
        assert!(!cli.no_dish);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_rejects_bad_resolution() {
        let result = Cli::try_parse_from(["opentrons-bioart-sim", "p.json", "-r", "wide"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let result = Cli::try_parse_from(["opentrons-bioart-sim", "p.json", "-f", "gif"]);
        assert!(result.is_err());
    }
}
