//! CLI Command Implementations
//!
//! Implements the simulate command for single protocols and batch directories.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::Cli;
use crate::config::SimulationConfig;
use crate::error::{BioartError, Result};
use crate::liquid::resolve_visual_color;
use crate::protocol::{discover_protocols, load_protocol, Protocol, RunReport};
use crate::render::{self, ImageFormat};
use crate::simulation::{Simulation, SimulationOutput};

/// Entry point: simulate one protocol file or every protocol in a directory.
pub fn run(cli: &Cli) -> Result<()> {
    let config = build_config(cli)?;

    if cli.protocol.is_dir() {
        let rendered = simulate_batch(&cli.protocol, cli.save.as_deref(), cli.format, &config)?;
        println!("Rendered {} protocol(s)", rendered);
        Ok(())
    } else {
        simulate(&cli.protocol, cli.save.as_deref(), cli.format, &config).map(|_| ())
    }
}

/// Resolve the configuration: defaults, then the config file, then flags.
pub fn build_config(cli: &Cli) -> Result<SimulationConfig> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(resolution) = cli.resolution {
        config.resolution = resolution;
    }
    if let Some(background) = cli.background {
        config.background = background;
    }
    if let Some(opacity) = cli.opacity {
        config.opacity = opacity;
    }
    if cli.smears {
        config.smears = true;
    }
    if cli.no_dish {
        config.dish_diameter = None;
    }

    config.validate()?;
    Ok(config)
}

/// Simulate a single protocol file, optionally saving the image.
///
/// Nothing is written unless every action succeeded.
pub fn simulate(
    path: &Path,
    save: Option<&Path>,
    format: Option<ImageFormat>,
    config: &SimulationConfig,
) -> Result<SimulationOutput> {
    let protocol = load_protocol(path)?;
    let output = Simulation::new(config.clone()).run(&protocol)?;

    print_volume_summary(&protocol, &output.report);
    println!("Checksum: {}", output.checksum());

    match save {
        Some(out) => {
            render::save(&output.raster, out, format)?;
            println!("\nImage saved to: {}", out.display());
        }
        None => info!("No --save given, image not written"),
    }

    Ok(output)
}

/// Render every protocol below `dir` into `out_dir`, mirroring the
/// directory layout (`dir/a/b.json` becomes `out_dir/a/b.<ext>`).
///
/// Output names are checked for clashes before anything is rendered.
/// Stops at the first failing protocol.
pub fn simulate_batch(
    dir: &Path,
    out_dir: Option<&Path>,
    format: Option<ImageFormat>,
    config: &SimulationConfig,
) -> Result<usize> {
    let protocols = discover_protocols(dir)?;
    if protocols.is_empty() {
        warn!("No protocols found in {}", dir.display());
        return Ok(0);
    }

    let format = format.unwrap_or(ImageFormat::Png);
    let targets: Vec<Option<PathBuf>> = match out_dir {
        Some(out_dir) => batch_targets(dir, out_dir, &protocols, format)?
            .into_iter()
            .map(Some)
            .collect(),
        None => vec![None; protocols.len()],
    };

    info!("Batch: {} protocol(s) in {}", protocols.len(), dir.display());
    for (path, target) in protocols.iter().zip(&targets) {
        println!("\n--- {} ---", path.display());
        if let Some(parent) = target.as_deref().and_then(Path::parent) {
            std::fs::create_dir_all(parent).map_err(|source| BioartError::IoWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        simulate(path, target.as_deref(), Some(format), config)?;
    }

    Ok(protocols.len())
}

/// Output image for `protocol`, found below `input_dir`: its path relative
/// to `input_dir`, moved under `out_dir`, with the image extension.
pub fn output_path(
    input_dir: &Path,
    out_dir: &Path,
    protocol: &Path,
    format: ImageFormat,
) -> PathBuf {
    let relative = match protocol.strip_prefix(input_dir) {
        Ok(rel) if rel.file_name().is_some() => rel.to_path_buf(),
        _ => PathBuf::from(protocol.file_name().unwrap_or_default()),
    };
    out_dir.join(relative).with_extension(format.extension())
}

/// One output path per protocol; fails if two protocols would share one.
fn batch_targets(
    input_dir: &Path,
    out_dir: &Path,
    protocols: &[PathBuf],
    format: ImageFormat,
) -> Result<Vec<PathBuf>> {
    let mut claimed: BTreeMap<PathBuf, &Path> = BTreeMap::new();
    let mut targets = Vec::with_capacity(protocols.len());
    for protocol in protocols {
        let target = output_path(input_dir, out_dir, protocol, format);
        if let Some(first) = claimed.insert(target.clone(), protocol) {
            return Err(BioartError::InvalidProtocol {
                reason: format!(
                    "{} and {} would both be saved to {}",
                    first.display(),
                    protocol.display(),
                    target.display()
                ),
            });
        }
        targets.push(target);
    }
    Ok(targets)
}

/// Display name of a liquid's color: the protein or color name it was
/// declared with, resolved the way the registry resolves it.
pub fn visual_color_name(protocol: &Protocol, liquid: &str) -> String {
    let spec = protocol
        .liquids
        .iter()
        .find(|l| l.name == liquid)
        .map(|l| l.color.as_deref().unwrap_or(&l.name))
        .unwrap_or(liquid);
    resolve_visual_color(spec).trim().to_string()
}

/// Print aspirated/dispensed totals per liquid and flag waste.
fn print_volume_summary(protocol: &Protocol, report: &RunReport) {
    let totals = &report.totals;

    println!(
        "Protocol '{}': {} action(s), {} paint event(s)",
        report.protocol, report.actions_run, report.paint_events
    );
    println!("\n=== TOTAL VOLUMES BY LIQUID ===");
    for liquid in totals.liquids() {
        let asp = totals.aspirated.get(liquid).copied().unwrap_or(0.0);
        let disp = totals.dispensed.get(liquid).copied().unwrap_or(0.0);
        let color = visual_color_name(protocol, liquid);
        let waste = if totals.wasted().iter().any(|(name, _)| *name == liquid) {
            "\t\t##### WASTE: more aspirated than dispensed!"
        } else {
            ""
        };
        println!(
            "\t{} ({}):\t aspirated {:.1}\t dispensed {:.1}{}",
            liquid, color, asp, disp, waste
        );
    }
    println!(
        "\t[all]:\t\t[aspirated {:.1}]\t[dispensed {:.1}]",
        totals.total_aspirated(),
        totals.total_dispensed()
    );

    if !report.tip.is_empty() {
        println!("\nTip still holds {:.1}µL", report.tip.volume());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    const DOT: &str = r##"{
        "labware": [{"name": "plate", "rows": 2, "columns": 2, "column_spacing": 9,
                     "row_spacing": 9, "well_diameter": 6}],
        "liquids": [{"name": "red", "color": "#ff0000"}],
        "initial_tip": {"red": 20},
        "actions": [{"action": "dispense", "well": "plate:A1", "volume": 10}]
    }"##;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["opentrons-bioart-sim"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"opacity": 0.25, "background": "paper"}"#).unwrap();
        let config_arg = config_path.to_string_lossy().into_owned();

        let config = build_config(&cli(&["p.json", "-c", &config_arg, "--opacity", "0.75"])).unwrap();
        assert_eq!(config.opacity, 0.75);
        assert_eq!(config.background, crate::config::Background::Paper);
    }

    #[test]
    fn test_no_dish_flag() {
        assert!(build_config(&cli(&["p.json"])).unwrap().dish_diameter.is_some());
        assert_eq!(build_config(&cli(&["p.json", "--no-dish"])).unwrap().dish_diameter, None);
    }

    #[test]
    fn test_invalid_opacity_flag() {
        let err = build_config(&cli(&["p.json", "--opacity", "2"])).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PROTOCOL");
    }

    #[test]
    fn test_simulate_writes_image() {
        let dir = tempdir().unwrap();
        let protocol = dir.path().join("dot.json");
        fs::write(&protocol, DOT).unwrap();
        let out = dir.path().join("dot.png");

        let config = SimulationConfig::preview();
        let output = simulate(&protocol, Some(&out), None, &config).unwrap();
        assert!(out.exists());
        assert_eq!(output.report.protocol, "dot");
    }

    #[test]
    fn test_failed_protocol_writes_nothing() {
        let dir = tempdir().unwrap();
        let protocol = dir.path().join("bad.json");
        fs::write(&protocol, DOT.replace(r#""volume": 10"#, r#""volume": 50"#)).unwrap();
        let out = dir.path().join("bad.png");

        let err = simulate(&protocol, Some(&out), None, &SimulationConfig::preview()).unwrap_err();
        assert_eq!(err.root().error_code(), "EMPTY_TIP");
        assert!(!out.exists());
    }

    #[test]
    fn test_batch_renders_each_protocol() {
        let dir = tempdir().unwrap();
        let protocols = dir.path().join("protocols");
        fs::create_dir(&protocols).unwrap();
        fs::write(protocols.join("one.json"), DOT).unwrap();
        fs::write(protocols.join("two.json"), DOT).unwrap();
        let out = dir.path().join("images");

        let count = simulate_batch(
            &protocols,
            Some(&out),
            Some(ImageFormat::Bmp),
            &SimulationConfig::preview(),
        )
        .unwrap();
        assert_eq!(count, 2);
        assert!(out.join("one.bmp").exists());
        assert!(out.join("two.bmp").exists());
    }

    #[test]
    fn test_output_path_mirrors_input_tree() {
        let path = output_path(
            Path::new("in"),
            Path::new("out"),
            Path::new("in/smiley.json"),
            ImageFormat::Jpeg,
        );
        assert_eq!(path, PathBuf::from("out/smiley.jpg"));

        let path = output_path(
            Path::new("in"),
            Path::new("out"),
            Path::new("in/faces/smiley.json"),
            ImageFormat::Png,
        );
        assert_eq!(path, PathBuf::from("out/faces/smiley.png"));
    }

    #[test]
    fn test_batch_keeps_same_named_protocols_apart() {
        let dir = tempdir().unwrap();
        let protocols = dir.path().join("protocols");
        fs::create_dir_all(protocols.join("nested")).unwrap();
        fs::write(protocols.join("art.json"), DOT).unwrap();
        fs::write(protocols.join("nested").join("art.json"), DOT).unwrap();
        let out = dir.path().join("images");

        let count =
            simulate_batch(&protocols, Some(&out), None, &SimulationConfig::preview()).unwrap();
        assert_eq!(count, 2);
        assert!(out.join("art.png").exists());
        assert!(out.join("nested").join("art.png").exists());
    }

    #[test]
    fn test_batch_rejects_clashing_outputs_before_rendering() {
        let dir = tempdir().unwrap();
        let protocols = dir.path().join("protocols");
        fs::create_dir(&protocols).unwrap();
        fs::write(protocols.join("art.json"), DOT).unwrap();
        fs::write(protocols.join("art.JSON"), DOT).unwrap();
        let out = dir.path().join("images");

        let err = simulate_batch(&protocols, Some(&out), None, &SimulationConfig::preview())
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PROTOCOL");
        assert!(!out.join("art.png").exists());
    }

    #[test]
    fn test_visual_color_name() {
        let protocol = Protocol::new("colors")
            .with_liquid("sfGFP", None)
            .with_liquid("dye", Some("mCherry"))
            .with_liquid("ink", Some("#0000ff"));

        assert_eq!(visual_color_name(&protocol, "sfGFP"), "lime");
        assert_eq!(visual_color_name(&protocol, "dye"), "firebrick");
        assert_eq!(visual_color_name(&protocol, "ink"), "#0000ff");
    }
}
