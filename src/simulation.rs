//! Simulation runs
//!
//! Wires a protocol to fresh registry, mapper and compositor instances and
//! returns the finished raster. Each call is independent of every other.

use log::debug;

use crate::canvas::{CanvasCompositor, Dish, Raster};
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::protocol::{mapper_for, registry_for, Interpreter, Protocol, RunReport};

/// Result of a successful simulation
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub report: RunReport,
    pub raster: Raster,
}

impl SimulationOutput {
    pub fn checksum(&self) -> String {
        self.raster.checksum()
    }
}

/// Runs protocols under one configuration
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    config: SimulationConfig,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Simulate `protocol` on a blank canvas.
    ///
    /// The raster is only produced when every action succeeded.
    pub fn run(&self, protocol: &Protocol) -> Result<SimulationOutput> {
        self.config.validate()?;

        let registry = registry_for(protocol)?;
        let mapper = mapper_for(protocol, &self.config);
        let mut compositor = match self.config.dish_diameter {
            Some(diameter) => CanvasCompositor::with_dish(
                self.config.resolution,
                self.config.background,
                self.config.opacity,
                Dish::new(mapper.layout_center(), mapper.dish_radius(diameter)),
            ),
            None => CanvasCompositor::from_config(&self.config),
        };
        debug!(
            "Canvas {} ({} background), scale {:.3} px/mm, {} liquids",
            self.config.resolution,
            self.config.background,
            mapper.scale(),
            registry.len()
        );

        let report = Interpreter::new(&registry, &mapper)
            .with_smears(self.config.smears)
            .run(protocol, &mut compositor)?;

        Ok(SimulationOutput {
            report,
            raster: compositor.export(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::compositor::SURROUND_COLOR;
    use crate::config::Resolution;
    use crate::labware::Labware;
    use crate::liquid::{Mixture, Rgba};
    use crate::protocol::Action;

    fn protocol() -> Protocol {
        Protocol::new("dot")
            .with_labware(Labware::new("plate", 2, 2, 10.0, 10.0))
            .with_liquid("red", Some("#ff0000"))
            .with_initial_tip(Mixture::single("red", 10.0))
            .then(Action::dispense("plate", "A1", 10.0))
    }

    #[test]
    fn test_run_produces_configured_resolution() {
        let sim = Simulation::new(SimulationConfig {
            resolution: Resolution::new(120, 80),
            margin: 4,
            ..SimulationConfig::default()
        });
        let output = sim.run(&protocol()).unwrap();
        assert_eq!(output.raster.width(), 120);
        assert_eq!(output.raster.height(), 80);
        assert_eq!(output.report.paint_events, 1);
    }

    #[test]
    fn test_invalid_config_rejected_before_running() {
        let sim = Simulation::new(SimulationConfig {
            opacity: 1.5,
            ..SimulationConfig::preview()
        });
        assert!(sim.run(&protocol()).is_err());
    }

    #[test]
    fn test_dish_drawn_around_layout() {
        let config = SimulationConfig {
            resolution: Resolution::new(400, 100),
            margin: 10,
            ..SimulationConfig::default()
        };
        // 20mm layout at 4px/mm: the 84mm dish has a 168px radius
        let raster = Simulation::new(config.clone()).run(&protocol()).unwrap().raster;
        assert_eq!(raster.pixel(200, 50), Some(Rgba::BLACK));
        assert_eq!(raster.pixel(0, 50), Some(SURROUND_COLOR));

        let plain = Simulation::new(SimulationConfig {
            dish_diameter: None,
            ..config
        })
        .run(&protocol())
        .unwrap()
        .raster;
        assert_eq!(plain.pixel(0, 50), Some(Rgba::BLACK));
    }

    #[test]
    fn test_runs_are_independent() {
        let sim = Simulation::new(SimulationConfig::preview());
        let first = sim.run(&protocol()).unwrap();
        let second = sim.run(&protocol()).unwrap();
        assert_eq!(first.checksum(), second.checksum());
    }
}
