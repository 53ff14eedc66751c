//! Protocol Interpreter
//!
//! Executes actions strictly in order against the deck and the pipette tip.
//! Dispense and mix produce paint events. Events are buffered and only
//! applied to the compositor once every action succeeded; the first failing
//! action aborts the run and nothing is painted.

use std::collections::BTreeMap;

use log::{debug, info};

use super::action::{Action, Protocol, WellRef};
use crate::canvas::{CanvasCompositor, PaintEvent};
use crate::config::SimulationConfig;
use crate::error::{BioartError, Result};
use crate::labware::{CoordinateMapper, Deck, PixelPoint, WellPosition};
use crate::liquid::{LiquidRegistry, Mixture, Rgba, VOLUME_EPSILON};

/// Leftover below this is rounding noise, not waste (µL)
const WASTE_TOLERANCE: f64 = 1e-6;

/// Liquid currently held by the pipette
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipState {
    contents: Mixture,
}

impl TipState {
    pub fn new(contents: Mixture) -> Self {
        Self { contents }
    }

    pub fn volume(&self) -> f64 {
        self.contents.total()
    }

    pub fn contents(&self) -> &Mixture {
        &self.contents
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Per-liquid volumes moved during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeTotals {
    pub aspirated: BTreeMap<String, f64>,
    pub dispensed: BTreeMap<String, f64>,
}

impl VolumeTotals {
    fn record(map: &mut BTreeMap<String, f64>, mixture: &Mixture) {
        for (liquid, volume) in mixture.iter() {
            *map.entry(liquid.to_string()).or_insert(0.0) += volume;
        }
    }

    pub fn total_aspirated(&self) -> f64 {
        self.aspirated.values().sum()
    }

    pub fn total_dispensed(&self) -> f64 {
        self.dispensed.values().sum()
    }

    /// Liquids that were aspirated but not (fully) dispensed again
    pub fn wasted(&self) -> Vec<(&str, f64)> {
        self.aspirated
            .iter()
            .filter_map(|(liquid, asp)| {
                let disp = self.dispensed.get(liquid).copied().unwrap_or(0.0);
                let waste = asp - disp;
                (waste > WASTE_TOLERANCE).then_some((liquid.as_str(), waste))
            })
            .collect()
    }

    /// Every liquid that was aspirated or dispensed, in name order
    pub fn liquids(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .aspirated
            .keys()
            .chain(self.dispensed.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub protocol: String,
    pub actions_run: usize,
    pub paint_events: usize,
    pub totals: VolumeTotals,
    pub tip: TipState,
    /// Final labware contents
    pub deck: Deck,
}

/// Runs protocols against a registry and mapper owned by the caller
#[derive(Debug, Clone)]
pub struct Interpreter<'a> {
    registry: &'a LiquidRegistry,
    mapper: &'a CoordinateMapper,
    smears: bool,
}

#[derive(Debug)]
struct RunState {
    deck: Deck,
    tip: TipState,
    position: Option<(String, WellPosition)>,
    events: Vec<PaintEvent>,
    totals: VolumeTotals,
    last_dispense: Option<(PixelPoint, Rgba, u32)>,
}

impl<'a> Interpreter<'a> {
    pub fn new(registry: &'a LiquidRegistry, mapper: &'a CoordinateMapper) -> Self {
        Self {
            registry,
            mapper,
            smears: false,
        }
    }

    /// Draw a smear when the pipette leaves a drop it just dispensed
    pub fn with_smears(mut self, smears: bool) -> Self {
        self.smears = smears;
        self
    }

    /// Execute every action of `protocol`, then paint the result.
    pub fn run(&self, protocol: &Protocol, compositor: &mut CanvasCompositor) -> Result<RunReport> {
        let mut state = self.prepare(protocol)?;
        info!(
            "Running protocol '{}' ({} actions)",
            protocol.name,
            protocol.actions.len()
        );

        for (index, action) in protocol.actions.iter().enumerate() {
            debug!("#{}: {}", index, action);
            self.step(&mut state, protocol, action)
                .map_err(|e| BioartError::ActionFailed {
                    index,
                    kind: action.kind(),
                    source: Box::new(e),
                })?;
        }

        for event in &state.events {
            compositor.apply(event);
        }
        info!(
            "Protocol '{}' complete: {} paint events",
            protocol.name,
            state.events.len()
        );

        Ok(RunReport {
            protocol: protocol.name.clone(),
            actions_run: protocol.actions.len(),
            paint_events: state.events.len(),
            totals: state.totals,
            tip: state.tip,
            deck: state.deck,
        })
    }

    fn prepare(&self, protocol: &Protocol) -> Result<RunState> {
        let mut deck = Deck::new();
        for setup in &protocol.labware {
            deck.load(setup.labware.clone())?;
        }
        for setup in &protocol.labware {
            for (well, mixture) in &setup.contents {
                self.check_registered(mixture)?;
                deck.fill(&setup.labware.name, well, mixture)?;
            }
        }

        let tip = protocol.initial_tip.clone().unwrap_or_default();
        self.check_registered(&tip)?;

        Ok(RunState {
            deck,
            tip: TipState::new(tip),
            position: None,
            events: Vec::new(),
            totals: VolumeTotals::default(),
            last_dispense: None,
        })
    }

    fn check_registered(&self, mixture: &Mixture) -> Result<()> {
        for (liquid, _) in mixture.iter() {
            self.registry.get(liquid)?;
        }
        Ok(())
    }

    fn step(&self, state: &mut RunState, protocol: &Protocol, action: &Action) -> Result<()> {
        let target = action.well();
        let labware = state.deck.labware(&target.labware)?.clone();
        let pos = labware.position_of(&target.well)?;

        if protocol.explicit_moves && !matches!(action, Action::Move { .. }) {
            check_position(state, target, pos)?;
        }

        let point = self.mapper.position_to_pixel(&labware, pos);
        if !matches!(action, Action::Mix { .. }) {
            self.smear_if_just_dispensed(state, point);
        }

        match action {
            Action::Aspirate { volume, .. } => {
                check_volume(*volume)?;
                let well = state.deck.well_mut(&labware.name, pos);
                let available = well.total();
                if available + VOLUME_EPSILON < *volume {
                    return Err(BioartError::InsufficientVolume {
                        well: target.to_string(),
                        requested: *volume,
                        available,
                    });
                }
                let sample = well.take(volume.min(available));
                VolumeTotals::record(&mut state.totals.aspirated, &sample);
                state.tip = TipState::new(sample);
            }
            Action::Dispense { volume, .. } => {
                check_volume(*volume)?;
                let available = state.tip.volume();
                if available + VOLUME_EPSILON < *volume {
                    return Err(BioartError::EmptyTip {
                        requested: *volume,
                        available,
                    });
                }
                let drop = state.tip.contents.take(volume.min(available));
                let color = self.registry.color_of_mixture(&drop)?;
                let radius = self.mapper.drop_radius_for(&labware, drop.total());

                state.deck.well_mut(&labware.name, pos).add(&drop);
                VolumeTotals::record(&mut state.totals.dispensed, &drop);
                state.events.push(PaintEvent::Drop {
                    at: point,
                    color,
                    radius,
                });
                state.last_dispense = Some((point, color, radius));
            }
            Action::Mix { cycles, .. } => {
                let contents = state.deck.well(&labware.name, pos);
                if contents.is_empty() {
                    debug!("mix x{} on empty well {}, nothing to show", cycles, target);
                } else {
                    // One event whatever the cycle count
                    let color = self.registry.color_of_mixture(&contents)?;
                    state.events.push(PaintEvent::Drop {
                        at: point,
                        color,
                        radius: self.mapper.drop_radius_for(&labware, contents.total()),
                    });
                }
            }
            Action::Move { .. } => {}
        }

        state.position = Some((labware.name.clone(), pos));
        Ok(())
    }

    /// A smear runs from the last drop halfway toward the next location.
    fn smear_if_just_dispensed(&self, state: &mut RunState, next: PixelPoint) {
        let Some((from, color, radius)) = state.last_dispense.take() else {
            return;
        };
        if !self.smears || from == next {
            return;
        }
        let to = PixelPoint::new(
            from.x + (next.x - from.x) / 2,
            from.y + (next.y - from.y) / 2,
        );
        state.events.push(PaintEvent::Stroke {
            from,
            to,
            color,
            radius: (radius / 3).max(1),
        });
    }
}

/// Run `protocol` with a fresh interpreter; smears disabled.
pub fn run(
    protocol: &Protocol,
    registry: &LiquidRegistry,
    mapper: &CoordinateMapper,
    compositor: &mut CanvasCompositor,
) -> Result<RunReport> {
    Interpreter::new(registry, mapper).run(protocol, compositor)
}

/// Build the registry for a protocol's liquid definitions
pub fn registry_for(protocol: &Protocol) -> Result<LiquidRegistry> {
    let mut registry = LiquidRegistry::new();
    for liquid in &protocol.liquids {
        registry.register_spec(&liquid.name, liquid.color.as_deref())?;
    }
    Ok(registry)
}

/// Build a mapper covering every labware of a protocol
pub fn mapper_for(protocol: &Protocol, config: &SimulationConfig) -> CoordinateMapper {
    CoordinateMapper::new(protocol.labware.iter().map(|s| &s.labware), config)
}

fn check_volume(volume: f64) -> Result<()> {
    if !volume.is_finite() || volume <= 0.0 {
        return Err(BioartError::InvalidVolume { volume });
    }
    Ok(())
}

fn check_position(state: &RunState, target: &WellRef, pos: WellPosition) -> Result<()> {
    match &state.position {
        Some((labware, at)) if *labware == target.labware && *at == pos => Ok(()),
        Some((labware, at)) => Err(BioartError::NotAtWell {
            target: target.to_string(),
            current: format!("{}:{}", labware, at),
        }),
        None => Err(BioartError::NotAtWell {
            target: target.to_string(),
            current: "home".to_string(),
        }),
    }
}
