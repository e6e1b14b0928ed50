//! Engine state management.
//!
//! Holds the loaded scenario, the ruleset, the moving player and the
//! validation mode between commands, and answers `validate`, `special` and
//! `bestroute` against them.

use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::board::{GameState, PlayerId, Route, TerritoryId, UnitId};
use crate::error::{EngineError, Result};
use crate::protocol::format::{write_best_route, write_verdict};
use crate::protocol::parser::MoveRequest;
use crate::protocol::scenario::Scenario;
use crate::routing::best_route;
use crate::rules::{Phase, RuleContext, Ruleset, ValidationMode};
use crate::validate::{MoveCandidate, MoveValidator, Verdict};

/// Holds the mutable state of the engine between commands.
#[derive(Debug, Default)]
pub struct Engine {
    pub state: Option<GameState>,
    pub rules: Ruleset,
    pub player: Option<PlayerId>,
    pub mode: ValidationMode,
}

impl Engine {
    /// Creates an engine with no scenario, default rules and combat phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a scenario and forgets the moving player.
    pub fn load_scenario(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let state = Scenario::load(path)?.build()?;
        info!(
            territories = state.map.len(),
            units = state.units().len(),
            players = state.players().len(),
            "scenario ready"
        );
        self.state = Some(state);
        self.player = None;
        Ok(())
    }

    pub fn load_rules(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.rules = Ruleset::load(path)?;
        Ok(())
    }

    pub fn set_player(&mut self, name: &str) -> Result<()> {
        let state = self.state()?;
        let player = state
            .player_by_name(name)
            .ok_or_else(|| EngineError::UnknownName(format!("player {}", name)))?;
        self.player = Some(player);
        Ok(())
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.mode.phase = phase;
    }

    pub fn set_edit_mode(&mut self, on: bool) {
        self.mode.edit_mode = on;
    }

    /// Handles the protocol handshake.
    pub fn handle_mli<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "id name landfall")?;
        writeln!(out, "id version {}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "protocol_version 1")?;
        writeln!(out, "mliok")?;
        out.flush()
    }

    pub fn handle_isready<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "readyok")?;
        out.flush()
    }

    /// Validates a move and writes the verdict block. Requests the engine
    /// cannot reason about get an `error` line instead.
    pub fn handle_validate<W: Write>(&self, out: &mut W, request: &MoveRequest, special: bool) -> io::Result<()> {
        match self.validate(request, special) {
            Ok(verdict) => write_verdict(out, &verdict)?,
            Err(e) => write_error(out, &e)?,
        }
        out.flush()
    }

    pub fn validate(&self, request: &MoveRequest, special: bool) -> Result<Verdict> {
        let state = self.state()?;
        let player = self.player.ok_or(EngineError::NotReady("no player set"))?;
        let candidate = candidate_from(state, request)?;
        let validator = MoveValidator::new(state, &self.rules);
        if special {
            validator.validate_special_move(player, self.mode, &candidate)
        } else {
            validator.validate(player, self.mode, &candidate)
        }
    }

    pub fn handle_bestroute<W: Write>(
        &self,
        out: &mut W,
        from: &str,
        to: &str,
        units: &[UnitId],
        force: bool,
    ) -> io::Result<()> {
        match self.best_route(from, to, units, force) {
            Ok(route) => {
                if let Some(state) = &self.state {
                    write_best_route(out, &state.map, route.as_ref())?;
                }
            }
            Err(e) => write_error(out, &e)?,
        }
        out.flush()
    }

    pub fn best_route(&self, from: &str, to: &str, units: &[UnitId], force: bool) -> Result<Option<Route>> {
        let state = self.state()?;
        let player = self.player.ok_or(EngineError::NotReady("no player set"))?;
        let start = resolve_territory(state, from)?;
        let end = resolve_territory(state, to)?;
        if let Some(&unit) = units.iter().find(|&&u| state.get_unit(u).is_none()) {
            return Err(EngineError::UnknownUnit(unit));
        }
        let ctx = RuleContext::new(state, &self.rules, player, self.mode);
        Ok(best_route(&ctx, start, end, units, force))
    }

    fn state(&self) -> Result<&GameState> {
        self.state.as_ref().ok_or(EngineError::NotReady("no scenario loaded"))
    }
}

/// Writes an `error` line for a failed command.
pub fn write_error<W: Write>(out: &mut W, error: &EngineError) -> io::Result<()> {
    warn!(%error, "command failed");
    writeln!(out, "error {}", error)
}

/// Resolves a wire token: an exact territory name, the name with `_` for
/// spaces, or a numeric id.
pub fn resolve_territory(state: &GameState, token: &str) -> Result<TerritoryId> {
    let map = &state.map;
    map.id_of(token)
        .or_else(|| map.id_of(&token.replace('_', " ")))
        .or_else(|| token.parse().ok().map(TerritoryId).filter(|&t| map.contains(t)))
        .ok_or_else(|| EngineError::UnknownName(format!("territory {}", token)))
}

fn candidate_from(state: &GameState, request: &MoveRequest) -> Result<MoveCandidate> {
    let path = request
        .route
        .iter()
        .map(|t| resolve_territory(state, t))
        .collect::<Result<Vec<_>>>()?;
    let route = Route::from_territories(&path).ok_or_else(|| EngineError::UnknownName("empty route".into()))?;
    let mut candidate = MoveCandidate::new(request.units.clone(), route);
    for &(cargo, transport) in &request.transports {
        candidate = candidate.with_sea_transport(cargo, transport);
    }
    for (transport, cargo) in &request.dependents {
        candidate = candidate.with_air_dependents(*transport, cargo.clone());
    }
    debug!(units = candidate.units.len(), steps = candidate.route.number_of_steps(), "candidate built");
    Ok(candidate)
}
