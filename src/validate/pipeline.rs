//! The ordered validation pipeline.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::board::{GameState, PlayerId};
use crate::error::{EngineError, Result};
use crate::rules::{RuleContext, Ruleset, ValidationMode};

use super::air::validate_air_can_land;
use super::airborne::{validate_airborne, validate_owned_only};
use super::basic::validate_basic;
use super::canal::validate_canal;
use super::candidate::MoveCandidate;
use super::first::validate_first;
use super::fuel::{validate_battle_zone_exit, validate_fuel};
use super::path::validate_non_enemy_units_on_path;
use super::paratroop::validate_paratroops;
use super::phase::{validate_combat, validate_non_combat};
use super::transport::validate_transport;
use super::verdict::{PassResult, Verdict};

#[derive(Clone, Copy)]
enum Pass {
    Rule(fn(&RuleContext<'_>, &MoveCandidate) -> PassResult),
    /// Also audits its own allocation bookkeeping.
    Audited(fn(&RuleContext<'_>, &MoveCandidate) -> Result<PassResult>),
}

const MOVE_PASSES: [(&str, Pass); 10] = [
    ("first", Pass::Rule(validate_first)),
    ("phase", Pass::Rule(validate_phase)),
    ("path", Pass::Rule(validate_non_enemy_units_on_path)),
    ("basic", Pass::Rule(validate_basic)),
    ("air", Pass::Audited(validate_air_can_land)),
    ("transport", Pass::Rule(validate_transport)),
    ("paratroops", Pass::Rule(validate_paratroops)),
    ("canal", Pass::Rule(validate_canal)),
    ("fuel", Pass::Rule(validate_fuel)),
    ("battle zone", Pass::Rule(validate_battle_zone_exit)),
];

const SPECIAL_PASSES: [(&str, Pass); 4] = [
    ("first", Pass::Rule(validate_first)),
    ("fuel", Pass::Rule(validate_fuel)),
    ("owned", Pass::Rule(validate_owned_only)),
    ("airborne", Pass::Rule(validate_airborne)),
];

fn validate_phase(ctx: &RuleContext<'_>, candidate: &MoveCandidate) -> PassResult {
    if ctx.mode.is_non_combat() {
        validate_non_combat(ctx, candidate)
    } else {
        validate_combat(ctx, candidate)
    }
}

/// Validates moves against one snapshot and ruleset.
#[derive(Debug, Clone, Copy)]
pub struct MoveValidator<'a> {
    pub state: &'a GameState,
    pub rules: &'a Ruleset,
}

impl<'a> MoveValidator<'a> {
    pub fn new(state: &'a GameState, rules: &'a Ruleset) -> Self {
        MoveValidator { state, rules }
    }

    /// Runs the full pipeline for a normal move. A route without steps is
    /// always clean. Errors on a candidate that references units or
    /// territories the snapshot does not have or assigns cargo that is not
    /// moving, and on a snapshot whose carrier loads do not add up.
    pub fn validate(&self, player: PlayerId, mode: ValidationMode, candidate: &MoveCandidate) -> Result<Verdict> {
        self.check_candidate(player, candidate)?;
        if candidate.route.has_no_steps() {
            return Ok(Verdict::clean());
        }
        let ctx = RuleContext::new(self.state, self.rules, player, mode);
        run(&ctx, candidate, &MOVE_PASSES)
    }

    /// Runs the airborne launch checks instead of the movement rules.
    pub fn validate_special_move(
        &self,
        player: PlayerId,
        mode: ValidationMode,
        candidate: &MoveCandidate,
    ) -> Result<Verdict> {
        self.check_candidate(player, candidate)?;
        let ctx = RuleContext::new(self.state, self.rules, player, mode);
        run(&ctx, candidate, &SPECIAL_PASSES)
    }

    /// Validates independent candidates in parallel. Results come back in
    /// input order and match what [`validate`](Self::validate) returns for
    /// each one.
    pub fn validate_batch(
        &self,
        player: PlayerId,
        mode: ValidationMode,
        candidates: &[MoveCandidate],
    ) -> Vec<Result<Verdict>> {
        candidates
            .par_iter()
            .map(|candidate| self.validate(player, mode, candidate))
            .collect()
    }

    fn check_candidate(&self, player: PlayerId, candidate: &MoveCandidate) -> Result<()> {
        if self.state.get_player(player).is_none() {
            warn!(player = player.0, "unknown player");
            return Err(EngineError::UnknownName(format!("player {}", player.0)));
        }
        let map = &self.state.map;
        if let Some(t) = candidate.route.all_territories().find(|&t| !map.contains(t)) {
            warn!(territory = t.0, "candidate route leaves the map");
            return Err(EngineError::UnknownTerritory(t));
        }
        let referenced = candidate
            .units
            .iter()
            .chain(candidate.sea_transports.values())
            .chain(candidate.air_dependents.keys())
            .copied();
        for unit in referenced {
            if self.state.get_unit(unit).is_none() {
                warn!(unit = unit.0, "candidate names an unknown unit");
                return Err(EngineError::UnknownUnit(unit));
            }
        }
        candidate.check_assignments().inspect_err(|e| warn!(error = %e, "bad candidate"))
    }
}

/// Free-function form of [`MoveValidator::validate_batch`].
pub fn validate_batch(
    state: &GameState,
    rules: &Ruleset,
    player: PlayerId,
    mode: ValidationMode,
    candidates: &[MoveCandidate],
) -> Vec<Result<Verdict>> {
    MoveValidator::new(state, rules).validate_batch(player, mode, candidates)
}

fn run(ctx: &RuleContext<'_>, candidate: &MoveCandidate, passes: &[(&str, Pass)]) -> Result<Verdict> {
    let mut verdict = Verdict::clean();
    for (name, pass) in passes {
        let result = match pass {
            Pass::Rule(check) => check(ctx, candidate),
            Pass::Audited(check) => {
                check(ctx, candidate).inspect_err(|e| warn!(pass = name, error = %e, "bookkeeping breach"))?
            }
        };
        verdict = verdict.absorb(result);
        if let Some(error) = verdict.fatal() {
            debug!(pass = name, %error, "move rejected");
            return Ok(verdict);
        }
    }
    debug!(status = verdict.status().as_str(), records = verdict.records().len(), "move validated");
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Domain, Route, TerritoryId, UnitId, UnitType};
    use crate::validate::verdict::{MoveError, VerdictStatus};

    fn two_provinces() -> (GameState, PlayerId, UnitId, TerritoryId, TerritoryId) {
        let mut state = GameState::new();
        let me = state.add_player("Russians");
        let infantry = state.add_unit_type(UnitType::new("infantry", Domain::Land, 1));
        let a = state.add_territory("Moscow", false);
        let b = state.add_territory("Karelia", false);
        state.connect(a, b);
        state.set_owner(a, Some(me));
        state.set_owner(b, Some(me));
        let u = state.add_unit(infantry, me, a);
        (state, me, u, a, b)
    }

    #[test]
    fn plain_move_is_clean() {
        let (state, me, u, a, b) = two_provinces();
        let rules = Ruleset::default();
        let validator = MoveValidator::new(&state, &rules);
        let verdict = validator
            .validate(me, ValidationMode::non_combat(), &MoveCandidate::new(vec![u], Route::new(a, vec![b])))
            .unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
    }

    #[test]
    fn stationary_route_skips_every_pass() {
        let (state, me, _, a, _) = two_provinces();
        let rules = Ruleset::default();
        let validator = MoveValidator::new(&state, &rules);
        let verdict = validator
            .validate(me, ValidationMode::combat(), &MoveCandidate::new(vec![], Route::stationary(a)))
            .unwrap();
        assert_eq!(verdict.status(), VerdictStatus::Clean);
    }

    #[test]
    fn first_fatal_error_stops_the_pipeline() {
        let (state, me, _, a, b) = two_provinces();
        let rules = Ruleset::default();
        let validator = MoveValidator::new(&state, &rules);
        let verdict = validator
            .validate(me, ValidationMode::combat(), &MoveCandidate::new(vec![], Route::new(a, vec![b])))
            .unwrap();
        assert_eq!(verdict.fatal(), Some(&MoveError::NoUnits));
    }

    #[test]
    fn unknown_ids_are_contract_breaches() {
        let (state, me, u, a, _) = two_provinces();
        let rules = Ruleset::default();
        let validator = MoveValidator::new(&state, &rules);
        let off_map = MoveCandidate::new(vec![u], Route::new(a, vec![TerritoryId(99)]));
        assert!(matches!(
            validator.validate(me, ValidationMode::combat(), &off_map),
            Err(EngineError::UnknownTerritory(TerritoryId(99)))
        ));
        let ghost = MoveCandidate::new(vec![UnitId(42)], Route::new(a, vec![TerritoryId(1)]));
        assert!(matches!(
            validator.validate(me, ValidationMode::combat(), &ghost),
            Err(EngineError::UnknownUnit(UnitId(42)))
        ));
    }

    #[test]
    fn batch_matches_sequential() {
        let (state, me, u, a, b) = two_provinces();
        let rules = Ruleset::default();
        let validator = MoveValidator::new(&state, &rules);
        let candidates = vec![
            MoveCandidate::new(vec![u], Route::new(a, vec![b])),
            MoveCandidate::new(vec![], Route::new(a, vec![b])),
            MoveCandidate::new(vec![u, u], Route::new(a, vec![b])),
        ];
        let batch = validator.validate_batch(me, ValidationMode::combat(), &candidates);
        for (candidate, result) in candidates.iter().zip(batch) {
            let sequential = validator.validate(me, ValidationMode::combat(), candidate).unwrap();
            assert_eq!(result.unwrap(), sequential);
        }
    }
}
