//! Rules scenarios run through the public library API.
//!
//! Each section builds a small snapshot, validates one candidate move and
//! checks the verdict the way a client would read it.

use landfall::board::{
    Canal, Domain, GameState, LimitKind, Movement, PlayerId, RelationshipKind, Route, StackingLimit, StackingScope,
    TerritoryId, UnitId, UnitType, UnitTypeId,
};
use landfall::rules::{RuleContext, Ruleset, ValidationMode};
use landfall::validate::{
    canal_blockage, filter_units, resolve_landing, CanalBlockage, LandingPhase, MoveCandidate, MoveError, MoveValidator,
    Reason, VerdictStatus,
};

/// Two players at war, with one land type, one fast land type, a fighter,
/// a carrier, a destroyer and a transport registered.
struct World {
    state: GameState,
    me: PlayerId,
    enemy: PlayerId,
    infantry: UnitTypeId,
    armour: UnitTypeId,
    fighter: UnitTypeId,
    carrier: UnitTypeId,
    destroyer: UnitTypeId,
}

fn world() -> World {
    let mut state = GameState::new();
    let me = state.add_player("British");
    let enemy = state.add_player("Germans");
    state.set_relationship(me, enemy, RelationshipKind::War);
    let mut infantry = UnitType::new("infantry", Domain::Land, 1);
    infantry.transport_cost = Some(2);
    let infantry = state.add_unit_type(infantry);
    let mut armour = UnitType::new("armour", Domain::Land, 2);
    armour.transport_cost = Some(3);
    armour.abilities.can_blitz = true;
    let armour = state.add_unit_type(armour);
    let mut fighter = UnitType::new("fighter", Domain::Air, 4);
    fighter.carrier_cost = Some(1);
    let fighter = state.add_unit_type(fighter);
    let mut carrier = UnitType::new("carrier", Domain::Sea, 2);
    carrier.carrier_capacity = Some(1);
    let carrier = state.add_unit_type(carrier);
    let mut destroyer = UnitType::new("destroyer", Domain::Sea, 2);
    destroyer.abilities.is_destroyer = true;
    let destroyer = state.add_unit_type(destroyer);
    World {
        state,
        me,
        enemy,
        infantry,
        armour,
        fighter,
        carrier,
        destroyer,
    }
}

fn land(w: &mut World, name: &str, owner: PlayerId) -> TerritoryId {
    let t = w.state.add_territory(name, false);
    w.state.set_owner(t, Some(owner));
    t
}

fn sea(w: &mut World, name: &str) -> TerritoryId {
    w.state.add_territory(name, true)
}

// ===========================================================================
// Air landing
// ===========================================================================

/// Drives a fighter with one movement point left one sea zone further out,
/// far from any land it could reach.
fn fighter_out_of_fuel(with_carrier: bool) -> (World, UnitId, Route) {
    let mut w = world();
    let home = { let owner = w.me; land(&mut w, "Gibraltar", owner) };
    let near = sea(&mut w, "sz13");
    let far = sea(&mut w, "sz14");
    w.state.connect(home, near);
    w.state.connect(near, far);
    let fighter = w.state.add_unit(w.fighter, w.me, near);
    w.state.spend_movement(fighter, Movement::from_int(3));
    if with_carrier {
        w.state.add_unit(w.carrier, w.me, far);
    }
    (w, fighter, Route::new(near, vec![far]))
}

#[test]
fn spent_fighter_lands_on_the_carrier_waiting_at_the_end() {
    let (w, fighter, route) = fighter_out_of_fuel(true);
    let rules = Ruleset::default();
    let ctx = RuleContext::new(&w.state, &rules, w.me, ValidationMode::non_combat());
    let report = resolve_landing(&ctx, &[fighter], &route);
    assert!(report.unlanded.is_empty());
    assert_eq!(report.phase, LandingPhase::CarriersAtEnd);

    let verdict = MoveValidator::new(&w.state, &rules)
        .validate(w.me, ValidationMode::non_combat(), &MoveCandidate::new(vec![fighter], route))
        .unwrap();
    assert_eq!(verdict.status(), VerdictStatus::Clean);
}

#[test]
fn spent_fighter_over_open_water_cannot_land() {
    let (w, fighter, route) = fighter_out_of_fuel(false);
    let rules = Ruleset::default();
    let verdict = MoveValidator::new(&w.state, &rules)
        .validate(w.me, ValidationMode::non_combat(), &MoveCandidate::new(vec![fighter], route.clone()))
        .unwrap();
    let disallowed = verdict.disallowed();
    assert_eq!(disallowed.len(), 1);
    assert_eq!(disallowed[0].0, &Reason::NotAllAirCanLand);
    assert_eq!(disallowed[0].1, vec![fighter]);
    assert_eq!(disallowed[0].0.to_string(), "Not all air units can land");

    let kamikaze = Ruleset {
        kamikaze_airplanes: true,
        ..Ruleset::default()
    };
    let ctx = RuleContext::new(&w.state, &kamikaze, w.me, ValidationMode::non_combat());
    assert_eq!(resolve_landing(&ctx, &[fighter], &route).phase, LandingPhase::Skipped);
}

#[test]
fn fighter_within_reach_of_land_skips_the_carrier_search() {
    let mut w = world();
    let home = { let owner = w.me; land(&mut w, "Malta", owner) };
    let near = sea(&mut w, "sz15");
    let far = sea(&mut w, "sz16");
    w.state.connect(home, near);
    w.state.connect(near, far);
    let fighter = w.state.add_unit(w.fighter, w.me, near);
    let rules = Ruleset::default();
    let ctx = RuleContext::new(&w.state, &rules, w.me, ValidationMode::non_combat());
    let report = resolve_landing(&ctx, &[fighter], &Route::new(near, vec![far]));
    assert!(report.unlanded.is_empty());
    assert!(report.assignments.is_empty());
    assert_eq!(report.phase, LandingPhase::NoCarriersNeeded);
}

// ===========================================================================
// Canals
// ===========================================================================

/// A canal between two sea zones flanked by two land territories, with a
/// destroyer waiting at the near end.
fn suez(second_flank_owner: PlayerId) -> (World, UnitId, Route) {
    let mut w = world();
    let west = sea(&mut w, "sz34");
    let east = sea(&mut w, "sz33");
    w.state.connect(west, east);
    let egypt = { let owner = w.me; land(&mut w, "Egypt", owner) };
    let sinai = land(&mut w, "Trans-Jordan", second_flank_owner);
    w.state.map.add_canal(Canal {
        name: "Suez Canal".into(),
        sea_zones: vec![west, east],
        land_territories: vec![egypt, sinai],
        excluded_types: Vec::new(),
        no_combat_move: false,
    });
    let ship = w.state.add_unit(w.destroyer, w.me, west);
    (w, ship, Route::new(west, vec![east]))
}

#[test]
fn controlled_canal_is_open() {
    let (w, ship, route) = suez(PlayerId(0));
    let rules = Ruleset {
        control_all_canals_between_territories_to_pass: true,
        ..Ruleset::default()
    };
    let ctx = RuleContext::new(&w.state, &rules, w.me, ValidationMode::non_combat());
    let candidate = MoveCandidate::new(vec![ship], route);
    assert_eq!(canal_blockage(&ctx, &candidate.route, Some(&candidate)), None);
}

#[test]
fn one_foreign_flank_blocks_every_ship() {
    let (mut w, ship, route) = suez(PlayerId(1));
    let second = w.state.add_unit(w.destroyer, w.me, route.start());
    let rules = Ruleset {
        control_all_canals_between_territories_to_pass: true,
        ..Ruleset::default()
    };
    let ctx = RuleContext::new(&w.state, &rules, w.me, ValidationMode::non_combat());
    let candidate = MoveCandidate::new(vec![ship, second], route);
    assert_eq!(
        canal_blockage(&ctx, &candidate.route, Some(&candidate)),
        Some(CanalBlockage::NotControlled("Suez Canal".into()))
    );

    let verdict = MoveValidator::new(&w.state, &rules)
        .validate(w.me, ValidationMode::non_combat(), &candidate)
        .unwrap();
    let partition = verdict.partition(&candidate.units);
    assert_eq!(partition.disallowed, vec![ship, second]);
    assert!(verdict
        .records()
        .iter()
        .all(|r| r.reason.to_string() == "Must control Suez Canal to move through"));
}

#[test]
fn exempt_types_ignore_the_canal() {
    let (mut w, ship, route) = suez(PlayerId(1));
    let destroyer = w.destroyer;
    w.state.map.canals_mut()[0].excluded_types.push(destroyer);
    let rules = Ruleset {
        control_all_canals_between_territories_to_pass: true,
        ..Ruleset::default()
    };
    let ctx = RuleContext::new(&w.state, &rules, w.me, ValidationMode::non_combat());
    let candidate = MoveCandidate::new(vec![ship], route);
    assert_eq!(canal_blockage(&ctx, &candidate.route, Some(&candidate)), None);
}

// ===========================================================================
// Movement
// ===========================================================================

#[test]
fn slow_units_are_dropped_from_a_long_march() {
    let mut w = world();
    let a = { let owner = w.me; land(&mut w, "Cairo", owner) };
    let b = { let owner = w.me; land(&mut w, "Alexandria", owner) };
    let c = { let owner = w.me; land(&mut w, "El Alamein", owner) };
    w.state.connect(a, b);
    w.state.connect(b, c);
    let slow1 = w.state.add_unit(w.infantry, w.me, a);
    let fast = w.state.add_unit(w.armour, w.me, a);
    let slow2 = w.state.add_unit(w.infantry, w.me, a);
    let rules = Ruleset::default();
    let candidate = MoveCandidate::new(vec![slow1, fast, slow2], Route::new(a, vec![b, c]));
    let verdict = MoveValidator::new(&w.state, &rules)
        .validate(w.me, ValidationMode::non_combat(), &candidate)
        .unwrap();

    assert_eq!(verdict.status(), VerdictStatus::PartialReject);
    let partition = verdict.partition(&candidate.units);
    assert_eq!(partition.approved, vec![fast]);
    assert_eq!(partition.disallowed, vec![slow1, slow2]);
    assert_eq!(verdict.disallowed()[0].0.to_string(), "Not all units have enough movement");
}

#[test]
fn enemy_units_on_the_way_block_land_moves() {
    let mut w = world();
    let a = { let owner = w.me; land(&mut w, "Kenya", owner) };
    let b = { let owner = w.enemy; land(&mut w, "Italian East Africa", owner) };
    let c = { let owner = w.me; land(&mut w, "Anglo-Egypt Sudan", owner) };
    w.state.connect(a, b);
    w.state.connect(b, c);
    w.state.add_unit(w.infantry, w.enemy, b);
    let tank = w.state.add_unit(w.armour, w.me, a);
    let rules = Ruleset::default();
    let verdict = MoveValidator::new(&w.state, &rules)
        .validate(w.me, ValidationMode::combat(), &MoveCandidate::new(vec![tank], Route::new(a, vec![b, c])))
        .unwrap();
    assert!(verdict.is_fatal());
}

#[test]
fn enemy_units_cannot_be_moved() {
    let mut w = world();
    let a = { let owner = w.me; land(&mut w, "Burma", owner) };
    let b = { let owner = w.me; land(&mut w, "India", owner) };
    w.state.connect(a, b);
    let theirs = w.state.add_unit(w.infantry, w.enemy, a);
    let rules = Ruleset::default();
    let verdict = MoveValidator::new(&w.state, &rules)
        .validate(w.me, ValidationMode::non_combat(), &MoveCandidate::new(vec![theirs], Route::new(a, vec![b])))
        .unwrap();
    assert!(verdict.is_fatal());
    assert_eq!(verdict.partition(&[theirs]).disallowed, vec![theirs]);
}

#[test]
fn invalid_route_is_fatal() {
    let mut w = world();
    let a = { let owner = w.me; land(&mut w, "Persia", owner) };
    let b = { let owner = w.me; land(&mut w, "India", owner) };
    let u = w.state.add_unit(w.infantry, w.me, a);
    let rules = Ruleset::default();
    let verdict = MoveValidator::new(&w.state, &rules)
        .validate(w.me, ValidationMode::non_combat(), &MoveCandidate::new(vec![u], Route::new(a, vec![b])))
        .unwrap();
    assert!(matches!(verdict.fatal(), Some(MoveError::InvalidRoute(_))));
}

// ===========================================================================
// Stacking
// ===========================================================================

#[test]
fn stacking_limit_admits_the_first_newcomer_only() {
    let mut w = world();
    let infantry = w.infantry;
    w.state.unit_type_mut(infantry).stacking.movement = Some(StackingLimit {
        max: 2,
        scope: StackingScope::Total,
    });
    let from = { let owner = w.me; land(&mut w, "Wales", owner) };
    let to = { let owner = w.me; land(&mut w, "London", owner) };
    w.state.connect(from, to);
    w.state.add_unit(infantry, w.me, to);
    let movers: Vec<UnitId> = (0..3).map(|_| w.state.add_unit(infantry, w.me, from)).collect();

    let rules = Ruleset::default();
    let ctx = RuleContext::new(&w.state, &rules, w.me, ValidationMode::non_combat());
    assert_eq!(filter_units(&ctx, &movers, LimitKind::Movement, to, &[]), vec![movers[0]]);

    let verdict = MoveValidator::new(&w.state, &rules)
        .validate(w.me, ValidationMode::non_combat(), &MoveCandidate::new(movers.clone(), Route::new(from, vec![to])))
        .unwrap();
    let partition = verdict.partition(&movers);
    assert_eq!(partition.approved, vec![movers[0]]);
    assert_eq!(partition.disallowed, vec![movers[1], movers[2]]);
}
