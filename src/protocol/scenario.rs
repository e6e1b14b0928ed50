//! JSON scenario snapshots.
//!
//! A scenario names everything: players, unit types and territories are
//! referenced by name, units by their position in the `units` list (which
//! becomes their id). Loading resolves the names and builds a
//! [`GameState`] through its builder API.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{
    AirborneTech, Canal, Domain, GameState, LimitKind, Movement, MovementRestriction, MoveRecord, PlayerId,
    PlayerStackingLimit, Relationship, RelationshipKind, ResourceBag, RestrictionKind, Route, StackingLimit,
    StackingLimits, StackingScope, TerritoryId, UnitId, UnitType, UnitTypeId,
};
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub players: Vec<PlayerSpec>,
    pub relationships: Vec<RelationshipSpec>,
    pub wars_declared_this_turn: Vec<(String, String)>,
    pub unit_types: Vec<UnitTypeSpec>,
    pub territories: Vec<TerritorySpec>,
    pub connections: Vec<(String, String)>,
    pub canals: Vec<CanalSpec>,
    pub units: Vec<UnitSpec>,
    pub moves_this_turn: Vec<MoveSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerSpec {
    pub name: String,
    pub resources: ResourceBag,
    pub paratroopers: bool,
    pub mechanized_infantry: bool,
    pub airborne: Option<AirborneSpec>,
    pub stacking_limits: Vec<PlayerLimitSpec>,
    pub movement_restriction: Option<RestrictionSpec>,
    pub production_queue: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AirborneSpec {
    pub distance: u32,
    pub bases: Vec<String>,
    pub types: Vec<String>,
    pub capacity_per_base: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerLimitSpec {
    pub kind: LimitKind,
    pub max: u32,
    #[serde(default)]
    pub scope: StackingScope,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestrictionSpec {
    pub kind: RestrictionKind,
    pub territories: Vec<String>,
}

/// A stance between two players; the flags override the stance defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationshipSpec {
    pub a: String,
    pub b: String,
    pub kind: RelationshipKind,
    pub can_move_land_units_over_owned_land: Option<bool>,
    pub can_move_air_units_over_owned_land: Option<bool>,
    pub can_land_air_units_on_owned_land: Option<bool>,
    pub can_move_through_canals: Option<bool>,
    pub can_move_into_during_combat_move: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitTypeSpec {
    pub name: String,
    pub domain: Domain,
    pub movement: Movement,
    #[serde(default)]
    pub attack: u32,
    #[serde(default)]
    pub defense: u32,
    pub carrier_capacity: Option<u32>,
    pub carrier_cost: Option<u32>,
    pub transport_capacity: Option<u32>,
    pub transport_cost: Option<u32>,
    /// Ability names, e.g. `can_blitz`, `is_destroyer`.
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub may_not_land_on_carrier_when_damaged: bool,
    #[serde(default)]
    pub may_not_leave_allied_carrier_when_damaged: bool,
    pub max_operational_damage: Option<u32>,
    #[serde(default)]
    pub stacking: StackingSpec,
    #[serde(default)]
    pub requires_units_to_move: Vec<Vec<String>>,
    #[serde(default)]
    pub cannot_invade_from: Vec<String>,
    #[serde(default)]
    pub receives_blitz_with: Vec<String>,
    #[serde(default)]
    pub fuel_cost: ResourceBag,
    #[serde(default)]
    pub fuel_flat_cost: ResourceBag,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StackingSpec {
    pub movement: Option<StackingLimit>,
    pub attacking: Option<StackingLimit>,
    pub placement: Option<StackingLimit>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TerritorySpec {
    pub name: String,
    pub water: bool,
    pub owner: Option<String>,
    pub impassable: bool,
    pub air_base: bool,
    pub factory_at_turn_start: bool,
    pub conquered: bool,
    pub blitzed: bool,
    pub battle_fought: bool,
    pub pending_battle: bool,
    /// Indices into the scenario's unit list.
    pub attackers: Vec<u32>,
    pub movement_cost: BTreeMap<String, Movement>,
    pub types_lose_blitz: Vec<String>,
    pub types_not_allowed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CanalSpec {
    pub name: String,
    pub sea_zones: Vec<String>,
    pub land_territories: Vec<String>,
    pub excluded_types: Vec<String>,
    pub no_combat_move: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnitSpec {
    #[serde(rename = "type")]
    pub unit_type: String,
    pub owner: String,
    pub at: String,
    /// Defaults to the type's full movement.
    pub movement_left: Option<Movement>,
    pub already_moved: Movement,
    pub hits: u32,
    pub damage: u32,
    /// Index of the carrying unit.
    pub transported_by: Option<u32>,
    pub submerged: bool,
    pub was_in_combat: bool,
    pub was_unloaded_this_turn: bool,
    pub was_loaded_this_turn: bool,
    pub was_loaded_after_combat: bool,
    pub airborne: bool,
    pub charged_flat_fuel: bool,
    pub unloaded_in_combat_phase: bool,
    pub unloaded_to: Option<String>,
    pub unloaded_cost: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoveSpec {
    pub units: Vec<u32>,
    pub route: Vec<String>,
}

impl Scenario {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let scenario = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        debug!(path = %path.display(), territories = scenario.territories.len(), units = scenario.units.len(), "loaded scenario");
        Ok(scenario)
    }

    /// Resolves every name and builds the snapshot.
    pub fn build(&self) -> Result<GameState> {
        let mut state = GameState::new();
        for p in &self.players {
            state.add_player(p.name.as_str());
        }
        for t in &self.territories {
            state.add_territory(t.name.as_str(), t.water);
        }

        // Types reference each other by name, so register every name first.
        let type_names: Vec<&str> = self.unit_types.iter().map(|t| t.name.as_str()).collect();
        let type_id = |name: &str| -> Result<UnitTypeId> {
            type_names
                .iter()
                .position(|n| *n == name)
                .map(|i| UnitTypeId(i as u16))
                .ok_or_else(|| EngineError::UnknownName(format!("unit type {}", name)))
        };
        let type_ids = |names: &[String]| names.iter().map(|n| type_id(n)).collect::<Result<Vec<_>>>();
        for spec in &self.unit_types {
            let mut ty = UnitType::new(spec.name.as_str(), spec.domain, 0);
            ty.movement = spec.movement;
            ty.attack = spec.attack;
            ty.defense = spec.defense;
            ty.carrier_capacity = spec.carrier_capacity;
            ty.carrier_cost = spec.carrier_cost;
            ty.transport_capacity = spec.transport_capacity;
            ty.transport_cost = spec.transport_cost;
            for ability in &spec.abilities {
                set_ability(&mut ty, ability)?;
            }
            ty.damaged_effects.units_may_not_land_on_carrier = spec.may_not_land_on_carrier_when_damaged;
            ty.damaged_effects.units_may_not_leave_allied_carrier = spec.may_not_leave_allied_carrier_when_damaged;
            ty.max_operational_damage = spec.max_operational_damage;
            ty.stacking = StackingLimits {
                movement: spec.stacking.movement,
                attacking: spec.stacking.attacking,
                placement: spec.stacking.placement,
            };
            ty.requires_units_to_move = spec
                .requires_units_to_move
                .iter()
                .map(|set| type_ids(set))
                .collect::<Result<_>>()?;
            ty.cannot_invade_from = type_ids(&spec.cannot_invade_from)?;
            ty.receives_blitz_with = type_ids(&spec.receives_blitz_with)?;
            ty.fuel_cost = spec.fuel_cost.clone();
            ty.fuel_flat_cost = spec.fuel_flat_cost.clone();
            state.add_unit_type(ty);
        }

        for (i, p) in self.players.iter().enumerate() {
            let id = PlayerId(i as u8);
            let airborne = match &p.airborne {
                Some(a) => Some(AirborneTech {
                    distance: a.distance,
                    bases: type_ids(&a.bases)?,
                    types: type_ids(&a.types)?,
                    capacity_per_base: a.capacity_per_base,
                }),
                None => None,
            };
            let limits = p
                .stacking_limits
                .iter()
                .map(|l| {
                    Ok(PlayerStackingLimit {
                        kind: l.kind,
                        max: l.max,
                        scope: l.scope,
                        types: type_ids(&l.types)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let restriction = match &p.movement_restriction {
                Some(r) => Some(MovementRestriction {
                    kind: r.kind,
                    territories: territory_ids(&state, &r.territories)?,
                }),
                None => None,
            };
            let queue = type_ids(&p.production_queue)?;
            let player = state.player_mut(id);
            player.resources = p.resources.clone();
            player.tech.paratroopers = p.paratroopers;
            player.tech.mechanized_infantry = p.mechanized_infantry;
            player.tech.airborne = airborne;
            player.stacking_limits = limits;
            player.movement_restriction = restriction;
            player.production_queue = queue;
        }

        for r in &self.relationships {
            let a = player_id(&state, &r.a)?;
            let b = player_id(&state, &r.b)?;
            let mut rel = Relationship::defaults(r.kind);
            let overrides = [
                (r.can_move_land_units_over_owned_land, &mut rel.can_move_land_units_over_owned_land),
                (r.can_move_air_units_over_owned_land, &mut rel.can_move_air_units_over_owned_land),
                (r.can_land_air_units_on_owned_land, &mut rel.can_land_air_units_on_owned_land),
                (r.can_move_through_canals, &mut rel.can_move_through_canals),
                (r.can_move_into_during_combat_move, &mut rel.can_move_into_during_combat_move),
            ];
            for (value, flag) in overrides {
                if let Some(value) = value {
                    *flag = value;
                }
            }
            state.relationships.set(a, b, rel);
        }
        for (a, b) in &self.wars_declared_this_turn {
            let a = player_id(&state, a)?;
            let b = player_id(&state, b)?;
            state.wars_declared_this_turn.insert(if a <= b { (a, b) } else { (b, a) });
        }

        for (a, b) in &self.connections {
            let a = territory_id(&state, a)?;
            let b = territory_id(&state, b)?;
            state.connect(a, b);
        }
        for spec in &self.territories {
            let id = territory_id(&state, &spec.name)?;
            let owner = match &spec.owner {
                Some(name) => Some(player_id(&state, name)?),
                None => None,
            };
            let mut movement_cost = BTreeMap::new();
            for (name, cost) in &spec.movement_cost {
                movement_cost.insert(type_id(name)?, *cost);
            }
            let lose_blitz = type_ids(&spec.types_lose_blitz)?;
            let not_allowed = type_ids(&spec.types_not_allowed)?;
            state.set_owner(id, owner);
            let t = state.territory_mut(id);
            t.impassable = spec.impassable;
            t.air_base = spec.air_base;
            t.factory_at_turn_start = spec.factory_at_turn_start;
            t.conquered = spec.conquered;
            t.blitzed = spec.blitzed;
            t.battle_fought = spec.battle_fought;
            t.pending_battle = spec.pending_battle;
            t.attackers = spec.attackers.iter().map(|&i| UnitId(i)).collect();
            t.effects.movement_cost = movement_cost;
            t.effects.types_lose_blitz = lose_blitz;
            t.effects.types_not_allowed = not_allowed;
        }
        for spec in &self.canals {
            let canal = Canal {
                name: spec.name.clone(),
                sea_zones: territory_ids(&state, &spec.sea_zones)?,
                land_territories: territory_ids(&state, &spec.land_territories)?,
                excluded_types: type_ids(&spec.excluded_types)?,
                no_combat_move: spec.no_combat_move,
            };
            state.map.add_canal(canal);
        }

        for spec in &self.units {
            let ty = type_id(&spec.unit_type)?;
            let owner = player_id(&state, &spec.owner)?;
            let at = territory_id(&state, &spec.at)?;
            let unloaded_to = match &spec.unloaded_to {
                Some(name) => Some(territory_id(&state, name)?),
                None => None,
            };
            let id = state.add_unit(ty, owner, at);
            let unit = state.unit_mut(id);
            if let Some(left) = spec.movement_left {
                unit.movement_left = left;
            }
            unit.already_moved = spec.already_moved;
            unit.hits = spec.hits;
            unit.damage = spec.damage;
            unit.submerged = spec.submerged;
            unit.was_in_combat = spec.was_in_combat;
            unit.was_unloaded_this_turn = spec.was_unloaded_this_turn;
            unit.was_loaded_this_turn = spec.was_loaded_this_turn;
            unit.was_loaded_after_combat = spec.was_loaded_after_combat;
            unit.airborne = spec.airborne;
            unit.charged_flat_fuel = spec.charged_flat_fuel;
            unit.history.unloaded_in_combat_phase = spec.unloaded_in_combat_phase;
            unit.history.unloaded_to = unloaded_to;
            unit.history.unloaded_cost = spec.unloaded_cost;
        }
        let count = self.units.len() as u32;
        for (i, spec) in self.units.iter().enumerate() {
            if let Some(transport) = spec.transported_by {
                if transport >= count {
                    return Err(EngineError::Scenario(format!("unit {} rides missing unit {}", i, transport)));
                }
                let (transport, cargo) = (UnitId(transport), UnitId(i as u32));
                if state.unit(transport).location != state.unit(cargo).location {
                    return Err(EngineError::Scenario(format!(
                        "unit {} is not where its transport is",
                        i
                    )));
                }
                state.load(transport, cargo);
            }
        }
        if let Some(&attacker) = self.territories.iter().flat_map(|t| &t.attackers).find(|&&a| a >= count) {
            return Err(EngineError::UnknownUnit(UnitId(attacker)));
        }

        for m in &self.moves_this_turn {
            let path = territory_ids(&state, &m.route)?;
            let route = Route::from_territories(&path)
                .ok_or_else(|| EngineError::Scenario("empty route in moves_this_turn".into()))?;
            let units: Vec<UnitId> = m.units.iter().map(|&u| UnitId(u)).collect();
            if let Some(missing) = units.iter().find(|u| u.0 >= count) {
                return Err(EngineError::UnknownUnit(*missing));
            }
            state.moves_this_turn.push(MoveRecord { units, route });
        }
        Ok(state)
    }
}

fn set_ability(ty: &mut UnitType, name: &str) -> Result<()> {
    let a = &mut ty.abilities;
    let flag = match name {
        "can_blitz" => &mut a.can_blitz,
        "can_move_through_enemies" => &mut a.can_move_through_enemies,
        "can_be_moved_through_by_enemies" => &mut a.can_be_moved_through_by_enemies,
        "is_destroyer" => &mut a.is_destroyer,
        "is_infrastructure" => &mut a.is_infrastructure,
        "cannot_move_during_combat_move" => &mut a.cannot_move_during_combat_move,
        "is_aa_for_fly_over" => &mut a.is_aa_for_fly_over,
        "is_kamikaze" => &mut a.is_kamikaze,
        "is_suicide_on_attack" => &mut a.is_suicide_on_attack,
        "is_air_transport" => &mut a.is_air_transport,
        "is_air_transportable" => &mut a.is_air_transportable,
        "is_land_transport" => &mut a.is_land_transport,
        "is_land_transportable" => &mut a.is_land_transportable,
        "is_combat_transport" => &mut a.is_combat_transport,
        "can_be_damaged" => &mut a.can_be_damaged,
        other => return Err(EngineError::Scenario(format!("unknown ability {} on {}", other, ty.name))),
    };
    *flag = true;
    Ok(())
}

pub fn player_id(state: &GameState, name: &str) -> Result<PlayerId> {
    state
        .player_by_name(name)
        .ok_or_else(|| EngineError::UnknownName(format!("player {}", name)))
}

pub fn territory_id(state: &GameState, name: &str) -> Result<TerritoryId> {
    state
        .map
        .id_of(name)
        .ok_or_else(|| EngineError::UnknownName(format!("territory {}", name)))
}

fn territory_ids(state: &GameState, names: &[String]) -> Result<Vec<TerritoryId>> {
    names.iter().map(|n| territory_id(state, n)).collect()
}
