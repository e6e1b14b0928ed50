//! Game state snapshot.
//!
//! Holds everything a validation call reads: the map, unit types, units,
//! players, relationships, and what has already moved this turn. Validation
//! only ever borrows a `GameState` immutably; the builder methods here exist
//! for scenario loading and tests.

use std::collections::BTreeSet;

use super::map::GameMap;
use super::movement::Movement;
use super::player::{Player, PlayerId, Relationship, RelationshipKind, Relationships};
use super::route::Route;
use super::territory::{Territory, TerritoryId};
use super::unit::{TransportHistory, Unit, UnitId, UnitType, UnitTypeId};

/// A move already made this turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub units: Vec<UnitId>,
    pub route: Route,
}

/// Complete snapshot of the board at one point in a turn.
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub map: GameMap,
    unit_types: Vec<UnitType>,
    units: Vec<Unit>,
    players: Vec<Player>,
    pub relationships: Relationships,
    /// Moves made earlier this turn, in order.
    pub moves_this_turn: Vec<MoveRecord>,
    /// Player pairs whose war began this turn.
    pub wars_declared_this_turn: BTreeSet<(PlayerId, PlayerId)>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    // Builders

    pub fn add_player(&mut self, name: impl Into<String>) -> PlayerId {
        let id = PlayerId(self.players.len() as u8);
        self.players.push(Player::new(id, name));
        id
    }

    pub fn add_unit_type(&mut self, unit_type: UnitType) -> UnitTypeId {
        let id = UnitTypeId(self.unit_types.len() as u16);
        self.unit_types.push(unit_type);
        id
    }

    pub fn add_territory(&mut self, name: impl Into<String>, is_water: bool) -> TerritoryId {
        self.map.add_territory(name, is_water)
    }

    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) {
        self.map.connect(a, b);
    }

    pub fn set_owner(&mut self, t: TerritoryId, owner: Option<PlayerId>) {
        self.map.territory_mut(t).owner = owner;
    }

    pub fn set_relationship(&mut self, a: PlayerId, b: PlayerId, kind: RelationshipKind) {
        self.relationships.set(a, b, Relationship::defaults(kind));
    }

    /// Places a fresh unit with its type's full movement.
    pub fn add_unit(&mut self, type_id: UnitTypeId, owner: PlayerId, at: TerritoryId) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        let movement_left = self.unit_types[type_id.index()].movement;
        self.units.push(Unit {
            id,
            type_id,
            owner,
            location: at,
            movement_left,
            already_moved: Movement::ZERO,
            hits: 0,
            damage: 0,
            transported_by: None,
            transporting: Vec::new(),
            submerged: false,
            was_in_combat: false,
            was_unloaded_this_turn: false,
            was_loaded_this_turn: false,
            was_loaded_after_combat: false,
            airborne: false,
            charged_flat_fuel: false,
            history: TransportHistory::default(),
        });
        self.map.territory_mut(at).units.push(id);
        id
    }

    /// Links `cargo` aboard `transport`. Both must share a territory.
    pub fn load(&mut self, transport: UnitId, cargo: UnitId) {
        self.units[cargo.index()].transported_by = Some(transport);
        let carried = &mut self.units[transport.index()].transporting;
        if !carried.contains(&cargo) {
            carried.push(cargo);
        }
    }

    /// Spends `amount` of a unit's movement as if it had already moved.
    pub fn spend_movement(&mut self, unit: UnitId, amount: Movement) {
        let u = &mut self.units[unit.index()];
        u.movement_left -= amount;
        u.already_moved += amount;
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.index()]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.index()]
    }

    pub fn unit_type_mut(&mut self, id: UnitTypeId) -> &mut UnitType {
        &mut self.unit_types[id.index()]
    }

    pub fn territory_mut(&mut self, id: TerritoryId) -> &mut Territory {
        self.map.territory_mut(id)
    }

    pub fn record_move(&mut self, units: Vec<UnitId>, route: Route) {
        self.moves_this_turn.push(MoveRecord { units, route });
    }

    // Queries

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    pub fn get_unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id.index())
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit_type(&self, id: UnitTypeId) -> &UnitType {
        &self.unit_types[id.index()]
    }

    pub fn unit_types(&self) -> &[UnitType] {
        &self.unit_types
    }

    /// The type of a unit.
    pub fn type_of(&self, unit: UnitId) -> &UnitType {
        self.unit_type(self.unit(unit).type_id)
    }

    pub fn unit_type_by_name(&self, name: &str) -> Option<UnitTypeId> {
        self.unit_types
            .iter()
            .position(|t| t.name == name)
            .map(|i| UnitTypeId(i as u16))
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id.index())
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players.iter().find(|p| p.name == name).map(|p| p.id)
    }

    pub fn territory(&self, id: TerritoryId) -> &Territory {
        self.map.territory(id)
    }

    /// Units in a territory, in placement order.
    pub fn units_in(&self, t: TerritoryId) -> impl Iterator<Item = UnitId> + '_ {
        self.map.territory(t).units.iter().copied()
    }

    /// Territories entered this turn by `unit`, oldest first.
    pub fn territories_entered_by(&self, unit: UnitId) -> impl Iterator<Item = TerritoryId> + '_ {
        self.moves_this_turn
            .iter()
            .filter(move |m| m.units.contains(&unit))
            .map(|m| m.route.end())
    }

    pub fn moved_into_this_turn(&self, unit: UnitId, t: TerritoryId) -> bool {
        self.territories_entered_by(unit).any(|entered| entered == t)
    }

    pub fn war_declared_this_turn(&self, a: PlayerId, b: PlayerId) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.wars_declared_this_turn.contains(&key)
    }
}
