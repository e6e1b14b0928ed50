//! Unit types and unit instances.
//!
//! A `UnitType` carries the static attributes shared by every piece of that
//! type; a `Unit` is one piece on the board with its own owner, remaining
//! movement, and transport links.

use serde::{Deserialize, Serialize};

use super::movement::Movement;
use super::player::{PlayerId, ResourceBag};
use super::territory::TerritoryId;

/// Index of a unit type in the snapshot's type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(pub u16);

/// Index of a unit in the snapshot's unit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl UnitTypeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Movement class of a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Land,
    Sea,
    Air,
}

/// Which units in a territory count against a stacking limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackingScope {
    /// Only units owned by the moving player.
    Owned,
    /// Units owned by the moving player or its allies.
    Allied,
    /// Every unit in the territory.
    #[default]
    Total,
}

/// The purpose a stacking limit applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Movement,
    Attacking,
    Placement,
}

/// A cap on how many units of a type may share a territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackingLimit {
    pub max: u32,
    #[serde(default)]
    pub scope: StackingScope,
}

/// Unit-level stacking limits, one optional cap per limit kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackingLimits {
    pub movement: Option<StackingLimit>,
    pub attacking: Option<StackingLimit>,
    pub placement: Option<StackingLimit>,
}

impl StackingLimits {
    pub const fn get(&self, kind: LimitKind) -> Option<StackingLimit> {
        match kind {
            LimitKind::Movement => self.movement,
            LimitKind::Attacking => self.attacking,
            LimitKind::Placement => self.placement,
        }
    }
}

/// Effects applied to a unit once it has taken hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DamagedEffects {
    /// Air units may no longer land on this carrier.
    pub units_may_not_land_on_carrier: bool,
    /// Allied air already aboard may not leave this carrier.
    pub units_may_not_leave_allied_carrier: bool,
}

/// Boolean abilities of a unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Abilities {
    pub can_blitz: bool,
    /// Submarine-style movement through enemy-occupied sea zones.
    pub can_move_through_enemies: bool,
    pub can_be_moved_through_by_enemies: bool,
    pub is_destroyer: bool,
    pub is_infrastructure: bool,
    /// AA guns and similar units that stay put during combat movement.
    pub cannot_move_during_combat_move: bool,
    pub is_aa_for_fly_over: bool,
    pub is_kamikaze: bool,
    pub is_suicide_on_attack: bool,
    pub is_air_transport: bool,
    pub is_air_transportable: bool,
    pub is_land_transport: bool,
    pub is_land_transportable: bool,
    pub is_combat_transport: bool,
    pub can_be_damaged: bool,
}

/// Static attributes shared by every unit of a type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitType {
    pub name: String,
    pub domain: Domain,
    pub movement: Movement,
    pub attack: u32,
    pub defense: u32,
    /// `None` means the type is not a carrier.
    pub carrier_capacity: Option<u32>,
    /// `None` means the type cannot land on carriers.
    pub carrier_cost: Option<u32>,
    /// `None` means the type cannot transport.
    pub transport_capacity: Option<u32>,
    /// `None` means the type cannot be transported.
    pub transport_cost: Option<u32>,
    pub abilities: Abilities,
    pub damaged_effects: DamagedEffects,
    pub max_operational_damage: Option<u32>,
    pub stacking: StackingLimits,
    /// Alternative sets of types; entering a territory requires one full set
    /// to be present there.
    pub requires_units_to_move: Vec<Vec<UnitTypeId>>,
    /// Transport types this unit may not invade from.
    pub cannot_invade_from: Vec<UnitTypeId>,
    /// Types whose presence in the same move grants this type blitz.
    pub receives_blitz_with: Vec<UnitTypeId>,
    pub fuel_cost: ResourceBag,
    pub fuel_flat_cost: ResourceBag,
}

impl UnitType {
    /// Creates a unit type with no special abilities.
    pub fn new(name: impl Into<String>, domain: Domain, movement: u32) -> Self {
        UnitType {
            name: name.into(),
            domain,
            movement: Movement::from(movement),
            attack: 0,
            defense: 0,
            carrier_capacity: None,
            carrier_cost: None,
            transport_capacity: None,
            transport_cost: None,
            abilities: Abilities::default(),
            damaged_effects: DamagedEffects::default(),
            max_operational_damage: None,
            stacking: StackingLimits::default(),
            requires_units_to_move: Vec::new(),
            cannot_invade_from: Vec::new(),
            receives_blitz_with: Vec::new(),
            fuel_cost: ResourceBag::default(),
            fuel_flat_cost: ResourceBag::default(),
        }
    }

    pub fn is_air(&self) -> bool {
        self.domain == Domain::Air
    }

    pub fn is_sea(&self) -> bool {
        self.domain == Domain::Sea
    }

    pub fn is_land(&self) -> bool {
        self.domain == Domain::Land
    }

    pub fn is_carrier(&self) -> bool {
        self.carrier_capacity.is_some()
    }

    pub fn can_land_on_carrier(&self) -> bool {
        self.carrier_cost.is_some()
    }

    pub fn can_transport(&self) -> bool {
        self.transport_capacity.is_some()
    }

    pub fn can_be_transported(&self) -> bool {
        self.transport_cost.is_some()
    }

    pub fn is_sea_transport(&self) -> bool {
        self.can_transport() && self.is_sea()
    }

    pub fn has_stacking_limits(&self) -> bool {
        self.stacking.movement.is_some() || self.stacking.attacking.is_some()
    }
}

/// Per-transport history needed to judge unloading restrictions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportHistory {
    /// Cargo came off this transport during combat movement.
    pub unloaded_in_combat_phase: bool,
    /// Where this transport has already unloaded cargo this turn.
    pub unloaded_to: Option<TerritoryId>,
    /// Transport cost of the cargo unloaded so far this turn.
    pub unloaded_cost: u32,
}

/// A single piece on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub type_id: UnitTypeId,
    pub owner: PlayerId,
    pub location: TerritoryId,
    pub movement_left: Movement,
    pub already_moved: Movement,
    pub hits: u32,
    pub damage: u32,
    /// Back-reference to the carrying unit; does not own it.
    pub transported_by: Option<UnitId>,
    pub transporting: Vec<UnitId>,
    pub submerged: bool,
    pub was_in_combat: bool,
    pub was_unloaded_this_turn: bool,
    pub was_loaded_this_turn: bool,
    pub was_loaded_after_combat: bool,
    pub airborne: bool,
    pub charged_flat_fuel: bool,
    pub history: TransportHistory,
}

impl Unit {
    pub fn has_moved(&self) -> bool {
        self.already_moved > Movement::ZERO
    }
}
