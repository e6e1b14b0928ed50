//! Territories and canals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::movement::Movement;
use super::player::PlayerId;
use super::unit::{UnitId, UnitTypeId};

/// Index of a territory in the map's territory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerritoryId(pub u16);

impl TerritoryId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Terrain effects attached to a territory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerritoryEffects {
    /// Per-type cost of entering, replacing the default of one point.
    pub movement_cost: BTreeMap<UnitTypeId, Movement>,
    pub types_lose_blitz: Vec<UnitTypeId>,
    pub types_not_allowed: Vec<UnitTypeId>,
}

/// A node in the map graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Territory {
    pub id: TerritoryId,
    pub name: String,
    pub is_water: bool,
    /// `None` is neutral land or unowned water.
    pub owner: Option<PlayerId>,
    pub units: Vec<UnitId>,
    pub impassable: bool,
    pub air_base: bool,
    /// The owner held a factory here since the start of the turn.
    pub factory_at_turn_start: bool,
    pub conquered: bool,
    pub blitzed: bool,
    pub battle_fought: bool,
    pub pending_battle: bool,
    /// Units already committed to attack the pending battle here.
    pub attackers: Vec<UnitId>,
    pub effects: TerritoryEffects,
}

impl Territory {
    pub fn new(id: TerritoryId, name: impl Into<String>, is_water: bool) -> Self {
        Territory {
            id,
            name: name.into(),
            is_water,
            owner: None,
            units: Vec::new(),
            impassable: false,
            air_base: false,
            factory_at_turn_start: false,
            conquered: false,
            blitzed: false,
            battle_fought: false,
            pending_battle: false,
            attackers: Vec::new(),
            effects: TerritoryEffects::default(),
        }
    }

    pub fn is_land(&self) -> bool {
        !self.is_water
    }

    /// Neutral land: land with no owner.
    pub fn is_neutral_land(&self) -> bool {
        !self.is_water && self.owner.is_none()
    }

    pub fn is_unowned_water(&self) -> bool {
        self.is_water && self.owner.is_none()
    }

    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Impassability only applies to land.
    pub fn is_impassable(&self) -> bool {
        !self.is_water && self.impassable
    }

    /// Conquered this turn without a blitz.
    pub fn conquered_not_blitzed(&self) -> bool {
        self.conquered && !self.blitzed
    }

    pub fn was_fought_over(&self) -> bool {
        self.battle_fought || self.blitzed
    }

    pub fn movement_cost_for(&self, unit_type: UnitTypeId) -> Movement {
        self.effects
            .movement_cost
            .get(&unit_type)
            .copied()
            .unwrap_or(Movement::ONE)
    }
}

/// A sea passage controlled by flanking land territories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canal {
    pub name: String,
    /// Sea zones joined by the canal; crossing between any two is a passage.
    pub sea_zones: Vec<TerritoryId>,
    pub land_territories: Vec<TerritoryId>,
    pub excluded_types: Vec<UnitTypeId>,
    pub no_combat_move: bool,
}

impl Canal {
    pub fn connects(&self, a: TerritoryId, b: TerritoryId) -> bool {
        a != b && self.sea_zones.contains(&a) && self.sea_zones.contains(&b)
    }
}
