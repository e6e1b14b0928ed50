//! Players, their resources and tech, and the relationships between them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::territory::TerritoryId;
use super::unit::{LimitKind, StackingScope, UnitTypeId};

/// Index of a player in the snapshot's player table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Name of the resource charged for violating neutral territory.
pub const PUS: &str = "PUs";

/// A named collection of resource quantities.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceBag(pub BTreeMap<String, u32>);

impl ResourceBag {
    pub fn get(&self, resource: &str) -> u32 {
        self.0.get(resource).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|&v| v == 0)
    }

    pub fn add(&mut self, other: &ResourceBag) {
        for (name, qty) in &other.0 {
            *self.0.entry(name.clone()).or_insert(0) += qty;
        }
    }

    pub fn add_scaled(&mut self, other: &ResourceBag, times: u32) {
        for (name, qty) in &other.0 {
            *self.0.entry(name.clone()).or_insert(0) += qty.saturating_mul(times);
        }
    }

    /// Returns true if this bag holds at least `cost` of every resource.
    pub fn covers(&self, cost: &ResourceBag) -> bool {
        cost.0.iter().all(|(name, &qty)| self.get(name) >= qty)
    }
}

impl fmt::Display for ResourceBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, qty) in self.0.iter().filter(|&(_, &q)| q > 0) {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", qty, name)?;
            first = false;
        }
        Ok(())
    }
}

/// Airborne-forces tech parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AirborneTech {
    pub distance: u32,
    pub bases: Vec<UnitTypeId>,
    pub types: Vec<UnitTypeId>,
    /// Launch capacity contributed by each base unit.
    pub capacity_per_base: u32,
}

/// Technologies that change movement legality.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tech {
    pub paratroopers: bool,
    pub mechanized_infantry: bool,
    pub airborne: Option<AirborneTech>,
}

/// A player-level stacking rule covering a set of unit types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStackingLimit {
    pub kind: LimitKind,
    pub max: u32,
    pub scope: StackingScope,
    pub types: Vec<UnitTypeId>,
}

/// Whether a movement restriction lists the allowed or the forbidden territories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictionKind {
    Allowed,
    Disallowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRestriction {
    pub kind: RestrictionKind,
    pub territories: Vec<TerritoryId>,
}

impl MovementRestriction {
    /// Returns true if the player may enter `t` under this restriction.
    pub fn permits(&self, t: TerritoryId) -> bool {
        let listed = self.territories.contains(&t);
        match self.kind {
            RestrictionKind::Allowed => listed,
            RestrictionKind::Disallowed => !listed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub resources: ResourceBag,
    pub tech: Tech,
    pub stacking_limits: Vec<PlayerStackingLimit>,
    pub movement_restriction: Option<MovementRestriction>,
    /// Unit types bought this turn and not yet placed.
    pub production_queue: Vec<UnitTypeId>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Player {
            id,
            name: name.into(),
            resources: ResourceBag::default(),
            tech: Tech::default(),
            stacking_limits: Vec::new(),
            movement_restriction: None,
            production_queue: Vec::new(),
        }
    }

    pub fn pus(&self) -> u32 {
        self.resources.get(PUS)
    }

    pub fn limits(&self, kind: LimitKind) -> impl Iterator<Item = &PlayerStackingLimit> {
        self.stacking_limits.iter().filter(move |l| l.kind == kind)
    }
}

/// Diplomatic stance between two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Allied,
    War,
    Neutral,
}

/// Stance plus the movement permissions it grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub can_move_land_units_over_owned_land: bool,
    pub can_move_air_units_over_owned_land: bool,
    pub can_land_air_units_on_owned_land: bool,
    pub can_move_through_canals: bool,
    pub can_move_into_during_combat_move: bool,
}

impl Relationship {
    /// The permissions a stance grants when nothing overrides them.
    pub const fn defaults(kind: RelationshipKind) -> Self {
        let allied = matches!(kind, RelationshipKind::Allied);
        let not_neutral = !matches!(kind, RelationshipKind::Neutral);
        Relationship {
            kind,
            can_move_land_units_over_owned_land: not_neutral,
            can_move_air_units_over_owned_land: not_neutral,
            can_land_air_units_on_owned_land: allied,
            can_move_through_canals: allied,
            can_move_into_during_combat_move: true,
        }
    }

    /// How every player relates to the owner of neutral land.
    pub const fn unowned() -> Self {
        Relationship::defaults(RelationshipKind::War)
    }

    pub const fn is_allied(&self) -> bool {
        matches!(self.kind, RelationshipKind::Allied)
    }

    pub const fn is_at_war(&self) -> bool {
        matches!(self.kind, RelationshipKind::War)
    }
}

/// Symmetric relationship table between players.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Relationships {
    table: BTreeMap<(PlayerId, PlayerId), Relationship>,
}

impl Relationships {
    fn key(a: PlayerId, b: PlayerId) -> (PlayerId, PlayerId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn set(&mut self, a: PlayerId, b: PlayerId, relationship: Relationship) {
        self.table.insert(Self::key(a, b), relationship);
    }

    /// Looks up how `a` relates to `b`. `None` is the absent owner of
    /// neutral territory. Pairs never set default to neutral.
    pub fn get(&self, a: PlayerId, b: Option<PlayerId>) -> Relationship {
        let b = match b {
            Some(b) => b,
            None => return Relationship::unowned(),
        };
        if a == b {
            let mut own = Relationship::defaults(RelationshipKind::Allied);
            own.can_land_air_units_on_owned_land = true;
            own.can_move_through_canals = true;
            return own;
        }
        self.table
            .get(&Self::key(a, b))
            .copied()
            .unwrap_or(Relationship::defaults(RelationshipKind::Neutral))
    }

    pub fn is_allied(&self, a: PlayerId, b: Option<PlayerId>) -> bool {
        self.get(a, b).is_allied()
    }

    pub fn is_at_war(&self, a: PlayerId, b: Option<PlayerId>) -> bool {
        self.get(a, b).is_at_war()
    }
}
