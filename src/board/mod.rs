//! Board representation and game-state types.
//!
//! Contains the territory graph, unit and player data, routes, and the
//! snapshot that every validation call reads from.

pub mod map;
pub mod movement;
pub mod player;
pub mod route;
pub mod state;
pub mod territory;
pub mod unit;

pub use map::GameMap;
pub use movement::{Movement, ParseMovementError};
pub use player::{
    AirborneTech, MovementRestriction, Player, PlayerId, PlayerStackingLimit, Relationship,
    RelationshipKind, Relationships, ResourceBag, RestrictionKind, Tech, PUS,
};
pub use route::Route;
pub use state::{GameState, MoveRecord};
pub use territory::{Canal, Territory, TerritoryEffects, TerritoryId};
pub use unit::{
    Abilities, DamagedEffects, Domain, LimitKind, StackingLimit, StackingLimits, StackingScope,
    TransportHistory, Unit, UnitId, UnitType, UnitTypeId,
};
