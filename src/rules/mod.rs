//! Rule configuration and the predicate toolbox.
//!
//! [`Ruleset`] holds the house-rule toggles, [`RuleContext`] binds them to a
//! snapshot and a moving player, and the methods in `matches` answer the
//! unit and territory questions every validation pass asks.

pub mod context;
pub mod matches;
pub mod predicate;
pub mod ruleset;

pub use context::{Phase, RuleContext, ValidationMode};
pub use predicate::{always, And, AndIf, BoxPredicate, Not, Or, Predicate};
pub use ruleset::Ruleset;
