//! Move validation.
//!
//! A [`MoveCandidate`] runs through an ordered list of passes. Each pass
//! returns [`Findings`] (per-unit rejections) or a fatal [`MoveError`], and
//! [`Verdict::absorb`] folds them into the answer. The air landing
//! resolver in [`air`] is the one pass that searches rather than checks.

pub mod air;
pub mod airborne;
pub mod basic;
pub mod canal;
pub mod candidate;
pub mod cargo;
pub mod first;
pub mod fuel;
pub mod paratroop;
pub mod path;
pub mod phase;
pub mod pipeline;
pub mod stacking;
pub mod transport;
pub mod verdict;

pub use air::{resolve_landing, LandingPhase, LandingReport};
pub use canal::{can_any_units_pass_canal, canal_blockage, CanalBlockage};
pub use candidate::MoveCandidate;
pub use fuel::fuel_charge;
pub use pipeline::{validate_batch, MoveValidator};
pub use stacking::filter_units;
pub use verdict::{Disposition, Findings, MoveError, Partition, PassResult, Reason, Rejection, Verdict, VerdictStatus};
