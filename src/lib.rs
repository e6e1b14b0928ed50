//! Landfall move legality engine library.
//!
//! Exposes the board snapshot, the rule toolbox, the validation pipeline,
//! route preference search and the text protocol for use by integration
//! tests, benchmarks and the binary entry point.

pub mod board;
pub mod candidates;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod routing;
pub mod rules;
pub mod validate;
