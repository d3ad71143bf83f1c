//! Domain models for the study tracker.
//!
//! # Core Concepts
//!
//! - [`Topic`]: A study area (e.g. "Graphs") with optional question/minute goals.
//!   Deleting a topic removes its problems and sessions.
//! - [`Problem`]: A practice problem, optionally filed under a topic, carrying
//!   its review flag and priority.
//! - [`Session`]: One logged practice block. Independent of resolve tracking.
//! - [`ResolveAttempt`]: A spaced-repetition attempt at re-solving a problem
//!   that was already logged. Always owned by exactly one problem.
//!
//! Outcome and priority values are closed enums ([`ResolveOutcome`],
//! [`ReviewPriority`]); free-text input is parsed into them at the boundary.

mod problem;
mod resolve;
mod session;
mod topic;

pub use problem::*;
pub use resolve::*;
pub use session::*;
pub use topic::*;
