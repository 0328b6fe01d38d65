//! Session state resolution and lifecycle
//!
//! Resolution maps the current branch to its (base, wip) pair; the controller
//! turns lifecycle commands into sequences of repository operations.

pub mod controller;
pub mod history;
pub mod resolver;
pub mod squash_wip;

#[cfg(test)]
pub mod mocks;


pub use controller::{DoneOutcome, NextOutcome, SessionController, StartOutcome};
pub use resolver::{determine_branches, SessionPair};
