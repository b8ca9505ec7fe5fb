//! 1D elementary cellular automaton whose rule is edited through a slider,
//! eight switches and a binary label.

pub mod router;
pub mod rule;
pub mod world;

pub use router::{RuleControls, RuleEvent};
pub use world::{next_line, CaWorld, PatchGrid};
