//! Navigation module orchestrator following the RSB module specification.
//!
//! The state machine lives in the private `core` module; the transition
//! completion bridge lives in `transition`.

mod core;
mod transition;

pub use core::{NavOutcome, NavigationStateMachine};
pub use transition::TransitionDirection;
