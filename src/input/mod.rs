//! Input module orchestrator following the RSB module specification.

mod core;

pub use core::{KeyBindings, NavCommand, SWIPE_MIN_RADIUS, SwipeTracker, classify_swipe};
