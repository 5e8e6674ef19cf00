//! Dual-display sync orchestrator following the RSB module specification.

mod core;

pub use core::{DualDisplaySync, END_SLIDE_TITLE, SyncMessage};
