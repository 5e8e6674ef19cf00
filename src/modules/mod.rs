//! Capability module orchestrator following the RSB module specification.
//!
//! The lifecycle machinery lives in the private `core` module; the bundled
//! diagnostics capability lives in `diagnostics`.

mod core;
pub mod diagnostics;

pub use core::{DeckModule, ModuleFactory, ModuleLifecycleManager, ModuleRegistry, SlideContext};
pub use diagnostics::LifecycleLoggerModule;
