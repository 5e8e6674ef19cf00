//! Visual tree module orchestrator following the RSB module specification.
//!
//! The presentation markup model (slides, fragments, datasets) lives in the
//! private `core` module; downstream code imports the types from here.

mod core;

pub use core::{
    ContentSpec, Node, NodeId, NodeKind, Presentation, PresentationBuilder, SlideBuilder,
    SlideState, TransitionPhase,
};
