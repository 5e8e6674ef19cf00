//! Fragment stream module orchestrator following the RSB module specification.

mod core;

pub use core::{FragmentStream, StreamItem};
