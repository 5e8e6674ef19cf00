//! Host environment orchestrator following the RSB module specification.

mod core;

pub use core::{HostEnvironment, NullHost};
