//! Presentation navigation engine: a flattened slide/fragment stream driven
//! by a small state machine, with per-slide capability modules, transition
//! completion bridging, and an optional one-way dual-display mirror.
//!
//! The modules follow the RSB `MODULE_SPEC` pattern so we can eventually
//! promote the code into a production crate without major surgery.

pub mod deck;
pub mod error;
pub mod geometry;
pub mod host;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod modules;
pub mod navigation;
pub mod stream;
pub mod sync;
pub mod tree;

pub use deck::{Capabilities, Deck, DeckConfig, DeckEvent, DeckNotification, EventFlow};
pub use error::{DeckError, Result};
pub use geometry::{REFERENCE_HEIGHT, REFERENCE_WIDTH, Size, scale_factor};
pub use host::{HostEnvironment, NullHost};
pub use input::{KeyBindings, NavCommand, SWIPE_MIN_RADIUS, SwipeTracker, classify_swipe};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink,
};
pub use metrics::{DeckMetrics, MetricSnapshot};
pub use modules::{
    DeckModule, LifecycleLoggerModule, ModuleFactory, ModuleLifecycleManager, ModuleRegistry,
    SlideContext,
};
pub use navigation::{NavOutcome, NavigationStateMachine, TransitionDirection};
pub use stream::{FragmentStream, StreamItem};
pub use sync::{DualDisplaySync, END_SLIDE_TITLE, SyncMessage};
pub use tree::{
    ContentSpec, NodeId, NodeKind, Presentation, PresentationBuilder, SlideBuilder, SlideState,
    TransitionPhase,
};
