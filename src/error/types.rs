use thiserror::Error;

/// Unified result type for the deck engine crate.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Errors surfaced by the navigation engine.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Navigation addressed a stream index outside `[0, length)`. An empty
    /// deck rejects every navigation call with `length = 0`.
    #[error("deck has {length} items but {requested} requested")]
    IndexOutOfRange { requested: usize, length: usize },
    #[error("node {0} is not a slide")]
    NotASlide(usize),
    /// A capability module reported a failure from one of its lifecycle
    /// phases, or its factory refused to build an instance. The engine does
    /// not recover from this; it surfaces the failure to the caller of the
    /// enclosing lifecycle operation.
    #[error("capability `{capability}` failed on slide {slide}: {message}")]
    Module {
        capability: String,
        slide: usize,
        message: String,
    },
    #[error("secondary display error: {0}")]
    SecondaryDisplay(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
