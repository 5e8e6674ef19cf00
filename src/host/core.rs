use serde_json::Value;

use crate::error::Result;
use crate::geometry::{REFERENCE_HEIGHT, REFERENCE_WIDTH, Size};

/// The engine's window onto mutable environment state: viewport size, the
/// address fragment, the detached secondary window, and fullscreen. Keeping
/// this behind a trait keeps the core logic testable without a live visual
/// environment.
pub trait HostEnvironment {
    fn viewport_size(&self) -> Size;

    /// Apply a uniform rendering scale to the root container.
    fn apply_scale(&mut self, scale: f64);

    /// Current address fragment including its leading `#`, if any.
    fn location_fragment(&self) -> Option<String>;

    fn set_location_fragment(&mut self, fragment: &str);

    /// Origin identity used to validate cross-window messages.
    fn origin(&self) -> String;

    /// Open the detached audience window. `Ok(false)` means the environment
    /// refused (for instance a blocked popup); dual-display mode proceeds
    /// with the in-page mirror alone.
    fn open_secondary_window(&mut self) -> Result<bool>;

    fn close_secondary_window(&mut self);

    /// Fire-and-forget message to the detached window. No acknowledgment,
    /// no ordering guarantee against other message traffic.
    fn post_message(&mut self, payload: &Value);

    fn is_fullscreen(&self) -> bool;

    fn set_fullscreen(&mut self, enabled: bool);
}

/// Inert host for embeddings and tests that do not care about the
/// environment. Remembers the fragment and fullscreen flag so round-trips
/// behave, refuses the secondary window, and drops messages.
pub struct NullHost {
    viewport: Size,
    scale: f64,
    fragment: Option<String>,
    fullscreen: bool,
}

impl Default for NullHost {
    fn default() -> Self {
        Self {
            viewport: Size::new(REFERENCE_WIDTH, REFERENCE_HEIGHT),
            scale: 1.0,
            fragment: None,
            fullscreen: false,
        }
    }
}

impl NullHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl HostEnvironment for NullHost {
    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn apply_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn location_fragment(&self) -> Option<String> {
        self.fragment.clone()
    }

    fn set_location_fragment(&mut self, fragment: &str) {
        self.fragment = Some(fragment.to_string());
    }

    fn origin(&self) -> String {
        "null://deck".to_string()
    }

    fn open_secondary_window(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn close_secondary_window(&mut self) {}

    fn post_message(&mut self, _payload: &Value) {}

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_fullscreen(&mut self, enabled: bool) {
        self.fullscreen = enabled;
    }
}
