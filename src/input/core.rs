use std::f64::consts::FRAC_PI_4;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Navigation commands producible by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    NextItem,
    PreviousItem,
    ToggleDualDisplay,
    ToggleFullscreen,
}

/// Keyboard chord table mapping key events to navigation commands.
pub struct KeyBindings {
    bindings: Vec<(KeyCode, KeyModifiers, NavCommand)>,
}

impl Default for KeyBindings {
    /// The presenter bindings: PageUp/Left step back, PageDown/Right step
    /// forward, F9 toggles the dual display, F4 toggles fullscreen.
    fn default() -> Self {
        let mut bindings = Self::empty();
        bindings.bind(KeyCode::PageUp, KeyModifiers::NONE, NavCommand::PreviousItem);
        bindings.bind(KeyCode::Left, KeyModifiers::NONE, NavCommand::PreviousItem);
        bindings.bind(KeyCode::PageDown, KeyModifiers::NONE, NavCommand::NextItem);
        bindings.bind(KeyCode::Right, KeyModifiers::NONE, NavCommand::NextItem);
        bindings.bind(KeyCode::F(9), KeyModifiers::NONE, NavCommand::ToggleDualDisplay);
        bindings.bind(KeyCode::F(4), KeyModifiers::NONE, NavCommand::ToggleFullscreen);
        bindings
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    pub fn bind(&mut self, code: KeyCode, modifiers: KeyModifiers, command: NavCommand) {
        self.bindings.push((code, modifiers, command));
    }

    /// Resolve a key event to a command. Key releases never trigger
    /// navigation; repeats do, so holding an arrow key keeps stepping.
    pub fn command_for(&self, key: &KeyEvent) -> Option<NavCommand> {
        if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
            return None;
        }
        self.bindings
            .iter()
            .find(|(code, modifiers, _)| *code == key.code && *modifiers == key.modifiers)
            .map(|(_, _, command)| *command)
    }
}

/// Minimum swipe displacement magnitude, in device-independent units.
/// Anything at or below this is treated as an accidental touch.
pub const SWIPE_MIN_RADIUS: f64 = 20.0;

/// Classify a two-point swipe by its displacement vector. A rightward swipe
/// (pulling the deck back) steps to the previous item, a leftward swipe to
/// the next; vertical and short gestures are ignored.
pub fn classify_swipe(dx: f64, dy: f64) -> Option<NavCommand> {
    let radius = (dx * dx + dy * dy).sqrt();
    if radius <= SWIPE_MIN_RADIUS {
        return None;
    }
    let angle = dy.atan2(dx);
    if angle > -FRAC_PI_4 && angle < FRAC_PI_4 {
        Some(NavCommand::PreviousItem)
    } else if angle > 3.0 * FRAC_PI_4 || angle < -3.0 * FRAC_PI_4 {
        Some(NavCommand::NextItem)
    } else {
        None
    }
}

/// Accumulates a touch gesture from start through moves to the end point.
#[derive(Debug, Default)]
pub struct SwipeTracker {
    start: Option<(f64, f64)>,
    end: Option<(f64, f64)>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.start = Some((x, y));
        self.end = None;
    }

    pub fn touch_move(&mut self, x: f64, y: f64) {
        if self.start.is_some() {
            self.end = Some((x, y));
        }
    }

    /// Finish the gesture and classify it. A touch that never moved is
    /// ignored.
    pub fn touch_end(&mut self) -> Option<NavCommand> {
        let start = self.start.take()?;
        let end = self.end.take()?;
        classify_swipe(end.0 - start.0, end.1 - start.1)
    }
}
