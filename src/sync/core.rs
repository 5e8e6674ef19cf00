use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::host::HostEnvironment;
use crate::modules::ModuleRegistry;
use crate::navigation::NavigationStateMachine;
use crate::tree::{Presentation, SlideBuilder};

/// Single-field wire schema for the cross-window channel. Receivers must
/// check the sender's origin and ignore anything that does not carry an
/// `item` field; discrimination is by payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    pub item: usize,
}

/// Title of the fixed terminal slide appended to the mirror's markup so it
/// can run one item ahead of the primary without overrunning its stream.
pub const END_SLIDE_TITLE: &str = "LAST SLIDE";

/// Mirrors navigation state to a secondary in-page display and, when the
/// environment allows one, a detached same-origin window.
///
/// The mirror is a pristine clone of the primary markup with the terminal
/// slide appended, driven by its own machine and its own module instance
/// set. Synchronization is strictly one-way, by value: the mirror is told
/// which item to show and the detached window receives a `SyncMessage`.
pub struct DualDisplaySync {
    mirror: NavigationStateMachine,
    detached: bool,
}

impl DualDisplaySync {
    /// Clone the primary markup, append the terminal slide, and stand up the
    /// mirror machine. `open_window` additionally requests a detached
    /// audience window from the host; a refusal (blocked popup) leaves dual
    /// display running with the in-page mirror alone.
    pub fn enable(
        primary: &Presentation,
        registry: Arc<ModuleRegistry>,
        host: &mut dyn HostEnvironment,
        open_window: bool,
    ) -> Result<Self> {
        let mut clone = primary.pristine_clone();
        clone.append_slide(SlideBuilder::titled(END_SLIDE_TITLE));
        let mirror = NavigationStateMachine::new(clone, registry);
        let detached = if open_window {
            host.open_secondary_window()?
        } else {
            false
        };
        Ok(Self { mirror, detached })
    }

    pub fn mirror(&self) -> &NavigationStateMachine {
        &self.mirror
    }

    pub fn mirror_item(&self) -> Option<usize> {
        self.mirror.current_item()
    }

    pub fn has_detached_window(&self) -> bool {
        self.detached
    }

    /// Bring the mirror to `primary_item + 1` (clamped to its own stream)
    /// and notify the detached window, if one is open. Returns whether a
    /// message was posted.
    pub fn sync(&mut self, primary_item: usize, host: &mut dyn HostEnvironment) -> Result<bool> {
        let last = self.mirror.stream().len().saturating_sub(1);
        let target = (primary_item + 1).min(last);
        self.mirror.activate_item(target)?;

        if self.detached {
            host.post_message(&json!({ "item": primary_item }));
            return Ok(true);
        }
        Ok(false)
    }

    /// Tear down dual-display mode: close the detached window and run the
    /// mirror's pending module cleanups before the clone is dropped.
    pub fn disable(mut self, host: &mut dyn HostEnvironment) -> Result<()> {
        if self.detached {
            host.close_secondary_window();
        }
        self.mirror.dispose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::geometry::Size;
    use crate::host::NullHost;
    use crate::modules::{DeckModule, ModuleRegistry};
    use crate::tree::SlideBuilder;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Host fake recording window and message traffic.
    #[derive(Default)]
    struct RecordingHost {
        window_open: bool,
        refuse_window: bool,
        closed: usize,
        messages: Vec<Value>,
    }

    impl HostEnvironment for RecordingHost {
        fn viewport_size(&self) -> Size {
            Size::new(1280, 720)
        }

        fn apply_scale(&mut self, _scale: f64) {}

        fn location_fragment(&self) -> Option<String> {
            None
        }

        fn set_location_fragment(&mut self, _fragment: &str) {}

        fn origin(&self) -> String {
            "test://deck".to_string()
        }

        fn open_secondary_window(&mut self) -> Result<bool> {
            if self.refuse_window {
                return Ok(false);
            }
            self.window_open = true;
            Ok(true)
        }

        fn close_secondary_window(&mut self) {
            self.window_open = false;
            self.closed += 1;
        }

        fn post_message(&mut self, payload: &Value) {
            self.messages.push(payload.clone());
        }

        fn is_fullscreen(&self) -> bool {
            false
        }

        fn set_fullscreen(&mut self, _enabled: bool) {}
    }

    fn two_slide_deck() -> Presentation {
        Presentation::builder()
            .slide(SlideBuilder::titled("A").fragment("a1").fragment("a2"))
            .slide(SlideBuilder::titled("B"))
            .build()
    }

    fn registry() -> Arc<ModuleRegistry> {
        Arc::new(ModuleRegistry::new())
    }

    #[test]
    fn mirror_gets_terminal_slide() {
        let deck = two_slide_deck();
        let mut host = NullHost::new();
        let sync = DualDisplaySync::enable(&deck, registry(), &mut host, false).unwrap();

        // Primary stream is 4 items; the mirror adds the LAST SLIDE unit.
        assert_eq!(sync.mirror().stream().len(), 5);
        let mirror_deck = sync.mirror().presentation();
        let last = *mirror_deck.slides().last().unwrap();
        assert_eq!(mirror_deck.text(last), END_SLIDE_TITLE);
    }

    #[test]
    fn mirror_runs_one_item_ahead_clamped() {
        let deck = two_slide_deck();
        let mut host = NullHost::new();
        let mut sync = DualDisplaySync::enable(&deck, registry(), &mut host, false).unwrap();

        for primary_item in 0..4 {
            sync.sync(primary_item, &mut host).unwrap();
            let expected = (primary_item + 1).min(sync.mirror().stream().len() - 1);
            assert_eq!(sync.mirror_item(), Some(expected));
        }

        // Stepping the primary to its last item parks the mirror on the
        // terminal slide without overrun.
        assert_eq!(sync.mirror_item(), Some(4));
    }

    #[test]
    fn detached_window_receives_item_messages() {
        let deck = two_slide_deck();
        let mut host = RecordingHost::default();
        let mut sync = DualDisplaySync::enable(&deck, registry(), &mut host, true).unwrap();
        assert!(sync.has_detached_window());
        assert!(host.window_open);

        let posted = sync.sync(2, &mut host).unwrap();
        assert!(posted);
        assert_eq!(host.messages.len(), 1);
        let message: SyncMessage = serde_json::from_value(host.messages[0].clone()).unwrap();
        assert_eq!(message, SyncMessage { item: 2 });
    }

    #[test]
    fn refused_window_still_mirrors_in_page() {
        let deck = two_slide_deck();
        let mut host = RecordingHost {
            refuse_window: true,
            ..RecordingHost::default()
        };
        let mut sync = DualDisplaySync::enable(&deck, registry(), &mut host, true).unwrap();
        assert!(!sync.has_detached_window());

        let posted = sync.sync(0, &mut host).unwrap();
        assert!(!posted);
        assert_eq!(sync.mirror_item(), Some(1));
        assert!(host.messages.is_empty());
    }

    #[test]
    fn disable_closes_window_and_cleans_modules() {
        let cleanups = Arc::new(Mutex::new(0usize));

        struct CleanupProbe {
            cleanups: Arc<Mutex<usize>>,
        }

        impl DeckModule for CleanupProbe {
            fn cleanup(&mut self) -> Result<()> {
                *self.cleanups.lock().unwrap() += 1;
                Ok(())
            }
        }

        let mut registry = ModuleRegistry::new();
        let probe_cleanups = cleanups.clone();
        registry.register_fn("probe", move |_context, _value| {
            Ok(Box::new(CleanupProbe {
                cleanups: probe_cleanups.clone(),
            }) as Box<dyn DeckModule>)
        });

        let deck = Presentation::builder()
            .data("probe", "on")
            .slide(SlideBuilder::titled("A"))
            .build();

        let mut host = RecordingHost::default();
        let mut sync =
            DualDisplaySync::enable(&deck, Arc::new(registry), &mut host, true).unwrap();
        sync.sync(0, &mut host).unwrap();

        sync.disable(&mut host).unwrap();
        assert!(!host.window_open);
        assert_eq!(host.closed, 1);
        assert_eq!(*cleanups.lock().unwrap(), 1);
    }

    #[test]
    fn mirror_state_is_independent_of_primary() {
        let deck = two_slide_deck();
        let mut primary = NavigationStateMachine::new(deck.clone(), registry());
        let mut host = NullHost::new();
        let mut sync = DualDisplaySync::enable(&deck, registry(), &mut host, false).unwrap();

        primary.activate_item(0).unwrap();
        sync.sync(0, &mut host).unwrap();

        // The mirror shows item 1 (A.frag1 active) while the primary still
        // sits on item 0 with no fragment revealed.
        let primary_fragment = primary.stream().get(1).unwrap().node();
        assert!(!primary.presentation().fragment_active(primary_fragment));
        let mirror_fragment = sync.mirror().stream().get(1).unwrap().node();
        assert!(sync.mirror().presentation().fragment_active(mirror_fragment));
    }
}
