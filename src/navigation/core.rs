use std::sync::Arc;

use crate::error::{DeckError, Result};
use crate::modules::{ModuleLifecycleManager, ModuleRegistry};
use crate::stream::{FragmentStream, StreamItem};
use crate::tree::{NodeId, Presentation, TransitionPhase};

/// What one navigation call changed. Produced only after every state
/// mutation for the call has been applied, so whoever turns this into
/// notifications never observes partial state. The slide notification, when
/// present, precedes the item notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavOutcome {
    pub slide_changed: Option<NodeId>,
    pub item_changed: Option<usize>,
}

impl NavOutcome {
    pub fn is_noop(&self) -> bool {
        self.slide_changed.is_none() && self.item_changed.is_none()
    }
}

/// The engine core: owns the visual tree, its flattened stream, and the
/// per-slide module lifecycle, and mediates every state change.
pub struct NavigationStateMachine {
    pub(super) presentation: Presentation,
    pub(super) stream: FragmentStream,
    pub(super) modules: ModuleLifecycleManager,
    pub(super) current_item: Option<usize>,
    pub(super) current_slide: Option<NodeId>,
}

impl NavigationStateMachine {
    pub fn new(presentation: Presentation, registry: Arc<ModuleRegistry>) -> Self {
        let stream = FragmentStream::build(&presentation);
        Self {
            presentation,
            stream,
            modules: ModuleLifecycleManager::new(registry),
            current_item: None,
            current_slide: None,
        }
    }

    pub fn current_item(&self) -> Option<usize> {
        self.current_item
    }

    pub fn current_slide(&self) -> Option<NodeId> {
        self.current_slide
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn stream(&self) -> &FragmentStream {
        &self.stream
    }

    pub fn modules(&self) -> &ModuleLifecycleManager {
        &self.modules
    }

    /// Jump to an arbitrary stream item.
    ///
    /// Fragment activation is applied as a single contiguous sweep: moving
    /// forward activates the fragments between the old and new item in
    /// increasing order, moving backward deactivates the fragments between
    /// the new and old item in decreasing order, and the first activation
    /// sets the whole prefix active and the suffix inactive in one pass.
    /// If the owning slide differs from the current slide, the slide
    /// transition runs before the outcome is produced.
    pub fn activate_item(&mut self, item: usize) -> Result<NavOutcome> {
        let length = self.stream.len();
        let entry = self
            .stream
            .get(item)
            .ok_or(DeckError::IndexOutOfRange {
                requested: item,
                length,
            })?;
        if self.current_item == Some(item) {
            return Ok(NavOutcome::default());
        }
        let item_slide = self
            .presentation
            .owning_slide(entry.node())
            .ok_or(DeckError::NotASlide(entry.node().index()))?;

        match self.current_item {
            Some(previous) if previous < item => self.sweep_activate(previous + 1, item),
            Some(previous) => self.sweep_deactivate(item + 1, previous),
            None => {
                self.sweep_activate(0, item);
                if item + 1 < length {
                    self.sweep_deactivate(item + 1, length - 1);
                }
            }
        }
        self.current_item = Some(item);

        let mut outcome = NavOutcome {
            slide_changed: None,
            item_changed: Some(item),
        };
        if self.current_slide != Some(item_slide) {
            self.activate_slide(item_slide)?;
            outcome.slide_changed = Some(item_slide);
        }
        Ok(outcome)
    }

    /// Step forward one item, clamped to the end of the stream. A no-op at
    /// the boundary; an error on an empty deck.
    pub fn next_item(&mut self) -> Result<NavOutcome> {
        let length = self.stream.len();
        if length == 0 {
            return Err(DeckError::IndexOutOfRange {
                requested: 0,
                length: 0,
            });
        }
        let target = match self.current_item {
            Some(current) => (current + 1).min(length - 1),
            None => 0,
        };
        if self.current_item == Some(target) {
            return Ok(NavOutcome::default());
        }
        self.activate_item(target)
    }

    /// Step backward one item, clamped to the start of the stream.
    pub fn previous_item(&mut self) -> Result<NavOutcome> {
        if self.stream.is_empty() {
            return Err(DeckError::IndexOutOfRange {
                requested: 0,
                length: 0,
            });
        }
        let target = match self.current_item {
            Some(current) => current.saturating_sub(1),
            None => 0,
        };
        if self.current_item == Some(target) {
            return Ok(NavOutcome::default());
        }
        self.activate_item(target)
    }

    /// Run pending cleanups for every slide with live module instances.
    /// Called when a deck (typically the mirror display) is torn down.
    pub fn dispose(&mut self) -> Result<()> {
        self.modules.dispose()
    }

    fn sweep_activate(&mut self, from: usize, to: usize) {
        for index in from..=to {
            if let Some(StreamItem::Fragment(node)) = self.stream.get(index) {
                self.presentation.set_fragment_active(node, true);
            }
        }
    }

    fn sweep_deactivate(&mut self, from: usize, to: usize) {
        for index in (from..=to).rev() {
            if let Some(StreamItem::Fragment(node)) = self.stream.get(index) {
                self.presentation.set_fragment_active(node, false);
            }
        }
    }

    fn activate_slide(&mut self, slide: NodeId) -> Result<()> {
        // Re-entered while still animating out: run the pending cleanup now
        // so no stale module instances survive the slide's second use.
        if self.presentation.transition(slide) == Some(TransitionPhase::Exiting) {
            self.presentation.clear_transition(slide);
            self.modules.cleanup_slide(slide)?;
        }
        if let Some(previous) = self.current_slide.take() {
            self.presentation.mark_exiting(previous);
        }
        self.modules.activate_slide(&self.presentation, slide)?;
        self.presentation.mark_current(slide);
        self.current_slide = Some(slide);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::DeckModule;
    use crate::navigation::TransitionDirection;
    use crate::tree::{SlideBuilder, SlideState};
    use std::sync::Mutex;

    fn empty_registry() -> Arc<ModuleRegistry> {
        Arc::new(ModuleRegistry::new())
    }

    /// Slide A with two fragments, slide B with none.
    /// Stream: [A, A.frag1, A.frag2, B].
    fn two_slide_machine() -> NavigationStateMachine {
        let deck = Presentation::builder()
            .slide(SlideBuilder::titled("A").fragment("a1").fragment("a2"))
            .slide(SlideBuilder::titled("B"))
            .build();
        NavigationStateMachine::new(deck, empty_registry())
    }

    fn active_flags(machine: &NavigationStateMachine) -> Vec<bool> {
        machine
            .stream()
            .iter()
            .filter(|item| item.is_fragment())
            .map(|item| machine.presentation().fragment_active(item.node()))
            .collect()
    }

    #[test]
    fn prefix_of_fragments_is_active_after_any_jump() {
        let machine = two_slide_machine();
        let length = machine.stream().len();
        for target in 0..length {
            let mut fresh = two_slide_machine();
            fresh.activate_item(target).unwrap();
            for index in 0..length {
                if let Some(StreamItem::Fragment(node)) = fresh.stream().get(index) {
                    assert_eq!(
                        fresh.presentation().fragment_active(node),
                        index <= target,
                        "fragment at {index} after activate_item({target})"
                    );
                }
            }
        }
    }

    #[test]
    fn activate_item_is_idempotent() {
        let mut machine = two_slide_machine();
        let first = machine.activate_item(1).unwrap();
        assert!(first.item_changed.is_some());
        let second = machine.activate_item(1).unwrap();
        assert!(second.is_noop());
    }

    #[test]
    fn boundary_steps_are_noops() {
        let mut machine = two_slide_machine();
        machine.activate_item(3).unwrap();
        assert!(machine.next_item().unwrap().is_noop());
        assert_eq!(machine.current_item(), Some(3));

        machine.activate_item(0).unwrap();
        assert!(machine.previous_item().unwrap().is_noop());
        assert_eq!(machine.current_item(), Some(0));
    }

    #[test]
    fn first_next_lands_on_item_zero() {
        let mut machine = two_slide_machine();
        let outcome = machine.next_item().unwrap();
        assert_eq!(outcome.item_changed, Some(0));
        assert_eq!(
            outcome.slide_changed,
            Some(machine.presentation().slides()[0])
        );
    }

    #[test]
    fn out_of_range_activation_fails() {
        let mut machine = two_slide_machine();
        let err = machine.activate_item(4).unwrap_err();
        match err {
            DeckError::IndexOutOfRange { requested, length } => {
                assert_eq!(requested, 4);
                assert_eq!(length, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_deck_rejects_all_navigation() {
        let deck = Presentation::builder().build();
        let mut machine = NavigationStateMachine::new(deck, empty_registry());
        assert!(matches!(
            machine.next_item(),
            Err(DeckError::IndexOutOfRange { length: 0, .. })
        ));
        assert!(matches!(
            machine.previous_item(),
            Err(DeckError::IndexOutOfRange { length: 0, .. })
        ));
        assert!(matches!(
            machine.activate_item(0),
            Err(DeckError::IndexOutOfRange { length: 0, .. })
        ));
    }

    #[test]
    fn crossing_a_slide_boundary_keeps_previous_fragments_active() {
        let mut machine = two_slide_machine();
        machine.activate_item(2).unwrap();
        assert_eq!(active_flags(&machine), vec![true, true]);
        assert_eq!(
            machine.current_slide(),
            Some(machine.presentation().slides()[0])
        );

        let outcome = machine.activate_item(3).unwrap();
        // One slide change, one item change, and fragment deactivation is
        // scoped strictly by stream index: A's fragments stay active.
        assert_eq!(
            outcome.slide_changed,
            Some(machine.presentation().slides()[1])
        );
        assert_eq!(outcome.item_changed, Some(3));
        assert_eq!(active_flags(&machine), vec![true, true]);
    }

    #[test]
    fn backward_jump_deactivates_only_the_crossed_range() {
        let mut machine = two_slide_machine();
        machine.activate_item(3).unwrap();
        machine.activate_item(0).unwrap();
        assert_eq!(active_flags(&machine), vec![false, false]);
        assert_eq!(
            machine.current_slide(),
            Some(machine.presentation().slides()[0])
        );
    }

    #[test]
    fn staying_within_a_slide_changes_no_slide() {
        let mut machine = two_slide_machine();
        machine.activate_item(0).unwrap();
        let outcome = machine.activate_item(2).unwrap();
        assert_eq!(outcome.slide_changed, None);
        assert_eq!(outcome.item_changed, Some(2));
    }

    #[test]
    fn slide_transition_states_track_navigation() {
        let mut machine = two_slide_machine();
        let slide_a = machine.presentation().slides()[0];
        let slide_b = machine.presentation().slides()[1];

        machine.activate_item(0).unwrap();
        assert_eq!(
            machine.presentation().slide_state(slide_a),
            SlideState::TransitioningIn
        );

        machine.activate_item(3).unwrap();
        assert_eq!(
            machine.presentation().slide_state(slide_a),
            SlideState::TransitioningOut
        );
        assert_eq!(
            machine.presentation().slide_state(slide_b),
            SlideState::TransitioningIn
        );
    }

    struct CountingModule {
        state: Arc<Mutex<Vec<&'static str>>>,
    }

    impl DeckModule for CountingModule {
        fn activate(&mut self) -> Result<()> {
            self.state.lock().unwrap().push("activate");
            Ok(())
        }

        fn cleanup(&mut self) -> Result<()> {
            self.state.lock().unwrap().push("cleanup");
            Ok(())
        }
    }

    fn counting_machine(state: Arc<Mutex<Vec<&'static str>>>) -> NavigationStateMachine {
        let mut registry = ModuleRegistry::new();
        let factory_state = state.clone();
        registry.register_fn("count", move |_context, _value| {
            factory_state.lock().unwrap().push("construct");
            Ok(Box::new(CountingModule {
                state: factory_state.clone(),
            }) as Box<dyn DeckModule>)
        });
        let deck = Presentation::builder()
            .slide(SlideBuilder::titled("A").data("count", "on"))
            .slide(SlideBuilder::titled("B"))
            .build();
        NavigationStateMachine::new(deck, Arc::new(registry))
    }

    #[test]
    fn reentry_before_transition_end_forces_cleanup_and_rebuild() {
        let state = Arc::new(Mutex::new(Vec::new()));
        let mut machine = counting_machine(state.clone());

        machine.activate_item(0).unwrap();
        machine.activate_item(1).unwrap();
        // Slide A is still transitioning out; going straight back must run
        // its pending cleanup before fresh instances are built.
        machine.activate_item(0).unwrap();

        assert_eq!(
            *state.lock().unwrap(),
            vec!["construct", "activate", "cleanup", "construct", "activate"]
        );
    }

    #[test]
    fn completed_exit_then_reactivation_also_rebuilds() {
        let state = Arc::new(Mutex::new(Vec::new()));
        let mut machine = counting_machine(state.clone());
        let slide_a = machine.presentation().slides()[0];

        machine.activate_item(0).unwrap();
        machine.activate_item(1).unwrap();
        machine
            .transition_finished(slide_a, TransitionDirection::Exit)
            .unwrap();
        machine.activate_item(0).unwrap();

        assert_eq!(
            *state.lock().unwrap(),
            vec!["construct", "activate", "cleanup", "construct", "activate"]
        );
    }
}
