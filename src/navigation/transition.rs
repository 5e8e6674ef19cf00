use crate::error::Result;
use crate::tree::{NodeId, TransitionPhase};

use super::NavigationStateMachine;

/// Direction key carried by a transition completion signal. Pairing the
/// signal with the slide's recorded phase keeps a stale completion from a
/// superseded transition away from the wrong lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionDirection {
    Enter,
    Exit,
}

impl NavigationStateMachine {
    /// Bridge a cooperative "transition finished" signal into the module
    /// lifecycle.
    ///
    /// An exiting slide finishing its exit is cleaned up; an entering slide
    /// finishing its entrance is stabilised. Every other combination (no
    /// transition in flight, a mismatched direction, a signal for a node
    /// that is not a slide) is ignored, since completion signals can also
    /// fire for unrelated visual properties. Navigation never blocks on
    /// these signals.
    pub fn transition_finished(
        &mut self,
        slide: NodeId,
        direction: TransitionDirection,
    ) -> Result<()> {
        match (self.presentation.transition(slide), direction) {
            (Some(TransitionPhase::Exiting), TransitionDirection::Exit) => {
                self.presentation.clear_transition(slide);
                self.modules.cleanup_slide(slide)?;
            }
            (Some(TransitionPhase::Entering), TransitionDirection::Enter) => {
                self.presentation.clear_transition(slide);
                self.modules.stabilise_slide(slide)?;
            }
            _ => {}
        }
        Ok(())
    }
}
