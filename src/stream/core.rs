use crate::tree::{NodeId, Presentation};

/// One addressable unit of the flattened deck: a slide itself (implicitly
/// item 0 of its own run) or one of its declared fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamItem {
    Slide(NodeId),
    Fragment(NodeId),
}

impl StreamItem {
    pub fn node(self) -> NodeId {
        match self {
            StreamItem::Slide(node) | StreamItem::Fragment(node) => node,
        }
    }

    pub fn is_fragment(self) -> bool {
        matches!(self, StreamItem::Fragment(_))
    }
}

/// The flattened slide+fragment sequence. Built once from the presentation
/// tree and never mutated; stream indices are the sole addressing scheme for
/// navigation.
#[derive(Debug, Clone)]
pub struct FragmentStream {
    items: Vec<StreamItem>,
}

impl FragmentStream {
    /// Interleave each slide followed by its own fragments, preserving
    /// document order across slides. An empty deck yields an empty stream.
    pub fn build(presentation: &Presentation) -> Self {
        let mut items = Vec::new();
        for &slide in presentation.slides() {
            items.push(StreamItem::Slide(slide));
            for fragment in presentation.descendant_fragments(slide) {
                items.push(StreamItem::Fragment(fragment));
            }
        }
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item: usize) -> Option<StreamItem> {
        self.items.get(item).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = StreamItem> + '_ {
        self.items.iter().copied()
    }
}
