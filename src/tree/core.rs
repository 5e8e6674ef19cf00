use std::collections::HashMap;

/// Index of a node in the presentation arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Structural role of a node in the visual tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Slide,
    Content,
}

/// Direction of an in-flight slide transition animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Entering,
    Exiting,
}

/// Lifecycle state of a slide as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideState {
    Pending,
    Current,
    TransitioningIn,
    TransitioningOut,
}

/// One node of the visual tree. Slides are the direct children of the root;
/// fragments are content nodes carrying the structural fragment marker.
#[derive(Debug, Clone)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
    text: String,
    dataset: HashMap<String, String>,
    fragment: bool,
    active: bool,
    current: bool,
    transition: Option<TransitionPhase>,
}

impl Node {
    fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            kind,
            text: String::new(),
            dataset: HashMap::new(),
            fragment: false,
            active: false,
            current: false,
            transition: None,
        }
    }
}

/// The deck's visual tree: an arena of nodes plus the ordered slide list and
/// the presentation-level dataset on the root. The structure is fixed at
/// construction; navigation only flips per-node state flags.
#[derive(Debug, Clone)]
pub struct Presentation {
    nodes: Vec<Node>,
    root: NodeId,
    slides: Vec<NodeId>,
}

impl Presentation {
    pub fn builder() -> PresentationBuilder {
        PresentationBuilder::new()
    }

    pub fn slides(&self) -> &[NodeId] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Presentation-level dataset, inherited by slides unless overridden.
    pub fn dataset(&self) -> &HashMap<String, String> {
        &self.nodes[self.root.0].dataset
    }

    pub fn node_kind(&self, node: NodeId) -> NodeKind {
        self.nodes[node.0].kind
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    pub fn slide_dataset(&self, slide: NodeId) -> &HashMap<String, String> {
        &self.nodes[slide.0].dataset
    }

    /// Configuration value for a capability key: slide-level override first,
    /// else presentation-level default. Empty values count as absent.
    pub fn config_value(&self, slide: NodeId, key: &str) -> Option<&str> {
        self.nodes[slide.0]
            .dataset
            .get(key)
            .or_else(|| self.dataset().get(key))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Nearest slide at or above `node` in the structural ancestry.
    pub fn owning_slide(&self, node: NodeId) -> Option<NodeId> {
        let mut cursor = node;
        loop {
            let entry = &self.nodes[cursor.0];
            match entry.kind {
                NodeKind::Slide => return Some(cursor),
                _ => cursor = entry.parent?,
            }
        }
    }

    /// All fragment descendants of a slide in document (pre-order) order.
    pub fn descendant_fragments(&self, slide: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_fragments(slide, &mut found);
        found
    }

    fn collect_fragments(&self, node: NodeId, found: &mut Vec<NodeId>) {
        for &child in &self.nodes[node.0].children {
            if self.nodes[child.0].fragment {
                found.push(child);
            }
            self.collect_fragments(child, found);
        }
    }

    pub fn is_fragment(&self, node: NodeId) -> bool {
        self.nodes[node.0].fragment
    }

    pub fn fragment_active(&self, node: NodeId) -> bool {
        self.nodes[node.0].active
    }

    pub fn set_fragment_active(&mut self, node: NodeId, active: bool) {
        self.nodes[node.0].active = active;
    }

    pub fn is_current(&self, slide: NodeId) -> bool {
        self.nodes[slide.0].current
    }

    pub fn transition(&self, slide: NodeId) -> Option<TransitionPhase> {
        self.nodes[slide.0].transition
    }

    /// Mark a slide current and entering. Callers are responsible for having
    /// deactivated the previous current slide first.
    pub fn mark_current(&mut self, slide: NodeId) {
        let node = &mut self.nodes[slide.0];
        node.current = true;
        node.transition = Some(TransitionPhase::Entering);
    }

    /// Begin the exit transition for a slide, if it was current.
    pub fn mark_exiting(&mut self, slide: NodeId) {
        let node = &mut self.nodes[slide.0];
        if node.current {
            node.current = false;
            node.transition = Some(TransitionPhase::Exiting);
        }
    }

    pub fn clear_transition(&mut self, slide: NodeId) {
        self.nodes[slide.0].transition = None;
    }

    pub fn slide_state(&self, slide: NodeId) -> SlideState {
        let node = &self.nodes[slide.0];
        match (node.current, node.transition) {
            (_, Some(TransitionPhase::Exiting)) => SlideState::TransitioningOut,
            (true, Some(TransitionPhase::Entering)) => SlideState::TransitioningIn,
            (true, None) => SlideState::Current,
            (false, _) => SlideState::Pending,
        }
    }

    /// Deep copy of the markup with all navigation state reset, as if no
    /// navigation had ever touched it. Used to seed the mirror display.
    pub fn pristine_clone(&self) -> Presentation {
        let mut clone = self.clone();
        for node in &mut clone.nodes {
            node.active = false;
            node.current = false;
            node.transition = None;
        }
        clone
    }

    /// Append one more slide to the tree. Only the mirror display uses this,
    /// before its own navigation machine is constructed.
    pub(crate) fn append_slide(&mut self, slide: SlideBuilder) {
        let root = self.root;
        let id = slide.attach(self, root);
        self.slides.push(id);
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = node.parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes.push(node);
        id
    }
}

/// Builder for a full presentation tree.
#[derive(Default)]
pub struct PresentationBuilder {
    dataset: Vec<(String, String)>,
    slides: Vec<SlideBuilder>,
}

impl PresentationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presentation-level configuration entry.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dataset.push((key.into(), value.into()));
        self
    }

    pub fn slide(mut self, slide: SlideBuilder) -> Self {
        self.slides.push(slide);
        self
    }

    pub fn build(self) -> Presentation {
        let mut root = Node::new(NodeKind::Root, None);
        root.dataset = self.dataset.into_iter().collect();

        let mut presentation = Presentation {
            nodes: vec![root],
            root: NodeId(0),
            slides: Vec::new(),
        };

        let root = presentation.root;
        for slide in self.slides {
            let id = slide.attach(&mut presentation, root);
            presentation.slides.push(id);
        }

        presentation
    }
}

/// Builder for one slide and its content nodes.
#[derive(Default)]
pub struct SlideBuilder {
    title: String,
    dataset: Vec<(String, String)>,
    content: Vec<ContentSpec>,
}

impl SlideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Slide-level configuration entry, overriding the presentation default.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dataset.push((key.into(), value.into()));
        self
    }

    /// Plain content node, always visible.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content.push(ContentSpec::text(text));
        self
    }

    /// Content node marked for incremental reveal.
    pub fn fragment(mut self, text: impl Into<String>) -> Self {
        self.content.push(ContentSpec::fragment(text));
        self
    }

    pub fn content(mut self, spec: ContentSpec) -> Self {
        self.content.push(spec);
        self
    }

    fn attach(self, presentation: &mut Presentation, root: NodeId) -> NodeId {
        let mut node = Node::new(NodeKind::Slide, Some(root));
        node.text = self.title;
        node.dataset = self.dataset.into_iter().collect();
        let slide = presentation.push_node(node);
        for spec in self.content {
            spec.attach(presentation, slide);
        }
        slide
    }
}

/// Arbitrarily nested content markup; fragments may sit below non-fragment
/// wrappers, which is what exercises the ancestry walk.
pub struct ContentSpec {
    text: String,
    fragment: bool,
    children: Vec<ContentSpec>,
}

impl ContentSpec {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fragment: false,
            children: Vec::new(),
        }
    }

    pub fn fragment(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fragment: true,
            children: Vec::new(),
        }
    }

    pub fn child(mut self, child: ContentSpec) -> Self {
        self.children.push(child);
        self
    }

    fn attach(self, presentation: &mut Presentation, parent: NodeId) {
        let mut node = Node::new(NodeKind::Content, Some(parent));
        node.text = self.text;
        node.fragment = self.fragment;
        let id = presentation.push_node(node);
        for child in self.children {
            child.attach(presentation, id);
        }
    }
}
