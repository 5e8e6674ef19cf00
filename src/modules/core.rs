use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::Result;
use crate::tree::{NodeId, Presentation};

/// Per-slide capability contract. Every phase is optional: the default
/// implementations are no-ops, so a capability only implements the phases it
/// cares about.
///
/// - `activate` runs the moment the owning slide becomes current.
/// - `stabilise` runs when the entering transition animation finishes.
/// - `cleanup` runs when the exiting transition finishes, or early when the
///   slide is re-entered before its exit animation completed.
pub trait DeckModule: Send {
    fn name(&self) -> &str {
        "deck_module"
    }

    fn activate(&mut self) -> Result<()> {
        Ok(())
    }

    fn stabilise(&mut self) -> Result<()> {
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Slide handle passed to capability factories alongside the configuration
/// value. Owned data so factories can stash it without borrowing the tree.
#[derive(Debug, Clone)]
pub struct SlideContext {
    pub slide: NodeId,
    pub index: usize,
    pub title: String,
    pub dataset: HashMap<String, String>,
}

/// Factory responsible for creating a fresh capability instance for one
/// `(slide, configuration value)` pair. Errors are not caught by the engine;
/// they propagate to the caller of the enclosing lifecycle operation.
pub type ModuleFactory =
    Arc<dyn Fn(&SlideContext, &str) -> Result<Box<dyn DeckModule>> + Send + Sync>;

/// Typed capability registry: name to factory, resolved once per slide
/// activation cycle. Ordered so instantiation order is deterministic.
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    factories: BTreeMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: ModuleFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&SlideContext, &str) -> Result<Box<dyn DeckModule>> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(factory));
    }

    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn entries(&self) -> impl Iterator<Item = (&str, &ModuleFactory)> {
        self.factories
            .iter()
            .map(|(name, factory)| (name.as_str(), factory))
    }
}

/// Drives per-slide capability instances through their lifecycle phases.
///
/// Instances are created lazily, immediately before a slide is first
/// activated, and discarded after `cleanup`; a deactivate/reactivate cycle
/// always sees fresh instances, never reused ones.
pub struct ModuleLifecycleManager {
    registry: Arc<ModuleRegistry>,
    instances: HashMap<NodeId, Vec<Box<dyn DeckModule>>>,
}

impl ModuleLifecycleManager {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self {
            registry,
            instances: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn has_instances(&self, slide: NodeId) -> bool {
        self.instances.contains_key(&slide)
    }

    pub fn instance_count(&self, slide: NodeId) -> usize {
        self.instances.get(&slide).map(Vec::len).unwrap_or(0)
    }

    /// Ensure instances exist for the slide, then run their `activate` phase.
    pub fn activate_slide(&mut self, presentation: &Presentation, slide: NodeId) -> Result<()> {
        if !self.instances.contains_key(&slide) {
            let built = self.build_instances(presentation, slide)?;
            self.instances.insert(slide, built);
        }
        if let Some(modules) = self.instances.get_mut(&slide) {
            for module in modules {
                module.activate()?;
            }
        }
        Ok(())
    }

    pub fn stabilise_slide(&mut self, slide: NodeId) -> Result<()> {
        if let Some(modules) = self.instances.get_mut(&slide) {
            for module in modules {
                module.stabilise()?;
            }
        }
        Ok(())
    }

    /// Run `cleanup` on the slide's instances and discard the set. The next
    /// activation builds fresh instances from the registry.
    pub fn cleanup_slide(&mut self, slide: NodeId) -> Result<()> {
        if let Some(mut modules) = self.instances.remove(&slide) {
            for module in &mut modules {
                module.cleanup()?;
            }
        }
        Ok(())
    }

    /// Clean up every slide with live instances. Used when an entire deck
    /// (typically the mirror display) is being torn down.
    pub fn dispose(&mut self) -> Result<()> {
        let slides: Vec<NodeId> = self.instances.keys().copied().collect();
        for slide in slides {
            self.cleanup_slide(slide)?;
        }
        Ok(())
    }

    fn build_instances(
        &self,
        presentation: &Presentation,
        slide: NodeId,
    ) -> Result<Vec<Box<dyn DeckModule>>> {
        let context = SlideContext {
            slide,
            index: presentation
                .slides()
                .iter()
                .position(|&s| s == slide)
                .unwrap_or(0),
            title: presentation.text(slide).to_string(),
            dataset: presentation.slide_dataset(slide).clone(),
        };

        let mut built = Vec::new();
        for (name, factory) in self.registry.entries() {
            if let Some(value) = presentation.config_value(slide, name) {
                built.push(factory(&context, value)?);
            }
        }
        Ok(built)
    }
}
