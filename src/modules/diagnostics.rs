use serde_json::json;

use crate::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::{DeckModule, ModuleRegistry, SlideContext};

/// Capability that logs a slide's lifecycle phases for observability and
/// debugging. Doubles as the in-tree demonstration of the capability
/// contract: register it under a key, declare that key on the deck or a
/// slide, and every activate/stabilise/cleanup shows up in the log.
pub struct LifecycleLoggerModule {
    logger: Logger,
    level: LogLevel,
    slide_index: usize,
    slide_title: String,
    label: String,
}

impl LifecycleLoggerModule {
    pub fn new(logger: Logger, context: &SlideContext, label: impl Into<String>) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            slide_index: context.index,
            slide_title: context.title.clone(),
            label: label.into(),
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Register this capability on a registry under `name`. The declared
    /// configuration value becomes the log label for that slide.
    pub fn register(registry: &mut ModuleRegistry, name: impl Into<String>, logger: Logger) {
        registry.register_fn(name, move |context, value| {
            Ok(Box::new(LifecycleLoggerModule::new(
                logger.clone(),
                context,
                value,
            )) as Box<dyn DeckModule>)
        });
    }

    fn emit(&self, phase: &str) {
        let event = event_with_fields(
            self.level,
            "deck::modules.lifecycle",
            phase,
            [
                json_kv("slide", json!(self.slide_index)),
                json_kv("title", json!(self.slide_title.clone())),
                json_kv("label", json!(self.label.clone())),
            ],
        );
        let _ = self.logger.log_event(event);
    }
}

impl DeckModule for LifecycleLoggerModule {
    fn name(&self) -> &str {
        "diagnostics.lifecycle_logger"
    }

    fn activate(&mut self) -> Result<()> {
        self.emit("module_activated");
        Ok(())
    }

    fn stabilise(&mut self) -> Result<()> {
        self.emit("module_stabilised");
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        self.emit("module_cleaned_up");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::modules::ModuleLifecycleManager;
    use crate::tree::{Presentation, SlideBuilder};
    use std::sync::Arc;

    #[test]
    fn lifecycle_phases_reach_the_log() {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::new(sink.clone());

        let mut registry = ModuleRegistry::new();
        LifecycleLoggerModule::register(&mut registry, "trace", logger);

        let deck = Presentation::builder()
            .data("trace", "demo")
            .slide(SlideBuilder::titled("intro"))
            .build();
        let slide = deck.slides()[0];

        let mut manager = ModuleLifecycleManager::new(Arc::new(registry));
        manager.activate_slide(&deck, slide).unwrap();
        manager.stabilise_slide(slide).unwrap();
        manager.cleanup_slide(slide).unwrap();

        let messages: Vec<_> = sink
            .events()
            .into_iter()
            .map(|event| event.message)
            .collect();
        assert_eq!(
            messages,
            vec!["module_activated", "module_stabilised", "module_cleaned_up"]
        );
    }
}
