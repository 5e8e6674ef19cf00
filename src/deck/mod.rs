use std::sync::{Arc, Mutex};
use std::time::Instant;

use crossterm::event::KeyEvent;
use serde_json::{Value, json};

use crate::error::Result;
use crate::geometry::{Size, scale_factor};
use crate::host::HostEnvironment;
use crate::input::{KeyBindings, NavCommand, SwipeTracker};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::{DeckMetrics, MetricSnapshot};
use crate::modules::ModuleRegistry;
use crate::navigation::{NavOutcome, NavigationStateMachine, TransitionDirection};
use crate::stream::FragmentStream;
use crate::sync::{DualDisplaySync, SyncMessage};
use crate::tree::{NodeId, Presentation};

/// Optional engine surfaces. One machine type serves every embedding; a
/// minimal one (the mirror display, a kiosk build) simply switches
/// capabilities off instead of instantiating a different type.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub keyboard: bool,
    pub touch: bool,
    pub cross_window_sync: bool,
}

impl Capabilities {
    /// The full presenter surface: keys, swipes, and the detached window.
    pub fn full() -> Self {
        Self {
            keyboard: true,
            touch: true,
            cross_window_sync: true,
        }
    }

    /// No input surfaces at all; navigation happens through the API only.
    pub fn minimal() -> Self {
        Self {
            keyboard: false,
            touch: false,
            cross_window_sync: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

/// Configuration knobs for a deck.
#[derive(Clone)]
pub struct DeckConfig {
    pub capabilities: Capabilities,
    /// Optional structured logger used by the engine.
    pub logger: Option<Logger>,
    /// Metrics accumulator shared with the embedding.
    pub metrics: Option<Arc<Mutex<DeckMetrics>>>,
    /// Log target used when a metrics snapshot is emitted.
    pub metrics_target: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            logger: None,
            metrics: None,
            metrics_target: "deck::metrics".to_string(),
        }
    }
}

impl DeckConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(DeckMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<DeckMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Environment events delivered to the deck.
#[derive(Debug, Clone)]
pub enum DeckEvent {
    Key(KeyEvent),
    TouchStart { x: f64, y: f64 },
    TouchMove { x: f64, y: f64 },
    TouchEnd,
    Resize(Size),
    /// Cross-window traffic. The payload is untrusted: the deck validates
    /// the origin and discriminates by payload shape.
    Message { origin: String, payload: Value },
    TransitionEnded {
        slide: NodeId,
        direction: TransitionDirection,
    },
}

/// Control the propagation of an event to other handlers in the embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Notifications emitted synchronously once a navigation call has fully
/// applied its state changes. A slide change always precedes its item
/// change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckNotification {
    SlideChanged { slide: NodeId },
    ItemChanged { item: usize },
}

type Observer = Box<dyn FnMut(&DeckNotification)>;

/// The assembled presentation engine: the navigation machine composed with
/// input bindings, the host environment, the optional dual display, and the
/// ambient logging/metrics plumbing.
pub struct Deck<H: HostEnvironment> {
    machine: NavigationStateMachine,
    registry: Arc<ModuleRegistry>,
    host: H,
    config: DeckConfig,
    bindings: KeyBindings,
    swipe: SwipeTracker,
    dual: Option<DualDisplaySync>,
    observers: Vec<Observer>,
    started_at: Instant,
}

impl<H: HostEnvironment> Deck<H> {
    pub fn new(presentation: Presentation, registry: ModuleRegistry, host: H) -> Self {
        Self::with_config(presentation, registry, host, DeckConfig::default())
    }

    pub fn with_config(
        presentation: Presentation,
        registry: ModuleRegistry,
        host: H,
        config: DeckConfig,
    ) -> Self {
        let registry = Arc::new(registry);
        let machine = NavigationStateMachine::new(presentation, registry.clone());
        Self {
            machine,
            registry,
            host,
            config,
            bindings: KeyBindings::default(),
            swipe: SwipeTracker::new(),
            dual: None,
            observers: Vec::new(),
            started_at: Instant::now(),
        }
    }

    pub fn config_mut(&mut self) -> &mut DeckConfig {
        &mut self.config
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn machine(&self) -> &NavigationStateMachine {
        &self.machine
    }

    pub fn stream(&self) -> &FragmentStream {
        self.machine.stream()
    }

    pub fn current_item(&self) -> Option<usize> {
        self.machine.current_item()
    }

    pub fn current_slide(&self) -> Option<NodeId> {
        self.machine.current_slide()
    }

    pub fn is_dual_display(&self) -> bool {
        self.dual.is_some()
    }

    pub fn mirror_item(&self) -> Option<usize> {
        self.dual.as_ref().and_then(DualDisplaySync::mirror_item)
    }

    /// Register an observer for slide/item notifications.
    pub fn on_notification<F>(&mut self, observer: F)
    where
        F: FnMut(&DeckNotification) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Bring the deck up: scale to the viewport, then land on the deep-linked
    /// item if the address fragment matches `#<digits>`, else step onto item
    /// 0 via the implicit first `next_item`. Errs on an empty deck, which
    /// rejects all navigation.
    pub fn start(&mut self) -> Result<()> {
        self.started_at = Instant::now();
        self.rescale();
        self.log_deck_event(
            LogLevel::Info,
            "deck_started",
            [
                json_kv("items", json!(self.machine.stream().len())),
                json_kv("slides", json!(self.machine.presentation().slide_count())),
            ],
        );

        let deep_link = self
            .host
            .location_fragment()
            .as_deref()
            .and_then(parse_deep_link);
        let outcome = match deep_link {
            Some(item) => self.machine.activate_item(item)?,
            None => self.machine.next_item()?,
        };
        self.apply_outcome(outcome)
    }

    /// Dispatch one environment event. Input surfaces honour the configured
    /// capability set; events for disabled surfaces pass through untouched.
    pub fn handle_event(&mut self, event: DeckEvent) -> Result<EventFlow> {
        match event {
            DeckEvent::Key(key) if self.config.capabilities.keyboard => {
                match self.bindings.command_for(&key) {
                    Some(command) => {
                        self.run_command(command)?;
                        Ok(EventFlow::Consumed)
                    }
                    None => Ok(EventFlow::Continue),
                }
            }
            DeckEvent::TouchStart { x, y } if self.config.capabilities.touch => {
                self.swipe.touch_start(x, y);
                Ok(EventFlow::Continue)
            }
            DeckEvent::TouchMove { x, y } if self.config.capabilities.touch => {
                self.swipe.touch_move(x, y);
                Ok(EventFlow::Continue)
            }
            DeckEvent::TouchEnd if self.config.capabilities.touch => {
                match self.swipe.touch_end() {
                    Some(command) => {
                        self.run_command(command)?;
                        Ok(EventFlow::Consumed)
                    }
                    None => Ok(EventFlow::Continue),
                }
            }
            DeckEvent::Resize(size) => {
                self.apply_viewport(size);
                Ok(EventFlow::Consumed)
            }
            DeckEvent::Message { origin, payload }
                if self.config.capabilities.cross_window_sync =>
            {
                self.handle_message(origin, payload)
            }
            DeckEvent::TransitionEnded { slide, direction } => {
                self.machine.transition_finished(slide, direction)?;
                Ok(EventFlow::Consumed)
            }
            _ => Ok(EventFlow::Continue),
        }
    }

    pub fn run_command(&mut self, command: NavCommand) -> Result<()> {
        match command {
            NavCommand::NextItem => self.next_item(),
            NavCommand::PreviousItem => self.previous_item(),
            NavCommand::ToggleDualDisplay => self.toggle_dual_display(),
            NavCommand::ToggleFullscreen => {
                self.toggle_fullscreen();
                Ok(())
            }
        }
    }

    pub fn activate_item(&mut self, item: usize) -> Result<()> {
        let outcome = self.machine.activate_item(item)?;
        self.apply_outcome(outcome)
    }

    pub fn next_item(&mut self) -> Result<()> {
        let outcome = self.machine.next_item()?;
        self.apply_outcome(outcome)
    }

    pub fn previous_item(&mut self) -> Result<()> {
        let outcome = self.machine.previous_item()?;
        self.apply_outcome(outcome)
    }

    /// Enable or tear down the secondary presenter display.
    pub fn toggle_dual_display(&mut self) -> Result<()> {
        if let Some(dual) = self.dual.take() {
            dual.disable(&mut self.host)?;
            self.log_deck_event(LogLevel::Info, "dual_display_disabled", std::iter::empty());
            return Ok(());
        }

        let open_window = self.config.capabilities.cross_window_sync;
        let mut dual = DualDisplaySync::enable(
            self.machine.presentation(),
            self.registry.clone(),
            &mut self.host,
            open_window,
        )?;
        // Catch the mirror up immediately so it is offset by one from the
        // moment the mode is enabled.
        if let Some(item) = self.machine.current_item() {
            if dual.sync(item, &mut self.host)? {
                self.record_sync_metric();
            }
        }
        self.log_deck_event(
            LogLevel::Info,
            "dual_display_enabled",
            [json_kv("detached_window", json!(dual.has_detached_window()))],
        );
        self.dual = Some(dual);
        Ok(())
    }

    pub fn toggle_fullscreen(&mut self) {
        let fullscreen = self.host.is_fullscreen();
        self.host.set_fullscreen(!fullscreen);
    }

    /// Recompute the uniform scale from the host's current viewport.
    pub fn rescale(&mut self) {
        let size = self.host.viewport_size();
        self.apply_viewport(size);
    }

    /// Snapshot the metrics counters, if metrics are enabled.
    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let metrics = self.config.metrics.as_ref()?;
        let guard = metrics.lock().ok()?;
        Some(guard.snapshot(self.started_at.elapsed()))
    }

    /// Write the current metrics snapshot to the configured logger.
    pub fn emit_metrics(&self) {
        if let (Some(logger), Some(snapshot)) =
            (self.config.logger.as_ref(), self.metrics_snapshot())
        {
            let _ = logger.log_event(snapshot.to_log_event(&self.config.metrics_target));
        }
    }

    fn handle_message(&mut self, origin: String, payload: Value) -> Result<EventFlow> {
        if origin != self.host.origin() {
            self.log_deck_event(
                LogLevel::Debug,
                "message_dropped",
                [json_kv("reason", json!("foreign_origin"))],
            );
            return Ok(EventFlow::Continue);
        }
        match serde_json::from_value::<SyncMessage>(payload) {
            Ok(SyncMessage { item }) => {
                self.activate_item(item)?;
                Ok(EventFlow::Consumed)
            }
            // Not our payload shape; other message traffic shares the
            // channel.
            Err(_) => Ok(EventFlow::Continue),
        }
    }

    fn apply_outcome(&mut self, outcome: NavOutcome) -> Result<()> {
        if outcome.is_noop() {
            return Ok(());
        }

        if let Some(slide) = outcome.slide_changed {
            self.notify(DeckNotification::SlideChanged { slide });
            self.record_slide_change_metric();
            self.log_deck_event(
                LogLevel::Debug,
                "slide_changed",
                [json_kv("slide", json!(slide.index()))],
            );
        }

        if let Some(item) = outcome.item_changed {
            self.notify(DeckNotification::ItemChanged { item });
            self.host.set_location_fragment(&format!("#{item}"));
            self.sync_aux(item)?;
            self.record_navigation_metric();
            self.log_deck_event(
                LogLevel::Debug,
                "item_changed",
                [json_kv("item", json!(item))],
            );
        }

        Ok(())
    }

    fn sync_aux(&mut self, item: usize) -> Result<()> {
        if let Some(dual) = self.dual.as_mut() {
            if dual.sync(item, &mut self.host)? {
                self.record_sync_metric();
            }
        }
        Ok(())
    }

    fn notify(&mut self, notification: DeckNotification) {
        for observer in &mut self.observers {
            observer(&notification);
        }
    }

    fn apply_viewport(&mut self, size: Size) {
        let scale = scale_factor(size);
        self.host.apply_scale(scale);
        self.record_rescale_metric();
        self.log_deck_event(
            LogLevel::Debug,
            "rescaled",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
                json_kv("scale", json!(scale)),
            ],
        );
    }

    fn log_deck_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, "deck::navigation", message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn record_navigation_metric(&mut self) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_navigation();
            }
        }
    }

    fn record_slide_change_metric(&mut self) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_slide_change();
            }
        }
    }

    fn record_sync_metric(&mut self) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_sync_message();
            }
        }
    }

    fn record_rescale_metric(&mut self) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_rescale();
            }
        }
    }
}

/// Parse a `#<digits>` deep link. Anything else means "no deep link".
fn parse_deep_link(fragment: &str) -> Option<usize> {
    let digits = fragment.strip_prefix('#')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
