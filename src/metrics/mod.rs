use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Saturating counters accumulated while a deck is being driven.
#[derive(Debug, Default, Clone)]
pub struct DeckMetrics {
    navigations: u64,
    slide_changes: u64,
    sync_messages: u64,
    rescales: u64,
}

impl DeckMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_navigation(&mut self) {
        self.navigations = self.navigations.saturating_add(1);
    }

    pub fn record_slide_change(&mut self) {
        self.slide_changes = self.slide_changes.saturating_add(1);
    }

    pub fn record_sync_message(&mut self) {
        self.sync_messages = self.sync_messages.saturating_add(1);
    }

    pub fn record_rescale(&mut self) {
        self.rescales = self.rescales.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            navigations: self.navigations,
            slide_changes: self.slide_changes,
            sync_messages: self.sync_messages,
            rescales: self.rescales,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub navigations: u64,
    pub slide_changes: u64,
    pub sync_messages: u64,
    pub rescales: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(
            LogLevel::Info,
            target.to_string(),
            "deck_metrics".to_string(),
            self.as_fields(),
        )
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("navigations".to_string(), json!(self.navigations));
        map.insert("slide_changes".to_string(), json!(self.slide_changes));
        map.insert("sync_messages".to_string(), json!(self.sync_messages));
        map.insert("rescales".to_string(), json!(self.rescales));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_into_snapshot() {
        let mut metrics = DeckMetrics::new();
        metrics.record_navigation();
        metrics.record_navigation();
        metrics.record_slide_change();
        metrics.record_sync_message();

        let snapshot = metrics.snapshot(Duration::from_millis(1500));
        assert_eq!(snapshot.uptime_ms, 1500);
        assert_eq!(snapshot.navigations, 2);
        assert_eq!(snapshot.slide_changes, 1);
        assert_eq!(snapshot.sync_messages, 1);
        assert_eq!(snapshot.rescales, 0);
    }
}
