//! Structured events emitted by the reconciliation core.
//!
//! The [`Provider`][crate::provider::Provider] doesn't log through a global logger. It is handed
//! an [`EventSink`] when it is built and reports everything it does as [`Event`]s. The binary
//! uses [`TracingSink`], which forwards events to [`tracing`]; tests use [`MemorySink`] to assert
//! on what was emitted.

use std::fmt;
use std::sync::{Arc, Mutex};

/// `DynEventSink` is a type alias for an [`EventSink`] shared between the components that
/// report into it.
#[allow(clippy::module_name_repetitions)]
pub type DynEventSink = Arc<dyn EventSink + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Error,
}

/// A single structured event: a severity, a message and ordered key/value fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl Event {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn debug(message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    #[must_use]
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    /// The value of the first field named `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for (key, value) in &self.fields {
            write!(f, " {key}={value:?}")?;
        }
        Ok(())
    }
}

pub trait EventSink {
    fn emit(&self, event: Event);
}

/// Forwards events to the process-wide [`tracing`] subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        match event.severity {
            Severity::Debug => tracing::debug!("{event}"),
            Severity::Info => tracing::info!("{event}"),
            Severity::Error => tracing::error!("{event}"),
        }
    }
}

/// Keeps every emitted event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.severity == severity)
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order_and_fields() {
        let sink = MemorySink::default();
        sink.emit(Event::debug("planning").field("zone", "example.com"));
        sink.emit(Event::error("unable to get DNS records").field("zone", "example.org"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get("zone"), Some("example.com"));
        let errors = sink.with_severity(Severity::Error);
        assert_eq!(errors[0].message, "unable to get DNS records");
    }

    #[test]
    fn display_renders_fields() {
        let event = Event::info("got DNS records for domain").field("domain", "example.com");
        assert_eq!(
            event.to_string(),
            "got DNS records for domain domain=\"example.com\""
        );
    }
}
