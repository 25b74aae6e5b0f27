//! Audit event sinks.
//!
//! The registry publishes to a sink after a mutation is committed and never
//! waits on delivery. A sink error is logged by the registry and does not
//! undo the mutation.

use crate::types::RegistryEvent;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event channel closed")]
    Closed,

    #[error("event sink backend error: {0}")]
    Backend(String),
}

/// Append-only destination for registry events.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &RegistryEvent) -> Result<(), SinkError>;
}

/// Keeps every event in memory, in publication order.
#[derive(Clone, Default)]
pub struct MemoryEventSink {
    events: Arc<RwLock<Vec<RegistryEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.read().clone()
    }

    pub fn last(&self) -> Option<RegistryEvent> {
        self.events.read().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, event: &RegistryEvent) -> Result<(), SinkError> {
        self.events.write().push(event.clone());
        Ok(())
    }
}

/// Writes events as structured `tracing` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &RegistryEvent) -> Result<(), SinkError> {
        let payload =
            serde_json::to_string(event).map_err(|e| SinkError::Backend(e.to_string()))?;
        tracing::info!(
            target: "namereg::audit",
            event = event.kind(),
            name = event.name(),
            payload = %payload,
            "registry event"
        );
        Ok(())
    }
}

/// Forwards events to an unbounded tokio channel without blocking.
#[derive(Clone)]
pub struct ChannelEventSink {
    sender: UnboundedSender<RegistryEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, UnboundedReceiver<RegistryEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, event: &RegistryEvent) -> Result<(), SinkError> {
        self.sender
            .send(event.clone())
            .map_err(|_| SinkError::Closed)
    }
}

/// Publishes to several sinks; every sink is attempted even if one fails.
#[derive(Clone, Default)]
pub struct FanoutEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutEventSink {
    fn publish(&self, event: &RegistryEvent) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.publish(event) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str) -> RegistryEvent {
        RegistryEvent::ApplicationSignUp {
            name: name.into(),
            official: true,
        }
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn publish(&self, _event: &RegistryEvent) -> Result<(), SinkError> {
            Err(SinkError::Backend("unavailable".into()))
        }
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemoryEventSink::new();
        sink.publish(&signup("one")).unwrap();
        sink.publish(&signup("two")).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events()[0], signup("one"));
        assert_eq!(sink.last(), Some(signup("two")));
    }

    #[test]
    fn tracing_sink_accepts_events() {
        assert!(TracingEventSink.publish(&signup("hydro")).is_ok());
    }

    #[tokio::test]
    async fn channel_sink_delivers_and_reports_closed() {
        let (sink, mut receiver) = ChannelEventSink::new();
        sink.publish(&signup("hydro")).unwrap();
        assert_eq!(receiver.recv().await, Some(signup("hydro")));

        drop(receiver);
        assert!(matches!(
            sink.publish(&signup("hydro")),
            Err(SinkError::Closed)
        ));
    }

    #[test]
    fn fanout_reaches_every_sink_despite_failures() {
        let memory = MemoryEventSink::new();
        let fanout = FanoutEventSink::new()
            .with(Arc::new(FailingSink))
            .with(Arc::new(memory.clone()));

        assert!(fanout.publish(&signup("hydro")).is_err());
        assert_eq!(memory.events(), vec![signup("hydro")]);
    }
}
