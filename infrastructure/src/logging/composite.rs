use agora_application::ports::event_publisher::{DebateNotification, EventPublisherPort};
use std::sync::Arc;

/// Forwards every notification to each inner publisher, in order
#[derive(Default)]
pub struct CompositeEventPublisher {
    publishers: Vec<Arc<dyn EventPublisherPort>>,
}

impl CompositeEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, publisher: Arc<dyn EventPublisherPort>) -> Self {
        self.publishers.push(publisher);
        self
    }

    pub fn len(&self) -> usize {
        self.publishers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publishers.is_empty()
    }
}

impl EventPublisherPort for CompositeEventPublisher {
    fn publish(&self, event: &DebateNotification) {
        for publisher in &self.publishers {
            publisher.publish(event);
        }
    }
}
