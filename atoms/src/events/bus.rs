use tokio::sync::broadcast;
use super::model::ChangeEvent;

/// In-process fan-out of change events. Publishing with nobody listening is
/// fine; lagging receivers lose the oldest events.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn publish(&self, event: ChangeEvent) {
        tracing::debug!(
            "📣 change event: {:?} {} {:?} (receivers={})",
            event.entity,
            event.entity_id,
            event.change,
            self.sender.receiver_count()
        );
        let _ = self.sender.send(event);
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(64)
    }
}
