//! In-memory audit bus used by local deployments and tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::payloads::{AuditEvent, DEFAULT_HISTORY_CAPACITY};

/// Audit sink that keeps the most recent events in memory.
///
/// Once `capacity` events are held, each new event evicts the oldest.
#[derive(Clone)]
pub struct EventBus {
    history: Arc<Mutex<VecDeque<AuditEvent>>>,
    capacity: usize,
}

impl EventBus {
    /// Bus holding at most `capacity` events (minimum one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    /// Bus with [`DEFAULT_HISTORY_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Record `event`.
    pub fn publish(&self, event: AuditEvent) {
        let mut history = self.lock();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(event);
    }

    /// Held events, oldest first.
    #[must_use]
    pub fn recorded(&self) -> Vec<AuditEvent> {
        self.lock().iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<AuditEvent>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::{AuditEventKind, AuditStatus};

    fn event(kind: AuditEventKind) -> AuditEvent {
        AuditEvent::new(kind, AuditStatus::InProgress, "trace")
    }

    #[test]
    fn clones_share_one_history() {
        let bus = EventBus::new();
        let sink = bus.clone();
        sink.publish(event(AuditEventKind::AnalyzeFileStarted));
        sink.publish(event(AuditEventKind::AnalyzeFileCompleted));

        let kinds: Vec<_> = bus.recorded().into_iter().map(|e| e.event).collect();
        assert_eq!(
            kinds,
            vec![
                AuditEventKind::AnalyzeFileStarted,
                AuditEventKind::AnalyzeFileCompleted
            ]
        );
    }

    #[test]
    fn oldest_event_is_evicted_at_capacity() {
        let bus = EventBus::with_capacity(2);
        bus.publish(event(AuditEventKind::ApplicationStarted));
        bus.publish(event(AuditEventKind::TriggerJob));
        bus.publish(event(AuditEventKind::ApplicationCompleted));

        let kinds: Vec<_> = bus.recorded().into_iter().map(|e| e.event).collect();
        assert_eq!(
            kinds,
            vec![
                AuditEventKind::TriggerJob,
                AuditEventKind::ApplicationCompleted
            ]
        );
    }
}
