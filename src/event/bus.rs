use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable occurrence in a run's history, ordered by creation sequence.
///
/// The core does not interpret `payload`; it only orders and counts events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Formatted `evt-{n}` from the owning bus's counter; id order equals
    /// temporal order.
    pub id: String,
    pub event_type: String,
    /// Emitting actor, e.g. `scheduler`, `orchestrator`, `team`.
    pub source: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Run-scoped event factory and sole id authority.
///
/// Each run constructs its own bus; the counter is owned by the instance,
/// not process-wide, so independent runs never collide.
#[derive(Debug)]
pub struct EventBus {
    next_seq: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self { next_seq: 1 }
    }

    pub fn emit(
        &mut self,
        event_type: impl Into<String>,
        source: impl Into<String>,
        payload: serde_json::Value,
    ) -> Event {
        let id = format!("evt-{}", self.next_seq);
        self.next_seq += 1;

        Event {
            id,
            event_type: event_type.into(),
            source: source.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Number of events this bus has issued.
    pub fn emitted_count(&self) -> u64 {
        self.next_seq - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_are_sequential_from_one() {
        let mut bus = EventBus::new();
        let first = bus.emit("run_started", "orchestrator", json!({}));
        let second = bus.emit("task_resolved", "scheduler", json!({"task_id": "t1"}));

        assert_eq!(first.id, "evt-1");
        assert_eq!(second.id, "evt-2");
        assert_eq!(bus.emitted_count(), 2);
    }

    #[test]
    fn test_event_carries_type_source_payload() {
        let mut bus = EventBus::new();
        let event = bus.emit("worker_heartbeat", "team", json!({"worker_id": "w-1"}));

        assert_eq!(event.event_type, "worker_heartbeat");
        assert_eq!(event.source, "team");
        assert_eq!(event.payload["worker_id"], "w-1");
    }

    #[test]
    fn test_independent_buses_do_not_share_counters() {
        let mut a = EventBus::new();
        let mut b = EventBus::new();
        a.emit("x", "team", json!({}));

        assert_eq!(b.emit("y", "team", json!({})).id, "evt-1");
    }
}
