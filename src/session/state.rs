use crate::mcp::protocol::JsonRpcRequest;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// One delivered response, addressable by a per-session monotonic id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub id: u64,
    pub payload: Value,
}

#[derive(Debug)]
pub struct Session {
    pub id: String,
    pending: VecDeque<JsonRpcRequest>,
    events: VecDeque<SessionEvent>,
    last_event_id: u64,
    created_at: Instant,
    last_activity: Instant,
    notify: Arc<Notify>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            id: id.into(),
            pending: VecDeque::new(),
            events: VecDeque::new(),
            last_event_id: 0,
            created_at: now,
            last_activity: now,
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn enqueue(&mut self, request: JsonRpcRequest) {
        self.pending.push_back(request);
    }

    pub fn dequeue(&mut self) -> Option<JsonRpcRequest> {
        self.pending.pop_front()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Appends to the outbox and wakes every poller. Returns the new event id.
    pub fn push_event(&mut self, payload: Value) -> u64 {
        self.last_event_id += 1;
        self.events.push_back(SessionEvent {
            id: self.last_event_id,
            payload,
        });
        self.notify.notify_waiters();
        self.last_event_id
    }

    /// Events newer than `cursor`. Everything at or below the cursor is
    /// acknowledged and dropped from the outbox.
    pub fn events_after(&mut self, cursor: u64) -> Vec<SessionEvent> {
        while self.events.front().is_some_and(|e| e.id <= cursor) {
            self.events.pop_front();
        }
        self.events.iter().cloned().collect()
    }

    pub fn last_event_id(&self) -> u64 {
        self.last_event_id
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }

    pub fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }
}
