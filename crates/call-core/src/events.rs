//! Event types and handler traits
//!
//! Two directions of events cross this crate:
//!
//! - **Inbound** push events from the signaling backend, delivered through
//!   [`SignalingEventHandler`] and [`RecordingEventHandler`]. The orchestrator
//!   implements both; backends call them.
//! - **Outbound** [`CallEvent`]s broadcast to UI code that wants to react to
//!   session changes instead of polling
//!   [`snapshot()`](crate::CallOrchestrator::snapshot).
//!
//! # Delivery Rules for Backends
//!
//! Handlers may wait for an in-flight gateway operation to settle before they
//! apply their transition. A backend must therefore invoke handlers from its
//! own task and never await a handler from inside `start_call`, `accept_call`
//! or `fetch_call_token`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::call::{CallHandle, CallStatus};

/// Call lifecycle notifications pushed by the signaling backend
#[async_trait]
pub trait SignalingEventHandler: Send + Sync {
    /// A remote party offered a call to the local user
    async fn on_incoming_call_received(&self, handle: CallHandle);

    /// The remote party accepted a call created by the local user
    async fn on_outgoing_call_accepted(&self, handle: CallHandle);

    /// The remote party rejected a call created by the local user
    async fn on_outgoing_call_rejected(&self);

    /// The remote party withdrew a call offered to the local user
    async fn on_incoming_call_cancelled(&self);

    /// The call ended, for any reason
    async fn on_call_ended(&self);
}

/// Recording notifications pushed by the signaling backend for one call
#[async_trait]
pub trait RecordingEventHandler: Send + Sync {
    async fn on_started(&self);

    async fn on_stopped(&self);

    async fn on_ended(&self);

    async fn on_timeout(&self);
}

/// Event priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventPriority {
    /// Routine status updates
    Low,
    /// State changes
    Normal,
    /// Incoming calls and failures
    High,
}

/// Session events broadcast to subscribers
#[derive(Debug, Clone)]
pub enum CallEvent {
    /// The session status changed
    StatusChanged {
        previous: CallStatus,
        current: CallStatus,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// The backend reported recording started or stopped
    RecordingChanged {
        recording: bool,
        timestamp: DateTime<Utc>,
    },
    /// An operation failed and the error was recorded on the session
    Error {
        error: crate::CallError,
        priority: EventPriority,
    },
}

impl CallEvent {
    /// Get the priority of this event
    pub fn priority(&self) -> EventPriority {
        match self {
            CallEvent::StatusChanged { current, .. } if *current == CallStatus::RingingIn => {
                EventPriority::High
            }
            CallEvent::StatusChanged { .. } => EventPriority::Normal,
            CallEvent::RecordingChanged { .. } => EventPriority::Low,
            CallEvent::Error { priority, .. } => *priority,
        }
    }
}
