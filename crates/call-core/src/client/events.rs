//! Event handling for the call-core library
//!
//! This module contains the handlers that bridge backend push events to
//! session transitions. Handlers never return errors: a failure while
//! preparing the call view is recorded as the session's last error.
//!
//! | Event | Effect |
//! |---|---|
//! | incoming call received | store incoming handle, `ringingIn` |
//! | outgoing call accepted | clear outgoing handle, `connecting`, prepare call view; ignored without a ringing outgoing call |
//! | outgoing call rejected | clear outgoing handle, last error `"rejected"`, reset |
//! | incoming call cancelled | clear incoming handle, reset |
//! | call ended | reset from any status |

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::call::CallHandle;
use crate::events::{RecordingEventHandler, SignalingEventHandler};

use super::manager::CallOrchestrator;

/// Last error recorded when the remote party rejects an outgoing call
pub const REJECTED_ERROR: &str = "rejected";

/// Bridges backend call events to session transitions
pub struct SignalingEventBridge {
    orchestrator: Weak<CallOrchestrator>,
}

impl std::fmt::Debug for SignalingEventBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingEventBridge")
            .field("attached", &(self.orchestrator.strong_count() > 0))
            .finish()
    }
}

impl SignalingEventBridge {
    pub fn new(orchestrator: Weak<CallOrchestrator>) -> Self {
        Self { orchestrator }
    }

    fn orchestrator(&self) -> Option<Arc<CallOrchestrator>> {
        let orchestrator = self.orchestrator.upgrade();
        if orchestrator.is_none() {
            debug!("Orchestrator dropped, ignoring signaling event");
        }
        orchestrator
    }
}

#[async_trait]
impl SignalingEventHandler for SignalingEventBridge {
    async fn on_incoming_call_received(&self, handle: CallHandle) {
        let Some(orchestrator) = self.orchestrator() else { return };
        info!(caller = %handle.initiator.uid, media = ?handle.media_kind, "Incoming call");

        orchestrator
            .transition("incoming call received", |session| {
                if !session.status().is_idle() {
                    warn!(status = %session.status(), "Incoming call replaces current session");
                }
                session.incoming_received(handle);
            })
            .await;
    }

    async fn on_outgoing_call_accepted(&self, handle: CallHandle) {
        let Some(orchestrator) = self.orchestrator() else { return };
        info!(receiver = %handle.receiver.uid, "Outgoing call accepted");

        let _gate = orchestrator.operation_gate.lock().await;
        let accepted = orchestrator
            .transition("outgoing call accepted", |session| session.outgoing_accepted())
            .await;
        if !accepted {
            debug!("No outgoing call awaiting acceptance, ignoring");
            return;
        }

        // Already recorded as last error and reset on failure.
        let _ = orchestrator.prepare_in_call_view(handle).await;
    }

    async fn on_outgoing_call_rejected(&self) {
        let Some(orchestrator) = self.orchestrator() else { return };
        info!("Outgoing call rejected");

        orchestrator
            .transition("outgoing call rejected", |session| {
                session.clear_outgoing();
                session.record_error(REJECTED_ERROR);
            })
            .await;
        orchestrator.reset_session("outgoing call rejected").await;
    }

    async fn on_incoming_call_cancelled(&self) {
        let Some(orchestrator) = self.orchestrator() else { return };
        info!("Incoming call cancelled");

        orchestrator
            .transition("incoming call cancelled", |session| session.clear_incoming())
            .await;
        orchestrator.reset_session("incoming call cancelled").await;
    }

    async fn on_call_ended(&self) {
        let Some(orchestrator) = self.orchestrator() else { return };
        info!("Call ended by backend");

        orchestrator.reset_session("call ended remotely").await;
    }
}

/// Keeps `is_recording` in sync with backend recording notifications for one call
pub struct RecordingEventListener {
    orchestrator: Weak<CallOrchestrator>,
    session_id: String,
}

impl RecordingEventListener {
    pub fn new(orchestrator: Weak<CallOrchestrator>, session_id: String) -> Self {
        Self {
            orchestrator,
            session_id,
        }
    }

    async fn set_recording(&self, recording: bool, cause: &str) {
        let Some(orchestrator) = self.orchestrator.upgrade() else { return };

        let changed = {
            let mut session = orchestrator.session.write().await;
            if recording && session.status().is_idle() {
                debug!(session_id = %self.session_id, "Recording started after reset, ignoring");
                return;
            }
            let changed = session.is_recording() != recording;
            session.set_recording(recording);
            changed
        };

        info!(session_id = %self.session_id, recording, cause, "Recording state updated");
        if changed {
            orchestrator.emit_recording_changed(recording);
        }
    }
}

#[async_trait]
impl RecordingEventHandler for RecordingEventListener {
    async fn on_started(&self) {
        self.set_recording(true, "started").await;
    }

    async fn on_stopped(&self) {
        self.set_recording(false, "stopped").await;
    }

    async fn on_ended(&self) {
        self.set_recording(false, "ended").await;
    }

    async fn on_timeout(&self) {
        self.set_recording(false, "timeout").await;
    }
}
