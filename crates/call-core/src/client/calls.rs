//! Call operations for the call-core library
//!
//! User-invoked operations: placing a call, answering or rejecting an incoming
//! call, and hanging up.
//!
//! # Failure Policy
//!
//! - `start_call` and `accept_incoming` record the error, reset the session
//!   and return the error.
//! - `reject_incoming` and `end_call` always finish with an idle session.
//!   Backend failures are logged and swallowed.
//!
//! # Usage
//!
//! ```rust,no_run
//! use call_core::{CallOrchestrator, CallStatus, ReceiverType};
//! # use std::sync::Arc;
//!
//! async fn place_call(orchestrator: Arc<CallOrchestrator>) -> Result<(), Box<dyn std::error::Error>> {
//!     orchestrator.start_call("user-42", ReceiverType::User).await?;
//!     assert_eq!(orchestrator.status().await, CallStatus::RingingOut);
//!
//!     // ... the remote party never answers
//!     orchestrator.end_call().await;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::call::{CallHandle, CallStatus, ReceiverType};
use crate::error::{CallError, CallResult};

use super::events::RecordingEventListener;

/// Call operations implementation for CallOrchestrator
impl super::manager::CallOrchestrator {
    /// Place an outgoing call
    ///
    /// On success the session is `ringingOut` with the new handle as its
    /// outgoing call.
    ///
    /// # Errors
    ///
    /// * `CallError::InvalidInput` - `receiver_id` is empty
    /// * `CallError::AlreadyInSession` - the session is not idle
    /// * `CallError::AuthCredentialsMissing` / `CallError::AuthenticationFailed`
    /// * `CallError::BackendOperationFailed` - the backend could not create the call
    ///
    /// Neither precondition error touches the backend or the session.
    pub async fn start_call(&self, receiver_id: &str, receiver_type: ReceiverType) -> CallResult<()> {
        if receiver_id.trim().is_empty() {
            return Err(CallError::invalid_input("receiver id must not be empty"));
        }
        self.ensure_idle().await?;

        let _gate = self.operation_gate.lock().await;
        self.transition("outgoing call requested", |session| {
            if session.status().is_idle() {
                session.begin_connecting();
                Ok(())
            } else {
                Err(CallError::AlreadyInSession { status: session.status() })
            }
        })
        .await?;

        let handle = match self.place_call(receiver_id, receiver_type).await {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail_and_reset(e).await),
        };

        self.transition("outgoing call ringing", |session| session.outgoing_created(handle))
            .await;
        info!(receiver_id, ?receiver_type, "Outgoing call created");
        Ok(())
    }

    /// Accept the pending incoming call
    ///
    /// Does nothing when no incoming call is pending. On success the session
    /// is `inCall` with a fresh call token.
    pub async fn accept_incoming(&self) -> CallResult<()> {
        let _gate = self.operation_gate.lock().await;

        let Some(incoming) = self.session.read().await.incoming_call().cloned() else {
            debug!("No incoming call to accept");
            return Ok(());
        };

        let session_id = match self.session_id_of(&incoming) {
            Ok(id) => id,
            Err(e) => return Err(self.fail_and_reset(e).await),
        };

        self.transition("accepting incoming call", |session| session.begin_connecting())
            .await;

        let accepted = match self.accept_on_backend(&session_id).await {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail_and_reset(e).await),
        };

        self.session.write().await.clear_incoming();
        info!(session_id = %session_id, "Incoming call accepted");

        self.prepare_in_call_view(accepted).await
    }

    /// Register the recording listener, fetch the call token, and enter the call
    ///
    /// Callers must hold the operation gate.
    pub(crate) async fn prepare_in_call_view(&self, handle: CallHandle) -> CallResult<()> {
        let session_id = match self.session_id_of(&handle) {
            Ok(id) => id,
            Err(e) => return Err(self.fail_and_reset(e).await),
        };

        let listener = Arc::new(RecordingEventListener::new(
            self.self_ref.clone(),
            session_id.clone(),
        ));
        match self.backend.subscribe_recording_events(&handle, listener) {
            Ok(subscription) => {
                // Replacing an older listener releases it.
                *self.recording_subscription.lock().await = Some(subscription);
            }
            Err(e) => {
                let error = CallError::backend_failed("subscribe_recording_events", e);
                return Err(self.fail_and_reset(error).await);
            }
        }

        let token = match self.backend.fetch_call_token(&session_id).await {
            Ok(token) => token.token,
            Err(e) => {
                let error = CallError::backend_failed("fetch_call_token", e);
                return Err(self.fail_and_reset(error).await);
            }
        };

        self.transition("call established", |session| session.enter_call(handle, token))
            .await;
        info!(session_id = %session_id, "In call");
        Ok(())
    }

    /// Reject the pending incoming call
    ///
    /// Always ends with an idle session. A backend failure is logged, not
    /// returned.
    pub async fn reject_incoming(&self) {
        let Some(incoming) = self.session.read().await.incoming_call().cloned() else {
            debug!("No incoming call to reject");
            return;
        };

        self.transition("rejecting incoming call", |session| session.begin_ending())
            .await;

        match self.session_id_of(&incoming) {
            Ok(session_id) => {
                if let Err(e) = self.backend.reject_call(&session_id).await {
                    warn!(session_id = %session_id, error = %e, "Reject failed, resetting anyway");
                } else {
                    info!(session_id = %session_id, "Rejected incoming call");
                }
            }
            Err(e) => {
                warn!(error = %e, "Incoming call has no session id, resetting without reject");
            }
        }

        self.session.write().await.clear_incoming();
        self.reset_session("incoming call rejected").await;
    }

    /// Hang up, cancel or reject whatever call is in progress
    ///
    /// The backend operation is picked from the status at the time of the
    /// call: `ringingOut`/`connecting` cancel, `ringingIn` rejects, anything
    /// else ends. If another operation is still waiting on the backend, this
    /// waits for it to settle first. Always ends with an idle session.
    pub async fn end_call(&self) {
        let captured = self
            .transition("ending call", |session| {
                let status = session.status();
                if !status.is_idle() {
                    session.begin_ending();
                }
                status
            })
            .await;

        let _gate = self.operation_gate.lock().await;

        let handle = self.session.read().await.termination_handle().cloned();
        let session_id = handle.as_ref().and_then(|h| self.session_id_of(h).ok());

        let Some(session_id) = session_id else {
            debug!(status = %captured, "No call to terminate on the backend");
            self.reset_session("call ended").await;
            return;
        };

        let (operation, result) = match captured {
            CallStatus::RingingOut | CallStatus::Connecting => {
                ("cancel_call", self.backend.cancel_call(&session_id).await)
            }
            CallStatus::RingingIn => ("reject_call", self.backend.reject_call(&session_id).await),
            _ => ("end_call", self.backend.end_call(&session_id).await),
        };

        match result {
            Ok(()) => info!(session_id = %session_id, operation, "Call terminated"),
            Err(e) => warn!(
                session_id = %session_id,
                operation,
                error = %e,
                "Termination failed, resetting anyway"
            ),
        }

        self.reset_session("call ended").await;
    }

    async fn ensure_idle(&self) -> CallResult<()> {
        let status = self.session.read().await.status();
        if status.is_idle() {
            Ok(())
        } else {
            debug!(status = %status, "Rejecting start_call outside idle");
            Err(CallError::AlreadyInSession { status })
        }
    }

    async fn place_call(&self, receiver_id: &str, receiver_type: ReceiverType) -> CallResult<CallHandle> {
        self.credentials.ensure_signaling_user().await?;
        self.backend
            .start_call(receiver_id, receiver_type)
            .await
            .map_err(|e| CallError::backend_failed("start_call", e))
    }

    async fn accept_on_backend(&self, session_id: &str) -> CallResult<CallHandle> {
        self.credentials.ensure_signaling_user().await?;
        self.backend
            .accept_call(session_id)
            .await
            .map_err(|e| CallError::backend_failed("accept_call", e))
    }
}
