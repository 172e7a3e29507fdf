//! The call session record
//!
//! [`CallSession`] is the single piece of mutable state the orchestrator owns.
//! Fields are private: reads go through accessors, writes go through the named
//! transition methods below, which are crate-private so only the gateway, the
//! recording controller and the event bridge can move the session.
//!
//! # Invariants (once an operation has settled)
//!
//! - `idle` implies no incoming, outgoing or active handle, no call token and
//!   recording off.
//! - `ringingIn` implies an incoming handle, `ringingOut` an outgoing handle,
//!   `inCall` an active handle.
//! - A call token is only present while `inCall`.
//! - At most one of the three handles is set.

use serde::{Deserialize, Serialize};

use crate::call::{CallHandle, CallStatus};

/// Mutable state of the one call the orchestrator manages
#[derive(Debug, Clone, Default)]
pub struct CallSession {
    status: CallStatus,
    incoming_call: Option<CallHandle>,
    outgoing_call: Option<CallHandle>,
    active_call: Option<CallHandle>,
    call_token: Option<String>,
    is_recording: bool,
    is_recording_busy: bool,
    last_error: Option<String>,
}

impl CallSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn incoming_call(&self) -> Option<&CallHandle> {
        self.incoming_call.as_ref()
    }

    pub fn outgoing_call(&self) -> Option<&CallHandle> {
        self.outgoing_call.as_ref()
    }

    pub fn active_call(&self) -> Option<&CallHandle> {
        self.active_call.as_ref()
    }

    pub fn call_token(&self) -> Option<&str> {
        self.call_token.as_deref()
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn is_recording_busy(&self) -> bool {
        self.is_recording_busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// True while a call is established or being placed by the local user
    pub fn has_active_call(&self) -> bool {
        self.active_call.is_some() || self.outgoing_call.is_some()
    }

    /// Handle used to address the backend when terminating: active, then
    /// outgoing, then incoming.
    pub fn termination_handle(&self) -> Option<&CallHandle> {
        self.active_call
            .as_ref()
            .or(self.outgoing_call.as_ref())
            .or(self.incoming_call.as_ref())
    }

    /// Check the settled-state invariants listed in the module docs
    pub fn invariants_hold(&self) -> bool {
        let handles = [&self.incoming_call, &self.outgoing_call, &self.active_call]
            .iter()
            .filter(|handle| handle.is_some())
            .count();

        let per_status = match self.status {
            CallStatus::Idle => handles == 0 && !self.is_recording,
            CallStatus::RingingIn => self.incoming_call.is_some(),
            CallStatus::RingingOut => self.outgoing_call.is_some(),
            CallStatus::InCall => self.active_call.is_some(),
            CallStatus::Connecting | CallStatus::Ending => true,
        };
        let token_ok = self.call_token.is_none() || self.status == CallStatus::InCall;

        handles <= 1 && per_status && token_ok
    }

    // ===== TRANSITIONS =====

    pub(crate) fn begin_connecting(&mut self) {
        self.status = CallStatus::Connecting;
    }

    /// Store the handle of a freshly created outgoing call
    ///
    /// A session already marked `ending` stays `ending` so the pending
    /// termination can cancel the call.
    pub(crate) fn outgoing_created(&mut self, handle: CallHandle) {
        self.outgoing_call = Some(handle);
        if self.status != CallStatus::Ending {
            self.status = CallStatus::RingingOut;
        }
    }

    pub(crate) fn incoming_received(&mut self, handle: CallHandle) {
        self.incoming_call = Some(handle);
        self.status = CallStatus::RingingIn;
    }

    /// Move an accepted outgoing call to `connecting`
    ///
    /// Returns false, leaving the session untouched, when there is no
    /// outgoing call to accept or termination already started.
    pub(crate) fn outgoing_accepted(&mut self) -> bool {
        if self.outgoing_call.is_none() || self.status == CallStatus::Ending {
            return false;
        }
        self.outgoing_call = None;
        self.status = CallStatus::Connecting;
        true
    }

    pub(crate) fn clear_incoming(&mut self) {
        self.incoming_call = None;
    }

    pub(crate) fn clear_outgoing(&mut self) {
        self.outgoing_call = None;
    }

    /// Promote a handle into the established call
    ///
    /// When termination already started the handle is kept for the pending
    /// `end_call`, but the token is dropped and the status stays `ending`.
    pub(crate) fn enter_call(&mut self, handle: CallHandle, token: String) {
        self.active_call = Some(handle);
        if self.status == CallStatus::Ending {
            self.call_token = None;
        } else {
            self.call_token = Some(token);
            self.status = CallStatus::InCall;
        }
    }

    pub(crate) fn begin_ending(&mut self) {
        self.status = CallStatus::Ending;
    }

    pub(crate) fn set_recording(&mut self, recording: bool) {
        self.is_recording = recording;
    }

    /// Take the recording lock; false if it is already held
    pub(crate) fn try_acquire_recording_lock(&mut self) -> bool {
        if self.is_recording_busy {
            return false;
        }
        self.is_recording_busy = true;
        true
    }

    pub(crate) fn release_recording_lock(&mut self) {
        self.is_recording_busy = false;
    }

    pub(crate) fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub(crate) fn take_last_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Return to `idle` and clear every transient field except `last_error`
    pub(crate) fn reset(&mut self) {
        self.status = CallStatus::Idle;
        self.incoming_call = None;
        self.outgoing_call = None;
        self.active_call = None;
        self.call_token = None;
        self.is_recording = false;
        self.is_recording_busy = false;
    }
}

/// Read-only view of the session exposed to UI code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSessionView {
    pub status: CallStatus,
    pub incoming_call: Option<CallHandle>,
    pub has_active_call: bool,
    pub is_recording: bool,
    pub is_recording_busy: bool,
    pub is_ready: bool,
}

impl CallSessionView {
    pub(crate) fn from_session(session: &CallSession, is_ready: bool) -> Self {
        Self {
            status: session.status(),
            incoming_call: session.incoming_call().cloned(),
            has_active_call: session.has_active_call(),
            is_recording: session.is_recording(),
            is_recording_busy: session.is_recording_busy(),
            is_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::{MediaKind, Participant, ReceiverType};

    fn handle(session_id: &str) -> CallHandle {
        CallHandle {
            media_kind: MediaKind::Video,
            initiator: Participant::new("me"),
            receiver: Participant::new("u1"),
            receiver_type: ReceiverType::User,
            payload: serde_json::json!({ "sessionId": session_id }),
        }
    }

    fn in_call_session() -> CallSession {
        let mut session = CallSession::new();
        session.begin_connecting();
        session.enter_call(handle("s1"), "tok-1".to_string());
        session.set_recording(true);
        assert!(session.try_acquire_recording_lock());
        session
    }

    #[test]
    fn test_new_session_is_idle_and_consistent() {
        let session = CallSession::new();
        assert_eq!(session.status(), CallStatus::Idle);
        assert!(!session.has_active_call());
        assert!(session.invariants_hold());
    }

    #[test]
    fn test_reset_clears_transient_fields() {
        let mut session = in_call_session();
        session.record_error("boom");

        session.reset();

        assert_eq!(session.status(), CallStatus::Idle);
        assert!(session.active_call().is_none());
        assert!(session.call_token().is_none());
        assert!(!session.is_recording());
        assert!(!session.is_recording_busy());
        assert!(session.invariants_hold());
        // last error survives so the UI can still read it
        assert_eq!(session.last_error(), Some("boom"));
    }

    #[test]
    fn test_outgoing_accepted_requires_ringing_outgoing_call() {
        let mut session = CallSession::new();
        assert!(!session.outgoing_accepted());
        assert_eq!(session.status(), CallStatus::Idle);

        session.begin_connecting();
        session.outgoing_created(handle("s1"));
        session.begin_ending();
        assert!(!session.outgoing_accepted());
        assert_eq!(session.status(), CallStatus::Ending);
        assert!(session.outgoing_call().is_some());

        let mut session = CallSession::new();
        session.begin_connecting();
        session.outgoing_created(handle("s1"));
        assert!(session.outgoing_accepted());
        assert_eq!(session.status(), CallStatus::Connecting);
        assert!(session.outgoing_call().is_none());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut session = in_call_session();
        session.reset();
        let after_first = format!("{:?}", session);

        session.reset();

        assert_eq!(format!("{:?}", session), after_first);
    }

    #[test]
    fn test_outgoing_created_respects_pending_termination() {
        let mut session = CallSession::new();
        session.begin_connecting();
        session.begin_ending();

        session.outgoing_created(handle("s1"));

        assert_eq!(session.status(), CallStatus::Ending);
        assert!(session.outgoing_call().is_some());
        assert!(session.has_active_call());
    }

    #[test]
    fn test_enter_call_while_ending_drops_token() {
        let mut session = CallSession::new();
        session.begin_ending();

        session.enter_call(handle("s1"), "tok-1".to_string());

        assert_eq!(session.status(), CallStatus::Ending);
        assert!(session.call_token().is_none());
        assert!(session.invariants_hold());
    }

    #[test]
    fn test_termination_handle_priority() {
        let mut session = CallSession::new();
        session.incoming_received(handle("in"));
        assert_eq!(session.termination_handle(), Some(&handle("in")));

        session.outgoing_created(handle("out"));
        assert_eq!(session.termination_handle(), Some(&handle("out")));

        session.enter_call(handle("active"), "tok".to_string());
        assert_eq!(session.termination_handle(), Some(&handle("active")));
        // three handles at once is only a transient state
        assert!(!session.invariants_hold());
    }

    #[test]
    fn test_recording_lock_is_exclusive() {
        let mut session = CallSession::new();
        assert!(session.try_acquire_recording_lock());
        assert!(!session.try_acquire_recording_lock());
        session.release_recording_lock();
        assert!(session.try_acquire_recording_lock());
    }

    #[test]
    fn test_take_last_error_consumes() {
        let mut session = CallSession::new();
        session.record_error("rejected");
        assert_eq!(session.take_last_error(), Some("rejected".to_string()));
        assert_eq!(session.take_last_error(), None);
    }

    #[test]
    fn test_view_reflects_session() {
        let mut session = CallSession::new();
        session.incoming_received(handle("s1"));

        let view = CallSessionView::from_session(&session, true);

        assert_eq!(view.status, CallStatus::RingingIn);
        assert_eq!(view.incoming_call, Some(handle("s1")));
        assert!(!view.has_active_call);
        assert!(view.is_ready);
    }
}
