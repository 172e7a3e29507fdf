//! The call orchestrator
//!
//! [`CallOrchestrator`] owns the one [`CallSession`] of the process, the
//! credential bootstrapper and the backend subscriptions. User actions live in
//! `calls.rs` and `recording.rs`, push events in `events.rs`; all of them are
//! `impl CallOrchestrator` blocks so every write to the session goes through
//! the helpers defined here.

use std::sync::{Arc, Weak};

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, error, info};

use crate::backend::{CallSettings, CallSettingsOptions, CredentialStore, SignalingBackend, Subscription};
use crate::call::{CallHandle, CallStatus};
use crate::error::{CallError, CallResult};
use crate::events::{CallEvent, EventPriority};
use crate::session::{CallSession, CallSessionView};

use super::config::OrchestratorConfig;
use super::credentials::CredentialBootstrapper;
use super::events::SignalingEventBridge;

/// Drives a single audio/video call on top of a signaling backend
pub struct CallOrchestrator {
    pub(crate) backend: Arc<dyn SignalingBackend>,

    pub(crate) credentials: CredentialBootstrapper,

    pub(crate) config: OrchestratorConfig,

    pub(crate) session: RwLock<CallSession>,

    /// Held by operations awaiting the backend on behalf of the session
    /// (`start_call`, `accept_incoming`, outgoing-accepted preparation) so
    /// `end_call` can wait for them to settle before resetting.
    pub(crate) operation_gate: Mutex<()>,

    pub(crate) is_ready: RwLock<bool>,

    pub(crate) signaling_subscription: Mutex<Option<Subscription>>,

    pub(crate) recording_subscription: Mutex<Option<Subscription>>,

    pub(crate) event_tx: broadcast::Sender<CallEvent>,

    pub(crate) self_ref: Weak<CallOrchestrator>,
}

impl std::fmt::Debug for CallOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallOrchestrator")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl CallOrchestrator {
    /// Create an orchestrator with an idle session
    ///
    /// The orchestrator does not talk to the backend until
    /// [`start`](Self::start) is called.
    pub fn new(
        backend: Arc<dyn SignalingBackend>,
        store: Arc<dyn CredentialStore>,
        config: OrchestratorConfig,
    ) -> CallResult<Arc<Self>> {
        config.validate()?;

        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        let credentials = CredentialBootstrapper::new(
            backend.clone(),
            store,
            config.auth_token_key.clone(),
            config.signaling_uid_key.clone(),
        );

        Ok(Arc::new_cyclic(|self_ref| Self {
            backend,
            credentials,
            config,
            session: RwLock::new(CallSession::new()),
            operation_gate: Mutex::new(()),
            is_ready: RwLock::new(false),
            signaling_subscription: Mutex::new(None),
            recording_subscription: Mutex::new(None),
            event_tx,
            self_ref: self_ref.clone(),
        }))
    }

    /// Initialize the backend and subscribe to its push events
    ///
    /// Calling `start` on a started orchestrator does nothing.
    pub async fn start(&self) -> CallResult<()> {
        let mut subscription = self.signaling_subscription.lock().await;
        if subscription.is_some() {
            debug!("Orchestrator already started");
            return Ok(());
        }

        self.backend
            .init()
            .await
            .map_err(|e| CallError::backend_failed("init", e))?;

        let bridge = Arc::new(SignalingEventBridge::new(self.self_ref.clone()));
        let handle = self
            .backend
            .subscribe(bridge)
            .map_err(|e| CallError::backend_failed("subscribe", e))?;
        *subscription = Some(handle);

        *self.is_ready.write().await = true;
        info!("Call orchestrator started");
        Ok(())
    }

    /// Unsubscribe from the backend and return the session to idle
    pub async fn shutdown(&self) {
        if let Some(subscription) = self.signaling_subscription.lock().await.take() {
            subscription.unsubscribe();
        }
        *self.is_ready.write().await = false;
        self.reset_session("orchestrator shutdown").await;
        info!("Call orchestrator stopped");
    }

    /// True once [`start`](Self::start) completed
    pub async fn is_ready(&self) -> bool {
        *self.is_ready.read().await
    }

    /// Subscribe to session events
    pub fn subscribe_events(&self) -> broadcast::Receiver<CallEvent> {
        self.event_tx.subscribe()
    }

    /// Credential bootstrapper used before authenticated backend calls
    pub fn credentials(&self) -> &CredentialBootstrapper {
        &self.credentials
    }

    // ===== READ SURFACE =====

    /// Read-only view for UI code
    pub async fn snapshot(&self) -> CallSessionView {
        let is_ready = self.is_ready().await;
        let session = self.session.read().await;
        CallSessionView::from_session(&session, is_ready)
    }

    /// Copy of the full session record
    pub async fn session(&self) -> CallSession {
        self.session.read().await.clone()
    }

    pub async fn status(&self) -> CallStatus {
        self.session.read().await.status()
    }

    pub async fn has_active_call(&self) -> bool {
        self.session.read().await.has_active_call()
    }

    pub async fn active_call(&self) -> Option<CallHandle> {
        self.session.read().await.active_call().cloned()
    }

    pub async fn call_token(&self) -> Option<String> {
        self.session.read().await.call_token().map(str::to_string)
    }

    /// Return the last recorded error and clear it
    pub async fn take_last_error(&self) -> Option<String> {
        self.session.write().await.take_last_error()
    }

    /// Settings blob for the media view of the active call
    pub async fn call_settings(&self) -> Option<CallSettings> {
        let handle = self.active_call().await?;
        let session_id = self.backend.extract_session_id(&handle)?;
        let defaults = &self.config.call_settings;
        let options = CallSettingsOptions {
            session_id,
            media_kind: handle.media_kind,
            start_audio_muted: defaults.start_audio_muted,
            start_video_paused: defaults.start_video_paused,
            show_recording_button: defaults.show_recording_button,
        };
        Some(self.backend.build_call_settings(&options))
    }

    // ===== TRANSITION HELPERS =====

    /// Apply a transition to the session and broadcast a status change
    pub(crate) async fn transition<R>(
        &self,
        reason: &str,
        apply: impl FnOnce(&mut CallSession) -> R,
    ) -> R {
        let (previous, current, result) = {
            let mut session = self.session.write().await;
            let previous = session.status();
            let result = apply(&mut session);
            (previous, session.status(), result)
        };

        if previous != current {
            info!(from = %previous, to = %current, reason, "Call status changed");
            let _ = self.event_tx.send(CallEvent::StatusChanged {
                previous,
                current,
                reason: Some(reason.to_string()),
                timestamp: Utc::now(),
            });
        }
        result
    }

    /// Return the session to idle and release the recording listener
    pub(crate) async fn reset_session(&self, reason: &str) {
        if let Some(subscription) = self.recording_subscription.lock().await.take() {
            subscription.unsubscribe();
        }
        self.transition(reason, CallSession::reset).await;
    }

    /// Store an error as the session's last error and broadcast it
    pub(crate) async fn record_error(&self, error: &CallError) {
        error!(error = %error, category = error.category(), "Call operation failed");
        self.session.write().await.record_error(error.to_string());
        let _ = self.event_tx.send(CallEvent::Error {
            error: error.clone(),
            priority: EventPriority::High,
        });
    }

    /// Record the error, reset the session, and hand the error back
    pub(crate) async fn fail_and_reset(&self, error: CallError) -> CallError {
        self.record_error(&error).await;
        self.reset_session("operation failed").await;
        error
    }

    pub(crate) fn session_id_of(&self, handle: &CallHandle) -> CallResult<String> {
        self.backend
            .extract_session_id(handle)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CallError::invalid_input("call handle has no session id"))
    }

    pub(crate) fn emit_recording_changed(&self, recording: bool) {
        let _ = self.event_tx.send(CallEvent::RecordingChanged {
            recording,
            timestamp: Utc::now(),
        });
    }
}
