//! Scripted signaling backend shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use call_core::{
    CallHandle, CallOrchestrator, CallStatus, CallSettings, CallSettingsOptions, CallToken, MediaKind,
    MemoryCredentialStore, OrchestratorBuilder, Participant, ReceiverType, RecordingEventHandler,
    SignalingBackend, SignalingEventHandler, SignalingUser, Subscription,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("call_core=debug")
        .with_test_writer()
        .try_init();
}

pub fn handle(session_id: &str) -> CallHandle {
    CallHandle {
        media_kind: MediaKind::Video,
        initiator: Participant::new("me").with_name("Me"),
        receiver: Participant::new("u1"),
        receiver_type: ReceiverType::User,
        payload: serde_json::json!({ "sessionId": session_id }),
    }
}

pub fn handle_without_session_id() -> CallHandle {
    CallHandle {
        payload: serde_json::json!({}),
        ..handle("")
    }
}

/// Mock backend: records every adapter call, can fail or hold any operation
#[derive(Default)]
pub struct MockBackend {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    holds: Mutex<HashMap<&'static str, oneshot::Receiver<()>>>,
    call_handles: Mutex<HashMap<&'static str, CallHandle>>,
    token: Mutex<String>,
    signaling_handler: Mutex<Option<Arc<dyn SignalingEventHandler>>>,
    recording_handler: Mutex<Option<Arc<dyn RecordingEventHandler>>>,
    active_subscriptions: Arc<Mutex<usize>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        let backend = Self::default();
        *backend.token.lock().unwrap() = "tok-1".to_string();
        Arc::new(backend)
    }

    /// Make `operation` return an error
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    /// Make `operation` wait until the returned sender fires or is dropped
    pub fn hold(&self, operation: &'static str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.holds.lock().unwrap().insert(operation, rx);
        tx
    }

    /// Handle returned by `start_call` / `accept_call`
    pub fn returns(&self, operation: &'static str, handle: CallHandle) {
        self.call_handles.lock().unwrap().insert(operation, handle);
    }

    pub fn set_token(&self, token: &str) {
        *self.token.lock().unwrap() = token.to_string();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.split(':').next() == Some(operation))
            .count()
    }

    pub fn signaling(&self) -> Arc<dyn SignalingEventHandler> {
        self.signaling_handler
            .lock()
            .unwrap()
            .clone()
            .expect("orchestrator is not subscribed")
    }

    pub fn recording(&self) -> Arc<dyn RecordingEventHandler> {
        self.recording_handler
            .lock()
            .unwrap()
            .clone()
            .expect("no recording listener registered")
    }

    pub fn has_recording_listener(&self) -> bool {
        self.recording_handler.lock().unwrap().is_some()
    }

    pub fn active_subscriptions(&self) -> usize {
        *self.active_subscriptions.lock().unwrap()
    }

    async fn run(&self, operation: &'static str, argument: &str) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", operation, argument));

        let hold = self.holds.lock().unwrap().remove(operation);
        if let Some(hold) = hold {
            let _ = hold.await;
        }

        if self.failing.lock().unwrap().contains(operation) {
            anyhow::bail!("{} failed", operation);
        }
        Ok(())
    }

    fn handle_for(&self, operation: &'static str, fallback: &str) -> CallHandle {
        self.call_handles
            .lock()
            .unwrap()
            .get(operation)
            .cloned()
            .unwrap_or_else(|| handle(fallback))
    }
}

#[async_trait]
impl SignalingBackend for MockBackend {
    async fn init(&self) -> anyhow::Result<()> {
        self.run("init", "").await
    }

    async fn login(&self, uid: &str) -> anyhow::Result<SignalingUser> {
        self.run("login", uid).await?;
        Ok(SignalingUser {
            uid: uid.to_string(),
            name: None,
        })
    }

    async fn start_call(
        &self,
        receiver_id: &str,
        _receiver_type: ReceiverType,
    ) -> anyhow::Result<CallHandle> {
        self.run("start_call", receiver_id).await?;
        Ok(self.handle_for("start_call", "s1"))
    }

    async fn accept_call(&self, session_id: &str) -> anyhow::Result<CallHandle> {
        self.run("accept_call", session_id).await?;
        Ok(self.handle_for("accept_call", session_id))
    }

    async fn reject_call(&self, session_id: &str) -> anyhow::Result<()> {
        self.run("reject_call", session_id).await
    }

    async fn cancel_call(&self, session_id: &str) -> anyhow::Result<()> {
        self.run("cancel_call", session_id).await
    }

    async fn end_call(&self, session_id: &str) -> anyhow::Result<()> {
        self.run("end_call", session_id).await
    }

    async fn fetch_call_token(&self, session_id: &str) -> anyhow::Result<CallToken> {
        self.run("fetch_call_token", session_id).await?;
        Ok(CallToken {
            token: self.token.lock().unwrap().clone(),
        })
    }

    fn extract_session_id(&self, handle: &CallHandle) -> Option<String> {
        handle
            .payload
            .get("sessionId")
            .and_then(|id| id.as_str())
            .map(str::to_string)
    }

    fn subscribe(&self, handler: Arc<dyn SignalingEventHandler>) -> anyhow::Result<Subscription> {
        self.calls.lock().unwrap().push("subscribe:".to_string());
        *self.signaling_handler.lock().unwrap() = Some(handler);
        *self.active_subscriptions.lock().unwrap() += 1;
        let active = self.active_subscriptions.clone();
        Ok(Subscription::new(move || {
            *active.lock().unwrap() -= 1;
        }))
    }

    fn subscribe_recording_events(
        &self,
        handle: &CallHandle,
        handler: Arc<dyn RecordingEventHandler>,
    ) -> anyhow::Result<Subscription> {
        let session_id = self.extract_session_id(handle).unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push(format!("subscribe_recording_events:{}", session_id));
        if self.failing.lock().unwrap().contains("subscribe_recording_events") {
            anyhow::bail!("subscribe_recording_events failed");
        }
        *self.recording_handler.lock().unwrap() = Some(handler);
        Ok(Subscription::noop())
    }

    async fn start_recording(&self) -> anyhow::Result<()> {
        self.run("start_recording", "").await
    }

    async fn stop_recording(&self) -> anyhow::Result<()> {
        self.run("stop_recording", "").await
    }

    fn build_call_settings(&self, options: &CallSettingsOptions) -> CallSettings {
        CallSettings(serde_json::to_value(options).unwrap_or_default())
    }
}

/// Credential store holding a valid token and signaling uid
pub fn credentials() -> Arc<MemoryCredentialStore> {
    let store = Arc::new(MemoryCredentialStore::new());
    store.set_item("auth_token", "auth-1");
    store.set_item("signaling_uid", "me");
    store
}

/// Started orchestrator wired to a fresh mock backend
pub async fn started_orchestrator() -> (Arc<CallOrchestrator>, Arc<MockBackend>) {
    init_tracing();
    let backend = MockBackend::new();
    let orchestrator = OrchestratorBuilder::new()
        .backend(backend.clone())
        .credential_store(credentials())
        .build()
        .expect("failed to build orchestrator");
    orchestrator.start().await.expect("failed to start orchestrator");
    (orchestrator, backend)
}

/// Wait until the backend saw `expected` calls of `operation`
pub async fn wait_for_calls(backend: &MockBackend, operation: &str, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while backend.count(operation) < expected {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("backend never saw {} x{}", operation, expected));
}

/// Wait until the session reaches `status`
pub async fn wait_for_status(orchestrator: &CallOrchestrator, status: CallStatus) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while orchestrator.status().await != status {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("session never reached {}", status));
}

/// Yield a few times so spawned tasks run as far as they can
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
