//! External collaborators consumed by the orchestrator
//!
//! [`SignalingBackend`] wraps the signaling/media service (login, call
//! control, media tokens, recording, push subscriptions). [`CredentialStore`]
//! wraps the secure storage holding the persisted auth token and signaling
//! user id.
//!
//! Adapter methods return [`anyhow::Result`]; the orchestrator never inspects
//! adapter errors beyond their message and wraps them into
//! [`CallError`](crate::CallError) variants.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::call::{CallHandle, MediaKind, ReceiverType, SignalingUser};
use crate::error::CallResult;
use crate::events::{RecordingEventHandler, SignalingEventHandler};

/// Media transport credential returned by [`SignalingBackend::fetch_call_token`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToken {
    pub token: String,
}

/// Options forwarded to [`SignalingBackend::build_call_settings`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSettingsOptions {
    pub session_id: String,
    pub media_kind: MediaKind,
    pub start_audio_muted: bool,
    pub start_video_paused: bool,
    pub show_recording_button: bool,
}

/// Opaque settings blob handed, uninterpreted, to the media view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallSettings(pub serde_json::Value);

/// Signaling backend adapter
#[async_trait]
pub trait SignalingBackend: Send + Sync {
    /// Initialize the backend SDK
    async fn init(&self) -> anyhow::Result<()>;

    /// Log the given signaling user in
    async fn login(&self, uid: &str) -> anyhow::Result<SignalingUser>;

    /// Create an outgoing call
    async fn start_call(
        &self,
        receiver_id: &str,
        receiver_type: ReceiverType,
    ) -> anyhow::Result<CallHandle>;

    /// Accept an incoming call
    async fn accept_call(&self, session_id: &str) -> anyhow::Result<CallHandle>;

    /// Reject an incoming call
    async fn reject_call(&self, session_id: &str) -> anyhow::Result<()>;

    /// Withdraw an outgoing call before it is accepted
    async fn cancel_call(&self, session_id: &str) -> anyhow::Result<()>;

    /// End an established call
    async fn end_call(&self, session_id: &str) -> anyhow::Result<()>;

    /// Fetch the media transport token for a session
    async fn fetch_call_token(&self, session_id: &str) -> anyhow::Result<CallToken>;

    /// Read the session identifier out of a call handle
    fn extract_session_id(&self, handle: &CallHandle) -> Option<String>;

    /// Register call lifecycle handlers
    fn subscribe(&self, handler: Arc<dyn SignalingEventHandler>) -> anyhow::Result<Subscription>;

    /// Register recording handlers bound to one call
    fn subscribe_recording_events(
        &self,
        handle: &CallHandle,
        handler: Arc<dyn RecordingEventHandler>,
    ) -> anyhow::Result<Subscription>;

    /// Ask the backend to start recording the current call
    async fn start_recording(&self) -> anyhow::Result<()>;

    /// Ask the backend to stop recording the current call
    async fn stop_recording(&self) -> anyhow::Result<()>;

    /// Build the settings blob for the media view
    fn build_call_settings(&self, options: &CallSettingsOptions) -> CallSettings;
}

/// Handle to a registered listener
///
/// The listener is removed when [`unsubscribe`](Subscription::unsubscribe) is
/// called or the subscription is dropped, whichever comes first.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` once when released
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Remove the listener now
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Secure key/value storage for persisted credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_item(&self, key: &str) -> CallResult<Option<String>>;
}

/// In-memory [`CredentialStore`]
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    items: DashMap<String, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.items.insert(key.into(), value.into());
    }

    pub fn remove_item(&self, key: &str) {
        self.items.remove(key);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_item(&self, key: &str) -> CallResult<Option<String>> {
        Ok(self.items.get(key).map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscription_releases_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_releases_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        {
            let _subscription = Subscription::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get_item("auth_token").await.unwrap(), None);

        store.set_item("auth_token", "secret");
        assert_eq!(store.get_item("auth_token").await.unwrap(), Some("secret".to_string()));

        store.remove_item("auth_token");
        assert_eq!(store.get_item("auth_token").await.unwrap(), None);
    }
}
