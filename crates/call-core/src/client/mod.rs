//! Call orchestrator implementation
//!
//! # Architecture Overview
//!
//! - **`manager`** - The [`CallOrchestrator`] owning the session record
//! - **`calls`** - User call operations (start, accept, reject, end)
//! - **`recording`** - Recording start/stop behind the recording lock
//! - **`events`** - Bridge from backend push events to session transitions
//! - **`credentials`** - Single-flight signaling login
//! - **`config`** / **`builder`** - Construction
//!
//! ```text
//!   UI ──► calls / recording ──┐
//!                              ├──► CallSession (owned by CallOrchestrator)
//!   backend ──► events ────────┘
//! ```
//!
//! # Basic Call Flow
//!
//! ```rust,no_run
//! # use call_core::{OrchestratorBuilder, CallEvent, CallStatus, ReceiverType};
//! # use call_core::backend::{SignalingBackend, MemoryCredentialStore};
//! # use std::sync::Arc;
//! # async fn example(backend: Arc<dyn SignalingBackend>) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryCredentialStore::new());
//! store.set_item("auth_token", "token-from-login");
//! store.set_item("signaling_uid", "alice");
//!
//! let orchestrator = OrchestratorBuilder::new()
//!     .backend(backend)
//!     .credential_store(store)
//!     .build()?;
//! orchestrator.start().await?;
//!
//! let mut events = orchestrator.subscribe_events();
//! orchestrator.start_call("bob", ReceiverType::User).await?;
//!
//! while let Ok(event) = events.recv().await {
//!     if let CallEvent::StatusChanged { current: CallStatus::InCall, .. } = event {
//!         let settings = orchestrator.call_settings().await;
//!         println!("Joining media view with {:?}", settings);
//!         break;
//!     }
//! }
//!
//! orchestrator.end_call().await;
//! orchestrator.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod calls;
pub mod config;
pub mod credentials;
pub mod events;
pub mod manager;
pub mod recording;

pub use builder::OrchestratorBuilder;
pub use config::{CallSettingsDefaults, OrchestratorConfig};
pub use credentials::CredentialBootstrapper;
pub use events::{RecordingEventListener, SignalingEventBridge, REJECTED_ERROR};
pub use manager::CallOrchestrator;
