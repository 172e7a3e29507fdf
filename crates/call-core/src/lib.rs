//! Call-core: session orchestration for a single audio/video call
//!
//! This crate manages the lifecycle of one call on top of an external
//! signaling backend that delivers call invitations by push and issues
//! short-lived media tokens.
//!
//! ## Layer Separation
//! ```text
//! UI -> call-core -> signaling backend adapter -> {signaling service, media transport}
//! ```
//!
//! Call-core focuses on:
//! - The call state machine (`idle`, `connecting`, `ringingOut`, `ringingIn`,
//!   `inCall`, `ending`)
//! - Safe cleanup on every exit path
//! - Single-flight signaling login
//! - Serialized recording start/stop
//!
//! Media transport, push delivery and call history belong to the backend and
//! the application.

pub mod backend;
pub mod call;
pub mod client;
pub mod error;
pub mod events;
pub mod session;

// Public API exports
pub use backend::{
    CallSettings, CallSettingsOptions, CallToken, CredentialStore, MemoryCredentialStore,
    SignalingBackend, Subscription,
};
pub use call::{CallHandle, CallStatus, MediaKind, Participant, ReceiverType, SignalingUser};
pub use client::{
    CallOrchestrator, CallSettingsDefaults, CredentialBootstrapper, OrchestratorBuilder,
    OrchestratorConfig, REJECTED_ERROR,
};
pub use error::{CallError, CallResult};
pub use events::{CallEvent, EventPriority, RecordingEventHandler, SignalingEventHandler};
pub use session::{CallSession, CallSessionView};

/// Call-core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
