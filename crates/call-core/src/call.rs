//! Call data types shared by the orchestrator and the signaling adapter
//!
//! All actual media transport is delegated to the signaling backend; these
//! types only describe what the orchestrator tracks about a call attempt.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current status of the call session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallStatus {
    /// No call in progress
    #[default]
    Idle,
    /// Waiting on the backend to create, accept or prepare a call
    Connecting,
    /// Outgoing call offered, waiting for the remote party
    RingingOut,
    /// Incoming call offered to the local user
    RingingIn,
    /// Call established and media token issued
    InCall,
    /// Termination in progress
    Ending,
}

impl CallStatus {
    /// Check if the session is between calls
    pub fn is_idle(&self) -> bool {
        matches!(self, CallStatus::Idle)
    }

    /// Check if the session is still ringing (either direction)
    pub fn is_ringing(&self) -> bool {
        matches!(self, CallStatus::RingingOut | CallStatus::RingingIn)
    }

    /// Name used in logs and error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Idle => "idle",
            CallStatus::Connecting => "connecting",
            CallStatus::RingingOut => "ringingOut",
            CallStatus::RingingIn => "ringingIn",
            CallStatus::InCall => "inCall",
            CallStatus::Ending => "ending",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media kind of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Kind of party a call is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiverType {
    User,
    Group,
}

/// Identity of one side of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Backend user identifier
    pub uid: String,
    /// Display name, if the backend provided one
    pub name: Option<String>,
    /// Avatar URL, if the backend provided one
    pub avatar: Option<String>,
}

impl Participant {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: None,
            avatar: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Backend-issued handle for one call attempt
///
/// The handle is opaque to the orchestrator: the session identifier lives in
/// `payload` and is only read through
/// [`SignalingBackend::extract_session_id`](crate::backend::SignalingBackend::extract_session_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallHandle {
    /// Audio or video
    pub media_kind: MediaKind,
    /// Party that created the call
    pub initiator: Participant,
    /// Party (user or group) the call is addressed to
    pub receiver: Participant,
    /// Receiver kind
    pub receiver_type: ReceiverType,
    /// Raw backend payload
    pub payload: serde_json::Value,
}

/// Authenticated signaling user returned by the backend login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalingUser {
    pub uid: String,
    pub name: Option<String>,
}
