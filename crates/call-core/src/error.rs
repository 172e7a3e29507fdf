//! Error types and handling for the call-core library
//!
//! This module defines every error an orchestrator operation can return and
//! groups them so callers can decide how to react.
//!
//! # Error Categories
//!
//! - **Input Errors** - Rejected before any backend call (`InvalidInput`)
//! - **State Errors** - Operation not allowed in the current call status
//!   (`AlreadyInSession`, `RecordingNotAllowed`)
//! - **Auth Errors** - The signaling session could not be bootstrapped
//!   (`AuthCredentialsMissing`, `AuthenticationFailed`)
//! - **Backend Errors** - The signaling adapter failed (`BackendOperationFailed`)
//! - **Configuration Errors** - The orchestrator was built with bad settings
//!
//! # Propagation
//!
//! `start_call` and `accept_incoming` store the error as the session's last
//! error, reset the session **and** return the error. Termination operations
//! (`reject_incoming`, `end_call`) only log backend failures. Push events never
//! return errors; their failures are visible through `take_last_error()`.
//!
//! ```rust,no_run
//! # use call_core::{CallOrchestrator, CallError, ReceiverType};
//! # use std::sync::Arc;
//! # async fn example(orchestrator: Arc<CallOrchestrator>) {
//! match orchestrator.start_call("user-42", ReceiverType::User).await {
//!     Ok(()) => println!("Ringing"),
//!     Err(CallError::AlreadyInSession { status }) => {
//!         println!("Busy: session is {}", status);
//!     }
//!     Err(e) if e.is_auth_error() => {
//!         println!("Please sign in again");
//!     }
//!     Err(e) => eprintln!("Call failed ({}): {}", e.category(), e),
//! }
//! # }
//! ```

use thiserror::Error;

use crate::call::CallStatus;

/// Result type alias for call-core operations
pub type CallResult<T> = Result<T, CallError>;

/// Error types for call orchestration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// Input errors
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// State errors
    #[error("Already in a call session (status: {status})")]
    AlreadyInSession { status: CallStatus },

    #[error("Recording not allowed: status is {status}, call token present: {has_token}")]
    RecordingNotAllowed { status: CallStatus, has_token: bool },

    /// Authentication errors
    #[error("Missing stored credential: {key}")]
    AuthCredentialsMissing { key: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// Signaling adapter errors
    #[error("Backend operation '{operation}' failed: {reason}")]
    BackendOperationFailed { operation: String, reason: String },

    /// Configuration errors
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },
}

impl CallError {
    /// Create an invalid input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    /// Create an authentication failed error
    pub fn authentication_failed(reason: impl Into<String>) -> Self {
        Self::AuthenticationFailed { reason: reason.into() }
    }

    /// Wrap a signaling adapter failure
    pub fn backend_failed(operation: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::BackendOperationFailed {
            operation: operation.into(),
            reason: error.to_string(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if retrying the same operation later can succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            CallError::BackendOperationFailed { .. }
            | CallError::AlreadyInSession { .. }
            | CallError::RecordingNotAllowed { .. } => true,

            CallError::InvalidInput { .. }
            | CallError::AuthCredentialsMissing { .. }
            | CallError::AuthenticationFailed { .. }
            | CallError::InvalidConfiguration { .. } => false,
        }
    }

    /// Check if error indicates authentication issue
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            CallError::AuthCredentialsMissing { .. } | CallError::AuthenticationFailed { .. }
        )
    }

    /// Get error category for metrics/logging
    pub fn category(&self) -> &'static str {
        match self {
            CallError::InvalidInput { .. } => "input",
            CallError::AlreadyInSession { .. } | CallError::RecordingNotAllowed { .. } => "state",
            CallError::AuthCredentialsMissing { .. } | CallError::AuthenticationFailed { .. } => {
                "auth"
            }
            CallError::BackendOperationFailed { .. } => "backend",
            CallError::InvalidConfiguration { .. } => "configuration",
        }
    }
}
