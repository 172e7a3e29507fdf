use serde::{Deserialize, Serialize};

use crate::error::{CallError, CallResult};

/// Defaults forwarded to the backend when building media view settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSettingsDefaults {
    /// Join with the microphone muted
    pub start_audio_muted: bool,
    /// Join with the camera paused
    pub start_video_paused: bool,
    /// Show the recording control in the media view
    pub show_recording_button: bool,
}

impl Default for CallSettingsDefaults {
    fn default() -> Self {
        Self {
            start_audio_muted: false,
            start_video_paused: false,
            show_recording_button: true,
        }
    }
}

/// Configuration for the call orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Secure-store key of the persisted auth token
    pub auth_token_key: String,
    /// Secure-store key of the persisted signaling user id
    pub signaling_uid_key: String,
    /// Capacity of the [`CallEvent`](crate::CallEvent) broadcast channel
    pub event_channel_capacity: usize,
    /// Media view defaults
    pub call_settings: CallSettingsDefaults,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            auth_token_key: "auth_token".to_string(),
            signaling_uid_key: "signaling_uid".to_string(),
            event_channel_capacity: 256,
            call_settings: CallSettingsDefaults::default(),
        }
    }

    /// Set the secure-store key names
    pub fn with_credential_keys(
        mut self,
        auth_token_key: impl Into<String>,
        signaling_uid_key: impl Into<String>,
    ) -> Self {
        self.auth_token_key = auth_token_key.into();
        self.signaling_uid_key = signaling_uid_key.into();
        self
    }

    /// Set the event channel capacity
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Set media view defaults
    pub fn with_call_settings(mut self, call_settings: CallSettingsDefaults) -> Self {
        self.call_settings = call_settings;
        self
    }

    /// Check the configuration for values the orchestrator cannot run with
    pub fn validate(&self) -> CallResult<()> {
        if self.auth_token_key.trim().is_empty() {
            return Err(CallError::invalid_configuration("auth_token_key", "must not be empty"));
        }
        if self.signaling_uid_key.trim().is_empty() {
            return Err(CallError::invalid_configuration("signaling_uid_key", "must not be empty"));
        }
        if self.event_channel_capacity == 0 {
            return Err(CallError::invalid_configuration(
                "event_channel_capacity",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
