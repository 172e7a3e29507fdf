//! Recording control
//!
//! Start and stop requests are serialized by the session's recording lock
//! (`is_recording_busy`): a request made while another one is still waiting
//! on the backend is ignored. `is_recording` itself is never set here; it
//! follows the backend's recording notifications.

use tracing::{debug, info};

use crate::call::CallStatus;
use crate::error::{CallError, CallResult};

impl super::manager::CallOrchestrator {
    /// Start recording if stopped, stop it if running
    pub async fn toggle_recording(&self) -> CallResult<()> {
        let (busy, recording) = {
            let session = self.session.read().await;
            (session.is_recording_busy(), session.is_recording())
        };
        if busy {
            debug!("Recording request already in flight, ignoring toggle");
            return Ok(());
        }

        if recording {
            self.stop_recording().await
        } else {
            self.start_recording().await
        }
    }

    /// Ask the backend to start recording the current call
    ///
    /// # Errors
    ///
    /// * `CallError::RecordingNotAllowed` - the session is not `inCall` or has
    ///   no call token; the backend is not contacted
    /// * `CallError::BackendOperationFailed` - the backend refused; also stored
    ///   as the session's last error
    pub async fn start_recording(&self) -> CallResult<()> {
        {
            let mut session = self.session.write().await;
            let status = session.status();
            let has_token = session.call_token().is_some();
            if status != CallStatus::InCall || !has_token {
                return Err(CallError::RecordingNotAllowed { status, has_token });
            }
            if !session.try_acquire_recording_lock() {
                debug!("Recording request already in flight");
                return Ok(());
            }
        }

        let result = self
            .backend
            .start_recording()
            .await
            .map_err(|e| CallError::backend_failed("start_recording", e));
        self.finish_recording_request(result, "start").await
    }

    /// Ask the backend to stop recording
    ///
    /// There is no status precondition: stopping while nothing records is
    /// forwarded to the backend as is.
    pub async fn stop_recording(&self) -> CallResult<()> {
        if !self.session.write().await.try_acquire_recording_lock() {
            debug!("Recording request already in flight");
            return Ok(());
        }

        let result = self
            .backend
            .stop_recording()
            .await
            .map_err(|e| CallError::backend_failed("stop_recording", e));
        self.finish_recording_request(result, "stop").await
    }

    async fn finish_recording_request(&self, result: CallResult<()>, action: &str) -> CallResult<()> {
        self.session.write().await.release_recording_lock();
        match result {
            Ok(()) => {
                info!(action, "Recording request sent");
                Ok(())
            }
            Err(e) => {
                self.record_error(&e).await;
                Err(e)
            }
        }
    }
}
